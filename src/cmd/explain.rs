//! Explain command - the derivation tree of one node

use crate::cmd::read_return;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExplainCommand {
    /// Node to explain, e.g. scheduleD.line16 or IL.line12
    node: String,

    /// Tax return JSON file. Reads from stdin if "-".
    #[arg(short = 'r', long = "return", default_value = "-")]
    tax_return: PathBuf,

    /// Output the trace tree as JSON
    #[arg(long)]
    json: bool,

    /// Only list the documents and entries the node depends on
    #[arg(long, conflicts_with = "json")]
    leaves: bool,
}

impl ExplainCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_return = read_return(&self.tax_return)?;
        let result = taxtrace::compute(&tax_return)?;

        if self.json {
            let trace = taxtrace::build_trace(&result, &self.node)?;
            println!("{}", serde_json::to_string_pretty(&trace)?);
        } else if self.leaves {
            let trace = taxtrace::build_trace(&result, &self.node)?;
            for leaf in trace.leaves() {
                println!("{} = {}  ({})", leaf.node_id, leaf.output.value(), leaf.label);
            }
        } else {
            print!("{}", taxtrace::render_trace(&result, &self.node)?);
        }
        Ok(())
    }
}
