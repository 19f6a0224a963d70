//! Schema command - print the expected input format

use clap::Args;
use schemars::schema_for;
use taxtrace::TaxReturn;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// List the supported state jurisdictions instead
    #[arg(long)]
    states: bool,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        if self.states {
            for (code, name) in taxtrace::state::supported() {
                println!("{:4} {}", code, name);
            }
            return Ok(());
        }
        let schema = schema_for!(TaxReturn);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
