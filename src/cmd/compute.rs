//! Compute command - every line of the federal and state returns

use crate::cmd::{read_return, source_name};
use clap::Args;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use taxtrace::{trace, ComputeResult};

#[derive(Args, Debug)]
pub struct ComputeCommand {
    /// Tax return JSON file. Reads from stdin if "-".
    #[arg(short = 'r', long = "return", default_value = "-")]
    tax_return: PathBuf,

    /// Only show nodes written by this module (e.g. scheduleD, IL)
    #[arg(short, long)]
    module: Option<String>,

    /// Output the full result as JSON
    #[arg(long, conflicts_with = "csv")]
    json: bool,

    /// Output one CSV row per node
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Tabled, Serialize)]
struct NodeRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Description")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: &'static str,
}

impl ComputeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_return = read_return(&self.tax_return)?;
        let result = taxtrace::compute(&tax_return)?;

        if let Some(module) = &self.module {
            if result.module(module).is_none() {
                let known: Vec<_> = result.modules.iter().map(|m| m.module.as_str()).collect();
                anyhow::bail!("no module '{}' in this run (ran: {})", module, known.join(", "));
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        let rows = self.rows(&result);
        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        } else {
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
            println!();
            println!("Tax year {}, digest {}", result.tax_year, result.digest()?);
        }
        Ok(())
    }

    /// Nodes in the order their modules wrote them
    fn rows(&self, result: &ComputeResult) -> Vec<NodeRow> {
        result
            .modules
            .iter()
            .filter(|m| self.module.as_ref().map_or(true, |name| &m.module == name))
            .flat_map(|m| {
                m.nodes.iter().filter_map(move |id| {
                    result.get(id.as_str()).map(|value| NodeRow {
                        module: m.module.clone(),
                        node: id.to_string(),
                        label: trace::label(id.as_str()),
                        value: value.value().to_string(),
                        source: source_name(value),
                    })
                })
            })
            .collect()
    }
}
