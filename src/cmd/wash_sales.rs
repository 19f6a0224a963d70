//! Wash-sales command - matched loss sales and their replacement lots

use crate::cmd::read_return;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use taxtrace::{match_wash_sales, WashSaleOutcome};

#[derive(Args, Debug)]
pub struct WashSalesCommand {
    /// Tax return JSON file. Reads from stdin if "-".
    #[arg(short = 'r', long = "return", default_value = "-")]
    tax_return: PathBuf,

    /// Output matches and adjusted lots as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Tabled, Serialize)]
struct MatchRow {
    #[tabled(rename = "Security")]
    symbol: String,
    #[tabled(rename = "Loss Sale")]
    loss_sale: String,
    #[tabled(rename = "Sold")]
    sold: String,
    #[tabled(rename = "Replacement")]
    replacement: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Disallowed")]
    disallowed: String,
}

impl WashSalesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_return = read_return(&self.tax_return)?;
        if !tax_return.elections.detect_wash_sales {
            log::warn!("wash-sale detection is switched off for this return; listing matches anyway");
        }
        let outcome = match_wash_sales(&tax_return.capital_transactions);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        if outcome.matches.is_empty() {
            println!("No wash sales found");
            return Ok(());
        }

        let rows = rows(&outcome);
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
        println!("Total disallowed: {}", outcome.total_disallowed());
        Ok(())
    }
}

fn rows(outcome: &WashSaleOutcome) -> Vec<MatchRow> {
    let find = |id: &str| outcome.transactions.iter().find(|t| t.id == id);
    outcome
        .matches
        .iter()
        .map(|m| MatchRow {
            symbol: m.symbol.clone(),
            loss_sale: m.loss_sale_id.clone(),
            sold: find(m.loss_sale_id.as_str())
                .map(|t| t.disposed.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            replacement: m.replacement_id.clone(),
            acquired: find(m.replacement_id.as_str())
                .and_then(|t| t.acquired)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            disallowed: m.disallowed.to_string(),
        })
        .collect()
}
