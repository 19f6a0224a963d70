mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taxtrace", version, about = "US income tax with per-line provenance")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a return and print every line
    Compute(cmd::compute::ComputeCommand),
    /// Show how one line was derived, down to the source documents
    Explain(cmd::explain::ExplainCommand),
    /// List wash sales found among the capital transactions
    WashSales(cmd::wash_sales::WashSalesCommand),
    /// Print the JSON Schema of the input format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts = Opts::parse();
    match opts.command {
        Command::Compute(compute) => compute.exec(),
        Command::Explain(explain) => explain.exec(),
        Command::WashSales(wash_sales) => wash_sales.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
