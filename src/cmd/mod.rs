pub mod compute;
pub mod explain;
pub mod schema;
pub mod wash_sales;

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use taxtrace::core::{LeafKind, Source, TracedValue};
use taxtrace::TaxReturn;

/// Read a JSON tax return from a file (or stdin with "-")
pub fn read_return(path: &Path) -> anyhow::Result<TaxReturn> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let tax_return = taxtrace::read_tax_return(BufReader::new(file))
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(tax_return)
    }
}

fn read_from_stdin() -> anyhow::Result<TaxReturn> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe a return to stdin.");
    }

    Ok(taxtrace::read_tax_return(io::Cursor::new(buffer))?)
}

/// Short description of where a value came from
pub fn source_name(value: &TracedValue) -> &'static str {
    match value.source() {
        Source::Leaf {
            kind: LeafKind::Document,
            ..
        } => "document",
        Source::Leaf {
            kind: LeafKind::UserEntry,
            ..
        } => "entered",
        Source::Computed { .. } => "computed",
    }
}
