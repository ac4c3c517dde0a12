//! Output formatting - plaintext and JSON.

use crate::constants::ConstantRecord;
use serde::Serialize;
use std::io::{self, Write};

/// Constants found for one type, as emitted in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct TypeReport<'a> {
    #[serde(rename = "type")]
    pub type_name: &'a str,
    pub constants: &'a [ConstantRecord],
}

/// Writes one type's constants as plain text.
///
/// One name per line; with `show_values` each line also carries the value
/// and whether it is signed.
pub fn write_plain(
    out: &mut impl Write,
    type_name: &str,
    records: &[ConstantRecord],
    show_values: bool,
) -> io::Result<()> {
    writeln!(out, "{} ({}):", type_name, records.len())?;
    for record in records {
        if show_values {
            let sign = if record.signed { "signed" } else { "unsigned" };
            writeln!(out, "- {} = {} ({})", record.name, record, sign)?;
        } else {
            writeln!(out, "- {}", record.name)?;
        }
    }
    Ok(())
}

/// Writes runs of consecutive values, one run per line.
pub fn write_runs(
    out: &mut impl Write,
    type_name: &str,
    runs: &[Vec<ConstantRecord>],
) -> io::Result<()> {
    writeln!(out, "{} runs ({}):", type_name, runs.len())?;
    for run in runs {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        let names: Vec<&str> = run.iter().map(|r| r.name.as_str()).collect();
        writeln!(out, "- [{}..={}] {}", first, last, names.join(" "))?;
    }
    Ok(())
}

/// Prints one type's constants in plain text format.
pub fn print_plain(type_name: &str, records: &[ConstantRecord], show_values: bool) {
    let stdout = io::stdout();
    if let Err(e) = write_plain(&mut stdout.lock(), type_name, records, show_values) {
        tracing::warn!(error = %e, "failed to write output");
    }
}

/// Prints runs of consecutive values in plain text format.
pub fn print_runs(type_name: &str, runs: &[Vec<ConstantRecord>]) {
    let stdout = io::stdout();
    if let Err(e) = write_runs(&mut stdout.lock(), type_name, runs) {
        tracing::warn!(error = %e, "failed to write output");
    }
}

/// Renders reports for several types as pretty JSON.
pub fn to_json(reports: &[TypeReport<'_>]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

/// Prints reports for several types in JSON format.
pub fn print_json(reports: &[TypeReport<'_>]) {
    match to_json(reports) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            let names: Vec<&str> = reports.iter().map(|r| r.type_name).collect();
            println!("{{\"types\": {:?}}}", names);
        }
    }
}
