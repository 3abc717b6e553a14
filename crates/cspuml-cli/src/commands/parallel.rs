// Command handler for: Parallel
//
// Parses every input file, composes them left to right under the given
// synchronisation set, and prints the composite in canonical surface form.
// A single input is printed back unchanged.

use std::path::PathBuf;

use cspuml_dsl::ast::EventId;

use super::helpers::load_diagram;

pub(crate) fn run(sync: Option<&str>, files: &[PathBuf]) -> miette::Result<()> {
    let sync_events = parse_sync_list(sync.unwrap_or(""));

    let mut diagrams = Vec::with_capacity(files.len());
    for file in files {
        diagrams.push(load_diagram(file)?);
    }

    let composite = cspuml_engine::parallel(diagrams, &sync_events)?;
    print!("{composite}");
    Ok(())
}

/// Split a `;`-separated synchronisation list, dropping empty entries.
fn parse_sync_list(raw: &str) -> Vec<EventId> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EventId::from)
        .collect()
}
