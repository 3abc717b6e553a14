// Command handler for: Events
//
// Prints the sorted union of the visible event ids of all input diagrams,
// one per line, or the intersection under --only-common.

use std::path::PathBuf;

use indexmap::IndexMap;

use cspuml_dsl::ast::EventId;
use cspuml_engine::alphabet::alphabet;

use super::helpers::load_diagram;

pub(crate) fn run(only_common: bool, files: &[PathBuf]) -> miette::Result<()> {
    if only_common && files.len() < 2 {
        return Err(miette::miette!("--only-common requires at least 2 files"));
    }

    // Count, per event, how many files mention it; the intersection is the
    // set mentioned by all of them.
    let mut counts: IndexMap<EventId, usize> = IndexMap::new();
    for file in files {
        let diagram = load_diagram(file)?;
        for event in alphabet(&diagram) {
            *counts.entry(event).or_insert(0) += 1;
        }
    }

    let mut events: Vec<EventId> = counts
        .into_iter()
        .filter(|(_, n)| !only_common || *n == files.len())
        .map(|(event, _)| event)
        .collect();
    events.sort();

    for event in events {
        println!("{event}");
    }
    Ok(())
}
