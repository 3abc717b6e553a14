// Command handler for: Refinement
//
// Parses the specification and implementation diagrams and prints the
// stable-failures proof obligation report.

use std::path::Path;

use miette::IntoDiagnostic;

use cspuml_engine::refinement::proof_obligations;
use cspuml_engine::report::render;

use super::helpers::load_diagram;

pub(crate) fn run(spec: &Path, implementation: &Path, format: &str) -> miette::Result<()> {
    let spec_diagram = load_diagram(spec)?;
    let impl_diagram = load_diagram(implementation)?;

    let obligations = proof_obligations(&spec_diagram, &impl_diagram);
    match format {
        "text" => print!("{}", render(&obligations)),
        "json" => {
            let json = serde_json::to_string_pretty(&obligations).into_diagnostic()?;
            println!("{json}");
        }
        other => {
            return Err(miette::miette!(
                "unknown output format '{other}' (expected text or json)"
            ));
        }
    }
    Ok(())
}
