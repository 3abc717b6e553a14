use std::path::Path;

use miette::{Context, IntoDiagnostic};

use cspuml_dsl::Diagram;

/// Read and parse a diagram file, attaching the path to any diagnostic.
pub(crate) fn load_diagram(path: &Path) -> miette::Result<Diagram> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    let diagram = cspuml_dsl::parse(&source, &path.display().to_string())?;
    Ok(diagram)
}
