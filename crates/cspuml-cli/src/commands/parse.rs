// Command handler for: Parse
//
// Reads a diagram from stdin and dumps a human-readable summary of the
// parsed structure.

use miette::IntoDiagnostic;

use cspuml_dsl::Diagram;

pub(crate) fn run() -> miette::Result<()> {
    let input = std::io::read_to_string(std::io::stdin()).into_diagnostic()?;
    let diagram = cspuml_dsl::parse(&input, "<stdin>")?;
    print!("{}", summary(&diagram));
    Ok(())
}

fn summary(diagram: &Diagram) -> String {
    let mut out = String::new();
    out.push_str("=== Parse Result ===\n");
    out.push_str(&format!("States: {}\n", diagram.states.len()));
    for state in diagram.states.values() {
        out.push_str(&format!("  State {}: \"{}\"\n", state.id, state.name));
        for var in &state.vars {
            out.push_str(&format!("    var: {var}\n"));
        }
    }

    out.push_str("\nStart Edge:\n");
    out.push_str(&format!("  [*] --> {}\n", diagram.start_edge.dst));
    out.push_str(&format!("    Post: \"{}\"\n", diagram.start_edge.post));

    out.push_str(&format!("\nEdges: {}\n", diagram.edges.len()));
    for (i, edge) in diagram.edges.iter().enumerate() {
        out.push_str(&format!("  Edge {}: {} --> {}\n", i + 1, edge.src, edge.dst));
        out.push_str(&format!("    Event: {}\n", edge.event));
        out.push_str(&format!("    Guard: \"{}\"\n", edge.guard));
        out.push_str(&format!("    Post: \"{}\"\n", edge.post));
    }
    out
}
