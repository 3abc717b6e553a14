//! Deterministic text rendering of obligation lists.

use crate::refinement::ProofObligation;

/// Render an obligation list as a numbered text report.
///
/// The input order is preserved verbatim; rendering the same list twice
/// yields byte-identical output.
pub fn render(obligations: &[ProofObligation]) -> String {
    let mut out = String::new();
    out.push_str("Stable Failures Refinement Verification\n");
    out.push_str("=====================================\n\n");

    for (i, ob) in obligations.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, ob.description));
        out.push_str(&format!("   Type: {}\n", ob.kind));
        out.push_str(&format!("   ID: {}\n", ob.id));
        out.push_str(&format!("   Prove: ({}) ⇒ ({})\n", ob.premise, ob.conclusion));
        if let Some(state) = &ob.context.spec_state {
            out.push_str(&format!("   Context: State {state}"));
            if let Some(event) = &ob.context.event {
                out.push_str(&format!(", Event {event}"));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}
