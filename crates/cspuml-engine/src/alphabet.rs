//! Visible alphabet, τ-closure, and stability of diagram states.

use indexmap::IndexSet;

use cspuml_dsl::ast::{Diagram, EventId, StateId};

/// The visible alphabet: every non-τ event id appearing on the diagram's
/// edges, in first-occurrence order. Termination events (and `✓` on a
/// composite) are visible and therefore included.
pub fn alphabet(d: &Diagram) -> IndexSet<EventId> {
    let mut out = IndexSet::new();
    for edge in &d.edges {
        if !edge.event.is_tau() {
            out.insert(edge.event.id.clone());
        }
    }
    out
}

/// The states reachable from `start` by zero or more τ-steps, `start`
/// included.
pub fn tau_reach(d: &Diagram, start: &StateId) -> IndexSet<StateId> {
    let mut reach = IndexSet::new();
    reach.insert(start.clone());
    let mut cursor = 0;
    while let Some(current) = reach.get_index(cursor).cloned() {
        cursor += 1;
        for edge in d.outgoing(&current) {
            if !edge.event.is_tau() {
                continue;
            }
            if let Some(dst) = edge.dst.id() {
                reach.insert(dst.clone());
            }
        }
    }
    reach
}

/// Whether `state` has no outgoing τ-edge, i.e. the process cannot move
/// autonomously from it.
pub fn is_stable(d: &Diagram, state: &StateId) -> bool {
    !d.outgoing(state).any(|edge| edge.event.is_tau())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cspuml_dsl::parse;

    const INTERNAL: &str = "@startuml
state \"A\" as s0
state \"B\" as s1
state \"C\" as s2
[*] --> s0
s0 --> s1 : tau
s1 --> s2 : work
s2 --> s2 : tau
s2 --> [*] : quit
@enduml
";

    fn diagram() -> Diagram {
        parse(INTERNAL, "internal.puml").expect("parse")
    }

    #[test]
    fn alphabet_excludes_tau() {
        let d = diagram();
        let alpha = alphabet(&d);
        assert!(alpha.contains(&EventId::from("work")));
        assert!(alpha.contains(&EventId::from("quit")));
        assert!(!alpha.iter().any(|e| e.is_tau()));
        assert_eq!(alpha.len(), 2);
    }

    #[test]
    fn tau_reach_follows_silent_edges_only() {
        let d = diagram();
        let reach = tau_reach(&d, &StateId::from("s0"));
        assert!(reach.contains(&StateId::from("s0")));
        assert!(reach.contains(&StateId::from("s1")));
        assert!(!reach.contains(&StateId::from("s2")));
    }

    #[test]
    fn tau_reach_handles_cycles() {
        let d = diagram();
        let reach = tau_reach(&d, &StateId::from("s2"));
        assert_eq!(reach.len(), 1);
    }

    #[test]
    fn stability() {
        let d = diagram();
        assert!(!is_stable(&d, &StateId::from("s0")));
        assert!(is_stable(&d, &StateId::from("s1")));
        assert!(!is_stable(&d, &StateId::from("s2")));
    }
}
