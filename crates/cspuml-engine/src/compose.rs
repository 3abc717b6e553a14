//! Parallel composition of diagrams under CSP generalised parallel `∥_X`.
//!
//! The binary product is a breadth-first exploration of state pairs from
//! the joint initial state, emitting composite edges according to the six
//! parallel rules: asynchronous moves (Para1/Para2), synchronised moves on
//! the shared event set (Para3), one-sided termination stepping silently
//! into the sentinel `Ω` (Para4/Para5), and joint termination (Para6).
//! `N > 2` diagrams reduce to the binary case by a left fold, which is
//! sound because the synchronisation set is fixed across the fold.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use cspuml_dsl::ast::{
    is_trivial, Diagram, Edge, Endpoint, Event, EventId, State, StateId, TRUE,
};
use cspuml_dsl::errors::StructuralError;

#[derive(Debug, Error, Diagnostic)]
pub enum CompositionError {
    #[error("at least one diagram is required for parallel composition")]
    #[diagnostic(code(cspuml::compose::no_diagrams))]
    NoDiagrams,

    #[error("composition reached unknown state '{id}'")]
    #[diagnostic(code(cspuml::compose::unknown_state))]
    UnknownState { id: StateId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structure(#[from] StructuralError),
}

fn conjoin(a: &str, b: &str) -> String {
    if is_trivial(a) {
        return b.to_owned();
    }
    if is_trivial(b) {
        return a.to_owned();
    }
    format!("{a} & {b}")
}

/// Syntactic conjunction of two guard expressions. `true` and the empty
/// string are the identity; nothing else is normalised.
pub fn compose_guard(g1: &str, g2: &str) -> String {
    conjoin(g1, g2)
}

/// Syntactic conjunction of two postcondition expressions, with the same
/// identity as [`compose_guard`].
pub fn compose_postcondition(p1: &str, p2: &str) -> String {
    conjoin(p1, p2)
}

/// Composite state id: the underscore-joined component ids.
pub fn compose_state_ids(l: &StateId, r: &StateId) -> StateId {
    StateId::new(format!("{l}_{r}"))
}

/// Composite display name: the component names joined with `||`.
pub fn compose_state_names(l: &str, r: &str) -> String {
    format!("{l} || {r}")
}

/// A pair of component states during the product exploration.
#[derive(Debug, Clone)]
struct StatePair {
    left: State,
    right: State,
}

impl StatePair {
    fn id(&self) -> StateId {
        compose_state_ids(&self.left.id, &self.right.id)
    }

    fn state(&self) -> State {
        let mut vars = self.left.vars.clone();
        vars.extend(self.right.vars.iter().cloned());
        State {
            id: self.id(),
            name: compose_state_names(&self.left.name, &self.right.name),
            vars,
        }
    }
}

/// A scan-ready transition with concrete endpoints.
#[derive(Debug, Clone)]
struct Trans {
    src: StateId,
    dst: StateId,
    event: Event,
    guard: String,
    post: String,
}

/// Rewrite a diagram's edge list so termination is uniform: every
/// termination edge `(s, [*], ev, g)` becomes a `✓`-transition `(s, Ω)`
/// carrying the same guard.
fn complete_termination(d: &Diagram) -> Result<Vec<Trans>, CompositionError> {
    d.edges
        .iter()
        .map(|e| {
            let src = e
                .src
                .id()
                .cloned()
                .ok_or(CompositionError::Structure(StructuralError::UnexpectedStartEdge))?;
            Ok(match &e.dst {
                Endpoint::StartEnd => Trans {
                    src,
                    dst: StateId::omega(),
                    event: Event::tick(),
                    guard: e.guard.clone(),
                    post: TRUE.to_owned(),
                },
                Endpoint::Concrete(dst) => Trans {
                    src,
                    dst: dst.clone(),
                    event: e.event.clone(),
                    guard: e.guard.clone(),
                    post: e.post.clone(),
                },
            })
        })
        .collect()
}

fn component_state(d: &Diagram, id: &StateId) -> Result<State, CompositionError> {
    if id.is_omega() {
        return Ok(State::omega());
    }
    d.states
        .get(id)
        .cloned()
        .ok_or_else(|| CompositionError::UnknownState { id: id.clone() })
}

/// Register a newly discovered pair: record its composite state and enqueue
/// it, exactly once per composite id.
fn discover(out: &mut Diagram, queue: &mut VecDeque<StatePair>, pair: StatePair) -> StateId {
    let id = pair.id();
    if !out.states.contains_key(&id) {
        out.states.insert(id.clone(), pair.state());
        queue.push_back(pair);
    }
    id
}

/// Parallel-compose `N ≥ 1` diagrams synchronised on `sync_events`.
///
/// A single diagram is returned unchanged. For more, the composition is
/// the left fold `((D1 ∥ D2) ∥ D3) …` of [`parallel2`].
pub fn parallel(
    diagrams: Vec<Diagram>,
    sync_events: &[EventId],
) -> Result<Diagram, CompositionError> {
    let mut iter = diagrams.into_iter();
    let first = iter.next().ok_or(CompositionError::NoDiagrams)?;
    iter.try_fold(first, |acc, next| parallel2(&acc, &next, sync_events))
}

/// The binary product `D_L ∥_X D_R`, restricted to pairs reachable from
/// the joint initial state.
pub fn parallel2(
    left: &Diagram,
    right: &Diagram,
    sync_events: &[EventId],
) -> Result<Diagram, CompositionError> {
    left.validate()?;
    right.validate()?;

    let sync: HashSet<&EventId> = sync_events.iter().collect();
    let ts_l = complete_termination(left)?;
    let ts_r = complete_termination(right)?;

    let l0 = left
        .start_state()
        .ok_or(StructuralError::MissingStartTarget)?;
    let r0 = right
        .start_state()
        .ok_or(StructuralError::MissingStartTarget)?;
    let init = StatePair {
        left: component_state(left, l0)?,
        right: component_state(right, r0)?,
    };

    let mut out = Diagram {
        states: IndexMap::new(),
        start_edge: Edge::start(
            init.id(),
            compose_postcondition(&left.start_edge.post, &right.start_edge.post),
        ),
        edges: Vec::new(),
    };

    let mut queue = VecDeque::new();
    out.states.insert(init.id(), init.state());
    queue.push_back(init);

    while let Some(pair) = queue.pop_front() {
        let pair_id = pair.id();

        // Para6: the jointly terminated pair does nothing but terminate.
        if pair.left.id.is_omega() && pair.right.id.is_omega() {
            out.edges
                .push(Edge::termination(pair_id, Event::tick(), TRUE));
            continue;
        }

        // Left scan, in input order: Para1 for free events, Para3 cross
        // product for synchronised ones. A synchronised event the right
        // side cannot offer is blocked and emits nothing.
        for e in ts_l.iter().filter(|e| e.src == pair.left.id) {
            if e.event.is_tick() {
                continue;
            }
            if sync.contains(&e.event.id) {
                for f in ts_r
                    .iter()
                    .filter(|f| f.src == pair.right.id && f.event.id == e.event.id)
                {
                    let next = StatePair {
                        left: component_state(left, &e.dst)?,
                        right: component_state(right, &f.dst)?,
                    };
                    let next_id = discover(&mut out, &mut queue, next);
                    out.edges.push(Edge {
                        src: Endpoint::Concrete(pair_id.clone()),
                        dst: Endpoint::Concrete(next_id),
                        event: Event::bare(e.event.id.clone()),
                        guard: compose_guard(&e.guard, &f.guard),
                        post: compose_postcondition(&e.post, &f.post),
                    });
                }
            } else {
                let next = StatePair {
                    left: component_state(left, &e.dst)?,
                    right: pair.right.clone(),
                };
                let next_id = discover(&mut out, &mut queue, next);
                out.edges.push(Edge {
                    src: Endpoint::Concrete(pair_id.clone()),
                    dst: Endpoint::Concrete(next_id),
                    event: e.event.clone(),
                    guard: e.guard.clone(),
                    post: e.post.clone(),
                });
            }
        }

        // Right scan: Para2. Synchronised events were already emitted by
        // the left scan.
        for f in ts_r.iter().filter(|f| f.src == pair.right.id) {
            if f.event.is_tick() || sync.contains(&f.event.id) {
                continue;
            }
            let next = StatePair {
                left: pair.left.clone(),
                right: component_state(right, &f.dst)?,
            };
            let next_id = discover(&mut out, &mut queue, next);
            out.edges.push(Edge {
                src: Endpoint::Concrete(pair_id.clone()),
                dst: Endpoint::Concrete(next_id),
                event: f.event.clone(),
                guard: f.guard.clone(),
                post: f.post.clone(),
            });
        }

        // Para4/Para5: a side that can terminate steps silently into Ω
        // while the other continues.
        if ts_l
            .iter()
            .any(|e| e.src == pair.left.id && e.event.is_tick())
        {
            let next = StatePair {
                left: State::omega(),
                right: pair.right.clone(),
            };
            let next_id = discover(&mut out, &mut queue, next);
            out.edges.push(Edge {
                src: Endpoint::Concrete(pair_id.clone()),
                dst: Endpoint::Concrete(next_id),
                event: Event::tau(),
                guard: TRUE.to_owned(),
                post: TRUE.to_owned(),
            });
        }
        if ts_r
            .iter()
            .any(|f| f.src == pair.right.id && f.event.is_tick())
        {
            let next = StatePair {
                left: pair.left.clone(),
                right: State::omega(),
            };
            let next_id = discover(&mut out, &mut queue, next);
            out.edges.push(Edge {
                src: Endpoint::Concrete(pair_id.clone()),
                dst: Endpoint::Concrete(next_id),
                event: Event::tau(),
                guard: TRUE.to_owned(),
                post: TRUE.to_owned(),
            });
        }
    }

    debug!(
        states = out.states.len(),
        edges = out.edges.len(),
        "parallel product complete"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cspuml_dsl::parse;

    fn diagram(src: &str) -> Diagram {
        parse(src, "test.puml").expect("parse")
    }

    fn self_loop(event: &str) -> Diagram {
        diagram(&format!(
            "@startuml\nstate \"S\" as s0\n[*] --> s0\ns0 --> s0 : {event}\n@enduml\n"
        ))
    }

    fn step(event: &str) -> Diagram {
        diagram(&format!(
            "@startuml\nstate \"A\" as s0\nstate \"B\" as s1\n[*] --> s0\ns0 --> s1 : {event}\n@enduml\n"
        ))
    }

    #[test]
    fn guard_conjunction_identity() {
        assert_eq!(compose_guard("", "x > 0"), "x > 0");
        assert_eq!(compose_guard("true", "x > 0"), "x > 0");
        assert_eq!(compose_guard("x > 0", ""), "x > 0");
        assert_eq!(compose_guard("x > 0", "y < 1"), "x > 0 & y < 1");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            parallel(Vec::new(), &[]),
            Err(CompositionError::NoDiagrams)
        ));
    }

    #[test]
    fn single_diagram_is_identity() {
        let d = self_loop("a");
        let out = parallel(vec![d.clone()], &[EventId::from("a")]).expect("compose");
        assert_eq!(out, d);
    }

    #[test]
    fn interleaving_self_loops() {
        let out = parallel2(&self_loop("a"), &self_loop("b"), &[]).expect("compose");
        assert_eq!(out.states.len(), 1);
        let id = StateId::from("s0_s0");
        assert!(out.states.contains_key(&id));
        assert_eq!(out.start_state(), Some(&id));
        assert_eq!(out.edges.len(), 2);
        assert_eq!(out.edges[0].event.id, EventId::from("a"));
        assert_eq!(out.edges[1].event.id, EventId::from("b"));
        for e in &out.edges {
            assert_eq!(e.src.id(), Some(&id));
            assert_eq!(e.dst.id(), Some(&id));
        }
    }

    #[test]
    fn rendezvous_on_shared_event() {
        let out = parallel2(&step("a"), &step("a"), &[EventId::from("a")]).expect("compose");
        assert_eq!(out.states.len(), 2);
        assert_eq!(out.edges.len(), 1);
        let edge = &out.edges[0];
        assert_eq!(edge.src.id(), Some(&StateId::from("s0_s0")));
        assert_eq!(edge.dst.id(), Some(&StateId::from("s1_s1")));
        assert_eq!(edge.event.id, EventId::from("a"));
    }

    #[test]
    fn blocked_rendezvous_deadlocks() {
        // `a` is synchronised but the right side never offers it, and `b`
        // is not in the left alphabet yet also not synchronised: the right
        // side may still move on `b` asynchronously, so the only true
        // deadlock needs `b` synchronised too.
        let out = parallel2(
            &step("a"),
            &step("b"),
            &[EventId::from("a"), EventId::from("b")],
        )
        .expect("compose");
        assert_eq!(out.states.len(), 1);
        assert!(out.states.contains_key(&StateId::from("s0_s0")));
        assert!(out.edges.is_empty());
    }

    #[test]
    fn one_sided_sync_event_is_blocked() {
        let out = parallel2(&step("a"), &step("b"), &[EventId::from("a")]).expect("compose");
        assert!(!out
            .edges
            .iter()
            .any(|e| e.event.id == EventId::from("a")));
        // `b` interleaves freely on the right side.
        assert!(out.edges.iter().any(|e| e.event.id == EventId::from("b")));
    }

    #[test]
    fn sync_cross_product_of_multi_edges() {
        let l = diagram(
            "@startuml\nstate \"A\" as s0\nstate \"B\" as s1\n[*] --> s0\ns0 --> s1 : a ; x > 0\ns0 --> s1 : a ; x <= 0\n@enduml\n",
        );
        let r = diagram(
            "@startuml\nstate \"A\" as s0\nstate \"B\" as s1\n[*] --> s0\ns0 --> s1 : a ; y > 0 ; y' = 0\n@enduml\n",
        );
        let out = parallel2(&l, &r, &[EventId::from("a")]).expect("compose");
        assert_eq!(out.edges.len(), 2);
        assert_eq!(out.edges[0].guard, "x > 0 & y > 0");
        assert_eq!(out.edges[1].guard, "x <= 0 & y > 0");
        assert_eq!(out.edges[0].post, "y' = 0");
    }

    #[test]
    fn termination_runs_through_omega() {
        let l = diagram("@startuml\nstate \"A\" as s0\n[*] --> s0\ns0 --> [*] : done\n@enduml\n");
        let r = diagram("@startuml\nstate \"B\" as s0\n[*] --> s0\ns0 --> [*] : stop\n@enduml\n");
        let out = parallel2(&l, &r, &[]).expect("compose");

        // s0_s0 steps by τ into Ω_s0 and s0_Ω, both into Ω_Ω, which
        // terminates with a single ✓ edge.
        let omega_pair = StateId::from("Ω_Ω");
        assert!(out.states.contains_key(&omega_pair));
        let term: Vec<&Edge> = out.edges.iter().filter(|e| e.is_termination()).collect();
        assert_eq!(term.len(), 1);
        assert_eq!(term[0].src.id(), Some(&omega_pair));
        assert!(term[0].event.is_tick());

        let taus: Vec<&Edge> = out.edges.iter().filter(|e| e.event.is_tau()).collect();
        assert_eq!(taus.len(), 4);
        assert!(out.states.contains_key(&StateId::from("Ω_s0")));
        assert!(out.states.contains_key(&StateId::from("s0_Ω")));
    }

    #[test]
    fn composite_metadata_joins_components() {
        let l = diagram(
            "@startuml\nstate \"Left\" as s0\ns0: x\n[*] --> s0 : x = 0\ns0 --> s0 : a\n@enduml\n",
        );
        let r = diagram(
            "@startuml\nstate \"Right\" as s0\ns0: y\n[*] --> s0 : y = 1\ns0 --> s0 : b\n@enduml\n",
        );
        let out = parallel2(&l, &r, &[]).expect("compose");
        let s = &out.states[&StateId::from("s0_s0")];
        assert_eq!(s.name, "Left || Right");
        assert_eq!(s.vars.len(), 2);
        assert_eq!(out.start_edge.post, "x = 0 & y = 1");
    }

    #[test]
    fn left_fold_composes_three() {
        let out = parallel(
            vec![self_loop("a"), self_loop("b"), self_loop("c")],
            &[],
        )
        .expect("compose");
        assert_eq!(out.states.len(), 1);
        assert!(out.states.contains_key(&StateId::from("s0_s0_s0")));
        assert_eq!(out.edges.len(), 3);
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let mut d = self_loop("a");
        d.edges[0].dst = Endpoint::Concrete(StateId::from("missing"));
        assert!(matches!(
            parallel2(&d, &self_loop("b"), &[]),
            Err(CompositionError::Structure(_))
        ));
    }
}
