//! Stable-failures refinement analysis.
//!
//! Given a specification diagram `S` and an implementation diagram `I`, the
//! analyser emits the proof obligations whose joint validity implies
//! `S ⊑_F I`: alphabet consistency, the initial-state placeholder, trace
//! inclusion, and refusal-set inclusion at stable states. Obligations are
//! generated, never discharged; an external prover (or a human) checks them.
//!
//! Spec and impl states are paired by identifier equality. A proper
//! simulation relation would need a joint state-space exploration; the
//! obligation text names the paired states so a prover can reject bad
//! pairings.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use cspuml_dsl::ast::{is_trivial, Diagram, EventId, StateId, TRUE};

use crate::alphabet::{alphabet, is_stable};
use crate::traces::{traces, Trace};

/// The four obligation families of the stable-failures refinement law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObligationKind {
    #[serde(rename = "alphabet_consistency")]
    AlphabetConsistency,
    #[serde(rename = "initial_state_refinement")]
    InitialStateRefinement,
    #[serde(rename = "trace_inclusion")]
    TraceInclusion,
    #[serde(rename = "refusal_set_inclusion")]
    RefusalSetInclusion,
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::AlphabetConsistency => write!(f, "alphabet_consistency"),
            ObligationKind::InitialStateRefinement => write!(f, "initial_state_refinement"),
            ObligationKind::TraceInclusion => write!(f, "trace_inclusion"),
            ObligationKind::RefusalSetInclusion => write!(f, "refusal_set_inclusion"),
        }
    }
}

/// Where in the two diagrams an obligation applies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObligationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_state: Option<StateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impl_state: Option<StateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
}

/// A premise/conclusion pair to be discharged externally.
#[derive(Debug, Clone, Serialize)]
pub struct ProofObligation {
    pub id: String,
    pub kind: ObligationKind,
    pub description: String,
    pub premise: String,
    pub conclusion: String,
    pub context: ObligationContext,
}

/// Render a trace in angle-bracket notation: `⟨⟩`, `⟨a,b⟩`.
pub fn format_trace(trace: &[EventId]) -> String {
    if trace.is_empty() {
        return "⟨⟩".to_owned();
    }
    let inner = trace
        .iter()
        .map(EventId::as_str)
        .collect::<Vec<_>>()
        .join(",");
    format!("⟨{inner}⟩")
}

/// Generate the proof obligations for `spec ⊑_F implementation`.
///
/// The list is deterministic: categories appear in the order alphabet
/// consistency, initial state, trace inclusion, refusal-set inclusion, and
/// entries within a category are sorted (by event id, trace, and state id
/// respectively). The analyser never fails; it degrades to an empty or
/// bounded result on degenerate input.
pub fn proof_obligations(spec: &Diagram, implementation: &Diagram) -> Vec<ProofObligation> {
    let mut obligations = Vec::new();
    push_alphabet_obligations(spec, implementation, &mut obligations);
    push_initial_obligation(spec, implementation, &mut obligations);
    push_trace_obligations(spec, implementation, &mut obligations);
    push_refusal_obligations(spec, implementation, &mut obligations);
    debug!(count = obligations.len(), "generated refinement obligations");
    obligations
}

/// One obligation per implementation event missing from the specification
/// alphabet. Any such event falsifies refinement at the trace level.
fn push_alphabet_obligations(
    spec: &Diagram,
    implementation: &Diagram,
    out: &mut Vec<ProofObligation>,
) {
    let spec_alpha = alphabet(spec);
    let mut missing: Vec<EventId> = alphabet(implementation)
        .into_iter()
        .filter(|ev| !spec_alpha.contains(ev))
        .collect();
    missing.sort();

    for ev in missing {
        out.push(ProofObligation {
            id: format!("alphabet_{ev}"),
            kind: ObligationKind::AlphabetConsistency,
            description: format!("Implementation event {ev} must be in specification alphabet"),
            premise: format!("impl_alphabet contains {ev}"),
            conclusion: format!("spec_alphabet contains {ev}"),
            context: ObligationContext {
                event: Some(ev),
                ..Default::default()
            },
        });
    }
}

/// The distinguished placeholder covering `I.init refines S.init`.
fn push_initial_obligation(
    spec: &Diagram,
    implementation: &Diagram,
    out: &mut Vec<ProofObligation>,
) {
    out.push(ProofObligation {
        id: "initial_state_refinement".to_owned(),
        kind: ObligationKind::InitialStateRefinement,
        description: "Implementation initial state must refine specification initial state"
            .to_owned(),
        premise: format!("impl_init = {}", implementation.start_edge.dst),
        conclusion: format!("spec_init = {}", spec.start_edge.dst),
        context: ObligationContext {
            spec_state: spec.start_state().cloned(),
            impl_state: implementation.start_state().cloned(),
            ..Default::default()
        },
    });
}

/// One obligation per implementation trace absent from the specification.
fn push_trace_obligations(
    spec: &Diagram,
    implementation: &Diagram,
    out: &mut Vec<ProofObligation>,
) {
    let spec_traces: HashSet<Trace> = traces(spec).into_iter().collect();
    let mut missing: Vec<Trace> = traces(implementation)
        .into_iter()
        .filter(|t| !spec_traces.contains(t))
        .collect();
    missing.sort();

    for t in missing {
        let display = format_trace(&t);
        let joined = t
            .iter()
            .map(EventId::as_str)
            .collect::<Vec<_>>()
            .join("_");
        out.push(ProofObligation {
            id: format!("trace_inclusion_{joined}"),
            kind: ObligationKind::TraceInclusion,
            description: format!("Trace inclusion verification for trace: {display}"),
            premise: format!(
                "initial state is reachable AND trace {display} exists in implementation"
            ),
            conclusion: format!("trace {display} must exist in specification"),
            context: ObligationContext {
                trace: Some(t),
                ..Default::default()
            },
        });
    }
}

/// One obligation per state id shared by both diagrams and stable in both.
/// When the two sides offer the same visible `(event, guard)` set at the
/// state, inclusion holds trivially and the obligation is suppressed; this
/// is what makes `proof_obligations(s, s)` emit only the initial-state
/// placeholder.
fn push_refusal_obligations(
    spec: &Diagram,
    implementation: &Diagram,
    out: &mut Vec<ProofObligation>,
) {
    let mut shared: Vec<&StateId> = implementation
        .states
        .keys()
        .filter(|id| spec.states.contains_key(*id))
        .collect();
    shared.sort();

    for id in shared {
        if !is_stable(implementation, id) || !is_stable(spec, id) {
            continue;
        }
        if visible_offers(implementation, id) == visible_offers(spec, id) {
            continue;
        }
        let impl_desc = refusal_set_description(implementation, id);
        let spec_desc = refusal_set_description(spec, id);
        out.push(ProofObligation {
            id: format!("refusal_inclusion_{id}"),
            kind: ObligationKind::RefusalSetInclusion,
            description: format!("Refusal set inclusion for stable state {id}"),
            premise: format!(
                "state {id} is reachable from initial state AND implementation {impl_desc}"
            ),
            conclusion: format!(
                "implementation refusal set ⊆ specification refusal set, where specification {spec_desc}"
            ),
            context: ObligationContext {
                spec_state: Some(id.clone()),
                impl_state: Some(id.clone()),
                ..Default::default()
            },
        });
    }
}

/// The outgoing visible `(event id, guard)` offers of a state, sorted, with
/// trivial guards normalised to `true`.
fn visible_offers(d: &Diagram, state: &StateId) -> Vec<(EventId, String)> {
    let mut offers: Vec<(EventId, String)> = d
        .outgoing(state)
        .filter(|e| !e.event.is_tau())
        .map(|e| {
            let guard = if is_trivial(&e.guard) {
                TRUE.to_owned()
            } else {
                e.guard.clone()
            };
            (e.event.id.clone(), guard)
        })
        .collect();
    offers.sort();
    offers
}

/// Human-readable refusal-set expression for a stable state: one clause per
/// non-trivially-guarded visible edge, plus the blanket clause for events
/// the state never offers.
fn refusal_set_description(d: &Diagram, state: &StateId) -> String {
    let outgoing: Vec<_> = d
        .outgoing(state)
        .filter(|e| !e.event.is_tau())
        .collect();
    if outgoing.is_empty() {
        return "refusals of all visible events (no outgoing transitions)".to_owned();
    }

    let conditions: Vec<String> = outgoing
        .iter()
        .filter(|e| !is_trivial(&e.guard))
        .map(|e| format!("refuse {} when ¬({})", e.event.id, e.guard))
        .collect();
    if conditions.is_empty() {
        return "refusals of events not available from this state".to_owned();
    }
    format!(
        "{}; plus refusals of events not available from this state",
        conditions.join("; ")
    )
}
