//! Bounded enumeration of visible traces.
//!
//! The extractor walks the diagram depth-first from the start state. Visible
//! events extend the current trace and count against the depth cap; τ-edges
//! recurse without extending it. A path-visited set prunes cycles on the
//! current exploration path (recording the partial trace at the point of
//! re-entry), and backtracking removes states from it again, so the walk
//! terminates on every input. The output is prefix-closed and deduplicated.

use std::collections::HashSet;

use indexmap::IndexSet;

use cspuml_dsl::ast::{Diagram, Endpoint, EventId, StateId};

/// Default bound on the number of visible events explored along one path.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A finite sequence of visible events.
pub type Trace = Vec<EventId>;

/// The visible traces reachable from the start state, bounded by
/// [`DEFAULT_MAX_DEPTH`].
pub fn traces(d: &Diagram) -> Vec<Trace> {
    traces_bounded(d, DEFAULT_MAX_DEPTH)
}

/// As [`traces`], with an explicit depth cap. Never fails: a diagram whose
/// start edge has no concrete target yields only the empty trace.
pub fn traces_bounded(d: &Diagram, max_depth: usize) -> Vec<Trace> {
    let mut found = Vec::new();
    if let Some(start) = d.start_state() {
        let mut trace = Vec::new();
        let mut path = IndexSet::new();
        explore(d, start, &mut trace, &mut path, 0, max_depth, &mut found);
    }

    // The empty trace is always observable.
    found.push(Vec::new());

    let mut seen = HashSet::new();
    found.retain(|t| seen.insert(t.clone()));
    found
}

fn explore(
    d: &Diagram,
    current: &StateId,
    trace: &mut Trace,
    path: &mut IndexSet<StateId>,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<Trace>,
) {
    if depth > max_depth {
        return;
    }
    if path.contains(current) {
        if !trace.is_empty() {
            out.push(trace.clone());
        }
        return;
    }
    path.insert(current.clone());

    if !trace.is_empty() {
        out.push(trace.clone());
    }

    for edge in d.outgoing(current) {
        match &edge.dst {
            Endpoint::StartEnd => {
                // Termination: the event is observed, nothing follows it.
                if !edge.event.is_tau() {
                    trace.push(edge.event.id.clone());
                    out.push(trace.clone());
                    trace.pop();
                }
            }
            Endpoint::Concrete(next) => {
                if edge.event.is_tau() {
                    explore(d, next, trace, path, depth, max_depth, out);
                } else {
                    trace.push(edge.event.id.clone());
                    explore(d, next, trace, path, depth + 1, max_depth, out);
                    trace.pop();
                }
            }
        }
    }

    path.swap_remove(current);
}
