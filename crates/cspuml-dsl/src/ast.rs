use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::errors::StructuralError;

/// The silent, internal event. Surface files spell it [`TAU_ASCII`].
pub const TAU: &str = "τ";
/// ASCII alias for [`TAU`], the only spelling the surface grammar admits.
pub const TAU_ASCII: &str = "tau";
/// The successful-termination event.
pub const TICK: &str = "✓";
/// Identifier of the terminated-process sentinel state.
pub const OMEGA: &str = "Ω";
/// The trivially true guard/postcondition literal.
pub const TRUE: &str = "true";

/// Whether an opaque expression string denotes the trivially true
/// expression. The empty string and the literal `true` are equivalent.
pub fn is_trivial(expr: &str) -> bool {
    expr.is_empty() || expr == TRUE
}

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// Identifier of a diagram state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StateId(String);

impl StateId {
    pub fn new(id: impl Into<String>) -> Self {
        StateId(id.into())
    }

    /// The sentinel id of the terminated process.
    pub fn omega() -> Self {
        StateId(OMEGA.to_owned())
    }

    pub fn is_omega(&self) -> bool {
        self.0 == OMEGA
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateId {
    fn from(id: &str) -> Self {
        StateId(id.to_owned())
    }
}

/// Identifier of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn tau() -> Self {
        EventId(TAU.to_owned())
    }

    pub fn tick() -> Self {
        EventId(TICK.to_owned())
    }

    /// True for both the canonical `τ` and the ASCII spelling `tau`.
    pub fn is_tau(&self) -> bool {
        self.0 == TAU || self.0 == TAU_ASCII
    }

    pub fn is_tick(&self) -> bool {
        self.0 == TICK
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        EventId(id.to_owned())
    }
}

/// Identifier of a declared variable or event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VarId(String);

impl VarId {
    pub fn new(id: impl Into<String>) -> Self {
        VarId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VarId {
    fn from(id: &str) -> Self {
        VarId(id.to_owned())
    }
}

/// An event label: an id plus an ordered, possibly empty parameter list.
///
/// Two events are compatible for synchronisation iff their ids are equal;
/// parameters are carried syntactically and never unified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub params: Vec<VarId>,
}

impl Event {
    pub fn new(id: EventId, params: Vec<VarId>) -> Self {
        Event { id, params }
    }

    /// An event with no parameters.
    pub fn bare(id: EventId) -> Self {
        Event {
            id,
            params: Vec::new(),
        }
    }

    pub fn tau() -> Self {
        Event::bare(EventId::tau())
    }

    pub fn tick() -> Self {
        Event::bare(EventId::tick())
    }

    pub fn is_tau(&self) -> bool {
        self.id.is_tau()
    }

    pub fn is_tick(&self) -> bool {
        self.id.is_tick()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A named state with its declared local variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    pub name: String,
    pub vars: Vec<VarId>,
}

impl State {
    /// The terminated-process sentinel: id and name `Ω`, no variables.
    pub fn omega() -> Self {
        State {
            id: StateId::omega(),
            name: OMEGA.to_owned(),
            vars: Vec::new(),
        }
    }
}

/// One side of an edge: a concrete state or the `[*]` start/end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Concrete(StateId),
    StartEnd,
}

impl Endpoint {
    /// The state id behind a concrete endpoint, `None` for `[*]`.
    pub fn id(&self) -> Option<&StateId> {
        match self {
            Endpoint::Concrete(id) => Some(id),
            Endpoint::StartEnd => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Concrete(id) => write!(f, "{id}"),
            Endpoint::StartEnd => write!(f, "[*]"),
        }
    }
}

/// A transition. Guard and postcondition are opaque expression strings;
/// see [`is_trivial`] for the `true`/empty identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub src: Endpoint,
    pub dst: Endpoint,
    pub event: Event,
    pub guard: String,
    pub post: String,
}

impl Edge {
    /// The start edge `[*] --> dst`. Its event slot is unused; only the
    /// postcondition matters, acting as the initial assertion.
    pub fn start(dst: StateId, post: impl Into<String>) -> Self {
        Edge {
            src: Endpoint::StartEnd,
            dst: Endpoint::Concrete(dst),
            event: Event::tau(),
            guard: TRUE.to_owned(),
            post: post.into(),
        }
    }

    /// A termination edge `src --> [*]`.
    pub fn termination(src: StateId, event: Event, guard: impl Into<String>) -> Self {
        Edge {
            src: Endpoint::Concrete(src),
            dst: Endpoint::StartEnd,
            event,
            guard: guard.into(),
            post: TRUE.to_owned(),
        }
    }

    pub fn is_termination(&self) -> bool {
        matches!(self.dst, Endpoint::StartEnd)
    }
}

/// An immutable state-machine diagram: a state table, the distinguished
/// start edge, and the transition list (termination edges included).
///
/// The state table preserves declaration order so that every traversal and
/// the canonical printer are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub states: IndexMap<StateId, State>,
    pub start_edge: Edge,
    pub edges: Vec<Edge>,
}

impl Diagram {
    /// The id the start edge points at.
    pub fn start_state(&self) -> Option<&StateId> {
        self.start_edge.dst.id()
    }

    /// Outgoing edges of `state`, in declaration order.
    pub fn outgoing<'a>(&'a self, state: &'a StateId) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.src.id() == Some(state))
    }

    /// Check the structural invariants: the start edge targets a known
    /// state, every edge source is a known state, and every non-termination
    /// edge target is a known state.
    pub fn validate(&self) -> Result<(), StructuralError> {
        match self.start_edge.dst.id() {
            Some(id) if self.states.contains_key(id) => {}
            Some(id) => {
                return Err(StructuralError::StartEdgeTarget { id: id.clone() });
            }
            None => return Err(StructuralError::MissingStartTarget),
        }
        for edge in &self.edges {
            match edge.src.id() {
                Some(id) if self.states.contains_key(id) => {}
                Some(id) => {
                    return Err(StructuralError::DanglingSource { id: id.clone() });
                }
                None => return Err(StructuralError::UnexpectedStartEdge),
            }
            if let Some(id) = edge.dst.id() {
                if !self.states.contains_key(id) {
                    return Err(StructuralError::DanglingTarget { id: id.clone() });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str) -> State {
        State {
            id: id.into(),
            name: id.to_owned(),
            vars: Vec::new(),
        }
    }

    fn two_state_diagram() -> Diagram {
        let mut states = IndexMap::new();
        states.insert(StateId::from("s0"), state("s0"));
        states.insert(StateId::from("s1"), state("s1"));
        Diagram {
            states,
            start_edge: Edge::start("s0".into(), TRUE),
            edges: vec![Edge {
                src: Endpoint::Concrete("s0".into()),
                dst: Endpoint::Concrete("s1".into()),
                event: Event::bare("a".into()),
                guard: TRUE.to_owned(),
                post: TRUE.to_owned(),
            }],
        }
    }

    #[test]
    fn trivial_expressions() {
        assert!(is_trivial(""));
        assert!(is_trivial("true"));
        assert!(!is_trivial("x > 0"));
    }

    #[test]
    fn tau_accepts_both_spellings() {
        assert!(EventId::new("tau").is_tau());
        assert!(EventId::new(TAU).is_tau());
        assert!(!EventId::new("taut").is_tau());
    }

    #[test]
    fn event_display_with_params() {
        let ev = Event::new("insert".into(), vec!["coin".into(), "slot".into()]);
        assert_eq!(ev.to_string(), "insert(coin, slot)");
        assert_eq!(Event::bare("a".into()).to_string(), "a");
    }

    #[test]
    fn omega_state_shape() {
        let omega = State::omega();
        assert!(omega.id.is_omega());
        assert_eq!(omega.name, OMEGA);
        assert!(omega.vars.is_empty());
    }

    #[test]
    fn validate_accepts_well_formed() {
        assert!(two_state_diagram().validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangling_target() {
        let mut d = two_state_diagram();
        d.edges[0].dst = Endpoint::Concrete("missing".into());
        assert!(matches!(
            d.validate(),
            Err(StructuralError::DanglingTarget { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_start_target() {
        let mut d = two_state_diagram();
        d.start_edge = Edge::start("missing".into(), TRUE);
        assert!(matches!(
            d.validate(),
            Err(StructuralError::StartEdgeTarget { .. })
        ));
    }

    #[test]
    fn validate_accepts_termination_edge() {
        let mut d = two_state_diagram();
        d.edges
            .push(Edge::termination("s1".into(), Event::bare("quit".into()), TRUE));
        assert!(d.validate().is_ok());
    }
}
