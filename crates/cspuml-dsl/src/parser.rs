use indexmap::IndexMap;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{
    Diagram, Edge, Endpoint, Event, EventId, Span, State, StateId, VarId, TRUE,
};
use crate::errors::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct DiagramParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

fn span_from(pair: &Pair<'_>) -> Span {
    let s = pair.as_span();
    Span::new(s.start(), s.end())
}

/// Parse a `.puml` state diagram.
///
/// # Parameters
/// - `source`: UTF-8 diagram source text.
/// - `filename`: Logical filename used in diagnostics.
///
/// # Returns
/// The parsed [`Diagram`] or a parser error. Structural invariants beyond
/// what the grammar enforces (dangling endpoints) are checked separately by
/// [`Diagram::validate`].
pub fn parse(source: &str, filename: &str) -> Result<Diagram, ParseError> {
    let pairs = DiagramParser::parse(Rule::diagram, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        // Pest reports end-of-input positions one past the source; keep the
        // span inside it so the diagnostic renderer can show a snippet.
        let start = start.min(source.len());
        let end = end.clamp(start, source.len());
        ParseError::syntax(format!("{e}"), Span::new(start, end), source, filename)
    })?;

    let root = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::syntax("empty input", Span::new(0, 0), source, filename))?;

    Builder { source, filename }.build(root)
}

struct Builder<'a> {
    source: &'a str,
    filename: &'a str,
}

impl Builder<'_> {
    fn named_src(&self) -> miette::NamedSource<String> {
        miette::NamedSource::new(self.filename, self.source.to_owned())
    }

    /// Extract the next child pair, reporting a descriptive error instead of
    /// panicking when the grammar-guaranteed structure is missing.
    fn child<'i>(
        &self,
        iter: &mut pest::iterators::Pairs<'i, Rule>,
        context: &str,
        outer: Span,
    ) -> Result<Pair<'i>, ParseError> {
        iter.next().ok_or_else(|| {
            ParseError::syntax(
                format!("malformed {context}"),
                outer,
                self.source,
                self.filename,
            )
        })
    }

    fn build(&self, root: Pair<'_>) -> Result<Diagram, ParseError> {
        let mut states: IndexMap<StateId, State> = IndexMap::new();
        let mut start_edge: Option<Edge> = None;
        let mut edges: Vec<Edge> = Vec::new();
        // Var lines only attach to the state declared immediately above them,
        // and only before the start edge; anywhere else they are stray lines.
        let mut open_state: Option<StateId> = None;

        for item in root.into_inner() {
            match item.as_rule() {
                Rule::state_line => {
                    let span = span_from(&item);
                    let mut inner = item.into_inner();
                    let name_raw = self.child(&mut inner, "state declaration", span)?;
                    let name = unquote(name_raw.as_str());
                    let id_pair = self.child(&mut inner, "state declaration", span)?;
                    let id = StateId::from(id_pair.as_str());
                    if states.contains_key(&id) {
                        return Err(ParseError::DuplicateState {
                            id: id.as_str().to_owned(),
                            span: miette_span(span_from(&id_pair)),
                            src: self.named_src(),
                        });
                    }
                    open_state = Some(id.clone());
                    states.insert(
                        id.clone(),
                        State {
                            id,
                            name,
                            vars: Vec::new(),
                        },
                    );
                }
                Rule::var_line => {
                    let span = span_from(&item);
                    let mut inner = item.into_inner();
                    let owner = self.child(&mut inner, "variable declaration", span)?;
                    let var = self.child(&mut inner, "variable declaration", span)?;
                    let owner_id = StateId::from(owner.as_str());
                    if start_edge.is_none() && open_state.as_ref() == Some(&owner_id) {
                        if let Some(state) = states.get_mut(&owner_id) {
                            state.vars.push(VarId::from(var.as_str()));
                        }
                    }
                    // Otherwise the line is outside a state header: skipped.
                }
                Rule::start_line => {
                    if start_edge.is_some() {
                        return Err(ParseError::DuplicateStartEdge {
                            span: miette_span(span_from(&item)),
                            src: self.named_src(),
                        });
                    }
                    let span = span_from(&item);
                    let mut inner = item.into_inner();
                    let dst = self.child(&mut inner, "start edge", span)?;
                    let post = inner
                        .next()
                        .map(|p| p.as_str().trim().to_owned())
                        .unwrap_or_else(|| TRUE.to_owned());
                    start_edge = Some(Edge::start(StateId::from(dst.as_str()), post));
                    open_state = None;
                }
                Rule::end_line => {
                    let span = span_from(&item);
                    let mut inner = item.into_inner();
                    let src = self.child(&mut inner, "termination edge", span)?;
                    let event_pair = self.child(&mut inner, "termination edge", span)?;
                    let event = self.build_event(event_pair, span)?;
                    let guard = inner
                        .next()
                        .map(|p| p.as_str().trim().to_owned())
                        .unwrap_or_else(|| TRUE.to_owned());
                    edges.push(Edge::termination(StateId::from(src.as_str()), event, guard));
                    open_state = None;
                }
                Rule::edge_line => {
                    let span = span_from(&item);
                    let mut inner = item.into_inner();
                    let src = self.child(&mut inner, "edge", span)?;
                    let dst = self.child(&mut inner, "edge", span)?;
                    let event_pair = self.child(&mut inner, "edge", span)?;
                    let event = self.build_event(event_pair, span)?;
                    let (guard, post) = match inner.next() {
                        Some(annot) => self.build_annot(annot, span)?,
                        None => (TRUE.to_owned(), TRUE.to_owned()),
                    };
                    edges.push(Edge {
                        src: Endpoint::Concrete(StateId::from(src.as_str())),
                        dst: Endpoint::Concrete(StateId::from(dst.as_str())),
                        event,
                        guard,
                        post,
                    });
                    open_state = None;
                }
                Rule::stray_line => {
                    open_state = None;
                }
                _ => {}
            }
        }

        let start_edge = start_edge.ok_or(ParseError::MissingStartEdge)?;
        Ok(Diagram {
            states,
            start_edge,
            edges,
        })
    }

    fn build_event(&self, pair: Pair<'_>, outer: Span) -> Result<Event, ParseError> {
        let mut inner = pair.into_inner();
        let id = self.child(&mut inner, "event", outer)?;
        let params = match inner.next() {
            Some(params) => params
                .into_inner()
                .map(|p| VarId::from(p.as_str()))
                .collect(),
            None => Vec::new(),
        };
        Ok(Event::new(EventId::from(id.as_str()), params))
    }

    fn build_annot(&self, pair: Pair<'_>, outer: Span) -> Result<(String, String), ParseError> {
        let mut inner = pair.into_inner();
        let guard = self
            .child(&mut inner, "edge annotation", outer)?
            .as_str()
            .trim()
            .to_owned();
        let post = inner
            .next()
            .map(|p| p.as_str().trim().to_owned())
            .unwrap_or_else(|| TRUE.to_owned());
        Ok((guard, post))
    }
}

fn miette_span(span: Span) -> miette::SourceSpan {
    (span.start, span.end.saturating_sub(span.start)).into()
}

/// Strip the surrounding quotes of a state name and resolve `\"` and `\\`
/// escapes. Unknown escapes are kept verbatim, backslash included.
fn unquote(raw: &str) -> String {
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
