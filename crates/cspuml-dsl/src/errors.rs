use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{Span, StateId};

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(cspuml::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Duplicate state id '{id}'")]
    #[diagnostic(code(cspuml::parse::duplicate_state))]
    DuplicateState {
        id: String,
        #[label("redeclared here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Duplicate start edge")]
    #[diagnostic(
        code(cspuml::parse::duplicate_start),
        help("a diagram has exactly one `[*] --> <state>` edge")
    )]
    DuplicateStartEdge {
        #[label("second start edge")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Missing start edge")]
    #[diagnostic(
        code(cspuml::parse::missing_start),
        help("add `[*] --> <state>` after the state declarations")
    )]
    MissingStartEdge,
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span, source: &str, filename: &str) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: (span.start, span.end.saturating_sub(span.start)).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        }
    }
}

/// Well-formed syntax that violates the diagram invariants.
#[derive(Debug, Error, Diagnostic)]
pub enum StructuralError {
    #[error("start edge targets unknown state '{id}'")]
    #[diagnostic(code(cspuml::structure::start_target))]
    StartEdgeTarget { id: StateId },

    #[error("start edge has no target state")]
    #[diagnostic(code(cspuml::structure::start_target))]
    MissingStartTarget,

    #[error("edge source references unknown state '{id}'")]
    #[diagnostic(code(cspuml::structure::dangling))]
    DanglingSource { id: StateId },

    #[error("edge target references unknown state '{id}'")]
    #[diagnostic(code(cspuml::structure::dangling))]
    DanglingTarget { id: StateId },

    #[error("edge list contains a second start edge")]
    #[diagnostic(code(cspuml::structure::start_edge))]
    UnexpectedStartEdge,
}
