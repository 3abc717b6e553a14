//! Canonical surface emission.
//!
//! The printer reproduces the surface shape the parser consumes, so
//! `parse(d.to_string())` yields `d` back for any well-formed diagram.
//! Trivial guards and postconditions are elided; a trivial guard next to a
//! non-trivial postcondition is spelled out as `true` because the grammar
//! reads the first `;` clause as the guard.

use std::fmt;

use crate::ast::{is_trivial, Diagram};

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@startuml")?;

        for state in self.states.values() {
            writeln!(f, "state \"{}\" as {}", escape_name(&state.name), state.id)?;
            for var in &state.vars {
                writeln!(f, "{}: {var}", state.id)?;
            }
        }

        if is_trivial(&self.start_edge.post) {
            writeln!(f, "[*] --> {}", self.start_edge.dst)?;
        } else {
            writeln!(f, "[*] --> {} : {}", self.start_edge.dst, self.start_edge.post)?;
        }

        for edge in &self.edges {
            if edge.is_termination() {
                write!(f, "{} --> [*] : {}", edge.src, edge.event)?;
                if !is_trivial(&edge.guard) {
                    write!(f, " ; {}", edge.guard)?;
                }
                writeln!(f)?;
                continue;
            }
            write!(f, "{} --> {} : {}", edge.src, edge.dst, edge.event)?;
            match (is_trivial(&edge.guard), is_trivial(&edge.post)) {
                (true, true) => {}
                (false, true) => write!(f, " ; {}", edge.guard)?,
                (true, false) => write!(f, " ; true ; {}", edge.post)?,
                (false, false) => write!(f, " ; {} ; {}", edge.guard, edge.post)?,
            }
            writeln!(f)?;
        }

        writeln!(f, "@enduml")
    }
}
