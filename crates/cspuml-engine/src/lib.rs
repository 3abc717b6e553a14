//! CSP-semantics engines over state diagrams.
//!
//! This crate implements the two semantic operations of cspuml: parallel
//! composition of diagrams under the generalised parallel operator `∥_X`
//! (rules Para1…Para6, with termination via `✓` and the sentinel `Ω`), and
//! stable-failures refinement analysis producing proof obligation lists.
//! Both engines are purely computational, single-threaded, and perform no
//! I/O; they own every collection they build.

pub mod alphabet;
pub mod compose;
pub mod refinement;
pub mod report;
pub mod traces;

pub use compose::{parallel, parallel2, CompositionError};
pub use refinement::{proof_obligations, ObligationKind, ProofObligation};
