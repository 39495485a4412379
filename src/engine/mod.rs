//! Core engine: outcome expansion, EV evaluation, parlay enumeration and
//! portfolio search.

pub mod combinations;
pub mod combiner;
pub mod enumerator;
pub mod evaluator;
pub mod expander;
