//! PARLAY: expected-value search over football accumulator bets
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod backtest;
pub mod config;
pub mod data;
pub mod engine;
pub mod strategy;
pub mod types;
