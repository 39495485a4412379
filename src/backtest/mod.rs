//! Strategy evaluation over historical matchdays.

pub mod simulation;
pub mod strata;
