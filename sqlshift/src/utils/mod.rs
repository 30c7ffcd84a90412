//! Helpers for driving the external Postgres client tools.

pub mod process;
