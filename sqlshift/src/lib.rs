// sqlshift/src/lib.rs
//! # sqlshift CLI
//!
//! Terminal front end for `sqlshift-core`: exports a Postgres database with
//! `pg_dump`, rewrites the dump for the destination and replays it with `psql`.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
pub mod utils;

pub use commands::dispatch;
