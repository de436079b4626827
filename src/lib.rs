//! clipforge: ingest, trim, merge and share short video clips.
//!
//! The heavy lifting lives in the workspace crates; this crate loads
//! configuration and wires them together for the command-line driver.

pub mod app;
pub mod config;

pub use app::App;
