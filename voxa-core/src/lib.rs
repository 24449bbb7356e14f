//! voxa-core: shared building blocks for the voxa chat widget backend
//!
//! - `Error` / `Result`: the failure taxonomy every crate converts into
//! - `config`: JSON/TOML document loading and environment helpers

pub mod config;
pub mod error;

pub use error::{Error, Result};
