//! Shared types and models for the Hainan Weather Service
//!
//! This crate contains the domain records exchanged between the sync
//! subsystem, the stores and the HTTP surface, plus the parsing helpers for
//! the provider's textual formats.

pub mod models;
pub mod parse;
pub mod types;
pub mod validation;

pub use models::*;
pub use parse::*;
pub use types::*;
pub use validation::*;
