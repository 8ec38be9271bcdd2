#![forbid(unsafe_code)]

//! Core types for the firma signature validator.
//!
//! Error type, namespace table and algorithm URI constants shared by every
//! crate in the workspace.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
