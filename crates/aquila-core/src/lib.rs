//! Core types and trait definitions for the Aquila activity tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies;
//! storage backends and the server both build on top of it.

pub mod aggregate;
pub mod audit;
pub mod dates;
pub mod error;
pub mod flow;
pub mod minutes;
pub mod policy;
pub mod profile;
pub mod report;
pub mod store;

pub use error::{Error, Result};
