//! # Route Modules
//!
//! - `schemas`: the schema resource: catalog listing and individual schema
//!   documents, mounted at the configured schema URI.

pub mod schemas;
