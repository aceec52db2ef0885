//! # Middleware Modules
//!
//! Per-endpoint hypermedia middleware plus the application trace layer.
//!
//! Handler pipeline (outermost first):
//!
//! ```text
//! error_context → produces (negotiate) → consumes (validate) → handler
//! ```
//!
//! Negotiation runs before validation so a request that can never be
//! answered is rejected with 406 without reading its body; Link and
//! Content-Type annotations are applied after the handler returns.

pub mod consumes;
pub mod produces;
pub mod trace;
