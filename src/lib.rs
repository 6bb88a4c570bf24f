//! ctsync - Reconcile declared content types with a content management API
//!
//! ctsync reads content type declarations from a project file, validates
//! them, and brings the remote content types in line with them through a
//! versioned REST API with optimistic concurrency.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Plans proposals and reconciles them against the API
//! - [`model`] - The content type model, wire shapes, translation and equality
//! - [`api`] - The remote API trait, its HTTP client, and a mock
//! - [`core`] - Configuration trees, path expressions, validators, modifiers,
//!   config files, and local state
//!
//! # Correctness Invariants
//!
//! ctsync maintains the following invariants:
//!
//! 1. No remote call is made for a configuration that fails validation
//! 2. Every mutating call carries the last version observed from the API
//! 3. A field is marked omitted in one update before it is deleted in the next
//! 4. Editor interface settings this tool does not manage are never dropped

pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod model;
