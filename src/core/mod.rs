//! core
//!
//! Core domain types, schemas, and local storage for ctsync.
//!
//! # Modules
//!
//! - [`value`] - The generic configuration tree
//! - [`path`] - Concrete attribute paths and path expressions
//! - [`diagnostics`] - Path-attributed diagnostics
//! - [`validators`] - Constraint validators
//! - [`modifiers`] - Defaulting and immutability plan modifiers
//! - [`schema`] - The content type rule table
//! - [`config`] - Configuration schema and loading
//! - [`state`] - Persisted snapshots
//! - [`lock`] - Exclusive state lock
//!
//! # Design Principles
//!
//! - Validators and modifiers are closed enums, one dispatch method each
//! - Schemas are strict and self-describing
//! - Validation collects every problem before reporting

pub mod config;
pub mod diagnostics;
pub mod lock;
pub mod modifiers;
pub mod path;
pub mod schema;
pub mod state;
pub mod validators;
pub mod value;
