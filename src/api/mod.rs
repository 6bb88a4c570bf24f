//! api
//!
//! Access to the remote content management API.
//!
//! # Architecture
//!
//! The [`ContentApi`] trait is the only way the engine talks to the remote
//! service. Commands build an [`HttpContentApi`] from configuration; tests
//! use [`mock::MockContentApi`].
//!
//! - Remote calls are made only after local validation has passed
//! - Calls are issued one at a time and never retried
//! - Every call returns the server's current version of the entity
//!
//! # Modules
//!
//! - `traits`: Core `ContentApi` trait, identities and errors
//! - [`http`]: reqwest implementation
//! - [`mock`]: Mock implementation for deterministic testing

pub mod http;
pub mod mock;
mod traits;

pub use http::HttpContentApi;
pub use traits::*;
