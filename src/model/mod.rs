//! model
//!
//! The schema entity model: the typed shape of a content type as configured
//! and persisted ([`resource`]), its wire representation on the remote API
//! ([`wire`]), the closed set of field validations ([`validation`]), the
//! translation between the two ([`translate`]), and the structural equality
//! test that decides whether a remote call is needed ([`equality`]).
//!
//! # Translation
//!
//! ```text
//! ConfigValue tree --from_tree--> ContentTypeModel --draft--> wire::ContentTypeBody
//!                                        ^                              |
//!                                        +------------import------------+
//! ```
//!
//! Translation fails loudly on shapes the model does not know: an
//! unrecognized validation, item type or default value is a [`ModelError`],
//! never silently dropped.

pub mod equality;
pub mod resource;
pub mod translate;
pub mod validation;
pub mod wire;

pub use equality::{content_types_equal, fields_equal};
pub use resource::{
    ContentTypeModel, ControlBlock, DefaultValueBlock, FieldModel, ItemsModel, RangeBlock,
    RegexpBlock, SettingsBlock, ValidationBlock,
};
pub use validation::{Validation, ValidationRule};

use thiserror::Error;

use crate::core::path::AttrPath;

/// Errors from translating between configuration, model and wire shapes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// A validation block with zero, several, or unknown kinds set.
    #[error("unsupported validation, please implement: {0}")]
    UnsupportedValidation(String),

    /// An array item type the model cannot represent.
    #[error("unsupported items type '{0}', please implement")]
    UnsupportedItems(String),

    /// A default value that is neither locale-to-string nor locale-to-bool.
    #[error("unsupported default value on field '{field}': {detail}")]
    UnsupportedDefaultValue { field: String, detail: String },

    /// Both string and bool defaults on one field.
    #[error("field '{0}' declares both string and bool default values")]
    ConflictingDefaultValue(String),

    /// The proposed tree still contains a value that is not known yet.
    #[error("value at '{0}' is not known yet")]
    NotKnown(AttrPath),

    /// The tree does not have the shape of a content type.
    #[error("invalid content type shape: {0}")]
    Shape(String),
}
