//! model::validation
//!
//! The closed set of field validations.
//!
//! A validation is exactly one rule plus an optional message. Both the
//! configured block ([`ValidationBlock`]) and the wire object
//! ([`RawValidation`]) allow any combination of keys; converting either into
//! a [`Validation`] is where "exactly one, and one we know" is enforced.
//! Anything else is [`ModelError::UnsupportedValidation`].

use std::fmt;

use super::resource::{RangeBlock, RegexpBlock, ValidationBlock};
use super::wire::{Bounds, Pattern, RawValidation};
use super::ModelError;

/// One validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    Unique(bool),
    Size(Bounds),
    Range(Bounds),
    AssetFileSize(Bounds),
    Regexp(Pattern),
    LinkContentType(Vec<String>),
    LinkMimetypeGroup(Vec<String>),
    In(Vec<String>),
    EnabledMarks(Vec<String>),
    EnabledNodeTypes(Vec<String>),
}

impl ValidationRule {
    /// Configuration key of the rule.
    pub fn key(&self) -> &'static str {
        match self {
            ValidationRule::Unique(_) => "unique",
            ValidationRule::Size(_) => "size",
            ValidationRule::Range(_) => "range",
            ValidationRule::AssetFileSize(_) => "asset_file_size",
            ValidationRule::Regexp(_) => "regexp",
            ValidationRule::LinkContentType(_) => "link_content_type",
            ValidationRule::LinkMimetypeGroup(_) => "link_mimetype_group",
            ValidationRule::In(_) => "in",
            ValidationRule::EnabledMarks(_) => "enabled_marks",
            ValidationRule::EnabledNodeTypes(_) => "enabled_node_types",
        }
    }
}

/// A validation rule with its optional message.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub rule: ValidationRule,
    pub message: Option<String>,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule.key())
    }
}

/// Pick the single rule out of a list of candidates.
fn exactly_one(
    candidates: Vec<Option<ValidationRule>>,
    unknown: Vec<String>,
) -> Result<ValidationRule, ModelError> {
    if !unknown.is_empty() {
        return Err(ModelError::UnsupportedValidation(format!(
            "unknown keys [{}]",
            unknown.join(", ")
        )));
    }
    let mut set: Vec<ValidationRule> = candidates.into_iter().flatten().collect();
    match set.len() {
        1 => Ok(set.remove(0)),
        0 => Err(ModelError::UnsupportedValidation(
            "no validation kind set".to_string(),
        )),
        _ => Err(ModelError::UnsupportedValidation(format!(
            "several validation kinds set [{}]",
            set.iter().map(ValidationRule::key).collect::<Vec<_>>().join(", ")
        ))),
    }
}

impl From<&RangeBlock> for Bounds {
    fn from(block: &RangeBlock) -> Self {
        Bounds {
            min: block.min,
            max: block.max,
        }
    }
}

impl From<Bounds> for RangeBlock {
    fn from(bounds: Bounds) -> Self {
        RangeBlock {
            min: bounds.min,
            max: bounds.max,
        }
    }
}

impl From<&RegexpBlock> for Pattern {
    fn from(block: &RegexpBlock) -> Self {
        Pattern {
            pattern: block.pattern.clone(),
            flags: block.flags.clone(),
        }
    }
}

impl From<Pattern> for RegexpBlock {
    fn from(pattern: Pattern) -> Self {
        RegexpBlock {
            pattern: pattern.pattern,
            flags: pattern.flags,
        }
    }
}

impl TryFrom<&ValidationBlock> for Validation {
    type Error = ModelError;

    fn try_from(block: &ValidationBlock) -> Result<Self, Self::Error> {
        let rule = exactly_one(
            vec![
                block.unique.map(ValidationRule::Unique),
                block.size.as_ref().map(|b| ValidationRule::Size(b.into())),
                block.range.as_ref().map(|b| ValidationRule::Range(b.into())),
                block
                    .asset_file_size
                    .as_ref()
                    .map(|b| ValidationRule::AssetFileSize(b.into())),
                block.regexp.as_ref().map(|p| ValidationRule::Regexp(p.into())),
                block
                    .link_content_type
                    .clone()
                    .map(ValidationRule::LinkContentType),
                block
                    .link_mimetype_group
                    .clone()
                    .map(ValidationRule::LinkMimetypeGroup),
                block.in_values.clone().map(ValidationRule::In),
                block.enabled_marks.clone().map(ValidationRule::EnabledMarks),
                block
                    .enabled_node_types
                    .clone()
                    .map(ValidationRule::EnabledNodeTypes),
            ],
            Vec::new(),
        )?;
        Ok(Validation {
            rule,
            message: block.message.clone(),
        })
    }
}

impl From<&Validation> for ValidationBlock {
    fn from(validation: &Validation) -> Self {
        let mut block = ValidationBlock {
            message: validation.message.clone(),
            ..Default::default()
        };
        match validation.rule.clone() {
            ValidationRule::Unique(v) => block.unique = Some(v),
            ValidationRule::Size(b) => block.size = Some(b.into()),
            ValidationRule::Range(b) => block.range = Some(b.into()),
            ValidationRule::AssetFileSize(b) => block.asset_file_size = Some(b.into()),
            ValidationRule::Regexp(p) => block.regexp = Some(p.into()),
            ValidationRule::LinkContentType(v) => block.link_content_type = Some(v),
            ValidationRule::LinkMimetypeGroup(v) => block.link_mimetype_group = Some(v),
            ValidationRule::In(v) => block.in_values = Some(v),
            ValidationRule::EnabledMarks(v) => block.enabled_marks = Some(v),
            ValidationRule::EnabledNodeTypes(v) => block.enabled_node_types = Some(v),
        }
        block
    }
}

impl TryFrom<&RawValidation> for Validation {
    type Error = ModelError;

    fn try_from(raw: &RawValidation) -> Result<Self, Self::Error> {
        let rule = exactly_one(
            vec![
                raw.unique.map(ValidationRule::Unique),
                raw.size.map(ValidationRule::Size),
                raw.range.map(ValidationRule::Range),
                raw.asset_file_size.map(ValidationRule::AssetFileSize),
                raw.regexp.clone().map(ValidationRule::Regexp),
                raw.link_content_type.clone().map(ValidationRule::LinkContentType),
                raw.link_mimetype_group
                    .clone()
                    .map(ValidationRule::LinkMimetypeGroup),
                raw.in_values.clone().map(ValidationRule::In),
                raw.enabled_marks.clone().map(ValidationRule::EnabledMarks),
                raw.enabled_node_types
                    .clone()
                    .map(ValidationRule::EnabledNodeTypes),
            ],
            raw.other.keys().cloned().collect(),
        )?;
        Ok(Validation {
            rule,
            message: raw.message.clone(),
        })
    }
}

impl From<&Validation> for RawValidation {
    fn from(validation: &Validation) -> Self {
        let mut raw = RawValidation {
            message: validation.message.clone(),
            ..Default::default()
        };
        match validation.rule.clone() {
            ValidationRule::Unique(v) => raw.unique = Some(v),
            ValidationRule::Size(b) => raw.size = Some(b),
            ValidationRule::Range(b) => raw.range = Some(b),
            ValidationRule::AssetFileSize(b) => raw.asset_file_size = Some(b),
            ValidationRule::Regexp(p) => raw.regexp = Some(p),
            ValidationRule::LinkContentType(v) => raw.link_content_type = Some(v),
            ValidationRule::LinkMimetypeGroup(v) => raw.link_mimetype_group = Some(v),
            ValidationRule::In(v) => raw.in_values = Some(v),
            ValidationRule::EnabledMarks(v) => raw.enabled_marks = Some(v),
            ValidationRule::EnabledNodeTypes(v) => raw.enabled_node_types = Some(v),
        }
        raw
    }
}

/// Translate a configured validation list into its wire form.
///
/// # Errors
///
/// Fails on the first block that is not exactly one known rule.
pub fn draft_validations(blocks: &[ValidationBlock]) -> Result<Vec<RawValidation>, ModelError> {
    blocks
        .iter()
        .map(|block| Validation::try_from(block).map(|v| RawValidation::from(&v)))
        .collect()
}

/// Translate a wire validation list into configured blocks.
///
/// # Errors
///
/// Fails on the first wire object that is not exactly one known rule.
pub fn import_validations(raw: &[RawValidation]) -> Result<Vec<ValidationBlock>, ModelError> {
    raw.iter()
        .map(|r| Validation::try_from(r).map(|v| ValidationBlock::from(&v)))
        .collect()
}
