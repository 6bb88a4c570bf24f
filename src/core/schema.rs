//! core::schema
//!
//! The rule table for the content type resource.
//!
//! # Design
//!
//! A [`ResourceSchema`] is an ordered list of [`AttributeRule`]s. Each rule
//! names the attribute it applies to with an absolute [`PathExpr`] (usually
//! containing `[*]` wildcards) and carries the validators and plan modifiers
//! for that attribute. Rules are written once and instantiated for every
//! concrete location the expression matches.
//!
//! Allowed enum values are injected through a [`TypeRegistry`] when the
//! schema is built; nothing here reads global state.
//!
//! # Pipeline
//!
//! - [`ResourceSchema::validate`] runs every validator over the configured
//!   tree and returns all diagnostics.
//! - [`ResourceSchema::plan`] validates, then applies plan modifiers to
//!   produce the proposed tree, failing with every diagnostic collected along
//!   the way.

use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use super::diagnostics::Diagnostics;
use super::modifiers::{DefaultLiteral, ModifyRequest, PlanModifier, ValueType};
use super::path::{AttrPath, PathExpr, PathParseError};
use super::validators::{ValidateRequest, Validator};
use super::value::ConfigValue;

/// Content type ids: letters, digits, `_`, `-`, `.`; at most 64 characters.
pub const CONTENT_TYPE_ID_PATTERN: &str = r"^[a-zA-Z0-9][a-zA-Z0-9_.\-]{0,63}$";

/// Field ids: a letter followed by letters, digits or `_`; at most 64.
pub const FIELD_ID_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9_]{0,63}$";

/// Keys of a validation block, exactly one of which must be set.
pub const VALIDATION_KINDS: &[&str] = &[
    "unique",
    "size",
    "range",
    "asset_file_size",
    "regexp",
    "link_content_type",
    "link_mimetype_group",
    "in",
    "enabled_marks",
    "enabled_node_types",
];

/// Environment used when the configuration does not name one.
pub const DEFAULT_ENVIRONMENT: &str = "master";

/// Widget namespace used when a control does not name one.
pub const DEFAULT_WIDGET_NAMESPACE: &str = "builtin";

/// Allowed enum values used across many rules.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    pub field_types: Arc<[String]>,
    pub item_types: Arc<[String]>,
    pub link_types: Arc<[String]>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Arc<[String]> {
            values.iter().map(|s| s.to_string()).collect()
        }
        Self {
            field_types: owned(&[
                "Symbol",
                "Text",
                "RichText",
                "Integer",
                "Number",
                "Date",
                "Location",
                "Boolean",
                "Object",
                "Link",
                "Array",
                "ResourceLink",
            ]),
            item_types: owned(&["Symbol", "Link", "ResourceLink"]),
            link_types: owned(&["Entry", "Asset"]),
        }
    }
}

/// Errors building a rule table.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid rule path: {0}")]
    Path(#[from] PathParseError),

    #[error("invalid id pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Validators and modifiers for one attribute.
#[derive(Debug, Clone)]
pub struct AttributeRule {
    pub path: PathExpr,
    pub validators: Vec<Validator>,
    pub modifiers: Vec<PlanModifier>,
}

impl AttributeRule {
    /// A rule for the attribute named by `path` (text form, absolute).
    pub fn at(path: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            path: PathExpr::parse(path)?,
            validators: Vec::new(),
            modifiers: Vec::new(),
        })
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn modify(mut self, modifier: PlanModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// The full rule table for one resource kind.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    rules: Vec<AttributeRule>,
}

impl ResourceSchema {
    pub fn new(rules: Vec<AttributeRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AttributeRule] {
        &self.rules
    }

    /// Rules for the content type resource.
    ///
    /// # Errors
    ///
    /// Fails only if a built-in path or id pattern does not parse.
    pub fn content_type(
        registry: &TypeRegistry,
        default_environment: &str,
    ) -> Result<Self, SchemaError> {
        let content_type_id = Regex::new(CONTENT_TYPE_ID_PATTERN)?;
        let field_id = Regex::new(FIELD_ID_PATTERN)?;
        let sibling = PathExpr::sibling;
        let parent_type = || PathExpr::relative().parent().attr("type");

        let mut rules = vec![
            AttributeRule::at("space_id")?
                .validate(Validator::Required)
                .modify(PlanModifier::Immutable),
            AttributeRule::at("environment")?
                .modify(PlanModifier::Default(DefaultLiteral::String(
                    default_environment.to_string(),
                )))
                .modify(PlanModifier::Immutable),
            AttributeRule::at("id")?
                .validate(Validator::Matches {
                    pattern: content_type_id,
                    describe: "content type id",
                })
                .modify(PlanModifier::UsePriorWhenAbsent)
                .modify(PlanModifier::Immutable),
            AttributeRule::at("name")?.validate(Validator::Required),
            AttributeRule::at("display_field")?
                .validate(Validator::Required)
                .validate(Validator::References {
                    target: PathExpr::parse("fields[*].id")?,
                }),
            AttributeRule::at("manage_field_controls")?
                .modify(PlanModifier::Default(DefaultLiteral::Bool(false))),
            AttributeRule::at("version")?
                .validate(Validator::Computed)
                .modify(PlanModifier::UsePriorWhenAbsent),
            AttributeRule::at("version_controls")?
                .validate(Validator::Computed)
                .modify(PlanModifier::UsePriorWhenAbsent),
            AttributeRule::at("fields")?
                .validate(Validator::UniqueBy("id".to_string()))
                .validate(Validator::FieldTypeChangeProhibited)
                .modify(PlanModifier::Default(DefaultLiteral::empty_list(
                    ValueType::Object,
                ))),
            AttributeRule::at("fields[*].id")?
                .validate(Validator::Required)
                .validate(Validator::Matches {
                    pattern: field_id,
                    describe: "field id",
                }),
            AttributeRule::at("fields[*].name")?.validate(Validator::Required),
            AttributeRule::at("fields[*].type")?
                .validate(Validator::Required)
                .validate(Validator::OneOf(registry.field_types.clone()))
                .validate(Validator::needs_to_be_set_when_equals(
                    sibling("link_type"),
                    "Link",
                ))
                .validate(Validator::needs_to_be_set_when_equals(
                    sibling("items"),
                    "Array",
                )),
            AttributeRule::at("fields[*].link_type")?
                .validate(Validator::OneOf(registry.link_types.clone()))
                .validate(Validator::allowed_only_when(sibling("type"), "Link"))
                .validate(Validator::ChangeProhibited),
            AttributeRule::at("fields[*].items")?
                .validate(Validator::allowed_only_when(sibling("type"), "Array")),
            AttributeRule::at("fields[*].items.type")?
                .validate(Validator::Required)
                .validate(Validator::OneOf(registry.item_types.clone()))
                .validate(Validator::needs_to_be_set_when_equals(
                    sibling("link_type"),
                    "Link",
                ))
                .validate(Validator::ChangeProhibited),
            AttributeRule::at("fields[*].items.link_type")?
                .validate(Validator::OneOf(registry.link_types.clone()))
                .validate(Validator::allowed_only_when(sibling("type"), "Link"))
                .validate(Validator::ChangeProhibited),
            AttributeRule::at("fields[*].default_value.string")?
                .validate(Validator::ConflictsWith {
                    related: sibling("bool"),
                })
                .validate(Validator::allowed_only_when_any(
                    parent_type(),
                    ["Symbol", "Text", "Date"],
                )),
            AttributeRule::at("fields[*].default_value.bool")?
                .validate(Validator::allowed_only_when(parent_type(), "Boolean")),
            AttributeRule::at("fields[*].control.widget_id")?.validate(Validator::Required),
            AttributeRule::at("fields[*].control.widget_namespace")?.modify(PlanModifier::Default(
                DefaultLiteral::String(DEFAULT_WIDGET_NAMESPACE.to_string()),
            )),
        ];

        for flag in ["required", "localized", "disabled", "omitted"] {
            rules.push(
                AttributeRule::at(&format!("fields[*].{}", flag))?
                    .modify(PlanModifier::Default(DefaultLiteral::Bool(false))),
            );
        }

        for validations in ["fields[*].validations", "fields[*].items.validations"] {
            rules.push(
                AttributeRule::at(validations)?.modify(PlanModifier::Default(
                    DefaultLiteral::empty_list(ValueType::Object),
                )),
            );
            rules.push(
                AttributeRule::at(&format!("{}[*]", validations))?
                    .validate(Validator::exactly_one_of(VALIDATION_KINDS.iter().copied())),
            );
        }

        Ok(Self::new(rules))
    }

    /// Run every validator over the configured tree.
    pub fn validate(&self, config: &ConfigValue, prior: Option<&ConfigValue>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let root = AttrPath::root();
        for rule in &self.rules {
            if rule.validators.is_empty() {
                continue;
            }
            for (path, value) in rule.path.resolve(&root, config) {
                let req = ValidateRequest {
                    path: &path,
                    value,
                    config,
                    prior,
                };
                for validator in &rule.validators {
                    validator.validate(&req, &mut diags);
                }
            }
        }
        diags
    }

    /// Validate, then apply plan modifiers to produce the proposed tree.
    ///
    /// # Errors
    ///
    /// Returns every diagnostic from validation and from the modifiers.
    pub fn plan(
        &self,
        config: &ConfigValue,
        prior: Option<&ConfigValue>,
    ) -> Result<ConfigValue, Diagnostics> {
        let mut diags = self.validate(config, prior);
        let mut proposed = config.clone();
        let root = AttrPath::root();

        for rule in &self.rules {
            if rule.modifiers.is_empty() {
                continue;
            }
            let paths: Vec<AttrPath> = rule
                .path
                .resolve(&root, &proposed)
                .into_iter()
                .map(|(path, _)| path)
                .collect();
            for path in paths {
                for modifier in &rule.modifiers {
                    let value = proposed.at(&path).cloned().unwrap_or_default();
                    let replacement = modifier.modify(
                        &ModifyRequest {
                            path: &path,
                            value: &value,
                            proposed: &proposed,
                            prior,
                        },
                        &mut diags,
                    );
                    if let Some(replacement) = replacement {
                        proposed.set_at(&path, replacement);
                    }
                }
            }
        }

        diags.into_result().map(|()| proposed)
    }
}
