//! core::validators
//!
//! Cross-field constraint validators.
//!
//! # Design
//!
//! Every validator kind is one variant of the closed [`Validator`] enum and
//! is dispatched through [`Validator::validate`]. A validator is attached to
//! an attribute (see [`crate::core::schema`]) and runs once for every
//! concrete location that attribute occupies in the tree.
//!
//! All validators follow the same single pass:
//!
//! 1. If the attribute's own value is null or unknown, there is nothing to
//!    check. (`Required` is the one exception: it exists to flag nulls.)
//! 2. Related locations are resolved through [`PathExpr::resolve`] relative
//!    to the attribute being checked.
//! 3. Related values that are unknown are skipped; they cannot be compared
//!    until apply time.
//! 4. Violations are appended to the caller's [`Diagnostics`]; nothing
//!    short-circuits.
//!
//! # Example
//!
//! ```
//! use ctsync::core::diagnostics::Diagnostics;
//! use ctsync::core::path::{AttrPath, PathExpr};
//! use ctsync::core::validators::{ValidateRequest, Validator};
//! use ctsync::core::value::ConfigValue;
//!
//! let config = ConfigValue::from_json(serde_json::json!({
//!     "fields": [{ "id": "author", "type": "Link" }]
//! }));
//! let path = AttrPath::root().attr("fields").index(0).attr("type");
//!
//! let rule = Validator::needs_to_be_set_when_equals(PathExpr::sibling("link_type"), "Link");
//! let mut diags = Diagnostics::new();
//! rule.validate(
//!     &ValidateRequest {
//!         path: &path,
//!         value: config.at(&path).unwrap(),
//!         config: &config,
//!         prior: None,
//!     },
//!     &mut diags,
//! );
//! assert_eq!(diags.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::diagnostics::{Diagnostic, Diagnostics};
use super::path::{locate_prior, AttrPath, PathExpr};
use super::value::{ConfigValue, NULL};

/// Everything a validator can see.
#[derive(Debug, Clone, Copy)]
pub struct ValidateRequest<'a> {
    /// Location of the attribute being validated.
    pub path: &'a AttrPath,
    /// Its configured value.
    pub value: &'a ConfigValue,
    /// The whole configuration tree.
    pub config: &'a ConfigValue,
    /// The previously persisted tree, if the resource exists.
    pub prior: Option<&'a ConfigValue>,
}

/// A single constraint kind.
#[derive(Debug, Clone)]
pub enum Validator {
    /// The attribute must not be null.
    Required,

    /// The attribute is owned by the remote side and may not be configured.
    Computed,

    /// A string value must be one of an injected set.
    OneOf(Arc<[String]>),

    /// A string value must match a pattern.
    Matches {
        pattern: Regex,
        /// What the pattern describes, e.g. "field id".
        describe: &'static str,
    },

    /// When this value equals `trigger`, every related location must be set.
    NeedsToBeSetWhenEquals {
        related: PathExpr,
        trigger: ConfigValue,
    },

    /// This attribute may only be set while the related value is one of
    /// `allowed`.
    AllowedOnlyWhen {
        related: PathExpr,
        allowed: Vec<ConfigValue>,
    },

    /// This attribute and the related one may not both be set.
    ConflictsWith { related: PathExpr },

    /// The value must equal one of the values the target resolves to.
    References { target: PathExpr },

    /// The value may not differ from the persisted value at the same
    /// identity.
    ChangeProhibited,

    /// On a list of fields: no entry may change the type tag it was
    /// persisted with.
    FieldTypeChangeProhibited,

    /// On an object: exactly one of the named keys must be set.
    ExactlyOneOf(Vec<String>),

    /// On a list of objects: no two elements share a value under the key.
    UniqueBy(String),
}

impl Validator {
    pub fn needs_to_be_set_when_equals(related: PathExpr, trigger: impl Into<ConfigValue>) -> Self {
        Validator::NeedsToBeSetWhenEquals {
            related,
            trigger: trigger.into(),
        }
    }

    pub fn allowed_only_when(related: PathExpr, required: impl Into<ConfigValue>) -> Self {
        Validator::AllowedOnlyWhen {
            related,
            allowed: vec![required.into()],
        }
    }

    pub fn allowed_only_when_any<V: Into<ConfigValue>>(
        related: PathExpr,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        Validator::AllowedOnlyWhen {
            related,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exactly_one_of<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Validator::ExactlyOneOf(keys.into_iter().map(Into::into).collect())
    }

    /// Check one attribute, appending any violations to `diags`.
    pub fn validate(&self, req: &ValidateRequest<'_>, diags: &mut Diagnostics) {
        if let Validator::Required = self {
            if req.value.is_null() {
                diags.push(Diagnostic::invalid(
                    req.path.clone(),
                    "Missing required attribute",
                    format!("{} must be set", display_name(req.path)),
                ));
            }
            return;
        }

        if !req.value.is_known() {
            return;
        }

        match self {
            Validator::Required => {}
            Validator::Computed => diags.push(Diagnostic::invalid(
                req.path.clone(),
                "Computed attribute",
                format!(
                    "{} is set by the remote system and cannot be configured",
                    display_name(req.path)
                ),
            )),
            Validator::OneOf(allowed) => one_of(req, allowed, diags),
            Validator::Matches { pattern, describe } => matches(req, pattern, describe, diags),
            Validator::NeedsToBeSetWhenEquals { related, trigger } => {
                needs_to_be_set_when_equals(req, related, trigger, diags)
            }
            Validator::AllowedOnlyWhen { related, allowed } => {
                allowed_only_when(req, related, allowed, diags)
            }
            Validator::ConflictsWith { related } => conflicts_with(req, related, diags),
            Validator::References { target } => references(req, target, diags),
            Validator::ChangeProhibited => change_prohibited(req, diags),
            Validator::FieldTypeChangeProhibited => field_type_change_prohibited(req, diags),
            Validator::ExactlyOneOf(keys) => exactly_one_of(req, keys, diags),
            Validator::UniqueBy(key) => unique_by(req, key, diags),
        }
    }
}

/// Human-friendly name for the attribute at a path.
fn display_name(path: &AttrPath) -> String {
    path.last_attr()
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}

fn describe_allowed(allowed: &[ConfigValue]) -> String {
    match allowed {
        [single] => single.to_string(),
        many => format!(
            "one of {}",
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn one_of(req: &ValidateRequest<'_>, allowed: &[String], diags: &mut Diagnostics) {
    let detail = match req.value.as_str() {
        Some(s) if allowed.iter().any(|a| a == s) => return,
        Some(s) => format!("expected one of {}, got {:?}", allowed.join(", "), s),
        None => format!("expected a string, got {}", req.value.kind()),
    };
    diags.push(Diagnostic::invalid(req.path.clone(), "Invalid value", detail));
}

fn matches(req: &ValidateRequest<'_>, pattern: &Regex, describe: &str, diags: &mut Diagnostics) {
    let detail = match req.value.as_str() {
        Some(s) if pattern.is_match(s) => return,
        Some(s) => format!(
            "{:?} is not a valid {}: must match {}",
            s,
            describe,
            pattern.as_str()
        ),
        None => format!("expected a string, got {}", req.value.kind()),
    };
    diags.push(Diagnostic::invalid(req.path.clone(), "Invalid value", detail));
}

fn needs_to_be_set_when_equals(
    req: &ValidateRequest<'_>,
    related: &PathExpr,
    trigger: &ConfigValue,
    diags: &mut Diagnostics,
) {
    if req.value != trigger {
        return;
    }
    for (path, value) in related.resolve(req.path, req.config) {
        if value.is_null() {
            diags.push(Diagnostic::invalid(
                req.path.clone(),
                "Missing required attribute",
                format!(
                    "{} must be set when {} is {}",
                    path,
                    display_name(req.path),
                    trigger
                ),
            ));
        }
    }
}

fn allowed_only_when(
    req: &ValidateRequest<'_>,
    related: &PathExpr,
    allowed: &[ConfigValue],
    diags: &mut Diagnostics,
) {
    for (path, value) in related.resolve(req.path, req.config) {
        if !value.is_known() || allowed.contains(value) {
            continue;
        }
        diags.push(Diagnostic::invalid(
            req.path.clone(),
            "Invalid attribute combination",
            format!(
                "{} can only be set when {} is {}, but it is {}",
                display_name(req.path),
                path,
                describe_allowed(allowed),
                value
            ),
        ));
    }
}

fn conflicts_with(req: &ValidateRequest<'_>, related: &PathExpr, diags: &mut Diagnostics) {
    for (path, value) in related.resolve(req.path, req.config) {
        if value.is_known() {
            diags.push(Diagnostic::invalid(
                req.path.clone(),
                "Conflicting attributes",
                format!("{} cannot be set together with {}", req.path, path),
            ));
        }
    }
}

fn references(req: &ValidateRequest<'_>, target: &PathExpr, diags: &mut Diagnostics) {
    let candidates = target.resolve(req.path, req.config);
    if candidates.iter().any(|(_, v)| v.is_unknown()) {
        return;
    }
    if candidates.iter().any(|(_, v)| *v == req.value) {
        return;
    }
    let known: Vec<String> = candidates
        .iter()
        .filter(|(_, v)| v.is_known())
        .map(|(_, v)| v.to_string())
        .collect();
    diags.push(Diagnostic::invalid(
        req.path.clone(),
        "Invalid reference",
        format!(
            "{} does not match any {} (available: [{}])",
            req.value,
            target,
            known.join(", ")
        ),
    ));
}

fn change_prohibited(req: &ValidateRequest<'_>, diags: &mut Diagnostics) {
    let Some(prior) = req.prior else {
        return;
    };
    let Some((_, before)) = locate_prior(req.path, req.config, prior) else {
        return;
    };
    if !before.is_known() || before == req.value {
        return;
    }
    diags.push(Diagnostic::irrecoverable(
        req.path.clone(),
        "Change not supported",
        format!(
            "{} cannot change from {} to {}: the remote system does not support this change \
             in place. Restore the previous value, or remove the resource and create it again.",
            display_name(req.path),
            before,
            req.value
        ),
    ));
}

fn field_type_change_prohibited(req: &ValidateRequest<'_>, diags: &mut Diagnostics) {
    let (Some(prior), Some(entries)) = (req.prior, req.value.as_list()) else {
        return;
    };

    for (i, entry) in entries.iter().enumerate() {
        let Some(id) = entry.get("id").and_then(ConfigValue::as_str) else {
            continue;
        };
        let type_path = req.path.index(i).attr("type");
        let Some(after) = entry.get("type").filter(|v| v.is_known()) else {
            continue;
        };
        let Some((_, before)) = locate_prior(&type_path, req.config, prior) else {
            continue;
        };
        if before.is_known() && before != after {
            diags.push(Diagnostic::irrecoverable(
                type_path,
                "Field type change not supported",
                format!(
                    "field {:?} cannot change type from {} to {}: existing content cannot be \
                     converted. Remove the field in one apply, then add it under a new id.",
                    id, before, after
                ),
            ));
        }
    }
}

fn exactly_one_of(req: &ValidateRequest<'_>, keys: &[String], diags: &mut Diagnostics) {
    let Some(object) = req.value.as_object() else {
        return;
    };
    let values: Vec<(&str, &ConfigValue)> = keys
        .iter()
        .map(|k| (k.as_str(), object.get(k).unwrap_or(&NULL)))
        .collect();
    if values.iter().any(|(_, v)| v.is_unknown()) {
        return;
    }
    let set: Vec<&str> = values
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, _)| *k)
        .collect();
    if set.len() == 1 {
        return;
    }
    let detail = if set.is_empty() {
        format!("exactly one of [{}] must be set, found none", keys.join(", "))
    } else {
        format!(
            "exactly one of [{}] must be set, found {}: [{}]",
            keys.join(", "),
            set.len(),
            set.join(", ")
        )
    };
    diags.push(Diagnostic::invalid(req.path.clone(), "Ambiguous block", detail));
}

fn unique_by(req: &ValidateRequest<'_>, key: &str, diags: &mut Diagnostics) {
    let Some(entries) = req.value.as_list() else {
        return;
    };
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        let Some(value) = entry.get(key).and_then(ConfigValue::as_str) else {
            continue;
        };
        if let Some(first) = seen.get(value) {
            diags.push(Diagnostic::invalid(
                req.path.index(i).attr(key),
                "Duplicate identifier",
                format!("{:?} is already used by {}", value, req.path.index(*first)),
            ));
        } else {
            seen.insert(value, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::DiagnosticKind;
    use serde_json::json;

    fn field_path(i: usize, attr: &str) -> AttrPath {
        AttrPath::root().attr("fields").index(i).attr(attr)
    }

    fn run(
        validator: &Validator,
        path: &AttrPath,
        config: &ConfigValue,
        prior: Option<&ConfigValue>,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let value = config.at(path).unwrap_or(&NULL);
        validator.validate(
            &ValidateRequest {
                path,
                value,
                config,
                prior,
            },
            &mut diags,
        );
        diags
    }

    fn fields(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from_json(json!({ "fields": value }))
    }

    #[test]
    fn required_flags_null_but_not_unknown() {
        let mut config = fields(json!([{ "id": "a" }]));
        let diags = run(&Validator::Required, &field_path(0, "name"), &config, None);
        assert_eq!(diags.len(), 1);
        assert!(diags.to_string().contains("name must be set"));

        config.set_at(&field_path(0, "name"), ConfigValue::Unknown);
        assert!(run(&Validator::Required, &field_path(0, "name"), &config, None).is_empty());
    }

    #[test]
    fn computed_rejects_any_known_value() {
        let config = ConfigValue::from_json(json!({ "version": 3 }));
        let path = AttrPath::root().attr("version");
        assert_eq!(run(&Validator::Computed, &path, &config, None).len(), 1);
        let empty = ConfigValue::from_json(json!({}));
        assert!(run(&Validator::Computed, &path, &empty, None).is_empty());
    }

    #[test]
    fn one_of_rejects_unlisted() {
        let allowed: Arc<[String]> = vec!["Symbol".to_string(), "Text".to_string()].into();
        let config = fields(json!([{ "type": "Symbl" }, { "type": "Text" }]));
        let v = Validator::OneOf(allowed);
        assert_eq!(run(&v, &field_path(0, "type"), &config, None).len(), 1);
        assert!(run(&v, &field_path(1, "type"), &config, None).is_empty());
    }

    #[test]
    fn matches_checks_pattern() {
        let v = Validator::Matches {
            pattern: Regex::new("^[a-z]+$").unwrap(),
            describe: "field id",
        };
        let config = fields(json!([{ "id": "ok" }, { "id": "Not OK" }]));
        assert!(run(&v, &field_path(0, "id"), &config, None).is_empty());
        let diags = run(&v, &field_path(1, "id"), &config, None);
        assert!(diags.to_string().contains("not a valid field id"));
    }

    #[test]
    fn needs_to_be_set_when_trigger_matches() {
        let v = Validator::needs_to_be_set_when_equals(PathExpr::sibling("link_type"), "Link");
        let config = fields(json!([
            { "type": "Link" },
            { "type": "Link", "link_type": "Entry" },
            { "type": "Symbol" }
        ]));
        let diags = run(&v, &field_path(0, "type"), &config, None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.at(&field_path(0, "type")).len(), 1);
        assert!(run(&v, &field_path(1, "type"), &config, None).is_empty());
        assert!(run(&v, &field_path(2, "type"), &config, None).is_empty());
    }

    #[test]
    fn unknown_related_value_never_fails() {
        let needs = Validator::needs_to_be_set_when_equals(PathExpr::sibling("link_type"), "Link");
        let allowed = Validator::allowed_only_when(PathExpr::sibling("type"), "Link");
        let mut config = fields(json!([{ "type": "Link", "link_type": "Entry" }]));
        config.set_at(&field_path(0, "link_type"), ConfigValue::Unknown);
        assert!(run(&needs, &field_path(0, "type"), &config, None).is_empty());

        let mut config = fields(json!([{ "link_type": "Entry" }]));
        config.set_at(&field_path(0, "type"), ConfigValue::Unknown);
        assert!(run(&allowed, &field_path(0, "link_type"), &config, None).is_empty());
    }

    #[test]
    fn unknown_own_value_never_fails() {
        let v = Validator::needs_to_be_set_when_equals(PathExpr::sibling("link_type"), "Link");
        let mut config = fields(json!([{}]));
        config.set_at(&field_path(0, "type"), ConfigValue::Unknown);
        assert!(run(&v, &field_path(0, "type"), &config, None).is_empty());
    }

    #[test]
    fn allowed_only_when_names_expected_and_actual() {
        let v = Validator::allowed_only_when(PathExpr::sibling("type"), "Link");
        let config = fields(json!([{ "type": "Symbol", "link_type": "Entry" }]));
        let diags = run(&v, &field_path(0, "link_type"), &config, None);
        assert_eq!(diags.len(), 1);
        let text = diags.to_string();
        assert!(text.contains("\"Link\""), "{}", text);
        assert!(text.contains("\"Symbol\""), "{}", text);
    }

    #[test]
    fn allowed_only_when_any_accepts_each_value() {
        let v = Validator::allowed_only_when_any(PathExpr::parse("..type").unwrap(), ["Symbol", "Text"]);
        let config = fields(json!([
            { "type": "Text", "default_value": { "string": { "en-US": "x" } } },
            { "type": "Integer", "default_value": { "string": { "en-US": "x" } } }
        ]));
        let path = |i| field_path(i, "default_value").attr("string");
        assert!(run(&v, &path(0), &config, None).is_empty());
        let diags = run(&v, &path(1), &config, None);
        assert!(diags.to_string().contains("one of \"Symbol\", \"Text\""));
    }

    #[test]
    fn conflicts_with_both_set() {
        let v = Validator::ConflictsWith {
            related: PathExpr::sibling("bool"),
        };
        let config = fields(json!([{ "default_value": {
            "string": { "en-US": "x" },
            "bool": { "en-US": true }
        } }]));
        let path = field_path(0, "default_value").attr("string");
        assert_eq!(run(&v, &path, &config, None).len(), 1);
    }

    #[test]
    fn references_requires_existing_target() {
        let v = Validator::References {
            target: PathExpr::parse("fields[*].id").unwrap(),
        };
        let ok = ConfigValue::from_json(json!({ "display_field": "a", "fields": [{ "id": "a" }] }));
        let bad = ConfigValue::from_json(json!({ "display_field": "b", "fields": [{ "id": "a" }] }));
        let path = AttrPath::root().attr("display_field");
        assert!(run(&v, &path, &ok, None).is_empty());
        assert!(run(&v, &path, &bad, None)
            .to_string()
            .contains("available: [\"a\"]"));
    }

    #[test]
    fn change_prohibited_compares_by_identity() {
        let prior = fields(json!([
            { "id": "a", "link_type": "Entry" },
            { "id": "b", "link_type": "Asset" }
        ]));
        let reordered = fields(json!([
            { "id": "b", "link_type": "Asset" },
            { "id": "a", "link_type": "Entry" }
        ]));
        let changed = fields(json!([{ "id": "b", "link_type": "Entry" }]));

        let v = Validator::ChangeProhibited;
        assert!(run(&v, &field_path(0, "link_type"), &reordered, Some(&prior)).is_empty());
        let diags = run(&v, &field_path(0, "link_type"), &changed, Some(&prior));
        assert_eq!(diags.len(), 1);
        assert!(diags.has_irrecoverable());
        assert!(run(&v, &field_path(0, "link_type"), &changed, None).is_empty());
    }

    #[test]
    fn change_prohibited_skips_entries_without_known_identity() {
        let prior = fields(json!([{ "id": "photo", "link_type": "Entry" }]));
        let mut config = fields(json!([{ "link_type": "Asset" }]));
        let v = Validator::ChangeProhibited;
        assert!(run(&v, &field_path(0, "link_type"), &config, Some(&prior)).is_empty());

        config.set_at(&field_path(0, "id"), ConfigValue::Unknown);
        assert!(run(&v, &field_path(0, "link_type"), &config, Some(&prior)).is_empty());

        config.set_at(&field_path(0, "id"), ConfigValue::string("photo"));
        let diags = run(&v, &field_path(0, "link_type"), &config, Some(&prior));
        assert_eq!(diags.len(), 1);
        assert!(diags.has_irrecoverable());
    }

    #[test]
    fn field_type_change_reported_on_offending_entry() {
        let prior = fields(json!([
            { "id": "title", "type": "Symbol" },
            { "id": "body", "type": "Text" }
        ]));
        let config = fields(json!([
            { "id": "title", "type": "Symbol" },
            { "id": "body", "type": "Integer" },
            { "id": "fresh", "type": "Boolean" }
        ]));
        let path = AttrPath::root().attr("fields");
        let diags = run(&Validator::FieldTypeChangeProhibited, &path, &config, Some(&prior));
        assert_eq!(diags.len(), 1);
        let d = diags.iter().next().unwrap();
        assert_eq!(d.path, field_path(1, "type"));
        assert_eq!(d.kind, DiagnosticKind::IrrecoverableChange);
        assert!(d.detail.contains("\"Text\" to \"Integer\""));
    }

    #[test]
    fn exactly_one_of_counts_set_keys() {
        let v = Validator::exactly_one_of(["unique", "size", "in"]);
        let config = ConfigValue::from_json(json!({ "v": [
            { "unique": true, "message": "m" },
            { "unique": true, "size": { "min": 1 } },
            { "message": "only" }
        ] }));
        let path = |i| AttrPath::root().attr("v").index(i);
        assert!(run(&v, &path(0), &config, None).is_empty());
        assert!(run(&v, &path(1), &config, None)
            .to_string()
            .contains("found 2: [unique, size]"));
        assert!(run(&v, &path(2), &config, None)
            .to_string()
            .contains("found none"));
    }

    #[test]
    fn unique_by_flags_every_duplicate() {
        let config = fields(json!([{ "id": "a" }, { "id": "b" }, { "id": "a" }, { "id": "a" }]));
        let diags = run(
            &Validator::UniqueBy("id".to_string()),
            &AttrPath::root().attr("fields"),
            &config,
            None,
        );
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.at(&field_path(2, "id")).len(), 1);
        assert_eq!(diags.at(&field_path(3, "id")).len(), 1);
    }
}
