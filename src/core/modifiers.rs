//! core::modifiers
//!
//! Plan modifiers: rewrite or reject a proposed value before it is compared
//! against the remote resource or persisted.
//!
//! # Kinds
//!
//! - [`PlanModifier::Default`] fills in a fixed value when the proposal
//!   leaves the attribute null or unknown.
//! - [`PlanModifier::UsePriorWhenAbsent`] carries a computed attribute
//!   (identity, version) forward from the persisted state.
//! - [`PlanModifier::Immutable`] rejects any change once a persisted value
//!   exists.
//!
//! Like validators, modifiers are a closed enum dispatched through one
//! method, [`PlanModifier::modify`].

use super::diagnostics::{Diagnostic, Diagnostics};
use super::path::{locate_prior, AttrPath};
use super::value::ConfigValue;

/// Element type of a list default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Object,
}

impl ValueType {
    fn admits(self, value: &ConfigValue) -> bool {
        match self {
            ValueType::String => value.as_str().is_some(),
            ValueType::Bool => value.as_bool().is_some(),
            ValueType::Int => value.as_i64().is_some(),
            ValueType::Object => value.as_object().is_some(),
        }
    }
}

/// A fixed default, keyed to one value type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultLiteral {
    String(String),
    Bool(bool),
    Int(i64),
    List {
        element: ValueType,
        items: Vec<ConfigValue>,
    },
}

impl DefaultLiteral {
    /// An empty list of the given element type.
    pub fn empty_list(element: ValueType) -> Self {
        DefaultLiteral::List {
            element,
            items: Vec::new(),
        }
    }

    /// A list default. Returns `None` if any item is not of `element` type.
    pub fn list(element: ValueType, items: Vec<ConfigValue>) -> Option<Self> {
        if items.iter().all(|item| element.admits(item)) {
            Some(DefaultLiteral::List { element, items })
        } else {
            None
        }
    }

    /// The value this default fills in.
    pub fn value(&self) -> ConfigValue {
        match self {
            DefaultLiteral::String(s) => ConfigValue::String(s.clone()),
            DefaultLiteral::Bool(b) => ConfigValue::Bool(*b),
            DefaultLiteral::Int(i) => ConfigValue::int(*i),
            DefaultLiteral::List { items, .. } => ConfigValue::List(items.clone()),
        }
    }
}

/// Everything a modifier can see.
#[derive(Debug, Clone, Copy)]
pub struct ModifyRequest<'a> {
    /// Location of the attribute being planned.
    pub path: &'a AttrPath,
    /// Its proposed value.
    pub value: &'a ConfigValue,
    /// The whole proposed tree.
    pub proposed: &'a ConfigValue,
    /// The previously persisted tree, if the resource exists.
    pub prior: Option<&'a ConfigValue>,
}

impl ModifyRequest<'_> {
    fn prior_value(&self) -> Option<&ConfigValue> {
        let prior = self.prior?;
        locate_prior(self.path, self.proposed, prior).map(|(_, v)| v)
    }
}

/// A single plan modifier kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanModifier {
    Default(DefaultLiteral),
    UsePriorWhenAbsent,
    Immutable,
}

impl PlanModifier {
    /// Compute the replacement for the proposed value, if any.
    ///
    /// Rejections are appended to `diags`; the proposal is left untouched in
    /// that case.
    pub fn modify(&self, req: &ModifyRequest<'_>, diags: &mut Diagnostics) -> Option<ConfigValue> {
        match self {
            PlanModifier::Default(literal) => {
                if req.value.is_known() {
                    None
                } else {
                    Some(literal.value())
                }
            }
            PlanModifier::UsePriorWhenAbsent => {
                if req.value.is_known() {
                    return None;
                }
                req.prior_value().filter(|v| v.is_known()).cloned()
            }
            PlanModifier::Immutable => {
                let before = req.prior_value().filter(|v| v.is_known())?;
                if req.value.is_known() && before != req.value {
                    let name = req.path.last_attr().unwrap_or("attribute");
                    diags.push(Diagnostic::irrecoverable(
                        req.path.clone(),
                        "Immutable attribute",
                        format!(
                            "{} is {} on the existing resource and cannot change to {}. \
                             Remove the resource and create it again.",
                            name, before, req.value
                        ),
                    ));
                }
                None
            }
        }
    }
}
