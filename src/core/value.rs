//! core::value
//!
//! The generic configuration tree that validators and modifiers operate on.
//!
//! # Design
//!
//! A [`ConfigValue`] is a JSON-like tree with one extra leaf, `Unknown`,
//! standing for a value that cannot be known until another resource has
//! been created. Validators treat unknown values as "cannot compare" and
//! never fail on them.
//!
//! Trees are built from the host's configuration (TOML project file) or
//! from a persisted snapshot (JSON), and decoded into typed models with
//! [`ConfigValue::to_json`] once every unknown has been resolved.
//!
//! # Example
//!
//! ```
//! use ctsync::core::value::ConfigValue;
//!
//! let tree = ConfigValue::from_json(serde_json::json!({
//!     "name": "Author",
//!     "fields": [{ "id": "name", "type": "Symbol" }]
//! }));
//!
//! assert_eq!(tree.get("name").and_then(ConfigValue::as_str), Some("Author"));
//! assert!(tree.index().len() > 3);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;
use thiserror::Error;

use super::path::{AttrPath, PathStep};

/// Errors from converting a tree into concrete data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    /// The tree still contains a value that is not known yet.
    #[error("value at '{0}' is not known yet")]
    Unknown(AttrPath),

    /// A TOML value has no JSON-compatible representation.
    #[error("unsupported value at '{path}': {message}")]
    Unsupported { path: AttrPath, message: String },
}

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    /// Explicitly or implicitly absent.
    #[default]
    Null,
    /// Not resolvable until apply time.
    Unknown,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConfigValue>),
    Object(BTreeMap<String, ConfigValue>),
}

/// Shared null used when a declared attribute is absent from an object.
pub static NULL: ConfigValue = ConfigValue::Null;

impl ConfigValue {
    /// Build a string leaf.
    pub fn string(value: impl Into<String>) -> Self {
        ConfigValue::String(value.into())
    }

    /// Build an integer leaf.
    pub fn int(value: i64) -> Self {
        ConfigValue::Number(Number::from(value))
    }

    /// Build an object from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        ConfigValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConfigValue::Unknown)
    }

    /// True when the value is neither null nor unknown.
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up an attribute of an object.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Short name of the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Unknown => "unknown",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Object(_) => "object",
        }
    }

    /// Follow a concrete path.
    ///
    /// A missing attribute on an object resolves to null. Anything else that
    /// does not exist returns `None`.
    pub fn at(&self, path: &AttrPath) -> Option<&ConfigValue> {
        let mut current = self;
        for step in path.steps() {
            current = match (step, current) {
                (PathStep::Attr(name), ConfigValue::Object(map)) => map.get(name).unwrap_or(&NULL),
                (PathStep::Index(i), ConfigValue::List(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace the value at a concrete path.
    ///
    /// Missing attributes are inserted into their parent object. Returns
    /// `false` if the parent does not exist or is not a container.
    pub fn set_at(&mut self, path: &AttrPath, value: ConfigValue) -> bool {
        let Some((last, parents)) = path.steps().split_last() else {
            *self = value;
            return true;
        };

        let mut current = self;
        for step in parents {
            current = match (step, current) {
                (PathStep::Attr(name), ConfigValue::Object(map)) => {
                    match map.get_mut(name) {
                        Some(child) => child,
                        None => return false,
                    }
                }
                (PathStep::Index(i), ConfigValue::List(items)) => match items.get_mut(*i) {
                    Some(child) => child,
                    None => return false,
                },
                _ => return false,
            };
        }

        match (last, current) {
            (PathStep::Attr(name), ConfigValue::Object(map)) => {
                map.insert(name.clone(), value);
                true
            }
            (PathStep::Index(i), ConfigValue::List(items)) if *i < items.len() => {
                items[*i] = value;
                true
            }
            _ => false,
        }
    }

    /// Structural index of the tree: every node paired with its path, in
    /// depth-first order with the root first.
    pub fn index(&self) -> Vec<(AttrPath, &ConfigValue)> {
        let mut out = Vec::new();
        self.collect_index(AttrPath::root(), &mut out);
        out
    }

    fn collect_index<'a>(&'a self, path: AttrPath, out: &mut Vec<(AttrPath, &'a ConfigValue)>) {
        match self {
            ConfigValue::Object(map) => {
                out.push((path.clone(), self));
                for (key, child) in map {
                    child.collect_index(path.attr(key), out);
                }
            }
            ConfigValue::List(items) => {
                out.push((path.clone(), self));
                for (i, child) in items.iter().enumerate() {
                    child.collect_index(path.index(i), out);
                }
            }
            _ => out.push((path, self)),
        }
    }

    /// Paths of every unknown leaf in the tree.
    pub fn unknown_paths(&self) -> Vec<AttrPath> {
        self.index()
            .into_iter()
            .filter(|(_, v)| v.is_unknown())
            .map(|(p, _)| p)
            .collect()
    }

    /// Convert from JSON. JSON has no notion of unknown values.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => ConfigValue::Number(n),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert into JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Unknown`] for the first unknown leaf found.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        self.to_json_at(&AttrPath::root())
    }

    fn to_json_at(&self, path: &AttrPath) -> Result<serde_json::Value, ValueError> {
        Ok(match self {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Unknown => return Err(ValueError::Unknown(path.clone())),
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Number(n) => serde_json::Value::Number(n.clone()),
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v.to_json_at(&path.index(i)))
                    .collect::<Result<_, _>>()?,
            ),
            ConfigValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json_at(&path.attr(k))?)))
                    .collect::<Result<_, ValueError>>()?,
            ),
        })
    }

    /// Convert from a parsed TOML value.
    ///
    /// # Errors
    ///
    /// Non-finite floats have no JSON representation and are rejected.
    pub fn from_toml(value: toml::Value) -> Result<Self, ValueError> {
        Self::from_toml_at(value, &AttrPath::root())
    }

    fn from_toml_at(value: toml::Value, path: &AttrPath) -> Result<Self, ValueError> {
        Ok(match value {
            toml::Value::String(s) => ConfigValue::String(s),
            toml::Value::Integer(i) => ConfigValue::int(i),
            toml::Value::Float(f) => match Number::from_f64(f) {
                Some(n) => ConfigValue::Number(n),
                None => {
                    return Err(ValueError::Unsupported {
                        path: path.clone(),
                        message: format!("non-finite number {}", f),
                    })
                }
            },
            toml::Value::Boolean(b) => ConfigValue::Bool(b),
            toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
            toml::Value::Array(items) => ConfigValue::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Self::from_toml_at(v, &path.index(i)))
                    .collect::<Result<_, _>>()?,
            ),
            toml::Value::Table(table) => ConfigValue::Object(
                table
                    .into_iter()
                    .map(|(k, v)| {
                        let child = Self::from_toml_at(v, &path.attr(&k))?;
                        Ok((k, child))
                    })
                    .collect::<Result<_, ValueError>>()?,
            ),
        })
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Unknown => write!(f, "(known after apply)"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::String(s) => write!(f, "{:?}", s),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ConfigValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::int(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigValue {
        ConfigValue::from_json(json!({
            "name": "Author",
            "fields": [
                { "id": "name", "type": "Symbol" },
                { "id": "bio", "type": "Text" }
            ]
        }))
    }

    #[test]
    fn at_follows_attrs_and_indices() {
        let tree = sample();
        let path = AttrPath::root().attr("fields").index(1).attr("type");
        assert_eq!(tree.at(&path), Some(&ConfigValue::string("Text")));
    }

    #[test]
    fn at_missing_attr_is_null() {
        let tree = sample();
        let path = AttrPath::root().attr("fields").index(0).attr("link_type");
        assert_eq!(tree.at(&path), Some(&ConfigValue::Null));
    }

    #[test]
    fn at_out_of_range_is_none() {
        let tree = sample();
        let path = AttrPath::root().attr("fields").index(5).attr("type");
        assert_eq!(tree.at(&path), None);
    }

    #[test]
    fn set_at_inserts_missing_attr() {
        let mut tree = sample();
        let path = AttrPath::root().attr("fields").index(0).attr("required");
        assert!(tree.set_at(&path, ConfigValue::Bool(false)));
        assert_eq!(tree.at(&path), Some(&ConfigValue::Bool(false)));
    }

    #[test]
    fn set_at_fails_under_null_parent() {
        let mut tree = sample();
        let path = AttrPath::root()
            .attr("fields")
            .index(0)
            .attr("items")
            .attr("type");
        assert!(!tree.set_at(&path, ConfigValue::string("Symbol")));
    }

    #[test]
    fn index_lists_every_node() {
        let tree = sample();
        let paths: Vec<String> = tree.index().iter().map(|(p, _)| p.to_string()).collect();
        assert!(paths.contains(&"fields[1].id".to_string()));
        assert!(paths.contains(&"name".to_string()));
        assert_eq!(paths[0], "");
    }

    #[test]
    fn to_json_rejects_unknown() {
        let mut tree = sample();
        let path = AttrPath::root().attr("fields").index(1).attr("id");
        tree.set_at(&path, ConfigValue::Unknown);
        assert_eq!(tree.to_json(), Err(ValueError::Unknown(path.clone())));
        assert_eq!(tree.unknown_paths(), vec![path]);
    }

    #[test]
    fn from_toml_converts_tables_and_arrays() {
        let parsed: toml::Value = toml::from_str(
            r#"
            name = "Author"
            [[fields]]
            id = "age"
            type = "Integer"
            required = true
            "#,
        )
        .unwrap();
        let tree = ConfigValue::from_toml(parsed).unwrap();
        let required = AttrPath::root().attr("fields").index(0).attr("required");
        assert_eq!(tree.at(&required), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn display_marks_unknown() {
        assert_eq!(ConfigValue::Unknown.to_string(), "(known after apply)");
        assert_eq!(ConfigValue::string("x").to_string(), "\"x\"");
    }
}
