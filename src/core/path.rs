//! core::path
//!
//! Concrete attribute paths and the path expressions that reference them.
//!
//! # Design
//!
//! An [`AttrPath`] names exactly one node in a configuration tree, e.g.
//! `fields[2].link_type`. A [`PathExpr`] names a *set* of nodes: it may be
//! absolute (anchored at the root) or relative to the parent of the
//! attribute being validated, and it may contain `[*]` wildcards that
//! expand over every element of a list.
//!
//! Relative expressions are merged onto the location of the attribute that
//! owns the rule, not onto the root. A rule attached to `fields[*].type`
//! that refers to `.link_type` therefore checks `fields[0].link_type` when
//! validating `fields[0].type`, `fields[1].link_type` for `fields[1].type`,
//! and so on.
//!
//! # Text syntax
//!
//! - `fields[*].type` - absolute
//! - `.link_type` - sibling of the current attribute
//! - `..items.type` - each extra leading `.` climbs one more level
//!
//! # Example
//!
//! ```
//! use ctsync::core::path::{AttrPath, PathExpr};
//! use ctsync::core::value::ConfigValue;
//!
//! let tree = ConfigValue::from_json(serde_json::json!({
//!     "fields": [
//!         { "id": "a", "type": "Link", "link_type": "Entry" },
//!         { "id": "b", "type": "Symbol" }
//!     ]
//! }));
//!
//! let current = AttrPath::root().attr("fields").index(1).attr("type");
//! let sibling = PathExpr::parse(".link_type").unwrap();
//! let matches = sibling.resolve(&current, &tree);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].0.to_string(), "fields[1].link_type");
//! assert!(matches[0].1.is_null());
//!
//! let all_ids = PathExpr::parse("fields[*].id").unwrap();
//! assert_eq!(all_ids.resolve(&current, &tree).len(), 2);
//! ```

use std::fmt;

use thiserror::Error;

use super::value::{ConfigValue, NULL};

/// One step of a concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    /// Attribute of an object.
    Attr(String),
    /// Element of a list.
    Index(usize),
}

/// A concrete location in a configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrPath(Vec<PathStep>);

impl AttrPath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend with an attribute step.
    pub fn attr(&self, name: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attr(name.into()));
        Self(steps)
    }

    /// Extend with a list index step.
    pub fn index(&self, i: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(i));
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The enclosing location, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Name of the final attribute step, if the path ends in one.
    pub fn last_attr(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathStep::Attr(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attr(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attr(name) => write!(f, ".{}", name)?,
                PathStep::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Errors from parsing a path expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("empty path segment in '{0}'")]
    EmptySegment(String),

    #[error("invalid index '{index}' in '{expr}'")]
    InvalidIndex { expr: String, index: String },

    #[error("unterminated '[' in '{0}'")]
    Unterminated(String),

    #[error("invalid character '{ch}' in '{expr}'")]
    InvalidChar { expr: String, ch: char },
}

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprStep {
    Attr(String),
    Index(usize),
    /// Every element of a list.
    AnyIndex,
    /// Climb to the enclosing location.
    Parent,
}

/// Where a path expression is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Anchored at the root of the tree.
    Absolute,
    /// Anchored at the parent of the attribute being evaluated.
    Relative,
}

/// A reference to zero or more locations in a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    anchor: Anchor,
    steps: Vec<ExprStep>,
}

impl PathExpr {
    /// Start an expression anchored at the root.
    pub fn absolute() -> Self {
        Self {
            anchor: Anchor::Absolute,
            steps: Vec::new(),
        }
    }

    /// Start an expression anchored at the current attribute's parent.
    pub fn relative() -> Self {
        Self {
            anchor: Anchor::Relative,
            steps: Vec::new(),
        }
    }

    /// Shorthand for a sibling attribute of the current attribute.
    pub fn sibling(name: impl Into<String>) -> Self {
        Self::relative().attr(name)
    }

    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.steps.push(ExprStep::Attr(name.into()));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.steps.push(ExprStep::Index(i));
        self
    }

    pub fn any(mut self) -> Self {
        self.steps.push(ExprStep::AnyIndex);
        self
    }

    pub fn parent(mut self) -> Self {
        self.steps.push(ExprStep::Parent);
        self
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Parse the text form.
    ///
    /// # Errors
    ///
    /// Returns a [`PathParseError`] on malformed segments or indices.
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let leading_dots = text.chars().take_while(|c| *c == '.').count();
        let mut expr = if leading_dots == 0 {
            Self::absolute()
        } else {
            let mut expr = Self::relative();
            for _ in 1..leading_dots {
                expr = expr.parent();
            }
            expr
        };

        let body = &text[leading_dots..];
        if body.is_empty() {
            return Ok(expr);
        }

        for segment in body.split('.') {
            if segment.is_empty() {
                return Err(PathParseError::EmptySegment(text.to_string()));
            }
            let (name, mut rest) = match segment.find('[') {
                Some(pos) => (&segment[..pos], &segment[pos..]),
                None => (segment, ""),
            };
            if let Some(ch) = name
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            {
                return Err(PathParseError::InvalidChar {
                    expr: text.to_string(),
                    ch,
                });
            }
            if !name.is_empty() {
                expr = expr.attr(name);
            }
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped
                    .find(']')
                    .ok_or_else(|| PathParseError::Unterminated(text.to_string()))?;
                let index = &stripped[..close];
                expr = if index == "*" {
                    expr.any()
                } else {
                    let i = index.parse().map_err(|_| PathParseError::InvalidIndex {
                        expr: text.to_string(),
                        index: index.to_string(),
                    })?;
                    expr.index(i)
                };
                rest = &stripped[close + 1..];
            }
            if let Some(ch) = rest.chars().next() {
                return Err(PathParseError::InvalidChar {
                    expr: text.to_string(),
                    ch,
                });
            }
        }

        Ok(expr)
    }

    /// Merge this expression onto the location of the attribute being
    /// evaluated, producing an absolute expression.
    ///
    /// Absolute expressions are returned unchanged. Relative expressions are
    /// appended to the parent of `current`; relative to the root itself they
    /// climb above the root and therefore match nothing.
    pub fn merged_onto(&self, current: &AttrPath) -> PathExpr {
        match self.anchor {
            Anchor::Absolute => self.clone(),
            Anchor::Relative => {
                let mut steps: Vec<ExprStep> = match current.parent() {
                    Some(parent) => parent.steps().iter().map(ExprStep::from).collect(),
                    None => vec![ExprStep::Parent],
                };
                steps.extend(self.steps.iter().cloned());
                PathExpr {
                    anchor: Anchor::Absolute,
                    steps,
                }
            }
        }
    }

    /// Fold `Parent` steps into the steps before them.
    ///
    /// Returns `None` if the expression climbs above the root.
    fn normalized_steps(&self) -> Option<Vec<ExprStep>> {
        let mut out: Vec<ExprStep> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                ExprStep::Parent => {
                    out.pop()?;
                }
                other => out.push(other.clone()),
            }
        }
        Some(out)
    }

    /// Resolve against a tree, from the point of view of the attribute at
    /// `current`.
    ///
    /// Returns every concrete match with its value. Never fails; an
    /// expression that matches nothing yields an empty vector.
    pub fn resolve<'a>(
        &self,
        current: &AttrPath,
        tree: &'a ConfigValue,
    ) -> Vec<(AttrPath, &'a ConfigValue)> {
        let merged = self.merged_onto(current);
        let Some(steps) = merged.normalized_steps() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        walk(tree, AttrPath::root(), &steps, &mut out);
        out
    }

    /// True if `path` is one of the locations this absolute expression can
    /// name. Relative expressions never match.
    pub fn matches(&self, path: &AttrPath) -> bool {
        if self.anchor == Anchor::Relative {
            return false;
        }
        let Some(steps) = self.normalized_steps() else {
            return false;
        };
        steps.len() == path.steps().len()
            && steps
                .iter()
                .zip(path.steps())
                .all(|(expr, step)| match (expr, step) {
                    (ExprStep::Attr(a), PathStep::Attr(b)) => a == b,
                    (ExprStep::Index(a), PathStep::Index(b)) => a == b,
                    (ExprStep::AnyIndex, PathStep::Index(_)) => true,
                    _ => false,
                })
    }
}

impl From<&PathStep> for ExprStep {
    fn from(step: &PathStep) -> Self {
        match step {
            PathStep::Attr(name) => ExprStep::Attr(name.clone()),
            PathStep::Index(i) => ExprStep::Index(*i),
        }
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_attr = false;
        if self.anchor == Anchor::Relative {
            write!(f, ".")?;
        }
        for step in &self.steps {
            match step {
                ExprStep::Parent => write!(f, ".")?,
                ExprStep::Attr(name) => {
                    if wrote_attr {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                    wrote_attr = true;
                }
                ExprStep::Index(i) => write!(f, "[{}]", i)?,
                ExprStep::AnyIndex => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}

fn walk<'a>(
    node: &'a ConfigValue,
    path: AttrPath,
    steps: &[ExprStep],
    out: &mut Vec<(AttrPath, &'a ConfigValue)>,
) {
    let Some((step, rest)) = steps.split_first() else {
        out.push((path, node));
        return;
    };

    match (step, node) {
        (ExprStep::Attr(name), ConfigValue::Object(map)) => {
            let child = map.get(name).unwrap_or(&NULL);
            walk(child, path.attr(name.as_str()), rest, out);
        }
        (ExprStep::Index(i), ConfigValue::List(items)) => {
            if let Some(child) = items.get(*i) {
                walk(child, path.index(*i), rest, out);
            }
        }
        (ExprStep::AnyIndex, ConfigValue::List(items)) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, path.index(i), rest, out);
            }
        }
        _ => {}
    }
}

/// Translate a location in the proposed tree into the prior tree.
///
/// List elements are matched by their `id` attribute. Lists whose elements
/// carry no `id` on either side (validation blocks) are matched by position.
/// Returns `None` when the prior tree has no entry with the same identity,
/// or when the proposed element's identity is not known yet.
pub fn locate_prior<'a>(
    path: &AttrPath,
    proposed: &ConfigValue,
    prior: &'a ConfigValue,
) -> Option<(AttrPath, &'a ConfigValue)> {
    let mut current = proposed;
    let mut before = prior;
    let mut before_path = AttrPath::root();

    for step in path.steps() {
        match step {
            PathStep::Attr(name) => {
                current = current.get(name).unwrap_or(&NULL);
                before = before.as_object()?.get(name).unwrap_or(&NULL);
                before_path = before_path.attr(name.as_str());
            }
            PathStep::Index(i) => {
                current = current.as_list()?.get(*i)?;
                let prior_items = before.as_list()?;
                let position = match current.get("id") {
                    Some(ConfigValue::String(id)) => prior_items.iter().position(|item| {
                        item.get("id").and_then(ConfigValue::as_str) == Some(id.as_str())
                    })?,
                    Some(_) => return None,
                    None if prior_items.iter().any(|item| item.get("id").is_some()) => {
                        return None
                    }
                    None => *i,
                };
                before = prior_items.get(position)?;
                before_path = before_path.index(position);
            }
        }
    }

    Some((before_path, before))
}
