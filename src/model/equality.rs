//! model::equality
//!
//! Structural equality between a drafted content type and the remote one.
//!
//! `content_types_equal(local, remote)` is true exactly when sending `local`
//! would leave `remote` unchanged, so a true result means no mutating call is
//! made. Field order matters: a field at another position is a change.

use super::translate::normalized_default;
use super::wire::{ContentTypeBody, Field};

/// Compare two content type bodies.
pub fn content_types_equal(local: &ContentTypeBody, remote: &ContentTypeBody) -> bool {
    if local.name != remote.name
        || local.display_field != remote.display_field
        || description(local) != description(remote)
        || local.fields.len() != remote.fields.len()
    {
        return false;
    }

    local.fields.iter().enumerate().all(|(i, field)| {
        match remote.fields.iter().position(|r| r.id == field.id) {
            Some(j) if j == i => fields_equal(field, &remote.fields[j]),
            _ => false,
        }
    })
}

/// Compare two fields with the same id.
pub fn fields_equal(a: &Field, b: &Field) -> bool {
    a.name == b.name
        && a.field_type == b.field_type
        && a.link_type == b.link_type
        && a.required == b.required
        && a.omitted == b.omitted
        && a.disabled == b.disabled
        && a.localized == b.localized
        && a.items == b.items
        && a.validations == b.validations
        && normalized_default(a.default_value.as_ref())
            == normalized_default(b.default_value.as_ref())
}

fn description(body: &ContentTypeBody) -> &str {
    body.description.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::wire::{DefaultValue, RawValidation};
    use std::collections::BTreeMap;

    fn field(id: &str) -> Field {
        Field {
            id: id.into(),
            name: id.to_uppercase(),
            field_type: "Symbol".into(),
            ..Default::default()
        }
    }

    fn body(fields: Vec<Field>) -> ContentTypeBody {
        ContentTypeBody {
            name: "Post".into(),
            display_field: "a".into(),
            description: None,
            fields,
        }
    }

    #[test]
    fn identical_bodies_are_equal() {
        let b = body(vec![field("a"), field("b")]);
        assert!(content_types_equal(&b, &b.clone()));
    }

    #[test]
    fn field_order_matters() {
        let local = body(vec![field("a"), field("b")]);
        let remote = body(vec![field("b"), field("a")]);
        assert!(!content_types_equal(&local, &remote));
    }

    #[test]
    fn each_field_attribute_matters() {
        let base = field("a");
        let variants: Vec<Box<dyn Fn(&mut Field)>> = vec![
            Box::new(|f| f.required = true),
            Box::new(|f| f.omitted = true),
            Box::new(|f| f.disabled = true),
            Box::new(|f| f.localized = true),
            Box::new(|f| f.field_type = "Text".into()),
            Box::new(|f| f.name = "Other".into()),
            Box::new(|f| {
                f.validations = vec![RawValidation {
                    unique: Some(true),
                    ..Default::default()
                }]
            }),
        ];
        for change in variants {
            let mut other = base.clone();
            change(&mut other);
            assert!(!fields_equal(&base, &other), "{:?}", other);
        }
    }

    #[test]
    fn empty_default_equals_absent_default() {
        let mut local = field("a");
        local.default_value = Some(DefaultValue::Strings(BTreeMap::new()));
        assert!(fields_equal(&local, &field("a")));
    }

    #[test]
    fn empty_description_equals_absent() {
        let mut remote = body(vec![field("a")]);
        remote.description = Some(String::new());
        assert!(content_types_equal(&body(vec![field("a")]), &remote));
    }
}
