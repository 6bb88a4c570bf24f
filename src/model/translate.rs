//! model::translate
//!
//! Draft (model to wire) and import (wire to model) translation.
//!
//! # Invariants
//!
//! - An absent or empty default value drafts to no default at all, and a
//!   missing or empty remote default imports as `None`. Both representations
//!   of "no default" therefore compare equal after a round trip.
//! - Import of a draft reproduces the field it came from, control included
//!   when the matching editor binding is supplied.

use super::resource::{
    ContentTypeModel, ControlBlock, DefaultValueBlock, FieldModel, ItemsModel, SettingsBlock,
};
use super::validation::{draft_validations, import_validations};
use super::wire::{
    ContentType, ContentTypeBody, Control, ControlSettings, DefaultValue, Field, Items,
};
use super::ModelError;
use crate::core::schema::{TypeRegistry, DEFAULT_WIDGET_NAMESPACE};

impl ContentTypeModel {
    /// Build the body sent on create and update.
    ///
    /// # Errors
    ///
    /// Fails if any field cannot be drafted.
    pub fn draft(&self) -> Result<ContentTypeBody, ModelError> {
        Ok(ContentTypeBody {
            name: self.name.clone(),
            display_field: self.display_field.clone(),
            description: self.description.clone(),
            fields: self
                .fields
                .iter()
                .map(FieldModel::draft)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Build a model from a remote content type.
    ///
    /// `controls` are the editor bindings to attach; pass an empty slice to
    /// import the schema alone.
    ///
    /// # Errors
    ///
    /// Fails on any validation, items type or default value the model cannot
    /// represent.
    pub fn import(
        remote: &ContentType,
        space_id: &str,
        environment: &str,
        controls: &[Control],
        registry: &TypeRegistry,
    ) -> Result<Self, ModelError> {
        let fields = remote
            .body
            .fields
            .iter()
            .map(|field| {
                let control = controls.iter().find(|c| c.field_id == field.id);
                FieldModel::import(field, control, registry)
            })
            .collect::<Result<_, _>>()?;

        Ok(ContentTypeModel {
            space_id: space_id.to_string(),
            environment: environment.to_string(),
            id: Some(remote.sys.id.clone()),
            name: remote.body.name.clone(),
            display_field: remote.body.display_field.clone(),
            description: remote.body.description.clone().filter(|d| !d.is_empty()),
            manage_field_controls: false,
            version: Some(remote.sys.version),
            version_controls: None,
            fields,
        })
    }

    /// Editor bindings for every field that declares a control.
    pub fn draft_controls(&self) -> Vec<Control> {
        self.fields
            .iter()
            .filter_map(|f| f.control.as_ref().map(|c| c.draft(&f.id)))
            .collect()
    }
}

impl FieldModel {
    /// # Errors
    ///
    /// Fails on a validation block that is not exactly one known rule.
    pub fn draft(&self) -> Result<Field, ModelError> {
        let items = match &self.items {
            Some(items) => Some(Items {
                item_type: items.item_type.clone(),
                link_type: items.link_type.clone(),
                validations: draft_validations(&items.validations)?,
            }),
            None => None,
        };
        let default_value = match &self.default_value {
            Some(block) => block.draft(&self.id)?,
            None => None,
        };

        Ok(Field {
            id: self.id.clone(),
            name: self.name.clone(),
            field_type: self.field_type.clone(),
            link_type: self.link_type.clone(),
            items,
            required: self.required,
            localized: self.localized,
            disabled: self.disabled,
            omitted: self.omitted,
            validations: draft_validations(&self.validations)?,
            default_value,
        })
    }

    /// # Errors
    ///
    /// Fails on unsupported validations, item types or default values.
    pub fn import(
        field: &Field,
        control: Option<&Control>,
        registry: &TypeRegistry,
    ) -> Result<Self, ModelError> {
        let items = match &field.items {
            Some(items) => {
                if !registry.item_types.iter().any(|t| t == &items.item_type) {
                    return Err(ModelError::UnsupportedItems(items.item_type.clone()));
                }
                Some(ItemsModel {
                    item_type: items.item_type.clone(),
                    link_type: items.link_type.clone(),
                    validations: import_validations(&items.validations)?,
                })
            }
            None => None,
        };

        Ok(FieldModel {
            id: field.id.clone(),
            name: field.name.clone(),
            field_type: field.field_type.clone(),
            link_type: field.link_type.clone(),
            required: field.required,
            localized: field.localized,
            disabled: field.disabled,
            omitted: field.omitted,
            validations: import_validations(&field.validations)?,
            items,
            default_value: DefaultValueBlock::import(&field.id, field.default_value.as_ref())?,
            control: control.and_then(ControlBlock::import),
        })
    }
}

impl DefaultValueBlock {
    /// Wire form of the default; `None` when no locale is set.
    ///
    /// # Errors
    ///
    /// [`ModelError::ConflictingDefaultValue`] if both variants carry
    /// locales.
    pub fn draft(&self, field_id: &str) -> Result<Option<DefaultValue>, ModelError> {
        let strings = self.string.as_ref().filter(|m| !m.is_empty());
        let bools = self.bool.as_ref().filter(|m| !m.is_empty());
        match (strings, bools) {
            (Some(_), Some(_)) => Err(ModelError::ConflictingDefaultValue(field_id.to_string())),
            (Some(s), None) => Ok(Some(DefaultValue::Strings(s.clone()))),
            (None, Some(b)) => Ok(Some(DefaultValue::Bools(b.clone()))),
            (None, None) => Ok(None),
        }
    }

    /// Model form of a remote default; `None` when absent or empty.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnsupportedDefaultValue`] for anything other than
    /// locale-to-string or locale-to-bool maps.
    pub fn import(
        field_id: &str,
        remote: Option<&DefaultValue>,
    ) -> Result<Option<Self>, ModelError> {
        match remote {
            None => Ok(None),
            Some(DefaultValue::Strings(m)) if m.is_empty() => Ok(None),
            Some(DefaultValue::Bools(m)) if m.is_empty() => Ok(None),
            Some(DefaultValue::Strings(m)) => Ok(Some(DefaultValueBlock {
                string: Some(m.clone()),
                bool: None,
            })),
            Some(DefaultValue::Bools(m)) => Ok(Some(DefaultValueBlock {
                string: None,
                bool: Some(m.clone()),
            })),
            Some(DefaultValue::Other(value)) => Err(ModelError::UnsupportedDefaultValue {
                field: field_id.to_string(),
                detail: value.to_string(),
            }),
        }
    }
}

/// Canonical comparison form of a wire default: empty maps are no default.
pub(crate) fn normalized_default(value: Option<&DefaultValue>) -> Option<&DefaultValue> {
    match value {
        Some(DefaultValue::Strings(m)) if m.is_empty() => None,
        Some(DefaultValue::Bools(m)) if m.is_empty() => None,
        other => other,
    }
}

impl ControlBlock {
    pub fn draft(&self, field_id: &str) -> Control {
        let namespace = if self.widget_namespace.is_empty() {
            DEFAULT_WIDGET_NAMESPACE.to_string()
        } else {
            self.widget_namespace.clone()
        };
        Control {
            field_id: field_id.to_string(),
            widget_id: Some(self.widget_id.clone()),
            widget_namespace: Some(namespace),
            settings: self.settings.as_ref().map(SettingsBlock::draft),
        }
    }

    /// A binding without a widget has nothing to manage and imports as `None`.
    pub fn import(control: &Control) -> Option<Self> {
        let widget_id = control.widget_id.clone()?;
        Some(ControlBlock {
            widget_id,
            widget_namespace: control
                .widget_namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_WIDGET_NAMESPACE.to_string()),
            settings: control
                .settings
                .as_ref()
                .map(SettingsBlock::import)
                .filter(|s| s != &SettingsBlock::default()),
        })
    }
}

impl SettingsBlock {
    pub fn draft(&self) -> ControlSettings {
        ControlSettings {
            help_text: self.help_text.clone(),
            true_label: self.true_label.clone(),
            false_label: self.false_label.clone(),
            stars: self.stars,
            format: self.format.clone(),
            ampm: self.ampm.clone(),
            bulk_editing: self.bulk_editing,
            tracking_field_id: self.tracking_field_id.clone(),
        }
    }

    pub fn import(settings: &ControlSettings) -> Self {
        SettingsBlock {
            help_text: settings.help_text.clone(),
            true_label: settings.true_label.clone(),
            false_label: settings.false_label.clone(),
            stars: settings.stars,
            format: settings.format.clone(),
            ampm: settings.ampm.clone(),
            bulk_editing: settings.bulk_editing,
            tracking_field_id: settings.tracking_field_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::{RangeBlock, ValidationBlock};
    use crate::model::wire::Sys;
    use std::collections::BTreeMap;

    fn locales<V: Clone>(pairs: &[(&str, V)]) -> BTreeMap<String, V> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn link_field() -> FieldModel {
        FieldModel {
            id: "author".into(),
            name: "Author".into(),
            field_type: "Link".into(),
            link_type: Some("Entry".into()),
            required: true,
            validations: vec![ValidationBlock {
                link_content_type: Some(vec!["person".into()]),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn field_draft_then_import_is_identity() {
        let mut field = link_field();
        field.control = Some(ControlBlock {
            widget_id: "entryLinkEditor".into(),
            widget_namespace: "builtin".into(),
            settings: Some(SettingsBlock {
                help_text: Some("Pick one".into()),
                ..Default::default()
            }),
        });
        let wire = field.draft().unwrap();
        let control = field.control.as_ref().unwrap().draft(&field.id);
        let back = FieldModel::import(&wire, Some(&control), &TypeRegistry::default()).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn array_items_round_trip() {
        let field = FieldModel {
            id: "tags".into(),
            name: "Tags".into(),
            field_type: "Array".into(),
            items: Some(ItemsModel {
                item_type: "Symbol".into(),
                link_type: None,
                validations: vec![ValidationBlock {
                    size: Some(RangeBlock {
                        min: None,
                        max: Some(10.0),
                    }),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        let wire = field.draft().unwrap();
        assert_eq!(wire.items.as_ref().unwrap().validations[0].size.unwrap().max, Some(10.0));
        assert_eq!(FieldModel::import(&wire, None, &TypeRegistry::default()).unwrap(), field);
    }

    #[test]
    fn unsupported_item_type_fails_import() {
        let wire = Field {
            id: "x".into(),
            name: "X".into(),
            field_type: "Array".into(),
            items: Some(Items {
                item_type: "Integer".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            FieldModel::import(&wire, None, &TypeRegistry::default()).unwrap_err(),
            ModelError::UnsupportedItems("Integer".into())
        );
    }

    #[test]
    fn default_value_canonical_absence() {
        assert_eq!(DefaultValueBlock::default().draft("f").unwrap(), None);
        assert_eq!(DefaultValueBlock::import("f", None).unwrap(), None);
        let empty = DefaultValue::Strings(BTreeMap::new());
        assert_eq!(DefaultValueBlock::import("f", Some(&empty)).unwrap(), None);

        let colours = DefaultValueBlock {
            string: Some(locales(&[("en-US", "green".to_string())])),
            bool: None,
        };
        let wire = colours.draft("colour").unwrap();
        assert_eq!(
            DefaultValueBlock::import("colour", wire.as_ref()).unwrap(),
            Some(colours)
        );
    }

    #[test]
    fn conflicting_and_unsupported_defaults() {
        let both = DefaultValueBlock {
            string: Some(locales(&[("en-US", "a".to_string())])),
            bool: Some(locales(&[("en-US", true)])),
        };
        assert!(matches!(
            both.draft("f"),
            Err(ModelError::ConflictingDefaultValue(_))
        ));

        let number = DefaultValue::Other(serde_json::json!({ "en-US": 4 }));
        assert!(matches!(
            DefaultValueBlock::import("count", Some(&number)),
            Err(ModelError::UnsupportedDefaultValue { .. })
        ));
    }

    #[test]
    fn content_type_import_records_identity() {
        let remote = ContentType {
            sys: Sys {
                id: "post".into(),
                version: 12,
            },
            body: ContentTypeBody {
                name: "Post".into(),
                display_field: "author".into(),
                description: Some(String::new()),
                fields: vec![link_field().draft().unwrap()],
            },
        };
        let model =
            ContentTypeModel::import(&remote, "space", "master", &[], &TypeRegistry::default())
                .unwrap();
        assert_eq!(model.id.as_deref(), Some("post"));
        assert_eq!(model.version, Some(12));
        assert_eq!(model.description, None);
        assert_eq!(model.fields, vec![link_field()]);
    }

    #[test]
    fn control_without_widget_is_ignored() {
        let bare = Control {
            field_id: "x".into(),
            ..Default::default()
        };
        assert_eq!(ControlBlock::import(&bare), None);
    }
}
