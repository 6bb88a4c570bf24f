//! model::resource
//!
//! The content type as configured and as persisted in local state.
//!
//! These types mirror the attribute shape of the configuration tree
//! (snake_case keys, optional blocks). A planned tree is decoded into a
//! [`ContentTypeModel`] once every value is known; the persisted snapshot is
//! the same model serialized back to JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::core::value::{ConfigValue, ValueError};

/// A content type resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentTypeModel {
    pub space_id: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub display_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub manage_field_controls: bool,
    /// Remote version of the content type, recorded after every call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Remote version of the editor interface, once controls are managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_controls: Option<u64>,
    #[serde(default)]
    pub fields: Vec<FieldModel>,
}

/// One field of a content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldModel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
    #[serde(default)]
    pub validations: Vec<ValidationBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValueBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlBlock>,
}

/// Element description of an `Array` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemsModel {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub validations: Vec<ValidationBlock>,
}

/// A configured validation; exactly one rule key is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<RangeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_file_size: Option<RangeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<RegexpBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_content_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_mimetype_group: Option<Vec<String>>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub in_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_marks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_node_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexpBlock {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// Per-locale default value, either strings or bools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultValueBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool: Option<BTreeMap<String, bool>>,
}

/// Editor binding for a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlBlock {
    pub widget_id: String,
    #[serde(default)]
    pub widget_namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ampm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_editing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_field_id: Option<String>,
}

impl ContentTypeModel {
    /// Decode a planned configuration tree.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotKnown`] if any value is still unknown, and
    /// [`ModelError::Shape`] if the tree does not fit the model.
    pub fn from_tree(tree: &ConfigValue) -> Result<Self, ModelError> {
        let json = tree.to_json().map_err(|e| match e {
            ValueError::Unknown(path) => ModelError::NotKnown(path),
            other => ModelError::Shape(other.to_string()),
        })?;
        serde_json::from_value(json).map_err(|e| ModelError::Shape(e.to_string()))
    }

    /// Encode as a configuration tree, the form plans and validators use.
    ///
    /// # Errors
    ///
    /// [`ModelError::Shape`] for values JSON cannot hold (non-finite bounds).
    pub fn to_tree(&self) -> Result<ConfigValue, ModelError> {
        serde_json::to_value(self)
            .map(ConfigValue::from_json)
            .map_err(|e| ModelError::Shape(e.to_string()))
    }

    pub fn field(&self, id: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_planned_tree() {
        let tree = ConfigValue::from_json(json!({
            "space_id": "s",
            "environment": "master",
            "name": "Author",
            "display_field": "name",
            "manage_field_controls": false,
            "fields": [{
                "id": "name", "name": "Name", "type": "Symbol",
                "required": true, "localized": false, "disabled": false, "omitted": false,
                "validations": [{ "size": { "max": 80 } }]
            }]
        }));
        let model = ContentTypeModel::from_tree(&tree).unwrap();
        assert_eq!(model.fields[0].validations[0].size.unwrap().max, Some(80.0));
        assert_eq!(model.id, None);
    }

    #[test]
    fn unknown_values_block_decoding() {
        let mut tree = ConfigValue::from_json(json!({
            "space_id": "s", "name": "A", "display_field": "x"
        }));
        tree.set_at(
            &crate::core::path::AttrPath::root().attr("space_id"),
            ConfigValue::Unknown,
        );
        assert!(matches!(
            ContentTypeModel::from_tree(&tree),
            Err(ModelError::NotKnown(_))
        ));
    }

    #[test]
    fn unknown_attribute_is_a_shape_error() {
        let tree = ConfigValue::from_json(json!({
            "space_id": "s", "name": "A", "display_field": "x", "colour": "red"
        }));
        assert!(matches!(
            ContentTypeModel::from_tree(&tree),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn tree_round_trip_keeps_state_fields() {
        let model = ContentTypeModel {
            space_id: "s".into(),
            environment: "master".into(),
            id: Some("author".into()),
            name: "Author".into(),
            display_field: "name".into(),
            version: Some(4),
            ..Default::default()
        };
        let tree = model.to_tree().unwrap();
        assert_eq!(tree.get("version"), Some(&ConfigValue::int(4)));
        assert_eq!(ContentTypeModel::from_tree(&tree).unwrap(), model);
    }
}
