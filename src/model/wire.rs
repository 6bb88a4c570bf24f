//! model::wire
//!
//! Wire shapes of the content management API, as sent and received.
//!
//! Field names follow the API's camelCase. Unknown keys on responses are
//! ignored, except on the editor interface, where they are carried through
//! untouched so that a write never drops configuration this tool does not
//! manage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// System metadata attached to every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: u64,
}

/// A content type as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    pub sys: Sys,
    #[serde(flatten)]
    pub body: ContentTypeBody,
}

/// The writable part of a content type: what create and update send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeBody {
    pub name: String,
    #[serde(default)]
    pub display_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One field of a content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
    #[serde(default)]
    pub validations: Vec<RawValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
}

/// Element description of an `Array` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Items {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub validations: Vec<RawValidation>,
}

/// A numeric bound pair (`size`, `range`, `assetFileSize`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A `regexp` validation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// A validation exactly as it appears on the wire.
///
/// Every supported key is optional here; keys the model does not know land
/// in `other` so that translation can reject them by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_file_size: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<Pattern>,
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
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// A per-locale default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Strings(BTreeMap<String, String>),
    Bools(BTreeMap<String, bool>),
    /// Anything else the API may hold (numbers, objects).
    Other(serde_json::Value),
}

/// The editor interface of a content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorInterface {
    #[serde(default, skip_serializing)]
    pub sys: Sys,
    #[serde(default)]
    pub controls: Vec<Control>,
    /// Sidebar, editor layout and anything else this tool leaves alone.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// One field's editor binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ControlSettings>,
}

/// Widget settings for a control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSettings {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_decodes_camel_case() {
        let ct: ContentType = serde_json::from_value(json!({
            "sys": { "id": "author", "version": 3, "type": "ContentType" },
            "name": "Author",
            "displayField": "name",
            "fields": [{
                "id": "photo", "name": "Photo", "type": "Link", "linkType": "Asset",
                "required": true, "validations": [{ "linkMimetypeGroup": ["image"] }]
            }]
        }))
        .unwrap();
        assert_eq!(ct.sys.version, 3);
        assert_eq!(ct.body.display_field, "name");
        let field = &ct.body.fields[0];
        assert_eq!(field.link_type.as_deref(), Some("Asset"));
        assert!(field.required && !field.omitted);
        assert_eq!(
            field.validations[0].link_mimetype_group,
            Some(vec!["image".to_string()])
        );
    }

    #[test]
    fn unknown_validation_keys_are_kept() {
        let raw: RawValidation =
            serde_json::from_value(json!({ "dateRange": { "min": "2020-01-01" } })).unwrap();
        assert!(raw.other.contains_key("dateRange"));
    }

    #[test]
    fn default_value_variants() {
        let s: DefaultValue = serde_json::from_value(json!({ "en-US": "green" })).unwrap();
        assert!(matches!(s, DefaultValue::Strings(_)));
        let b: DefaultValue = serde_json::from_value(json!({ "en-US": true })).unwrap();
        assert!(matches!(b, DefaultValue::Bools(_)));
        let n: DefaultValue = serde_json::from_value(json!({ "en-US": 4 })).unwrap();
        assert!(matches!(n, DefaultValue::Other(_)));
    }

    #[test]
    fn editor_interface_keeps_unmanaged_keys() {
        let ei: EditorInterface = serde_json::from_value(json!({
            "sys": { "version": 9 },
            "controls": [{ "fieldId": "name", "widgetId": "singleLine" }],
            "sidebar": [{ "widgetId": "publication-widget" }]
        }))
        .unwrap();
        assert_eq!(ei.sys.version, 9);
        let back = serde_json::to_value(&ei).unwrap();
        assert!(back.get("sys").is_none());
        assert_eq!(back["sidebar"][0]["widgetId"], "publication-widget");
        assert_eq!(back["controls"][0]["fieldId"], "name");
    }

    #[test]
    fn body_omits_absent_optionals() {
        let body = ContentTypeBody {
            name: "A".into(),
            display_field: "x".into(),
            description: None,
            fields: vec![Field {
                id: "x".into(),
                name: "X".into(),
                field_type: "Symbol".into(),
                ..Default::default()
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("description").is_none());
        assert!(json["fields"][0].get("linkType").is_none());
        assert_eq!(json["fields"][0]["omitted"], false);
    }
}
