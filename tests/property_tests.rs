//! Property-based tests for translation, equality and validation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use ctsync::core::path::AttrPath;
use ctsync::core::schema::{ResourceSchema, TypeRegistry, DEFAULT_ENVIRONMENT};
use ctsync::core::value::ConfigValue;
use ctsync::model::wire::{ContentTypeBody, Field};
use ctsync::model::{
    content_types_equal, DefaultValueBlock, FieldModel, ItemsModel, RangeBlock, RegexpBlock,
    ValidationBlock,
};

// =============================================================================
// Strategies
// =============================================================================

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}"
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 1..4)
}

fn bound() -> impl Strategy<Value = Option<f64>> {
    prop::option::of((0u32..10_000).prop_map(f64::from))
}

fn range_block() -> impl Strategy<Value = RangeBlock> {
    (bound(), bound()).prop_map(|(min, max)| RangeBlock { min, max })
}

/// One validation block with exactly one rule key set.
fn validation() -> impl Strategy<Value = ValidationBlock> {
    let rule = prop_oneof![
        any::<bool>().prop_map(|b| ValidationBlock {
            unique: Some(b),
            ..Default::default()
        }),
        range_block().prop_map(|r| ValidationBlock {
            size: Some(r),
            ..Default::default()
        }),
        range_block().prop_map(|r| ValidationBlock {
            range: Some(r),
            ..Default::default()
        }),
        range_block().prop_map(|r| ValidationBlock {
            asset_file_size: Some(r),
            ..Default::default()
        }),
        (word(), prop::option::of("[gimsu]{1,3}")).prop_map(|(pattern, flags)| {
            ValidationBlock {
                regexp: Some(RegexpBlock { pattern, flags }),
                ..Default::default()
            }
        }),
        words().prop_map(|v| ValidationBlock {
            link_content_type: Some(v),
            ..Default::default()
        }),
        words().prop_map(|v| ValidationBlock {
            link_mimetype_group: Some(v),
            ..Default::default()
        }),
        words().prop_map(|v| ValidationBlock {
            in_values: Some(v),
            ..Default::default()
        }),
        words().prop_map(|v| ValidationBlock {
            enabled_marks: Some(v),
            ..Default::default()
        }),
        words().prop_map(|v| ValidationBlock {
            enabled_node_types: Some(v),
            ..Default::default()
        }),
    ];
    (rule, prop::option::of("[A-Za-z ]{1,20}")).prop_map(|(mut block, message)| {
        block.message = message;
        block
    })
}

fn locale() -> impl Strategy<Value = String> {
    prop_oneof![Just("en-US".to_string()), Just("de-DE".to_string()), Just("fr".to_string())]
}

/// A non-empty default of either kind.
fn default_value() -> impl Strategy<Value = DefaultValueBlock> {
    prop_oneof![
        prop::collection::btree_map(locale(), word(), 1..3).prop_map(|m| DefaultValueBlock {
            string: Some(m),
            bool: None,
        }),
        prop::collection::btree_map(locale(), any::<bool>(), 1..3).prop_map(|m| {
            DefaultValueBlock {
                string: None,
                bool: Some(m),
            }
        }),
    ]
}

fn field() -> impl Strategy<Value = FieldModel> {
    (
        "[a-z][a-zA-Z0-9_]{0,12}",
        "[A-Za-z ]{1,16}",
        prop_oneof![Just("Symbol"), Just("Text"), Just("Integer"), Just("Link")],
        any::<[bool; 4]>(),
        prop::collection::vec(validation(), 0..4),
        prop::option::of(default_value()),
        prop::option::of(prop::collection::vec(validation(), 0..3)),
    )
        .prop_map(
            |(id, name, field_type, [required, localized, disabled, omitted], validations, default_value, items)| {
                let mut field = FieldModel {
                    id,
                    name,
                    field_type: field_type.to_string(),
                    required,
                    localized,
                    disabled,
                    omitted,
                    validations,
                    default_value,
                    ..Default::default()
                };
                if field.field_type == "Link" {
                    field.link_type = Some("Entry".to_string());
                }
                if let Some(item_validations) = items {
                    field.field_type = "Array".to_string();
                    field.link_type = None;
                    field.items = Some(ItemsModel {
                        item_type: "Symbol".to_string(),
                        link_type: None,
                        validations: item_validations,
                    });
                }
                field
            },
        )
}

fn body(fields: Vec<Field>) -> ContentTypeBody {
    ContentTypeBody {
        name: "Author".to_string(),
        display_field: fields.first().map(|f| f.id.clone()).unwrap_or_default(),
        description: None,
        fields,
    }
}

/// Distinct field ids, so fields keep their identity under reordering.
fn distinct_fields() -> impl Strategy<Value = Vec<Field>> {
    prop::collection::vec(field(), 2..6).prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(i, mut f)| {
                f.id = format!("{}{}", f.id, i);
                f.draft().unwrap()
            })
            .collect()
    })
}

// =============================================================================
// Translation
// =============================================================================

proptest! {
    #[test]
    fn import_of_draft_is_identity(f in field()) {
        let registry = TypeRegistry::default();
        let wire = f.draft().unwrap();
        let back = FieldModel::import(&wire, None, &registry).unwrap();
        prop_assert_eq!(back, f);
    }

    #[test]
    fn import_of_draft_survives_json(f in field()) {
        let registry = TypeRegistry::default();
        let json = serde_json::to_string(&f.draft().unwrap()).unwrap();
        let wire: Field = serde_json::from_str(&json).unwrap();
        let back = FieldModel::import(&wire, None, &registry).unwrap();
        prop_assert_eq!(back, f);
    }

    #[test]
    fn empty_defaults_mean_no_default(
        string in prop::option::of(Just(BTreeMap::<String, String>::new())),
        flag in prop::option::of(Just(BTreeMap::<String, bool>::new())),
    ) {
        let block = DefaultValueBlock { string, bool: flag };
        let drafted = block.draft("f").unwrap();
        prop_assert!(drafted.is_none());
        prop_assert_eq!(DefaultValueBlock::import("f", drafted.as_ref()).unwrap(), None);
    }
}

// =============================================================================
// Equality
// =============================================================================

proptest! {
    #[test]
    fn equality_is_reflexive(fields in distinct_fields()) {
        let b = body(fields);
        prop_assert!(content_types_equal(&b, &b.clone()));
    }

    #[test]
    fn field_order_matters(fields in distinct_fields(), shift in 1usize..5) {
        let mut rotated = fields.clone();
        let n = rotated.len();
        rotated.rotate_left(shift % n);
        prop_assume!(rotated.iter().zip(&fields).any(|(a, b)| a.id != b.id));

        let local = body(fields);
        let mut remote = body(rotated);
        remote.display_field = local.display_field.clone();
        prop_assert!(!content_types_equal(&local, &remote));
    }

    #[test]
    fn omitted_flag_matters(fields in distinct_fields(), pick in any::<prop::sample::Index>()) {
        let local = body(fields);
        let mut remote = local.clone();
        let i = pick.index(remote.fields.len());
        remote.fields[i].omitted = !remote.fields[i].omitted;
        prop_assert!(!content_types_equal(&local, &remote));
    }
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    /// A rule whose related value is not known yet never fires, whatever the
    /// value of the attribute it guards.
    #[test]
    fn unknown_related_value_never_fires(link_type in word(), has_items in any::<bool>()) {
        let schema = ResourceSchema::content_type(&TypeRegistry::default(), DEFAULT_ENVIRONMENT)
            .unwrap();
        let mut field = BTreeMap::new();
        field.insert("id".to_string(), ConfigValue::string("f"));
        field.insert("name".to_string(), ConfigValue::string("F"));
        field.insert("type".to_string(), ConfigValue::Unknown);
        field.insert("link_type".to_string(), ConfigValue::string(link_type));
        if has_items {
            field.insert(
                "items".to_string(),
                ConfigValue::object([("type", ConfigValue::string("Symbol"))]),
            );
        }
        let config = ConfigValue::object([
            ("space_id", ConfigValue::string("s")),
            ("name", ConfigValue::string("N")),
            ("display_field", ConfigValue::string("f")),
            ("fields", ConfigValue::List(vec![ConfigValue::Object(field)])),
        ]);

        let diags = schema.validate(&config, None);
        let combination = AttrPath::root().attr("fields").index(0);
        prop_assert!(
            diags.iter().all(|d| d.summary != "Invalid attribute combination"
                || !d.path.to_string().starts_with(&combination.to_string())),
            "{}", diags
        );
    }
}
