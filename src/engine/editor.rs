//! engine::editor
//!
//! Keep the editor interface in line with the fields' declared controls.
//!
//! # Design
//!
//! Only fields that declare a `control` are managed. Their bindings are
//! compared with the remote ones after normalization (missing namespace is
//! `builtin`, empty settings are no settings). On a difference the remote
//! list is rewritten in place: managed bindings are replaced, missing ones
//! are appended, and everything else in the editor interface is sent back
//! as it was read.
//!
//! On first engagement, when no editor interface version has been recorded
//! yet, the read only captures the version baseline. Bindings for fields the
//! content type does not have are left out of any write that follows, but
//! they never cause a write on their own.

use std::collections::{BTreeMap, BTreeSet};

use crate::api::{ApiError, ContentApi, ContentTypeRef};
use crate::core::schema::DEFAULT_WIDGET_NAMESPACE;
use crate::model::wire::{Control, ControlSettings, EditorInterface};
use crate::model::ContentTypeModel;

/// Sync managed bindings and return the editor interface version to record.
///
/// `recorded` is the editor interface version from the last run, if any.
pub async fn sync_controls(
    api: &dyn ContentApi,
    target: &ContentTypeRef,
    proposed: &ContentTypeModel,
    recorded: Option<u64>,
) -> Result<u64, ApiError> {
    let remote = api.get_editor_interface(target).await?;
    if let Some(recorded) = recorded {
        if recorded != remote.sys.version {
            tracing::warn!(
                id = %target,
                recorded,
                remote = remote.sys.version,
                "editor interface changed outside ctsync"
            );
        }
    }

    let Some(next) = merge_controls(&remote, proposed, recorded.is_none()) else {
        tracing::debug!(id = %target, "editor interface is up to date");
        return Ok(remote.sys.version);
    };

    let updated = api
        .update_editor_interface(target, remote.sys.version, &next)
        .await?;
    tracing::info!(
        id = %target,
        before = remote.sys.version,
        after = updated.sys.version,
        "updated editor interface"
    );
    Ok(updated.sys.version)
}

/// The editor interface to write, or `None` when nothing would change.
pub fn merge_controls(
    remote: &EditorInterface,
    proposed: &ContentTypeModel,
    first_engagement: bool,
) -> Option<EditorInterface> {
    let desired: BTreeMap<String, Control> = proposed
        .draft_controls()
        .into_iter()
        .map(|c| (c.field_id.clone(), normalize(&c)))
        .collect();

    let field_ids: BTreeSet<&str> = proposed.fields.iter().map(|f| f.id.as_str()).collect();
    let kept: Vec<&Control> = remote
        .controls
        .iter()
        .filter(|c| !first_engagement || field_ids.contains(c.field_id.as_str()))
        .collect();

    let current: BTreeMap<String, Control> = kept
        .iter()
        .filter(|c| desired.contains_key(&c.field_id))
        .map(|c| (c.field_id.clone(), normalize(c)))
        .collect();

    if current == desired {
        return None;
    }

    let mut controls: Vec<Control> = kept
        .iter()
        .map(|c| desired.get(&c.field_id).cloned().unwrap_or_else(|| (*c).clone()))
        .collect();
    for (field_id, control) in &desired {
        if !controls.iter().any(|c| &c.field_id == field_id) {
            controls.push(control.clone());
        }
    }

    Some(EditorInterface {
        sys: remote.sys.clone(),
        controls,
        rest: remote.rest.clone(),
    })
}

fn normalize(control: &Control) -> Control {
    Control {
        field_id: control.field_id.clone(),
        widget_id: control.widget_id.clone(),
        widget_namespace: Some(
            control
                .widget_namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_WIDGET_NAMESPACE.to_string()),
        ),
        settings: control
            .settings
            .clone()
            .filter(|s| s != &ControlSettings::default()),
    }
}
