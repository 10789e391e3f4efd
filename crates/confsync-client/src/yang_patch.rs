//! YANG-Patch (RFC 8072) edit lists

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Operation of a single YANG-Patch edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    /// Create the target; fails if it exists
    Create,
    /// Delete the target; fails if it is absent
    Delete,
    /// Merge the value into the target, creating it if needed
    Merge,
    /// Replace the target with the value
    Replace,
    /// Delete the target if it exists
    Remove,
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditOperation::Create => "create",
            EditOperation::Delete => "delete",
            EditOperation::Merge => "merge",
            EditOperation::Replace => "replace",
            EditOperation::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// One edit of a YANG-Patch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YangPatchEdit {
    pub edit_id: String,
    pub operation: EditOperation,
    /// Data resource path of the edit target, relative to the datastore root
    pub target: String,
    /// Payload for create/merge/replace
    pub value: Option<Value>,
}

impl YangPatchEdit {
    pub fn new(operation: EditOperation, target: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            edit_id: String::new(),
            operation,
            target: target.into(),
            value,
        }
    }
}

/// An ordered list of edits applied as one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YangPatch {
    pub patch_id: String,
    pub comment: Option<String>,
    pub edits: Vec<YangPatchEdit>,
}

impl YangPatch {
    pub fn new(patch_id: impl Into<String>) -> Self {
        Self {
            patch_id: patch_id.into(),
            comment: None,
            edits: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Append an edit; edit ids are assigned in order starting at 1.
    pub fn push(&mut self, mut edit: YangPatchEdit) {
        edit.edit_id = (self.edits.len() + 1).to_string();
        self.edits.push(edit);
    }

    pub fn merge(&mut self, target: impl Into<String>, value: Value) {
        self.push(YangPatchEdit::new(EditOperation::Merge, target, Some(value)));
    }

    pub fn remove(&mut self, target: impl Into<String>) {
        self.push(YangPatchEdit::new(EditOperation::Remove, target, None));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Wire form of the request body (`application/yang-patch+json`).
    pub fn to_body(&self) -> Value {
        let edits: Vec<Value> = self
            .edits
            .iter()
            .map(|edit| {
                let mut entry = json!({
                    "edit-id": edit.edit_id,
                    "operation": edit.operation.to_string(),
                    "target": format!("/{}", edit.target.trim_start_matches('/')),
                });
                if let Some(value) = &edit.value {
                    entry["value"] = value.clone();
                }
                entry
            })
            .collect();

        let mut patch = json!({
            "patch-id": self.patch_id,
            "edit": edits,
        });
        if let Some(comment) = &self.comment {
            patch["comment"] = json!(comment);
        }
        json!({ "ietf-yang-patch:yang-patch": patch })
    }
}
