//! Appointment history entries (append-only audit trail).

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::types::DbId;

pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DELETE: &str = "delete";
pub const ACTION_STATUS_CHANGE: &str = "status_change";
pub const ACTION_SERVICE_CHANGE: &str = "service_change";
pub const ACTION_PAYMENT: &str = "payment";

/// All valid history actions.
pub const VALID_ACTIONS: &[&str] = &[
    ACTION_CREATE,
    ACTION_UPDATE,
    ACTION_DELETE,
    ACTION_STATUS_CHANGE,
    ACTION_SERVICE_CHANGE,
    ACTION_PAYMENT,
];

/// Source recorded when the caller does not name one.
pub const DEFAULT_SOURCE: &str = "web";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
    StatusChange,
    ServiceChange,
    Payment,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => ACTION_CREATE,
            Self::Update => ACTION_UPDATE,
            Self::Delete => ACTION_DELETE,
            Self::StatusChange => ACTION_STATUS_CHANGE,
            Self::ServiceChange => ACTION_SERVICE_CHANGE,
            Self::Payment => ACTION_PAYMENT,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            ACTION_CREATE => Ok(Self::Create),
            ACTION_UPDATE => Ok(Self::Update),
            ACTION_DELETE => Ok(Self::Delete),
            ACTION_STATUS_CHANGE => Ok(Self::StatusChange),
            ACTION_SERVICE_CHANGE => Ok(Self::ServiceChange),
            ACTION_PAYMENT => Ok(Self::Payment),
            other => Err(CoreError::Validation(format!(
                "Unknown history action: '{other}'. Valid actions: {}",
                VALID_ACTIONS.join(", ")
            ))),
        }
    }
}

/// The `changes` payload: what the appointment looked like before and/or
/// what was requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl HistoryChanges {
    pub fn created(after: Value) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(before: Value, after: Value) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(before: Value) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }

    pub fn to_value(&self) -> Value {
        json!(self)
    }
}

/// A history entry as assembled by a mutation. Incomplete drafts are
/// dropped rather than recorded.
#[derive(Debug, Clone, Default)]
pub struct HistoryDraft {
    pub appointment_id: Option<DbId>,
    pub branch_id: Option<DbId>,
    pub action: Option<HistoryAction>,
    pub actor_id: Option<DbId>,
    pub changes: HistoryChanges,
    pub source: Option<String>,
}

/// A complete entry, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub appointment_id: DbId,
    pub branch_id: Option<DbId>,
    pub action: HistoryAction,
    pub actor_id: Option<DbId>,
    pub changes: Value,
    pub source: String,
}

impl HistoryDraft {
    pub fn new(
        appointment_id: DbId,
        branch_id: DbId,
        action: HistoryAction,
        changes: HistoryChanges,
    ) -> Self {
        Self {
            appointment_id: Some(appointment_id),
            branch_id: Some(branch_id),
            action: Some(action),
            changes,
            ..Default::default()
        }
    }

    pub fn by(mut self, actor_id: Option<DbId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// `None` when the appointment or the action is missing.
    pub fn into_entry(self) -> Option<HistoryEntry> {
        Some(HistoryEntry {
            appointment_id: self.appointment_id?,
            branch_id: self.branch_id,
            action: self.action?,
            actor_id: self.actor_id,
            changes: self.changes.to_value(),
            source: self.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        })
    }
}

/// Extra entry logged alongside an update when the status moved.
pub fn status_change(before: &str, after: &str) -> Option<HistoryChanges> {
    (before != after).then(|| {
        HistoryChanges::updated(json!({ "status": before }), json!({ "status": after }))
    })
}

/// Extra entry logged alongside an update when the main service moved.
pub fn service_change(before: Option<DbId>, after: Option<DbId>) -> Option<HistoryChanges> {
    (before != after).then(|| {
        HistoryChanges::updated(json!({ "service_id": before }), json!({ "service_id": after }))
    })
}
