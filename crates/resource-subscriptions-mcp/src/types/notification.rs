//! Server-to-client notification payloads.

use serde::{Deserialize, Serialize};

use super::message::{methods, JsonRpcNotification};

/// Params of `notifications/resources/updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUpdatedParams {
    /// URI of the updated resource.
    pub uri: String,
}

impl ResourceUpdatedParams {
    /// Wrap into the JSON-RPC notification sent to subscribers.
    pub fn into_notification(self) -> JsonRpcNotification {
        JsonRpcNotification::new(
            methods::RESOURCE_UPDATED,
            Some(serde_json::json!({ "uri": self.uri })),
        )
    }

    /// Recover the params from a received notification, if it is a resource update.
    pub fn from_notification(notification: &JsonRpcNotification) -> Option<Self> {
        if notification.method != methods::RESOURCE_UPDATED {
            return None;
        }
        notification
            .params
            .clone()
            .and_then(|params| serde_json::from_value(params).ok())
    }
}

/// Params of `notifications/cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    /// The request being cancelled.
    pub request_id: serde_json::Value,
    /// Optional reason for cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
