//! Push notification construction and the presenter seam.
//!
//! Payloads are ephemeral: a push event builds a `Notification` value from
//! the payload text (or the default reminder) and hands it to the injected
//! presenter. Nothing here is persisted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::SwError;

/// Notification title.
pub const NOTIFICATION_TITLE: &str = "錯題集提醒";
/// Body used when the push carries no payload.
pub const DEFAULT_BODY: &str = "您有新的錯題待處理";
/// Notification icon asset.
pub const NOTIFICATION_ICON: &str = "/icons/icon-192x192.png";
/// Badge asset.
pub const NOTIFICATION_BADGE: &str = "/icons/icon-72x72.png";
/// Icon shared by both actions.
pub const ACTION_ICON: &str = "/icons/icon-96x96.png";
/// Action id for opening the collection view.
pub const ACTION_EXPLORE: &str = "explore";
/// Action id for dismissing the notification.
pub const ACTION_CLOSE: &str = "close";
/// Vibration pattern (ms on/off/on).
pub const VIBRATION_PATTERN: [u32; 3] = [100, 50, 100];

/// A button on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Metadata attached to the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Arrival time, ms since epoch.
    pub date_of_arrival: u64,
    pub primary_key: u32,
}

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Build the reminder notification for a push event. `payload` is the raw
/// push text, if any.
pub fn build_notification(payload: Option<&str>) -> Notification {
    let date_of_arrival = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Notification {
        title: NOTIFICATION_TITLE.to_string(),
        body: payload.unwrap_or(DEFAULT_BODY).to_string(),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        vibrate: VIBRATION_PATTERN.to_vec(),
        data: NotificationData {
            date_of_arrival,
            primary_key: 1,
        },
        actions: vec![
            NotificationAction {
                action: ACTION_EXPLORE.to_string(),
                title: "查看錯題".to_string(),
                icon: ACTION_ICON.to_string(),
            },
            NotificationAction {
                action: ACTION_CLOSE.to_string(),
                title: "關閉".to_string(),
                icon: ACTION_ICON.to_string(),
            },
        ],
    }
}

/// The injected display seam. The host wires this to the platform
/// notification UI.
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// Display a notification. The push event is held open until this
    /// settles.
    async fn show(&self, notification: &Notification) -> Result<(), SwError>;

    /// Close the currently displayed notification.
    async fn close(&self) -> Result<(), SwError>;
}
