//! Durable decision records and best-effort notifications.

use crate::ConfigHandle;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use warden_interface::{
    AUTHORIZED_COLOR, AuditEvent, BLOCKED_COLOR, GuardRepository, Notice, NoticeField,
    NotificationSink,
};

/// Records every guard decision.
///
/// The audit event is stored first and unconditionally; the notification is
/// rendered and sent afterwards, and any failure there is only logged.
#[derive(Clone)]
pub struct LogEmitter {
    repository: Arc<dyn GuardRepository>,
    sink: Option<Arc<dyn NotificationSink>>,
    config: ConfigHandle,
}

impl LogEmitter {
    /// Create an emitter. Without a sink only the durable record is written.
    pub fn new(
        repository: Arc<dyn GuardRepository>,
        sink: Option<Arc<dyn NotificationSink>>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            repository,
            sink,
            config,
        }
    }

    /// Store `event`, then try to notify the channel for its category.
    #[instrument(skip(self, event), fields(action = %event.action(), category = %event.category()))]
    pub async fn record(&self, event: AuditEvent) {
        if let Err(e) = self.repository.insert_audit_event(&event).await {
            error!(error = %e, "Failed to store audit event");
        }

        let Some(sink) = &self.sink else {
            return;
        };
        let channel = self
            .config
            .read(|config| config.log_channels().channel_for(*event.category()).to_string());
        let notice = render_notice(&event);
        match sink.send(&channel, &notice).await {
            Ok(()) => debug!(channel = %channel, "Notification sent"),
            Err(e) => warn!(channel = %channel, error = %e, "Notification failed"),
        }
    }
}

/// Render an audit event as a notification.
///
/// Blocked and failed actions are red, everything else green. The optional
/// `target`, `remedy` and `reason` detail keys become fields.
pub fn render_notice(event: &AuditEvent) -> Notice {
    let failed = *event.was_blocked() || event.action().ends_with("_FAILED");
    let details = event.details();

    let mut fields = vec![NoticeField::inline(
        "Executor",
        event
            .executor_id()
            .map(|id| id.mention())
            .unwrap_or_else(|| "Unknown".to_string()),
    )];
    let target = detail(details, "target")
        .map(str::to_string)
        .or_else(|| event.target_id().map(|id| id.to_string()));
    if let Some(target) = target {
        fields.push(NoticeField::inline("Target", target));
    }
    if let Some(remedy) = detail(details, "remedy") {
        fields.push(NoticeField {
            name: "Action".to_string(),
            value: remedy.to_string(),
            inline: false,
        });
    }
    if let Some(reason) = detail(details, "reason") {
        fields.push(NoticeField {
            name: "Reason".to_string(),
            value: reason.to_string(),
            inline: false,
        });
    }

    Notice {
        title: title_from_action(event.action()),
        description: event.summary().unwrap_or_default().to_string(),
        color: if failed { BLOCKED_COLOR } else { AUTHORIZED_COLOR },
        fields,
        footer: format!("{} | Warden", event.source()),
        timestamp: *event.timestamp(),
    }
}

fn detail<'a>(details: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    details.get(key).and_then(serde_json::Value::as_str)
}

/// `CHANNEL_DELETE_BLOCKED` -> `Channel Delete Blocked`.
fn title_from_action(action: &str) -> String {
    action
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
