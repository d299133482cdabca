mod smtp;
mod templates;

pub use smtp::SmtpNotifier;
pub use templates::EmailTemplate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vitals_core::{AlertSink, DispatchedAlert, Priority, SinkError};

/// A dispatched alert prepared for outbound channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub patient_id: String,
    /// Condition text exactly as rendered for the sink
    pub condition: String,
    /// Priority the alert was raised with, `None` when undecorated
    pub priority: Option<Priority>,
    pub timestamp_ms: i64,
    pub title: String,
}

impl Notification {
    pub fn from_alert(alert: &DispatchedAlert) -> Self {
        let event = &alert.event;
        Self {
            patient_id: event.patient_id.clone(),
            condition: event.condition.clone(),
            priority: alert.priority,
            timestamp_ms: event.timestamp_ms,
            title: format!("Patient {}: {}", event.patient_id, event.condition),
        }
    }

    pub fn occurred_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Discord webhook error: {0}")]
    Discord(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Vec<String>,
    pub smtp_tls: SmtpTls,
    pub discord_webhook_url: Option<String>,
    /// Alerts raised below this priority are not forwarded
    pub min_priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            smtp_to: Vec::new(),
            smtp_tls: SmtpTls::default(),
            discord_webhook_url: None,
            min_priority: None,
        }
    }
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let smtp_to = std::env::var("NOTIFICATION_EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let smtp_tls = match std::env::var("SMTP_TLS").unwrap_or_default().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        };

        Self {
            smtp_host: non_empty_var("SMTP_HOST"),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            smtp_username: non_empty_var("SMTP_USERNAME"),
            smtp_password: non_empty_var("SMTP_PASSWORD"),
            smtp_from: non_empty_var("SMTP_FROM_ADDRESS"),
            smtp_to,
            smtp_tls,
            discord_webhook_url: non_empty_var("DISCORD_WEBHOOK_URL"),
            min_priority: non_empty_var("NOTIFICATION_MIN_PRIORITY")
                .and_then(|s| Priority::parse(&s)),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Forwards dispatched alerts to every configured channel.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
    min_priority: Option<Priority>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        // Add SMTP channel if configured
        if config.smtp_host.is_some() && config.smtp_from.is_some() && !config.smtp_to.is_empty() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email notifications enabled (SMTP -> {} recipients)",
                        config.smtp_to.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        }

        if let Some(ref webhook_url) = config.discord_webhook_url {
            channels.push(Box::new(DiscordWebhookNotifier {
                webhook_url: webhook_url.clone(),
                client: reqwest::Client::new(),
            }));
            tracing::info!("Discord webhook notifications enabled");
        }

        if channels.is_empty() {
            tracing::info!(
                "No notification channels configured (set SMTP_HOST or DISCORD_WEBHOOK_URL)"
            );
        }

        Self {
            channels,
            min_priority: config.min_priority,
        }
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channels,
            min_priority: None,
        }
    }

    pub fn with_min_priority(mut self, min_priority: Option<Priority>) -> Self {
        self.min_priority = min_priority;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Alerts without a priority always pass
    fn wants(&self, notification: &Notification) -> bool {
        match (self.min_priority, notification.priority) {
            (Some(min), Some(p)) => p >= min,
            _ => true,
        }
    }

    /// Send to every channel, awaiting each. All channels are tried; the
    /// first failure is returned. Ok carries the number of channels used.
    pub async fn notify(&self, notification: &Notification) -> Result<usize, NotificationError> {
        if !self.wants(notification) {
            tracing::debug!(
                patient_id = %notification.patient_id,
                priority = ?notification.priority,
                "Below notification threshold, skipped"
            );
            return Ok(0);
        }

        let mut first_error = None;
        let mut sent = 0;
        for channel in &self.channels {
            match channel.send(notification).await {
                Ok(()) => {
                    sent += 1;
                    tracing::debug!("Sent notification via {}", channel.name());
                }
                Err(e) => {
                    tracing::warn!("Failed to send notification via {}: {}", channel.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }
}

#[async_trait]
impl AlertSink for NotificationService {
    async fn dispatch(&self, alert: &DispatchedAlert) -> Result<(), SinkError> {
        self.notify(&Notification::from_alert(alert))
            .await
            .map(|_| ())
            .map_err(|e| SinkError::Notification(e.to_string()))
    }

    fn name(&self) -> &str {
        "notifications"
    }
}

/// Embed colour for an alert's priority
fn embed_color(priority: Option<Priority>) -> u32 {
    match priority {
        Some(Priority::Critical) => 0xff0000,
        Some(Priority::High) => 0xff6600,
        Some(Priority::Medium) => 0xffcc00,
        Some(Priority::Low) => 0x0099ff,
        None => 0x808080,
    }
}

fn discord_payload(notification: &Notification) -> serde_json::Value {
    let mut embed = serde_json::json!({
        "title": notification.title,
        "description": notification.condition,
        "color": embed_color(notification.priority),
        "fields": [
            { "name": "Patient", "value": notification.patient_id, "inline": true },
            {
                "name": "Priority",
                "value": notification.priority.map(|p| p.as_str()).unwrap_or("NONE"),
                "inline": true
            },
        ],
    });
    if let Some(at) = notification.occurred_at() {
        embed["timestamp"] = serde_json::Value::String(at.to_rfc3339());
    }
    serde_json::json!({ "embeds": [embed] })
}

/// Discord webhook notifier.
struct DiscordWebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

#[async_trait]
impl NotificationChannel for DiscordWebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.client
            .post(&self.webhook_url)
            .json(&discord_payload(notification))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotificationError::Discord(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "discord-webhook"
    }
}
