use async_trait::async_trait;
use notification_service::NotificationService;
use record_store::PatientStore;
use std::sync::Arc;
use vitals_core::{AlertSink, DispatchedAlert, SinkError};

/// Terminal sink for the service: every delivery is written to the alert
/// log first, then forwarded to the notification channels.
pub struct AlertDispatcher {
    store: Arc<PatientStore>,
    notifications: Option<NotificationService>,
}

impl AlertDispatcher {
    pub fn new(store: Arc<PatientStore>) -> Self {
        Self {
            store,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, service: NotificationService) -> Self {
        // Nothing to forward to
        if service.channel_count() > 0 {
            self.notifications = Some(service);
        }
        self
    }

    pub fn notifies(&self) -> bool {
        self.notifications.is_some()
    }
}

#[async_trait]
impl AlertSink for AlertDispatcher {
    async fn dispatch(&self, alert: &DispatchedAlert) -> Result<(), SinkError> {
        self.store.dispatch(alert).await?;
        if let Some(notifications) = &self.notifications {
            notifications.dispatch(alert).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "dispatcher"
    }
}
