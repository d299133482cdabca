use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::templates::EmailTemplate;
use crate::{Notification, NotificationChannel, NotificationConfig, NotificationError, SmtpTls};

/// Emails each alert to the ward's distribution list.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotificationError::Config("SMTP_HOST not set".into()))?;
        let from_addr = config
            .smtp_from
            .as_deref()
            .ok_or_else(|| NotificationError::Config("SMTP_FROM_ADDRESS not set".into()))?;

        let from: Mailbox = from_addr
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid from address: {}", e)))?;

        let mut to = Vec::with_capacity(config.smtp_to.len());
        for addr in &config.smtp_to {
            match addr.parse::<Mailbox>() {
                Ok(mailbox) => to.push(mailbox),
                Err(e) => tracing::warn!("Ignoring recipient {}: {}", addr, e),
            }
        }
        if to.is_empty() {
            return Err(NotificationError::Config(
                "No valid NOTIFICATION_EMAIL_TO addresses".into(),
            ));
        }

        Ok(Self {
            transport: build_transport(host, config)?,
            from,
            to,
        })
    }

    pub fn recipients(&self) -> usize {
        self.to.len()
    }
}

fn build_transport(
    host: &str,
    config: &NotificationConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
    let mut builder = match config.smtp_tls {
        SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
        SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
    }
    .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?
    .port(config.smtp_port);

    if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    Ok(builder.build())
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let html_body = EmailTemplate::render(notification);

        // One bad mailbox must not keep the alert from the rest of the list
        let mut failed = Vec::new();
        for recipient in &self.to {
            let email = Message::builder()
                .from(self.from.clone())
                .to(recipient.clone())
                .subject(&notification.title)
                .header(ContentType::TEXT_HTML)
                .body(html_body.clone())
                .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))?;

            if let Err(e) = self.transport.send(email).await {
                failed.push(format!("{}: {}", recipient.email, e));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::Smtp(format!(
                "Failed to send email to {} of {} recipients ({})",
                failed.len(),
                self.to.len(),
                failed.join("; ")
            )))
        }
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
