use crate::Notification;
use vitals_core::Priority;

pub struct EmailTemplate;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn banner_color(priority: Option<Priority>) -> &'static str {
    match priority {
        Some(Priority::Critical) => "#dc2626",
        Some(Priority::High) => "#f97316",
        Some(Priority::Medium) => "#eab308",
        Some(Priority::Low) => "#3b82f6",
        None => "#64748b",
    }
}

impl EmailTemplate {
    pub fn render(notification: &Notification) -> String {
        let color = banner_color(notification.priority);
        let priority = notification.priority.map(|p| p.as_str()).unwrap_or("NONE");
        let patient = escape(&notification.patient_id);
        let condition = escape(&notification.condition);
        let occurred = notification
            .occurred_at()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| format!("{} ms", notification.timestamp_ms));

        let body_content = format!(
            r#"<div style="background:{color};color:#fff;padding:12px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:700;">{priority} &middot; Patient {patient}</div>
<table style="width:100%;border-collapse:collapse;">
  <tr><td style="padding:8px 12px;color:#94a3b8;">Patient</td><td style="padding:8px 12px;font-weight:600;">{patient}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">Condition</td><td style="padding:8px 12px;font-weight:600;color:{color};">{condition}</td></tr>
  <tr><td style="padding:8px 12px;color:#94a3b8;">Priority</td><td style="padding:8px 12px;font-weight:600;">{priority}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">Measured at</td><td style="padding:8px 12px;font-weight:600;">{occurred}</td></tr>
</table>"#
        );

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f1f5f9;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;box-shadow:0 1px 3px rgba(0,0,0,0.1);">
      <tr><td>
        {body_content}
      </td></tr>
      <tr><td style="padding:16px 20px;border-top:1px solid #e2e8f0;">
        <p style="margin:0;color:#94a3b8;font-size:12px;">
          Sent at {sent} UTC
        </p>
      </td></tr>
    </table>
    <p style="color:#94a3b8;font-size:11px;margin-top:16px;">VitalWatch Alert Service</p>
  </td></tr>
</table>
</body>
</html>"#,
            sent = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::{AlertEvent, DispatchedAlert};

    #[test]
    fn test_render_includes_alert_fields() {
        let n = Notification::from_alert(&DispatchedAlert::with_priority(
            AlertEvent::new("42", "[CRITICAL] BloodOxygen - Rapid SpO2 Drop", 0),
            Priority::Critical,
        ));
        let html = EmailTemplate::render(&n);
        assert!(html.contains("CRITICAL &middot; Patient 42"));
        assert!(html.contains("BloodOxygen - Rapid SpO2 Drop"));
        assert!(html.contains("1970-01-01 00:00:00 UTC"));
        assert!(html.contains("#dc2626"));
    }

    #[test]
    fn test_render_escapes_markup() {
        let n = Notification::from_alert(&AlertEvent::new("<b>7</b>", "ECG - <script>", 0).into());
        let html = EmailTemplate::render(&n);
        assert!(html.contains("&lt;b&gt;7&lt;/b&gt;"));
        assert!(!html.contains("<script>"));
    }
}
