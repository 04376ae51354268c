//! Outbound e-mail for the weekly report.
//!
//! [`MailTransport`] is the seam between the report job and SMTP. The real
//! implementation is [`SmtpMailer`] (lettre, implicit TLS on port 465 and
//! STARTTLS otherwise); when the server is not configured every send fails
//! with [`Error::Mail`] via [`UnconfiguredMailer`].

use crate::{
    config::settings::MailConfig,
    core::budget::money,
    errors::{Error, Result},
};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Subject line of the weekly report.
pub const WEEKLY_REPORT_SUBJECT: &str = "Your Weekly Budget AI Summary";

const IMPLICIT_TLS_PORT: u16 = 465;

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub text: String,
    /// HTML body
    pub html: String,
}

/// Something that can deliver an [`OutgoingMail`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers one message.
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Builds the transport for `config`.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn MailTransport>> {
    if config.is_configured() {
        Ok(Arc::new(SmtpMailer::from_config(config)?))
    } else {
        warn!("Mail server settings not configured; weekly e-mails will fail");
        Ok(Arc::new(UnconfiguredMailer))
    }
}

/// SMTP delivery through lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Creates a mailer from a fully configured [`MailConfig`].
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let (Some(host), Some(user), Some(password)) =
            (&config.host, &config.user, &config.password)
        else {
            return Err(Error::Mail {
                message: "Mail server settings not configured".to_string(),
            });
        };

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| Error::Mail {
            message: format!("Invalid SMTP host {host}: {e}"),
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(user.clone(), password.clone()))
            .build();

        let address = user.parse().map_err(|e| Error::Mail {
            message: format!("MAIL_USER is not a valid address: {e}"),
        })?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let to: Mailbox = mail.to.parse().map_err(|e| Error::Mail {
            message: format!("Invalid recipient {}: {e}", mail.to),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))
            .map_err(|e| Error::Mail {
                message: format!("Failed to build message: {e}"),
            })?;

        self.transport.send(message).await.map_err(|e| Error::Mail {
            message: format!("SMTP delivery failed: {e}"),
        })?;
        debug!("Delivered mail");
        Ok(())
    }
}

/// Transport used when SMTP is not configured. Every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredMailer;

#[async_trait]
impl MailTransport for UnconfiguredMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
        Err(Error::Mail {
            message: "Mail server settings not configured".to_string(),
        })
    }
}

/// Numbers and narrative that go into the weekly report.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyEmailData {
    /// Greeting name
    pub user_name: String,
    /// Currency symbol
    pub currency: String,
    /// Nominal monthly budget
    pub monthly_budget: f64,
    /// Sum of fixed expenses
    pub fixed_expenses_total: f64,
    /// Monthly budget after fixed expenses
    pub real_monthly_budget: f64,
    /// Real monthly budget divided by four
    pub weekly_budget: f64,
    /// Spending in the report window
    pub week_total: f64,
    /// `week_total - weekly_budget`
    pub difference: f64,
    /// True when `difference` is positive
    pub is_over_budget: bool,
    /// AI or fallback analysis text
    pub ai_analysis: String,
}

impl WeeklyEmailData {
    fn status(&self) -> &'static str {
        if self.is_over_budget {
            "⚠️ You overspent this week"
        } else {
            "✓ You stayed under your weekly budget"
        }
    }

    const fn over_under(&self) -> &'static str {
        if self.is_over_budget { "over" } else { "under" }
    }

    fn m(&self, amount: f64) -> String {
        money(&self.currency, amount)
    }
}

/// Escapes text for inclusion in HTML element content.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Plain-text body of the weekly report.
#[must_use]
pub fn render_text(data: &WeeklyEmailData) -> String {
    format!(
        "Hello {name}, here is your weekly spending analysis:

Monthly Budget: {monthly}
Fixed Expenses Total: {fixed}
Real Monthly Budget: {real}
Weekly Budget: {weekly}

You Spent This Week: {spent}
Difference: {difference} {over_under} budget
Status: {status}

AI Analysis:
{analysis}

---
This is an automated weekly report from your Budget Tracker.
To disable these emails, update your settings in the app.
",
        name = data.user_name,
        monthly = data.m(data.monthly_budget),
        fixed = data.m(data.fixed_expenses_total),
        real = data.m(data.real_monthly_budget),
        weekly = data.m(data.weekly_budget),
        spent = data.m(data.week_total),
        difference = data.m(data.difference.abs()),
        over_under = data.over_under(),
        status = data.status(),
        analysis = data.ai_analysis,
    )
}

/// HTML body of the weekly report. User-supplied text is escaped.
#[must_use]
pub fn render_html(data: &WeeklyEmailData) -> String {
    let (status_color, status_background) = if data.is_over_budget {
        ("#ef4444", "#fef2f2")
    } else {
        ("#22c55e", "#f0fdf4")
    };
    let row = |label: &str, amount: f64| {
        format!(
            r#"        <tr>
          <td style="padding: 8px 0; color: #6b7280;">{label}:</td>
          <td style="padding: 8px 0; text-align: right; font-weight: 600;">{}</td>
        </tr>"#,
            escape_html(&data.m(amount))
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Weekly Budget Report</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f5f5f5;">
  <div style="background-color: white; border-radius: 8px; padding: 30px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
    <h1 style="color: #111; margin-top: 0; font-size: 24px;">{subject}</h1>
    <p style="font-size: 16px;">Hello <strong>{name}</strong>, here is your weekly spending analysis:</p>

    <div style="background-color: #f9fafb; border-radius: 6px; padding: 20px; margin: 20px 0;">
      <h2 style="margin-top: 0; font-size: 18px; color: #374151;">Budget Overview</h2>
      <table style="width: 100%; border-collapse: collapse;">
{monthly}
{fixed}
{real}
{weekly}
      </table>
    </div>

    <div style="background-color: {status_background}; border-left: 4px solid {status_color}; border-radius: 6px; padding: 20px; margin: 20px 0;">
      <h2 style="margin-top: 0; font-size: 18px; color: #374151;">This Week's Spending</h2>
      <p style="font-size: 32px; font-weight: bold; margin: 10px 0; color: {status_color};">{spent}</p>
      <p style="margin: 5px 0; color: #6b7280;">{difference} {over_under} budget</p>
      <p style="margin: 10px 0 0 0; font-weight: 600; color: {status_color};">{status}</p>
    </div>

    <div style="background-color: #eff6ff; border-radius: 6px; padding: 20px; margin: 20px 0;">
      <h2 style="margin-top: 0; font-size: 18px; color: #374151;">🤖 AI Analysis</h2>
      <div style="white-space: pre-line; color: #374151; line-height: 1.8;">{analysis}</div>
    </div>

    <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 30px 0;">

    <p style="font-size: 12px; color: #9ca3af; text-align: center; margin: 0;">
      This is an automated weekly report from your Budget Tracker.<br>
      To disable these emails, update your settings in the app.
    </p>
  </div>
</body>
</html>
"#,
        subject = WEEKLY_REPORT_SUBJECT,
        name = escape_html(&data.user_name),
        monthly = row("Monthly Budget", data.monthly_budget),
        fixed = row("Fixed Expenses Total", data.fixed_expenses_total),
        real = row("Real Monthly Budget", data.real_monthly_budget),
        weekly = row("Weekly Budget", data.weekly_budget),
        spent = escape_html(&data.m(data.week_total)),
        difference = escape_html(&data.m(data.difference.abs())),
        over_under = data.over_under(),
        status = data.status(),
        analysis = escape_html(&data.ai_analysis),
    )
}

/// The weekly report addressed to `to`.
#[must_use]
pub fn weekly_report_mail(to: &str, data: &WeeklyEmailData) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: WEEKLY_REPORT_SUBJECT.to_string(),
        text: render_text(data),
        html: render_html(data),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn data(over: bool) -> WeeklyEmailData {
        WeeklyEmailData {
            user_name: "Sam <script>".to_string(),
            currency: "$".to_string(),
            monthly_budget: 3000.0,
            fixed_expenses_total: 1000.0,
            real_monthly_budget: 2000.0,
            weekly_budget: 500.0,
            week_total: if over { 620.0 } else { 400.0 },
            difference: if over { 120.0 } else { -100.0 },
            is_over_budget: over,
            ai_analysis: "• Eat in & save".to_string(),
        }
    }

    #[test]
    fn test_text_body_reports_difference() {
        let text = render_text(&data(false));
        assert!(text.starts_with("Hello Sam <script>, here is your weekly spending analysis:"));
        assert!(text.contains("Real Monthly Budget: $2000.00"));
        assert!(text.contains("Difference: $100.00 under budget"));
        assert!(text.contains("Status: ✓ You stayed under your weekly budget"));
        assert!(text.contains("AI Analysis:\n• Eat in & save"));
    }

    #[test]
    fn test_html_body_escapes_user_text() {
        let html = render_html(&data(true));
        assert!(html.contains("Hello <strong>Sam &lt;script&gt;</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("• Eat in &amp; save"));
        assert!(html.contains("$120.00 over budget"));
        assert!(html.contains("⚠️ You overspent this week"));
        assert!(html.contains("#ef4444"));
    }

    #[test]
    fn test_weekly_report_mail_fields() {
        let mail = weekly_report_mail("sam@example.com", &data(false));
        assert_eq!(mail.to, "sam@example.com");
        assert_eq!(mail.subject, WEEKLY_REPORT_SUBJECT);
        assert!(mail.html.contains("<title>Weekly Budget Report</title>"));
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_always_fails() {
        let mailer = build_mailer(&MailConfig::default()).unwrap();
        let result = mailer.send(&weekly_report_mail("x@example.com", &data(false))).await;
        assert!(matches!(result, Err(Error::Mail { .. })));
    }

    #[test]
    fn test_smtp_mailer_requires_settings() {
        let result = SmtpMailer::from_config(&MailConfig::default());
        assert!(matches!(result, Err(Error::Mail { .. })));
    }

    #[tokio::test]
    async fn test_smtp_mailer_builds_from_full_config() {
        let config = MailConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            user: Some("reports@example.com".to_string()),
            password: Some("pw".to_string()),
            from_name: "Budget Tracker".to_string(),
        };
        let mailer = SmtpMailer::from_config(&config).unwrap();
        assert_eq!(mailer.from.email.to_string(), "reports@example.com");
        assert_eq!(mailer.from.name.as_deref(), Some("Budget Tracker"));
    }
}
