//! Outbound transactional mail over an HTTP mail API
//!
//! Sends are one-shot: a failed send surfaces to the caller and is never
//! retried here.

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

/// Mailer configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Mail API endpoint
    pub api_url: String,
    /// API key sent in the `api-key` header
    pub api_key: String,
    /// Sender address
    pub sender_email: String,
    /// Sender display name
    pub sender_name: String,
    /// When set, log instead of sending (local development)
    pub suppress_send: bool,
}

impl MailerConfig {
    /// Create a new MailerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MAIL_API_URL`: endpoint (default: Brevo transactional endpoint)
    /// - `MAIL_API_KEY`: API key (required unless sends are suppressed)
    /// - `MAIL_SENDER_EMAIL`: sender address (default: "no-reply@clipstream.dev")
    /// - `MAIL_SENDER_NAME`: sender name (default: "Clipstream")
    /// - `MAIL_SUPPRESS_SEND`: "true" to log instead of sending
    pub fn from_env() -> Result<Self> {
        let suppress_send = std::env::var("MAIL_SUPPRESS_SEND")
            .map(|v| v == "true" || v == "True")
            .unwrap_or(false);

        let api_key = match std::env::var("MAIL_API_KEY") {
            Ok(key) => key,
            Err(_) if suppress_send => String::new(),
            Err(_) => anyhow::bail!("MAIL_API_KEY environment variable not set"),
        };

        Ok(MailerConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
            api_key,
            sender_email: std::env::var("MAIL_SENDER_EMAIL")
                .unwrap_or_else(|_| "no-reply@clipstream.dev".to_string()),
            sender_name: std::env::var("MAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Clipstream".to_string()),
            suppress_send,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

/// HTTP mail API client
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    config: MailerConfig,
}

impl Mailer {
    /// Create a new mailer
    pub fn new(config: MailerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Send an HTML email to a single recipient
    pub async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        if self.config.suppress_send {
            warn!("Mail sending suppressed; would send {:?} to {}", subject, recipient);
            return Ok(());
        }

        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.config.sender_email.clone(),
                name: Some(self.config.sender_name.clone()),
            },
            to: vec![EmailAddress {
                email: recipient.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: html_body.to_string(),
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("mail send failed (status={}): {}", status, detail);
        }

        info!("Sent mail {:?} to {}", subject, recipient);
        Ok(())
    }
}

/// Render the account confirmation email
pub fn verification_email(token: &str, confirm_base_url: &str, expiration_minutes: u64) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<body style="margin: 0; padding: 0; background-color: #f7f7f7; font-family: Arial, sans-serif;">
    <table align="center" border="0" cellpadding="0" cellspacing="0" width="100%" style="max-width: 600px;">
        <tr>
            <td align="center" bgcolor="#ffffff" style="padding: 20px; border-bottom: 3px solid #e6598c;">
                <h2 style="color: #ca004b; font-size: 25px; margin: 15px 0;">Welcome to Clipstream!</h2>
                <p style="font-size: 16px; color: #333333; line-height: 1.5;">
                    Thanks for signing up! To complete your registration, please confirm your
                    email address by clicking the button below.
                </p>
            </td>
        </tr>
        <tr>
            <td align="center" bgcolor="#ffffff" style="padding: 20px;">
                <a href="{confirm_base_url}/confirm/{token}" target="_blank" style="background-color: #ca004b; color: #ffffff; font-size: 18px; text-decoration: none; padding: 12px 24px; border-radius: 5px; display: inline-block;">
                    Confirm Email
                </a>
                <p style="font-size: 14px; color: #666666; margin-top: 15px;">
                    This link will expire in {expiration_minutes} minutes. If you didn't request
                    this, please ignore this email.
                </p>
            </td>
        </tr>
    </table>
</body>
</html>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_embeds_the_token_link() {
        let html = verification_email("deadbeef", "http://localhost:3000", 10);
        assert!(html.contains("http://localhost:3000/confirm/deadbeef"));
        assert!(html.contains("expire in 10 minutes"));
    }

    #[tokio::test]
    async fn suppressed_mailer_never_talks_to_the_network() {
        let mailer = Mailer::new(MailerConfig {
            api_url: "http://127.0.0.1:1/unreachable".to_string(),
            api_key: String::new(),
            sender_email: "no-reply@clipstream.dev".to_string(),
            sender_name: "Clipstream".to_string(),
            suppress_send: true,
        });

        mailer
            .send("a@example.com", "subject", "<p>hi</p>")
            .await
            .expect("suppressed send should succeed");
    }
}
