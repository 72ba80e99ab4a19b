use serde_json::json;

use crate::config::ContactConfig;
use crate::error::{AppError, AppResult};

/// A validated contact submission ready for delivery.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub reply_to: String,
    pub subject: Option<String>,
    pub body: String,
}

impl ContactMessage {
    fn subject_line(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| format!("Contact form message from {}", self.name))
    }

    fn body_text(&self) -> String {
        format!(
            "From: {} <{}>\nSubmission: {}\nReceived: {}\n\n{}",
            self.name,
            self.reply_to,
            self.id,
            chrono::Utc::now().to_rfc3339(),
            self.body,
        )
    }
}

/// Delivers contact submissions through an HTTP email-delivery API or SMTP.
pub struct ContactMailer {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
    smtp_transport: Option<lettre::AsyncSmtpTransport<lettre::Tokio1Executor>>,
    from: String,
    to: String,
}

impl ContactMailer {
    pub fn new(config: &ContactConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client");

        let smtp_transport = if config.smtp.enabled {
            let builder = if config.smtp.starttls {
                lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::starttls_relay(
                    &config.smtp.host,
                )
            } else {
                lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::relay(&config.smtp.host)
            };
            match builder {
                Ok(b) => {
                    let transport = b
                        .port(config.smtp.port)
                        .credentials(lettre::transport::smtp::authentication::Credentials::new(
                            config.smtp.username.clone(),
                            config.smtp.password.clone(),
                        ))
                        .build();
                    tracing::info!(host = %config.smtp.host, port = config.smtp.port, "SMTP transport initialized");
                    Some(transport)
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to create SMTP transport");
                    None
                }
            }
        } else {
            None
        };

        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            smtp_transport,
            from: config.from.clone(),
            to: config.to.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() || self.smtp_transport.is_some()
    }

    /// Deliver through whichever transport is configured; the HTTP API takes
    /// precedence when both are.
    pub async fn deliver(&self, msg: &ContactMessage) -> AppResult<()> {
        if let Some(url) = &self.api_url {
            return self.send_api(url, msg).await;
        }
        if let Some(transport) = &self.smtp_transport {
            return self.send_smtp(transport, msg).await;
        }
        Err(AppError::Unconfigured("contact delivery"))
    }

    async fn send_api(&self, url: &str, msg: &ContactMessage) -> AppResult<()> {
        let payload = json!({
            "from": self.from,
            "to": [self.to],
            "reply_to": msg.reply_to,
            "subject": msg.subject_line(),
            "text": msg.body_text(),
        });

        let mut req = self.client.post(url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::Mail(format!(
                "delivery API returned {}",
                resp.status()
            )));
        }
        tracing::info!(id = %msg.id, "contact message delivered via API");
        Ok(())
    }

    async fn send_smtp(
        &self,
        transport: &lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
        msg: &ContactMessage,
    ) -> AppResult<()> {
        use lettre::message::Mailbox;
        use lettre::AsyncTransport;

        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid from address: {e}")))?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid to address: {e}")))?;
        let reply_to: Mailbox = msg
            .reply_to
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid reply address: {e}")))?;

        let email = lettre::Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply_to)
            .subject(msg.subject_line())
            .body(msg.body_text())
            .map_err(|e| AppError::Mail(format!("failed to build message: {e}")))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        tracing::info!(id = %msg.id, "contact message delivered via SMTP");
        Ok(())
    }
}
