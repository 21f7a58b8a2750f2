//! Email sending
//!
//! SMTP transport built from the `EMAIL_*` environment settings. Sending
//! is best-effort everywhere it is used: callers log failures and carry
//! on, they never fail the request over a mail problem.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;
use crate::models::DemoRequest;

/// Email service
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Whether an SMTP relay is configured at all
    pub fn is_enabled(&self) -> bool {
        self.config.host.is_some()
    }

    /// Send the OTP second-factor email.
    pub async fn send_otp_email(
        &self,
        to_email: &str,
        admin_name: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> Result<()> {
        let subject = "Your Assetra sign-in code";
        let body = otp_email_body(admin_name, code, expiry_minutes);
        self.send_html(to_email, subject, &body).await
    }

    /// Notify the configured recipient about a new demo request.
    pub async fn send_demo_request_notification(&self, request: &DemoRequest) -> Result<()> {
        let to = self
            .config
            .notify_to
            .as_deref()
            .ok_or_else(|| anyhow!("EMAIL_NOTIFY_TO not configured"))?
            .to_string();

        let subject = format!("New demo request from {}", request.name);
        let body = demo_request_email_body(request);
        self.send_html(&to, &subject, &body).await
    }

    async fn send_html(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let host = self
            .config
            .host
            .as_deref()
            .ok_or_else(|| anyhow!("EMAIL_HOST not configured"))?;

        let email = Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.port);

        if let (Some(user), Some(password)) = (&self.config.user, &self.config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let mailer = builder.build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

/// HTML body of the OTP email
pub fn otp_email_body(admin_name: &str, code: &str, expiry_minutes: i64) -> String {
    format!(
        r#"<html>
<body style="font-family: sans-serif; color: #222;">
  <h2>Assetra sign-in</h2>
  <p>Hi {name},</p>
  <p>Your one-time sign-in code is:</p>
  <p style="font-size: 28px; font-weight: bold; letter-spacing: 4px;">{code}</p>
  <p>The code expires in {minutes} minutes. If you did not try to sign in,
  you can ignore this email.</p>
</body>
</html>"#,
        name = admin_name,
        code = code,
        minutes = expiry_minutes,
    )
}

/// HTML body of the demo-request notification
pub fn demo_request_email_body(request: &DemoRequest) -> String {
    format!(
        r#"<html>
<body style="font-family: sans-serif; color: #222;">
  <h2>New demo request</h2>
  <ul>
    <li><strong>Name:</strong> {name}</li>
    <li><strong>Email:</strong> {email}</li>
    <li><strong>Company:</strong> {company}</li>
  </ul>
  <p>{message}</p>
</body>
</html>"#,
        name = request.name,
        email = request.email,
        company = request.company.as_deref().unwrap_or("-"),
        message = request.message.as_deref().unwrap_or(""),
    )
}
