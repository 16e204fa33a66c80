use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::EmailConfig;
use crate::domain::account::errors::EmailSendError;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::ports::EmailSender;
use crate::domain::action_token::models::ActionTokenSecret;

/// Email sender backed by an async SMTP transport.
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_base_url: String,
}

impl SmtpEmailSender {
    /// Build the transport from configuration.
    ///
    /// No connection is opened until the first message is sent.
    ///
    /// # Errors
    /// * `InvalidAddress` - `from_address` is not a valid mailbox
    /// * `Transport` - Relay could not be configured
    pub fn new(config: &EmailConfig) -> Result<Self, EmailSendError> {
        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| EmailSendError::InvalidAddress(e.to_string()))?;

        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| EmailSendError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(10)));
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
            frontend_base_url: config.frontend_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn link(&self, path: &str, token: &ActionTokenSecret) -> String {
        format!("{}/{}?token={}", self.frontend_base_url, path, token.expose())
    }

    fn build_message(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: String,
    ) -> Result<Message, EmailSendError> {
        let to = to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| EmailSendError::InvalidAddress(e.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailSendError::Message(e.to_string()))
    }

    async fn deliver(&self, message: Message) -> Result<(), EmailSendError> {
        self.mailer
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| EmailSendError::Transport(e.to_string()))
    }
}

fn verification_body(link: &str) -> String {
    format!(
        "Welcome!\n\
        \n\
        Please confirm your email address by opening the link below:\n\
        \n\
        {}\n\
        \n\
        If you did not create an account, you can ignore this message.\n",
        link
    )
}

fn password_reset_body(link: &str) -> String {
    format!(
        "Hello,\n\
        \n\
        A password reset was requested for your account. To choose a new\n\
        password, open the link below:\n\
        \n\
        {}\n\
        \n\
        The link can be used once. If you did not request a reset, you can\n\
        ignore this message and your password will stay the same.\n",
        link
    )
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_verification_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError> {
        let body = verification_body(&self.link("verify-email", token));
        let message = self.build_message(to, "Verify your email address", body)?;
        self.deliver(message).await?;

        tracing::debug!(to = %to, "Verification email sent");
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &EmailAddress,
        token: &ActionTokenSecret,
    ) -> Result<(), EmailSendError> {
        let body = password_reset_body(&self.link("reset-password", token));
        let message = self.build_message(to, "Reset your password", body)?;
        self.deliver(message).await?;

        tracing::debug!(to = %to, "Password reset email sent");
        Ok(())
    }
}
