//! SMTP mail via lettre.
//!
//! Used for the password-reset OTP flow. When mail is not configured
//! the caller logs the code instead of sending it.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::server::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials =
            Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(credentials)
            .build();

        Ok(Mailer {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the password-reset OTP. The code expires 10 minutes after
    /// it was stored.
    pub async fn send_otp(&self, to: &str, otp_code: &str) -> Result<(), MailError> {
        let from: Mailbox = self.from_address.parse()?;
        let to: Mailbox = to.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject("Your password reset code")
            .body(format!(
                "Your password reset code is {otp_code}. It expires in 10 minutes."
            ))?;

        self.transport.send(email).await?;
        Ok(())
    }
}
