//!
//! # Account emails
//!
//! Outbound mail goes through the [`Mailer`] trait. The shipped
//! [`LogMailer`] only writes the message to the log; a real transport can be
//! plugged in without touching the account flows. Sending is fire-and-forget
//! from the caller's point of view: [`Notifier`] logs failures and never
//! returns them.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Writes every message to the log at `info` level instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            "mail to={} from={} subject={:?}: {}",
            message.to, message.from, message.subject, message.text
        );
        Ok(())
    }
}

pub fn welcome_email(from: &str, to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        from: from.to_string(),
        subject: "Thanks for joining in!".to_string(),
        text: format!(
            "Welcome to the app, {}. Let me know how you get along with the app.",
            name
        ),
    }
}

pub fn cancellation_email(from: &str, to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        from: from.to_string(),
        subject: "Sorry to see you go!".to_string(),
        text: format!("Goodbye, {}. I hope to see you back sometime soon.", name),
    }
}

/// Sends the account lifecycle emails from a fixed sender address.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    pub async fn welcome(&self, to: &str, name: &str) {
        self.deliver(welcome_email(&self.from, to, name)).await;
    }

    pub async fn cancellation(&self, to: &str, name: &str) {
        self.deliver(cancellation_email(&self.from, to, name)).await;
    }

    async fn deliver(&self, message: EmailMessage) {
        let to = message.to.clone();
        if let Err(e) = self.mailer.send(message).await {
            warn!("could not send mail to {}: {}", to, e);
        }
    }
}
