//! Outgoing email.
//!
//! Delivery itself belongs to an external provider; the service only builds
//! messages and hands them to a [`Mailer`]. A failed delivery never undoes the
//! operation that triggered it: callers get back [`EMAIL_DELIVERY_FAILED`] and
//! report it next to the successful result.

use crate::{
    config::EmailSettings,
    entities::{VerificationStatus, user},
    errors::Result,
};
use tracing::{info, warn};

/// Error code reported when a secondary email step fails.
pub const EMAIL_DELIVERY_FAILED: &str = "EMAIL_DELIVERY_FAILED";

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Email transport.
pub trait Mailer: Send + Sync {
    /// Delivers one message.
    fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Mailer that writes every message to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    /// Creates a log mailer using `from` as the sender address.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<()> {
        info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            "Email queued for delivery"
        );
        Ok(())
    }
}

/// Sends `email`, returning an error code instead of failing on delivery errors.
pub fn deliver(mailer: &dyn Mailer, email: &OutgoingEmail) -> Option<&'static str> {
    match mailer.send(email) {
        Ok(()) => None,
        Err(e) => {
            warn!(to = %email.to, error = %e, "Email delivery failed");
            Some(EMAIL_DELIVERY_FAILED)
        }
    }
}

/// Welcome message for a newly created account.
#[must_use]
pub fn welcome_email(
    settings: &EmailSettings,
    account: &user::Model,
    temporary_password: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: account.email.clone(),
        subject: "Your Elog Book account".to_string(),
        body: format!(
            "Hello {name},\n\n\
             An Elog Book account has been created for you.\n\n\
             Email: {email}\n\
             Temporary password: {temporary_password}\n\n\
             Sign in at {login}\n\
             You will be asked to choose a new password at {change}\n",
            name = account.name,
            email = account.email,
            login = settings.login_link(),
            change = settings.change_password_link(),
        ),
    }
}

/// Notification sent after a reviewer decides on a student profile.
#[must_use]
pub fn verification_email(
    settings: &EmailSettings,
    account: &user::Model,
    status: VerificationStatus,
    note: Option<&str>,
) -> OutgoingEmail {
    let outcome = match status {
        VerificationStatus::Approved => "approved",
        VerificationStatus::Rejected => "rejected",
        VerificationStatus::Pending => "returned to pending",
    };
    let mut body = format!(
        "Hello {},\n\nYour student profile has been {outcome}.\n",
        account.name
    );
    if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
        body.push_str(&format!("\nReviewer note: {note}\n"));
    }
    body.push_str(&format!("\nSign in at {}\n", settings.login_link()));
    OutgoingEmail {
        to: account.email.clone(),
        subject: format!("Profile verification {outcome}"),
        body,
    }
}
