/// Asynchronous notification gateway
///
/// Transactional email (OTP codes, welcome mail, reset links, subscription
/// confirmations, teammate invites) is decoupled from request handling:
/// handlers enqueue a [`Notification`] on an in-process channel and return
/// immediately; a dispatcher task spawned at startup delivers each message
/// by POSTing to the configured HTTP mail API.
///
/// Delivery is fire-and-forget. A failed send is logged and dropped — it
/// never blocks a request and never fails state that already committed.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::mail::{MailConfig, Mailer, Notification};
///
/// let mailer = Mailer::spawn(MailConfig {
///     api_url: "https://mail.example.com/v1/send".to_string(),
///     api_key: "key".to_string(),
///     sender: "noreply@taskdeck.io".to_string(),
/// });
///
/// mailer.send(Notification::Otp {
///     to: "alice@example.com".to_string(),
///     code: "123456".to_string(),
/// });
/// ```

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Mail API configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP endpoint of the mail provider
    pub api_url: String,

    /// Bearer token for the mail provider
    pub api_key: String,

    /// From-address on outgoing mail
    pub sender: String,
}

/// One transactional email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// OTP code for login/registration verification
    Otp { to: String, code: String },

    /// Welcome mail after registration
    Welcome { to: String, username: String },

    /// Password-reset link
    PasswordReset { to: String, reset_url: String },

    /// Newsletter subscription confirmation
    SubscriptionConfirmed { to: String },

    /// Invite carrying a teammate's initial credentials
    TeammateInvite {
        to: String,
        username: String,
        password: String,
    },
}

impl Notification {
    /// Recipient address
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Otp { to, .. }
            | Notification::Welcome { to, .. }
            | Notification::PasswordReset { to, .. }
            | Notification::SubscriptionConfirmed { to }
            | Notification::TeammateInvite { to, .. } => to,
        }
    }

    /// Subject line
    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Otp { .. } => "Your OTP Code",
            Notification::Welcome { .. } => "Welcome to TaskDeck",
            Notification::PasswordReset { .. } => "Password Reset Link",
            Notification::SubscriptionConfirmed { .. } => "Subscription Confirmed",
            Notification::TeammateInvite { .. } => "Your TaskDeck Account",
        }
    }

    /// Plain-text body
    pub fn body(&self) -> String {
        match self {
            Notification::Otp { code, .. } => {
                format!("Your OTP Code is {}", code)
            }
            Notification::Welcome { username, .. } => {
                format!(
                    "Hi {}, your TaskDeck account is ready. \
                     Verify your email with the OTP we just sent you.",
                    username
                )
            }
            Notification::PasswordReset { reset_url, .. } => {
                format!("Click the link to reset your password: {}", reset_url)
            }
            Notification::SubscriptionConfirmed { .. } => {
                "You are subscribed to the TaskDeck newsletter.".to_string()
            }
            Notification::TeammateInvite {
                username, password, ..
            } => {
                format!(
                    "An account was created for you.\nUsername: {}\nTemporary password: {}\n\
                     Please log in and change it.",
                    username, password
                )
            }
        }
    }
}

/// Wire format the dispatcher POSTs to the mail API
#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Handle for enqueueing notifications
///
/// Cheap to clone; all clones feed the same dispatcher. A disabled mailer
/// (no mail configuration at startup) accepts and drops every message so
/// callers never branch on configuration.
#[derive(Clone)]
pub struct Mailer {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Mailer {
    /// Starts the dispatcher task and returns the sending handle
    pub fn spawn(config: MailConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(config, rx));
        Mailer { tx: Some(tx) }
    }

    /// A mailer that drops everything, for deployments without mail
    pub fn disabled() -> Self {
        Mailer { tx: None }
    }

    /// Whether a dispatcher is running behind this handle
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueues a notification; never blocks, never fails the caller
    pub fn send(&self, notification: Notification) {
        match &self.tx {
            Some(tx) => {
                if tx.send(notification).is_err() {
                    warn!("Mail dispatcher is gone; notification dropped");
                }
            }
            None => {
                debug!(
                    recipient = notification.recipient(),
                    subject = notification.subject(),
                    "Mail disabled; notification dropped"
                );
            }
        }
    }
}

/// Consumes the channel until every sender is dropped
async fn dispatch_loop(config: MailConfig, mut rx: mpsc::UnboundedReceiver<Notification>) {
    let client = reqwest::Client::new();

    while let Some(notification) = rx.recv().await {
        if let Err(e) = deliver(&client, &config, &notification).await {
            warn!(
                recipient = notification.recipient(),
                subject = notification.subject(),
                error = %e,
                "Failed to deliver notification"
            );
        } else {
            debug!(
                recipient = notification.recipient(),
                subject = notification.subject(),
                "Notification delivered"
            );
        }
    }

    debug!("Mail dispatcher shutting down");
}

async fn deliver(
    client: &reqwest::Client,
    config: &MailConfig,
    notification: &Notification,
) -> Result<(), reqwest::Error> {
    let message = OutboundMessage {
        from: &config.sender,
        to: notification.recipient(),
        subject: notification.subject(),
        text: notification.body(),
    };

    client
        .post(&config.api_url)
        .bearer_auth(&config.api_key)
        .json(&message)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_body_contains_code() {
        let n = Notification::Otp {
            to: "a@x.com".to_string(),
            code: "123456".to_string(),
        };
        assert_eq!(n.recipient(), "a@x.com");
        assert_eq!(n.subject(), "Your OTP Code");
        assert!(n.body().contains("123456"));
    }

    #[test]
    fn test_reset_body_contains_link() {
        let n = Notification::PasswordReset {
            to: "a@x.com".to_string(),
            reset_url: "https://app.example.com/reset-password/tok".to_string(),
        };
        assert!(n.body().contains("/reset-password/tok"));
    }

    #[test]
    fn test_invite_body_contains_credentials() {
        let n = Notification::TeammateInvite {
            to: "b@x.com".to_string(),
            username: "bob".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let body = n.body();
        assert!(body.contains("bob"));
        assert!(body.contains("hunter2hunter2"));
    }

    #[test]
    fn test_disabled_mailer_accepts_sends() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());
        mailer.send(Notification::SubscriptionConfirmed {
            to: "a@x.com".to_string(),
        });
    }

    #[tokio::test]
    async fn test_spawned_mailer_survives_failed_delivery() {
        // Port 1 refuses connections; the dispatcher must log and move on.
        let mailer = Mailer::spawn(MailConfig {
            api_url: "http://127.0.0.1:1/send".to_string(),
            api_key: "key".to_string(),
            sender: "noreply@test".to_string(),
        });

        assert!(mailer.is_enabled());
        mailer.send(Notification::Otp {
            to: "a@x.com".to_string(),
            code: "000000".to_string(),
        });
        // Enqueue is fire-and-forget; nothing to await.
    }
}
