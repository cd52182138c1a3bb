/// Account lifecycle email notifications
///
/// Sends plain-text emails through the SendGrid v3 HTTP API using
/// `reqwest`. The mailer is constructed once at startup from config and
/// cloned into handlers via application state.
///
/// Every send is spawned onto the runtime and the result is only logged;
/// the caller gets its response as soon as the primary mutation is
/// durable, whether or not the email ever goes out. When no API key is
/// configured the mailer is disabled and sends become debug-logged no-ops.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Email notification sink
///
/// Cheap to clone; the HTTP client and credentials are shared behind an
/// Arc.
#[derive(Clone)]
pub struct Mailer {
    inner: Option<Arc<MailerInner>>,
}

struct MailerInner {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl Mailer {
    /// Creates a mailer
    ///
    /// Disabled (no-op) unless both an API key and a sender address are
    /// provided.
    pub fn new(api_key: Option<String>, from: Option<String>) -> Self {
        let inner = match (api_key, from) {
            (Some(api_key), Some(from)) if !api_key.is_empty() && !from.is_empty() => {
                Some(Arc::new(MailerInner {
                    client: reqwest::Client::new(),
                    api_key,
                    from,
                }))
            }
            _ => {
                debug!("Email notifications disabled: no API key or sender configured");
                None
            }
        };

        Self { inner }
    }

    /// Creates a disabled mailer (useful in tests)
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether this mailer will actually dispatch emails
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Notifies a new user that their account was created
    pub fn send_account_created(&self, to: &str, name: &str) {
        let subject = "Welcome to our application";
        let text = format!(
            "Dear {}, Your account created successfully. Welcome to our startup project.",
            name
        );
        self.send(to, subject, text);
    }

    /// Notifies a user that their account changed
    pub fn send_account_updated(&self, to: &str, name: &str) {
        let subject = "Your account has been updated";
        let text = format!(
            "Dear {}, your account has been updated recently. Please ignore this email \
             if you did changes, otherwise login and check your account.",
            name
        );
        self.send(to, subject, text);
    }

    /// Says goodbye to a user whose account was deleted
    pub fn send_account_removed(&self, to: &str, name: &str) {
        let subject = "We are sorry to see you go";
        let text = format!(
            "Dear {}, we are sorry to hear about that. Please let us know if we can help you.",
            name
        );
        self.send(to, subject, text);
    }

    /// Dispatches one email, fire-and-forget
    fn send(&self, to: &str, subject: &str, text: String) {
        let Some(inner) = self.inner.clone() else {
            debug!(to, subject, "Email notifications disabled, skipping send");
            return;
        };

        let to = to.to_string();
        let subject = subject.to_string();

        tokio::spawn(async move {
            let payload = build_payload(&inner.from, &to, &subject, &text);

            let result = inner
                .client
                .post(SENDGRID_SEND_URL)
                .bearer_auth(&inner.api_key)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    info!(to, subject, "Notification email sent");
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(to, subject, %status, body, "Notification email rejected");
                }
                Err(err) => {
                    error!(to, subject, error = %err, "Notification email failed");
                }
            }
        });
    }
}

/// Builds the SendGrid v3 send payload
fn build_payload(from: &str, to: &str, subject: &str, text: &str) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": from },
        "subject": subject,
        "content": [{ "type": "text/plain", "value": text }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_payload_shape() {
        let payload = build_payload("noreply@taskdeck.dev", "a@x.com", "Hello", "Body text");

        assert_eq!(payload["from"]["email"], "noreply@taskdeck.dev");
        assert_eq!(payload["personalizations"][0]["to"][0]["email"], "a@x.com");
        assert_eq!(payload["subject"], "Hello");
        assert_eq!(payload["content"][0]["type"], "text/plain");
        assert_eq!(payload["content"][0]["value"], "Body text");
    }

    #[test]
    fn test_mailer_disabled_without_credentials() {
        assert!(!Mailer::new(None, None).is_enabled());
        assert!(!Mailer::new(Some("key".into()), None).is_enabled());
        assert!(!Mailer::new(None, Some("from@x.com".into())).is_enabled());
        assert!(!Mailer::new(Some(String::new()), Some("from@x.com".into())).is_enabled());
        assert!(!Mailer::disabled().is_enabled());
    }

    #[test]
    fn test_mailer_enabled_with_credentials() {
        let mailer = Mailer::new(Some("SG.key".into()), Some("from@x.com".into()));
        assert!(mailer.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_mailer_send_is_noop() {
        // Must not panic or require a runtime network call
        let mailer = Mailer::disabled();
        mailer.send_account_created("a@x.com", "A");
        mailer.send_account_updated("a@x.com", "A");
        mailer.send_account_removed("a@x.com", "A");
    }
}
