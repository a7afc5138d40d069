use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::RequestBuilder;
use std::fmt;

/// HTTP basic credentials. The platform ignores the username; the API key is the password.
#[derive(Clone)]
pub struct MailchimpAuth {
    username: String,
    api_key: String,
}

impl MailchimpAuth {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    /// Attach credentials and the JSON content type to a request.
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.basic_auth(&self.username, Some(&self.api_key))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }
}

// Keep the key out of logs and panics.
impl fmt::Debug for MailchimpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailchimpAuth")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let auth = MailchimpAuth::new("anystring", "secret-us1");
        let out = format!("{:?}", auth);
        assert!(out.contains("anystring"));
        assert!(!out.contains("secret-us1"));
    }

    #[test]
    fn test_apply_sets_headers() {
        let auth = MailchimpAuth::new("anystring", "test-key-us1");
        let req = auth
            .apply(reqwest::Client::new().get("http://localhost/templates"))
            .build()
            .unwrap();
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            req.headers()[reqwest::header::AUTHORIZATION],
            "Basic YW55c3RyaW5nOnRlc3Qta2V5LXVzMQ=="
        );
    }
}
