//! One-shot flash messages carried in a cookie.
//!
//! A mutating handler records what happened and redirects; the next page
//! render drains the messages and the cookie is cleared. Nothing is kept on
//! the server between requests.
//!
//! # Flow
//!
//! 1. **Extract** `Flash` from the request (decodes the `todo_flash` cookie)
//! 2. **Push** messages in a `POST` handler and return `(flash, Redirect)`
//! 3. **Drain** them in the `GET` handler with [`Flash::take_messages`]
//! 4. **Emit** `Set-Cookie`: the remaining queue, or an expired cookie once drained
//!
//! # Example
//!
//! ```ignore
//! async fn add(flash: Flash, Form(form): Form<AddForm>) -> (Flash, Redirect) {
//!     (flash.success("Todo added."), Redirect::to("/"))
//! }
//!
//! async fn index(mut flash: Flash) -> (Flash, Html<String>) {
//!     let messages = flash.take_messages();
//!     (flash, Html(render(&messages)))
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Name of the cookie holding pending flash messages.
pub const FLASH_COOKIE: &str = "todo_flash";

/// Upper bound on queued messages; older ones are dropped first.
pub const MAX_PENDING_MESSAGES: usize = 10;

/// Category of a flash message, used as a CSS class by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// The action succeeded
    Success,
    /// Neutral status update
    Info,
    /// Input was rejected
    Warning,
    /// The action failed
    Danger,
}

impl FlashLevel {
    /// Lowercase name of the category
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A single user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// Category
    pub level: FlashLevel,
    /// Text shown to the user
    pub message: String,
}

/// Flash message queue for one request/response cycle.
///
/// Works both as an extractor and as a response part, so a handler takes
/// it in, modifies it, and hands it back.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pending: Vec<FlashMessage>,
    from_cookie: bool,
}

impl Flash {
    /// Load the pending queue from request headers.
    ///
    /// A missing or undecodable cookie yields an empty queue.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match cookie_value(headers, FLASH_COOKIE) {
            Some(value) => Self {
                pending: decode(value),
                from_cookie: true,
            },
            None => Self::default(),
        }
    }

    /// Queue a message.
    #[must_use]
    pub fn push(mut self, level: FlashLevel, message: impl Into<String>) -> Self {
        self.pending.push(FlashMessage {
            level,
            message: message.into(),
        });
        if self.pending.len() > MAX_PENDING_MESSAGES {
            let overflow = self.pending.len() - MAX_PENDING_MESSAGES;
            self.pending.drain(..overflow);
        }
        self
    }

    /// Queue a `success` message.
    #[must_use]
    pub fn success(self, message: impl Into<String>) -> Self {
        self.push(FlashLevel::Success, message)
    }

    /// Queue an `info` message.
    #[must_use]
    pub fn info(self, message: impl Into<String>) -> Self {
        self.push(FlashLevel::Info, message)
    }

    /// Queue a `warning` message.
    #[must_use]
    pub fn warning(self, message: impl Into<String>) -> Self {
        self.push(FlashLevel::Warning, message)
    }

    /// Queue a `danger` message.
    #[must_use]
    pub fn error(self, message: impl Into<String>) -> Self {
        self.push(FlashLevel::Danger, message)
    }

    /// Messages queued so far.
    #[must_use]
    pub fn pending(&self) -> &[FlashMessage] {
        &self.pending
    }

    /// Remove and return every queued message.
    ///
    /// Once drained, the response clears the cookie.
    pub fn take_messages(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.pending)
    }

    fn set_cookie_header(&self) -> Option<String> {
        if !self.pending.is_empty() {
            let value = encode(&self.pending)?;
            Some(format!(
                "{FLASH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax"
            ))
        } else if self.from_cookie {
            Some(format!(
                "{FLASH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"
            ))
        } else {
            None
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.set_cookie_header() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                },
                Err(error) => {
                    tracing::warn!(%error, "Dropping flash cookie with invalid header value");
                },
            }
        }
        Ok(res)
    }
}

/// Find a cookie by name across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn encode(messages: &[FlashMessage]) -> Option<String> {
    match serde_json::to_vec(messages) {
        Ok(json) => Some(URL_SAFE_NO_PAD.encode(json)),
        Err(error) => {
            tracing::warn!(%error, "Failed to encode flash messages");
            None
        },
    }
}

fn decode(value: &str) -> Vec<FlashMessage> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{
        http::Request,
        response::{IntoResponse, Redirect},
    };

    fn cookie_from(flash: Flash) -> Option<String> {
        let response = (flash, Redirect::to("/")).into_response();
        response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    /// Turn a `Set-Cookie` value back into a request `Cookie` header.
    fn echo(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        headers_with_cookie(pair)
    }

    #[test]
    fn test_empty_flash_sets_no_cookie() {
        assert_eq!(cookie_from(Flash::default()), None);
    }

    #[test]
    fn test_messages_survive_redirect() {
        let set_cookie = cookie_from(Flash::default().success("Todo added.")).unwrap();
        assert!(set_cookie.starts_with("todo_flash="));
        assert!(set_cookie.contains("HttpOnly"));

        let mut flash = Flash::from_headers(&echo(&set_cookie));
        let messages = flash.take_messages();
        assert_eq!(
            messages,
            vec![FlashMessage {
                level: FlashLevel::Success,
                message: "Todo added.".to_string(),
            }]
        );
    }

    #[test]
    fn test_draining_clears_cookie() {
        let set_cookie = cookie_from(Flash::default().warning("Please enter a title.")).unwrap();
        let mut flash = Flash::from_headers(&echo(&set_cookie));
        let _ = flash.take_messages();

        let cleared = cookie_from(flash).unwrap();
        assert!(cleared.starts_with("todo_flash=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_unread_messages_accumulate() {
        let first = cookie_from(Flash::default().success("one")).unwrap();
        let flash = Flash::from_headers(&echo(&first)).error("two");
        let levels: Vec<_> = flash.pending().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![FlashLevel::Success, FlashLevel::Danger]);
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut flash = Flash::default();
        for i in 0..(MAX_PENDING_MESSAGES + 3) {
            flash = flash.info(format!("message {i}"));
        }
        assert_eq!(flash.pending().len(), MAX_PENDING_MESSAGES);
        assert_eq!(flash.pending()[0].message, "message 3");
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let mut flash = Flash::from_headers(&headers_with_cookie("todo_flash=%%%not-base64"));
        assert!(flash.take_messages().is_empty());
        // The bad cookie still gets cleared
        assert!(cookie_from(flash).unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_other_cookies_are_skipped() {
        let set_cookie = cookie_from(Flash::default().info("hello")).unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        let headers = headers_with_cookie(&format!("theme=dark; {pair}; lang=en"));
        assert_eq!(Flash::from_headers(&headers).pending().len(), 1);
    }

    #[test]
    fn test_level_names() {
        assert_eq!(FlashLevel::Danger.as_str(), "danger");
        assert_eq!(
            serde_json::to_string(&FlashLevel::Warning).unwrap(),
            "\"warning\""
        );
    }

    #[tokio::test]
    async fn test_extractor_reads_cookie() {
        let set_cookie = cookie_from(Flash::default().success("saved")).unwrap();
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let req = Request::builder()
            .header(header::COOKIE, pair)
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let flash = Flash::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(flash.pending().len(), 1);
    }
}
