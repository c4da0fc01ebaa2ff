//! Cookie-backed session and the login guard.
//!
//! The whole session lives client-side in one HMAC-signed cookie. Its payload
//! is JSON, base64url-encoded so it stays inside the cookie value alphabet.
//! A cookie that fails signature checks or decoding reads as a fresh
//! anonymous session.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Notice queued when a guarded route is hit without a login.
pub const LOGIN_REQUIRED: &str = "You need to login first.";

/// Notice queued on logout.
pub const LOGGED_OUT: &str = "You were logged out";

/// Current time in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Authentication state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Outcome of the login guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

/// Per-client session: the login flag plus queued one-shot notices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    logged_in: bool,
    /// Login expiry in epoch milliseconds, when a max age is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<String>,
}

impl Session {
    /// Read the session from the request's cookie jar.
    pub fn from_jar(jar: &SignedCookieJar) -> Self {
        jar.get(SESSION_COOKIE)
            .map(|cookie| Self::decode(cookie.value(), now_ms()))
            .unwrap_or_default()
    }

    /// Decode a verified cookie value. An expired login is dropped but
    /// queued notices are kept.
    pub fn decode(value: &str, now: i64) -> Self {
        let parsed = URL_SAFE_NO_PAD
            .decode(value)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Session>(&bytes).ok());

        let Some(mut session) = parsed else {
            tracing::debug!("Discarding undecodable session cookie");
            return Self::default();
        };

        if session.is_expired_at(now) {
            tracing::debug!("Session login expired");
            session.logout();
        }
        session
    }

    /// Encode for storage in the cookie.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    pub fn state(&self) -> SessionState {
        if self.logged_in {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Decide whether a guarded route may run.
    pub fn guard(&self) -> Access {
        match self.state() {
            SessionState::Authenticated => Access::Granted,
            SessionState::Anonymous => Access::Denied,
        }
    }

    /// Anonymous to Authenticated. `max_age_secs` bounds how long the login
    /// stays valid.
    pub fn login(&mut self, max_age_secs: Option<i64>, now: i64) {
        self.logged_in = true;
        self.expires_at = max_age_secs.map(|secs| now.saturating_add(secs.saturating_mul(1000)));
    }

    /// Authenticated to Anonymous. Queued notices survive.
    pub fn logout(&mut self) {
        self.logged_in = false;
        self.expires_at = None;
    }

    /// Queue a notice for the next rendered page.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    /// Notices queued so far, without consuming them.
    pub fn flashes(&self) -> &[String] {
        &self.flashes
    }

    /// Drain the queued notices. Each is shown once.
    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    /// Write the session back into the jar.
    pub fn save(&self, jar: SignedCookieJar) -> SignedCookieJar {
        let cookie = Cookie::build((SESSION_COOKIE, self.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        jar.add(cookie)
    }
}

/// Middleware for guarded routes: runs the handler for an authenticated
/// session, otherwise queues [`LOGIN_REQUIRED`] and redirects to the login
/// page without touching the handler.
pub async fn require_login(jar: SignedCookieJar, request: Request, next: Next) -> Response {
    let mut session = Session::from_jar(&jar);
    match session.guard() {
        Access::Granted => next.run(request).await,
        Access::Denied => {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected request without login"
            );
            session.flash(LOGIN_REQUIRED);
            (session.save(jar), Redirect::to("/")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn new_session_is_anonymous_and_denied() {
        let session = Session::default();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.guard(), Access::Denied);
    }

    #[test]
    fn login_then_logout() {
        let mut session = Session::default();

        session.login(None, 0);
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.guard(), Access::Granted);

        session.logout();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.guard(), Access::Denied);
    }

    #[test]
    fn flashes_are_shown_once() {
        let mut session = Session::default();
        session.flash("first");
        session.flash("second");
        assert_eq!(session.flashes(), ["first", "second"]);

        assert_eq!(session.take_flashes(), vec!["first", "second"]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn logout_keeps_queued_notices() {
        let mut session = Session::default();
        session.login(None, 0);
        session.logout();
        session.flash(LOGGED_OUT);
        assert_eq!(session.flashes(), [LOGGED_OUT]);
    }

    #[test]
    fn encoded_value_decodes_to_same_session() {
        let mut session = Session::default();
        session.login(Some(60), 1_000);
        session.flash("Hello, world; \"quoted\"");

        let value = session.encode();
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(Session::decode(&value, 2_000), session);
    }

    #[test]
    fn garbage_decodes_to_anonymous() {
        assert_eq!(Session::decode("not base64 !!", 0), Session::default());
        let not_json = URL_SAFE_NO_PAD.encode("logged_in=true");
        assert_eq!(Session::decode(&not_json, 0), Session::default());
    }

    #[test]
    fn expired_login_reads_as_anonymous() {
        let mut session = Session::default();
        session.login(Some(10), 0);
        session.flash("pending");
        let value = session.encode();

        let fresh = Session::decode(&value, 9_999);
        assert!(fresh.is_authenticated());

        let stale = Session::decode(&value, 10_000);
        assert!(!stale.is_authenticated());
        assert_eq!(stale.flashes(), ["pending"]);
    }

    #[test]
    fn jar_roundtrip_verifies_signature() {
        let key = Key::generate();
        let mut session = Session::default();
        session.login(None, now_ms());

        let jar = session.save(SignedCookieJar::new(key));
        assert!(Session::from_jar(&jar).is_authenticated());

        let other = SignedCookieJar::new(Key::generate());
        assert_eq!(Session::from_jar(&other), Session::default());
    }
}
