//! Login state for one WebClass run.
//!
//! The server embeds a fresh anti-forgery token (`acs_`) in nearly every
//! response and expects the latest one echoed on the next request. Requests
//! made with a stale token are not rejected: they silently get the
//! logged-out view. [`Session`] owns the token, and every operation that
//! talks to the server takes it by `&mut`, so there is exactly one writer.

use core::fmt;
use std::sync::{Arc, LazyLock};

use compact_str::CompactString;
use regex::Regex;
use reqwest::{
    Client, RequestBuilder, Url,
    cookie::{CookieStore, Jar},
    header::COOKIE,
};

use crate::{Error, Result, config::Config};

pub const SESSION_COOKIE: &str = "WBT_Session";

/// Token value a session holds before it has ever talked to the server.
pub const PLACEHOLDER_TOKEN: &str = "12345678";

/// Anything at or below this many characters is a login page or an error
/// stub, whatever the status code says.
pub const MIN_PAGE_CHARS: usize = 1000;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"acs_=([a-zA-Z0-9]+)").unwrap());

/// The last `acs_=` value in `text`. Earlier occurrences may be stale.
pub fn last_token(text: &str) -> Option<CompactString> {
    TOKEN
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| CompactString::new(m.as_str()))
}

/// Session expiry shows up only as a short body.
pub fn ensure_alive(body: &str) -> Result<()> {
    let chars = body.chars().count();
    if chars <= MIN_PAGE_CHARS {
        tracing::error!(target: "session", "response has only {chars} characters, session is not alive");
        return Err(Error::Auth("session expired or login rejected".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct Session {
    config: Config,
    client: Client,
    jar: Arc<Jar>,
    token: CompactString,
    cookie: Option<CompactString>,
    authenticated: bool,
}

impl Session {
    /// A fresh, logged-out session with its own connection pool and cookie jar.
    pub fn new(config: Config) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            config,
            client: builder.build()?,
            jar,
            token: CompactString::const_new(PLACEHOLDER_TOKEN),
            cookie: None,
            authenticated: false,
        })
    }

    /// Picks up a session cookie obtained elsewhere (e.g. from a browser)
    /// instead of posting credentials. The token starts as the placeholder
    /// and is replaced by the first page fetched.
    pub fn resume(config: Config, cookie: impl Into<CompactString>) -> Result<Self> {
        let mut session = Self::new(config)?;
        session.cookie = Some(cookie.into());
        session.authenticated = true;
        tracing::info!(target: "session", "resumed from existing {SESSION_COOKIE}");
        Ok(session)
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub const fn require_login(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    pub fn set_token(&mut self, token: CompactString) {
        tracing::debug!(target: "session", "token {} -> {token}", self.token);
        self.token = token;
    }

    /// Adopts the last token found in `body`. Returns `false` and keeps the
    /// current token if there is none.
    pub fn rotate(&mut self, body: &str) -> bool {
        match last_token(body) {
            Some(token) => {
                self.set_token(token);
                true
            }
            None => false,
        }
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            tracing::error!(target: "session", "username or password is unset");
            return Err(Error::InvalidCredentials);
        }

        let form = [
            ("username", credentials.username.as_str()),
            ("val", credentials.password.as_str()),
        ];
        let response = self
            .client
            .post(self.config.url("/webclass/login.php"))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "session", "login request failed: {e:?}");
                Error::Auth(compact_str::format_compact!("login request failed: {e}"))
            })?;

        let final_url = response.url().clone();
        let cookie = response
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| CompactString::new(c.value()));
        let body = response.text().await.map_err(|e| {
            tracing::error!(target: "session", "login response unreadable: {e:?}");
            Error::Auth(compact_str::format_compact!("login response unreadable: {e}"))
        })?;

        let Some(token) = last_token(&body) else {
            tracing::error!(target: "session", "no token in login response ({} bytes)", body.len());
            return Err(Error::Auth("no token in login response".into()));
        };

        // Redirects after the POST may have carried the cookie instead of the final response.
        let cookie = cookie.or_else(|| self.jar_cookie(&final_url));
        if cookie.is_none() {
            tracing::warn!(target: "session", "login succeeded without a {SESSION_COOKIE} cookie");
        }

        self.set_token(token);
        self.cookie = cookie;
        self.authenticated = true;
        tracing::info!(target: "session", "\x1b[32mlogin success\x1b[0m");
        Ok(())
    }

    /// Ends the session on the server and resets `self` to a pristine
    /// logged-out session with a new client. Local state is discarded even
    /// if the logout request fails.
    pub async fn logout(&mut self) -> Result<()> {
        self.require_login()?;

        let request = self.authed(self.client.get(self.config.url("/webclass/logout.php")));
        let sent = request.send().await;

        self.authenticated = false;
        self.cookie = None;
        self.token = CompactString::const_new(PLACEHOLDER_TOKEN);
        let fresh = Self::new(self.config.clone())?;
        *self = fresh;

        sent?;
        tracing::info!(target: "session", "logout success");
        Ok(())
    }

    /// POSTs the lecture-scoped login and adopts the token it returns. Must
    /// precede every request into a lecture.
    pub async fn enter_lecture(&mut self, lecture_id: &str) -> Result<()> {
        self.require_login()?;

        let url = self.config.url(&format!(
            "/webclass/course.php/{lecture_id}/login?acs_={}",
            self.token
        ));
        let body = self
            .authed(self.client.post(url))
            .form(&[("acs_", self.token.as_str())])
            .send()
            .await?
            .text()
            .await?;

        if !self.rotate(&body) {
            tracing::warn!(target: "session", "[{lecture_id}] lecture login returned no token");
            return Err(Error::TokenMissing(compact_str::format_compact!(
                "lecture {lecture_id} login"
            )));
        }
        Ok(())
    }

    /// GETs `url` with the session cookie attached. The status code is not
    /// inspected; callers decide liveness from the body.
    pub async fn get_text(&self, url: String) -> Result<String> {
        self.require_login()?;
        let body = self.authed(self.client.get(url)).send().await?.text().await?;
        Ok(body)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, format!("{SESSION_COOKIE}={cookie}")),
            None => builder,
        }
    }

    fn jar_cookie(&self, url: &Url) -> Option<CompactString> {
        let header = self.jar.cookies(url)?;
        header
            .to_str()
            .ok()?
            .split("; ")
            .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
            .map(CompactString::new)
    }
}
