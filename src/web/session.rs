//! Authenticated session against the forum
//!
//! A [`Session`] is created once per run and passed explicitly to every
//! component that needs network access.

use crate::config::{RetryConfig, SiteConfig};
use crate::web::backoff::LinearBackoff;
use crate::web::policy::{Policy, ResponseMeta, SESSION_COOKIE};
use crate::web::{FetchOutcome, FetchedImage, Payload, WebError};
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{redirect::Policy as RedirectPolicy, Client, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use url::Url;

static SESSION_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"a=do_inc_page_header_logout&amp;sessid=(?P<token>[^"&]+)""#)
        .expect("session token pattern is valid")
});

/// How to authenticate a session
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A `PHPSESSID` obtained out of band
    SessionId(String),
    /// Account name and password for the sign-in form
    Password { username: String, password: String },
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
}

/// One logical request, attempted until its policy accepts a response
struct Request<'a> {
    method: Method,
    path: &'a str,
    params: &'a [(&'a str, &'a str)],
    policy: Policy,
}

impl Request<'_> {
    fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn describe(&self) -> String {
        let mut text = match self.method {
            Method::Get => "GET".to_string(),
            Method::Post => "POST".to_string(),
        };
        if !self.path.is_empty() {
            text.push_str(&format!(" path:{}", self.path));
        }
        if let Some(action) = self.param("a") {
            text.push_str(&format!(" action:{}", action));
        }
        if let Some(file) = self.param("filename") {
            text.push_str(&format!(" file:{}", file));
        }
        text
    }
}

/// An HTTP session with the forum
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    site: SiteConfig,
    base_url: Url,
    backoff: LinearBackoff,
    max_attempts: u32,
    total_retries: AtomicU64,
    php_session_id: Option<String>,
    sns_session_id: Option<String>,
}

impl Session {
    /// Builds an unauthenticated session
    pub fn new(site: &SiteConfig, retry: &RetryConfig) -> Result<Self, WebError> {
        let base_url = Url::parse(&site.base_url)?;
        let jar = Arc::new(Jar::default());
        let client = build_client(site, &jar)?;

        Ok(Self {
            client,
            jar,
            site: site.clone(),
            base_url,
            backoff: LinearBackoff::from_config(retry),
            max_attempts: retry.max_attempts,
            total_retries: AtomicU64::new(0),
            php_session_id: None,
            sns_session_id: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The transport session cookie (`PHPSESSID`)
    pub fn php_session_id(&self) -> Option<&str> {
        self.php_session_id.as_deref()
    }

    /// The application session token required by state-changing actions
    pub fn sns_session_id(&self) -> Option<&str> {
        self.sns_session_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.php_session_id.is_some() && self.sns_session_id.is_some()
    }

    /// Retries consumed since the session was created
    pub fn total_retries(&self) -> u64 {
        self.total_retries.load(Ordering::Relaxed)
    }

    /// Logs in to the forum
    ///
    /// Returns `Ok(true)` only when both the session cookie and the session
    /// token were obtained. Refused credentials and an unusable session id
    /// yield `Ok(false)`; only transport failures and exhausted retries are
    /// errors.
    ///
    /// Every attempt starts from an empty cookie jar, so a rejected session
    /// id is never sent along with a later sign-in.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<bool, WebError> {
        self.php_session_id = None;
        self.sns_session_id = None;
        self.reset_cookies()?;

        let php_session_id = match credentials {
            Credentials::SessionId(id) => {
                self.install_session_cookie(id);
                Some(id.clone())
            }
            Credentials::Password { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Ok(false);
                }
                self.sign_in(username, password).await?
            }
        };

        let Some(php_session_id) = php_session_id else {
            tracing::info!("Sign-in refused");
            return Ok(false);
        };
        self.php_session_id = Some(php_session_id);

        self.sns_session_id = self.fetch_session_token().await?;
        if self.sns_session_id.is_none() {
            tracing::info!("Session token not found on the profile page");
        }

        Ok(self.is_authenticated())
    }

    fn reset_cookies(&mut self) -> Result<(), WebError> {
        let jar = Arc::new(Jar::default());
        self.client = build_client(&self.site, &jar)?;
        self.jar = jar;
        Ok(())
    }

    fn install_session_cookie(&self, session_id: &str) {
        self.jar.add_cookie_str(
            &format!("{}={}", SESSION_COOKIE, session_id),
            &self.base_url,
        );
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Option<String>, WebError> {
        let form = [
            ("username", username),
            ("password", password),
            ("m", "pc"),
            ("a", "do_o_login"),
            ("login_params", ""),
            ("is_save", "1"),
        ];
        let request = Request {
            method: Method::Post,
            path: "",
            params: &form,
            policy: Policy::SignIn,
        };

        match self.request(&request).await? {
            Payload::SignedIn(cookie) => Ok(Some(cookie)),
            _ => Ok(None),
        }
    }

    async fn fetch_session_token(&self) -> Result<Option<String>, WebError> {
        let page = self.fetch_page("page_h_prof", &[]).await?;
        Ok(SESSION_TOKEN_RE
            .captures(&page)
            .map(|caps| caps["token"].to_string()))
    }

    /// Fetches a forum page for the given action
    ///
    /// `m=pc` and `a=<action>` are always sent; an `a` key in `extra` is
    /// ignored.
    pub async fn fetch_page(&self, action: &str, extra: &[(&str, &str)]) -> Result<String, WebError> {
        let mut params = vec![("m", "pc"), ("a", action)];
        params.extend(extra.iter().copied().filter(|(k, _)| *k != "a"));

        let request = Request {
            method: Method::Get,
            path: "",
            params: &params,
            policy: Policy::Page,
        };
        let body = self.request(&request).await?;
        Ok(into_text(body))
    }

    /// Fetches the site stylesheet
    pub async fn fetch_stylesheet(&self) -> Result<String, WebError> {
        let request = Request {
            method: Method::Get,
            path: "xhtml_style.php",
            params: &[],
            policy: Policy::Stylesheet,
        };
        let body = self.request(&request).await?;
        Ok(into_text(body))
    }

    /// Fetches an image, turning an intentionally empty slot into a placeholder
    pub async fn fetch_image(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchedImage, WebError> {
        let request = Request {
            method: Method::Get,
            path,
            params,
            policy: Policy::Image,
        };
        match self.request(&request).await? {
            Payload::EmptyImage => Ok(FetchedImage::Placeholder),
            Payload::Body(bytes) => Ok(FetchedImage::Data(bytes)),
            _ => Ok(FetchedImage::Placeholder),
        }
    }

    /// Fetches a JavaScript file
    pub async fn fetch_script(&self, path: &str) -> Result<String, WebError> {
        let request = Request {
            method: Method::Get,
            path,
            params: &[],
            policy: Policy::Script,
        };
        let body = self.request(&request).await?;
        Ok(into_text(body))
    }

    /// Attempts a request until its policy accepts a response
    ///
    /// Invalid responses are retried with a linear backoff; a transport
    /// failure ends the request at once.
    async fn request(&self, request: &Request<'_>) -> Result<Payload, WebError> {
        let url = self.resolve(request.path)?;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.backoff.delay(attempt);
                tracing::warn!(
                    "Retry {} after {} sec.",
                    request.describe(),
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                self.total_retries.fetch_add(1, Ordering::Relaxed);
            }

            match self.attempt(&url, request).await {
                FetchOutcome::Success(payload) => return Ok(payload),
                FetchOutcome::Invalid(reason) => {
                    tracing::debug!(
                        "Invalid {} response for {}: {}",
                        request.policy.label(),
                        request.describe(),
                        reason
                    );
                }
                FetchOutcome::TransportFailure(source) => {
                    return Err(WebError::Transport {
                        url: url.to_string(),
                        source,
                    });
                }
            }
        }

        Err(WebError::RetryExhausted {
            target: request.describe(),
            attempts: self.max_attempts,
        })
    }

    async fn attempt(&self, url: &Url, request: &Request<'_>) -> FetchOutcome {
        let builder = match request.method {
            Method::Get => self.client.get(url.clone()).query(request.params),
            Method::Post => self.client.post(url.clone()).form(request.params),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportFailure(e),
        };

        let meta = response_meta(&response);
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return FetchOutcome::TransportFailure(e),
        };

        FetchOutcome::from_verdict(request.policy.judge(&meta, &body), body)
    }

    fn resolve(&self, path: &str) -> Result<Url, WebError> {
        if path.is_empty() {
            Ok(self.base_url.clone())
        } else {
            Ok(self.base_url.join(path)?)
        }
    }
}

/// Redirects are never followed: the sign-in response is a redirect whose
/// cookies decide the outcome.
fn build_client(site: &SiteConfig, jar: &Arc<Jar>) -> Result<Client, WebError> {
    Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(site.request_timeout())
        .redirect(RedirectPolicy::none())
        .cookie_provider(Arc::clone(jar))
        .danger_accept_invalid_certs(site.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(WebError::Client)
}

fn response_meta(response: &Response) -> ResponseMeta {
    let headers = response.headers();
    ResponseMeta {
        status: response.status().as_u16(),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string(),
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok()),
        session_cookie: response
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .map(|c| c.value().to_string()),
    }
}

fn into_text(payload: Payload) -> String {
    match payload {
        Payload::Body(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => String::new(),
    }
}
