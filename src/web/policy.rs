//! Response validation policies
//!
//! The forum answers many failures with HTTP 200, so besides its status a
//! response is judged by its content type and, for pages, by its body. Each resource kind has one
//! named policy; the retry loop only ever sees the resulting [`Verdict`].

use regex::Regex;
use std::sync::LazyLock;

/// Title of the forum's soft failure page
pub const SOFT_FAILURE_TITLE: &str = "ページが表示できませんでした";

/// Name of the transport-level session cookie
pub const SESSION_COOKIE: &str = "PHPSESSID";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(?P<title>.+)</title>").expect("title pattern is valid"));

/// The kind of resource a request is expected to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// An HTML page of the forum
    Page,
    /// The site stylesheet
    Stylesheet,
    /// An image; an empty HTML answer stands for an intentionally empty slot
    Image,
    /// A JavaScript file
    Script,
    /// The sign-in form submission
    SignIn,
}

/// The parts of a response a policy looks at besides the body
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    pub status: u16,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub session_cookie: Option<String>,
}

/// Outcome of judging one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The body is what was asked for
    Accept,
    /// An intentionally empty image slot
    EmptyImage,
    /// Sign-in succeeded with the given session cookie
    SignedIn(String),
    /// Sign-in was refused (bad credentials)
    Denied,
    /// The response must be retried
    Invalid(String),
}

impl Policy {
    /// Judges a response against this policy
    ///
    /// Error statuses are retried whatever the body says.
    pub fn judge(self, meta: &ResponseMeta, body: &[u8]) -> Verdict {
        if meta.status >= 400 {
            return Verdict::Invalid(format!("status {}", meta.status));
        }

        match self {
            Policy::Page => judge_page(meta, body),
            Policy::Stylesheet => require_content_type(meta, "text/css"),
            Policy::Script => require_content_type(meta, "text/javascript"),
            Policy::Image => {
                if meta.content_type.starts_with("image/") {
                    Verdict::Accept
                } else if meta.content_type.starts_with("text/html") && meta.content_length == Some(0)
                {
                    Verdict::EmptyImage
                } else {
                    unexpected_content_type(meta, "image/*")
                }
            }
            Policy::SignIn => {
                if let Some(cookie) = &meta.session_cookie {
                    Verdict::SignedIn(cookie.clone())
                } else if meta.status == 302 {
                    Verdict::Denied
                } else {
                    Verdict::Invalid(format!(
                        "sign-in answered status {} without a session cookie",
                        meta.status
                    ))
                }
            }
        }
    }

    /// Short name used in log lines
    pub fn label(self) -> &'static str {
        match self {
            Policy::Page => "page",
            Policy::Stylesheet => "stylesheet",
            Policy::Image => "image",
            Policy::Script => "script",
            Policy::SignIn => "sign-in",
        }
    }
}

fn judge_page(meta: &ResponseMeta, body: &[u8]) -> Verdict {
    if !meta.content_type.starts_with("text/html") {
        return unexpected_content_type(meta, "text/html");
    }

    let text = String::from_utf8_lossy(body);
    match TITLE_RE.captures(&text) {
        Some(caps) if &caps["title"] != SOFT_FAILURE_TITLE => Verdict::Accept,
        Some(_) => Verdict::Invalid("soft failure page".to_string()),
        None => Verdict::Invalid("page has no title".to_string()),
    }
}

fn require_content_type(meta: &ResponseMeta, expected: &str) -> Verdict {
    if meta.content_type.starts_with(expected) {
        Verdict::Accept
    } else {
        unexpected_content_type(meta, expected)
    }
}

fn unexpected_content_type(meta: &ResponseMeta, expected: &str) -> Verdict {
    Verdict::Invalid(format!(
        "expected {}, got content type '{}'",
        expected, meta.content_type
    ))
}
