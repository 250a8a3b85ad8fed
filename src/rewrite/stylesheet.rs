//! Stylesheet image references
//!
//! The site stylesheet points at its images with `url(...)`. The dump
//! stores those images next to `tslove.css` and rewrites every reference
//! to `url(./<file name>)`.

use crate::rewrite::filename::resolve_asset_filename;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"url\((?P<path>[^)]+)\)").expect("url pattern is valid"));

fn unquote(path: &str) -> &str {
    path.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Collects the image paths referenced by a stylesheet
///
/// Paths listed in `excluded` are left out.
pub fn stylesheet_image_paths(css: &str, excluded: &[String]) -> BTreeSet<String> {
    URL_RE
        .captures_iter(css)
        .map(|caps| unquote(&caps["path"]).to_string())
        .filter(|path| !path.is_empty() && !excluded.iter().any(|e| e == path))
        .collect()
}

/// Rewrites every `url(...)` reference to the local copy of the image
///
/// Excluded references are kept as they are, since no local copy is made
/// for them.
pub fn rewrite_stylesheet(css: &str, excluded: &[String]) -> String {
    URL_RE
        .replace_all(css, |caps: &Captures<'_>| {
            let path = unquote(&caps["path"]);
            if path.is_empty() || excluded.iter().any(|e| e == path) {
                caps[0].to_string()
            } else {
                format!("url(./{})", resolve_asset_filename(path))
            }
        })
        .into_owned()
}
