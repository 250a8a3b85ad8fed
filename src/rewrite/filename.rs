//! Local file names for remote assets

use regex::Regex;
use std::sync::LazyLock;

static SKIN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"image_filename=(?P<name>[^&;?]+)").expect("skin image pattern is valid")
});

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[?&;])filename=(?P<name>[^&;?]+)").expect("image pattern is valid")
});

/// Resolves the local file name of an image reference
///
/// `img_skin.php` references name the file in `image_filename`, `img.php`
/// references in `filename`. Anything else keeps the last path segment,
/// without its query string.
///
/// Resolving an already resolved name returns it unchanged.
///
/// # Examples
///
/// ```
/// use tslove_dump::rewrite::resolve_asset_filename;
///
/// assert_eq!(
///     resolve_asset_filename("./img.php?filename=a_1_2.jpg&w=120&h=120&m=pc"),
///     "a_1_2.jpg"
/// );
/// assert_eq!(resolve_asset_filename("./skin/default/img/dot.gif"), "dot.gif");
/// ```
pub fn resolve_asset_filename(path: &str) -> String {
    if let Some(caps) = SKIN_IMAGE_RE.captures(path) {
        return caps["name"].to_string();
    }
    if let Some(caps) = IMAGE_RE.captures(path) {
        return caps["name"].to_string();
    }
    basename(path)
}

/// Local file name of a script reference
pub fn script_filename(path: &str) -> String {
    basename(path)
}

fn basename(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path).to_string()
}
