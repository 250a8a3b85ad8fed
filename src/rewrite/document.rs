//! Rewriting of diary pages for offline viewing

use crate::html::selector;
use crate::rewrite::edits::Edits;
use crate::rewrite::filename::{resolve_asset_filename, script_filename};
use crate::rewrite::LinkRewriter;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Edge of the square thumbnails served with `w=120&h=120`
const THUMBNAIL_EDGE: u32 = 120;
const THUMBNAIL_QUERY: &str = "w=120&h=120";

static DIARY_LIST_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./)?\?m=pc&a=page_fh_diary_list").expect("diary list pattern is valid")
});

static DIARY_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./)?\?m=pc&a=page_fh_diary").expect("diary link pattern is valid")
});

static ACTION_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./)?\?m=pc&a=.+").expect("action link pattern is valid")
});

static IMAGE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./)?img\.php.+").expect("image link pattern is valid")
});

/// Asset references found in a page
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssetReferences {
    /// `src` of every `<img>`
    pub images: BTreeSet<String>,
    /// `src` of every `<script>` that has one
    pub scripts: BTreeSet<String>,
}

/// Lists the images and scripts a page refers to
pub fn asset_references(html: &str) -> AssetReferences {
    let document = Html::parse_document(html);
    let sources = |css: &str| -> BTreeSet<String> {
        document
            .select(&selector(css))
            .filter_map(|element| element.value().attr("src"))
            .map(str::to_string)
            .collect()
    };

    AssetReferences {
        images: sources("img[src]"),
        scripts: sources("script[src]"),
    }
}

/// Rewrites diary pages so they can be browsed from the dump directory
///
/// Scripts and form controls are stripped, links between diary pages are
/// pointed at the local copies and assets at the `images/`, `scripts/`
/// and `stylesheet/` directories.
#[derive(Debug, Clone)]
pub struct DocumentRewriter {
    excluded_scripts: Vec<String>,
    output_dir: PathBuf,
}

impl DocumentRewriter {
    /// Creates a rewriter for pages stored in `output_dir`
    ///
    /// `excluded_scripts` are prefixes of script paths that are dropped
    /// from the pages and never downloaded.
    pub fn new(output_dir: impl Into<PathBuf>, excluded_scripts: Vec<String>) -> Self {
        Self {
            excluded_scripts,
            output_dir: output_dir.into(),
        }
    }

    pub fn is_excluded_script(&self, src: &str) -> bool {
        self.excluded_scripts.iter().any(|prefix| src.starts_with(prefix.as_str()))
    }

    /// Rewrites a page
    ///
    /// Rewriting an already rewritten page returns it unchanged.
    pub fn rewrite(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut edits = Edits::default();

        self.strip_scripts(&document, &mut edits);
        strip_form_items(&document, &mut edits);
        self.fix_links(&document, &mut edits);

        edits.apply(&document)
    }

    fn strip_scripts(&self, document: &Html, edits: &mut Edits) {
        for script in edits.live(document, &selector("script")) {
            let remove = match edits.attr(&script, "src") {
                Some(src) => self.is_excluded_script(&src),
                None => !script.text().collect::<String>().contains("url2cmd"),
            };
            if remove {
                edits.remove(&script);
            }
        }

        for link in edits.live(document, &selector("a[onclick]")) {
            edits.remove(&link);
        }
    }

    fn fix_links(&self, document: &Html, edits: &mut Edits) {
        for link in edits.live(document, &selector(r#"link[rel~="stylesheet"]"#)) {
            edits.set_attr(&link, "href", "./stylesheet/tslove.css");
        }

        for anchor in edits.live(document, &selector("a[href]")) {
            let Some(href) = edits.attr(&anchor, "href") else {
                continue;
            };

            if let Some(target) = page_link_target(&href) {
                edits.set_attr(&anchor, "href", target);
                edits.remove_attr(&anchor, "rel");
                edits.remove_attr(&anchor, "target");
            } else if IMAGE_LINK_RE.is_match(&href) {
                edits.set_attr(
                    &anchor,
                    "href",
                    format!("./images/{}", resolve_asset_filename(&href)),
                );
            }
        }

        for image in edits.live(document, &selector("img[src]")) {
            let Some(src) = edits.attr(&image, "src") else {
                continue;
            };
            let filename = resolve_asset_filename(&src);

            if src.contains(THUMBNAIL_QUERY) {
                let (width, height) = self.thumbnail_size(&filename);
                if let Some(width) = width {
                    edits.set_attr(&image, "width", width.to_string());
                }
                if let Some(height) = height {
                    edits.set_attr(&image, "height", height.to_string());
                }
            }
            edits.set_attr(&image, "src", format!("./images/{}", filename));
        }

        for script in edits.live(document, &selector("script[src]")) {
            if let Some(src) = edits.attr(&script, "src") {
                edits.set_attr(&script, "src", format!("scripts/{}", script_filename(&src)));
            }
        }
    }

    /// Display size of a thumbnail, fitting its longer side to 120 pixels
    fn thumbnail_size(&self, filename: &str) -> (Option<u32>, Option<u32>) {
        let path = self.output_dir.join("images").join(filename);
        thumbnail_size_of(&path)
    }
}

impl LinkRewriter for DocumentRewriter {
    fn rewrite_document(&self, html: &str) -> String {
        self.rewrite(html)
    }
}

fn strip_form_items(document: &Html, edits: &mut Edits) {
    for css in ["div#commentForm", "div.operation"] {
        for element in edits.live(document, &selector(css)) {
            edits.remove(&element);
        }
    }

    for form in edits.live(document, &selector("form")) {
        edits.unwrap(&form);
    }

    for input in edits.live(document, &selector("input")) {
        edits.remove(&input);
    }
}

/// Local target of a link to a forum page, if it is one
fn page_link_target(href: &str) -> Option<String> {
    if DIARY_LIST_LINK_RE.is_match(href) {
        return Some("./index.html".to_string());
    }
    if DIARY_LINK_RE.is_match(href) {
        let target = crate::diary::entry_id_from_href(href)
            .map(|id| format!("./{}.html", id))
            .unwrap_or_else(|| "#".to_string());
        return Some(target);
    }
    if href == "./" {
        return Some("./index.html".to_string());
    }
    if ACTION_LINK_RE.is_match(href) {
        return Some("#".to_string());
    }
    None
}

fn thumbnail_size_of(path: &Path) -> (Option<u32>, Option<u32>) {
    let edge = Some(THUMBNAIL_EDGE);
    match image::image_dimensions(path) {
        Ok((width, height)) if width > height => (edge, None),
        Ok((width, height)) if width < height => (None, edge),
        _ => (edge, edge),
    }
}
