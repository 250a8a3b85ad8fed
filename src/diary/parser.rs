//! Diary page parser
//!
//! Extracts an [`EntryRecord`] from a diary page, whether it was just
//! fetched or read back from the local mirror.

use crate::diary::record::{EntryRecord, PAGE_DATE_FORMAT};
use crate::diary::DiaryError;
use crate::html::{selector, stripped_text};
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// Error fragment shown by the forum for an unknown diary id
pub const NO_SUCH_ENTRY_MARKER: &str = "<td>該当する日記が見つかりません。</td>";

/// Link to a diary entry, as written in the forum's pages
static ENTRY_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./)?\?m=pc&a=page_fh_diary&target_c_diary_id=(?P<id>[0-9]+)")
        .expect("entry link pattern is valid")
});

static PREDECESSOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"target_c_diary_id=(?P<id>[0-9]+)").expect("predecessor pattern is valid")
});

/// Fails with [`DiaryError::NoSuchEntry`] when the page is the forum's
/// "no such diary" answer
pub fn check_entry_page(id: &str, html: &str) -> Result<(), DiaryError> {
    if html.contains(NO_SUCH_ENTRY_MARKER) {
        return Err(DiaryError::NoSuchEntry(id.to_string()));
    }
    Ok(())
}

/// Parses a diary page into an entry record
///
/// # Arguments
///
/// * `id` - The diary id the page was fetched or stored under
/// * `html` - The page source
///
/// # Returns
///
/// * `Ok(EntryRecord)` - Title, date and predecessor of the entry
/// * `Err(DiaryError)` - The page is not a readable diary entry
pub fn parse_entry(id: &str, html: &str) -> Result<EntryRecord, DiaryError> {
    check_entry_page(id, html)?;

    let document = Html::parse_document(html);

    let title = document
        .select(&selector("p.heading"))
        .next()
        .map(stripped_text)
        .ok_or_else(|| DiaryError::MissingElement {
            id: id.to_string(),
            element: "p.heading",
        })?;

    let date_text = document
        .select(&selector("div.dparts.diaryDetailBox div dl dt"))
        .next()
        .map(stripped_text)
        .ok_or_else(|| DiaryError::MissingElement {
            id: id.to_string(),
            element: "diaryDetailBox dt",
        })?;

    let date = NaiveDateTime::parse_from_str(&date_text, PAGE_DATE_FORMAT).map_err(|source| {
        DiaryError::BadDate {
            id: id.to_string(),
            value: date_text.clone(),
            source,
        }
    })?;

    let predecessor_id = document
        .select(&selector("p.prev a[href]"))
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| PREDECESSOR_RE.captures(href))
        .map(|caps| caps["id"].to_string());

    Ok(EntryRecord {
        title,
        date,
        predecessor_id,
        id: id.to_string(),
    })
}

/// Extracts the diary id from a link to a diary entry
pub fn entry_id_from_href(href: &str) -> Option<String> {
    ENTRY_LINK_RE
        .captures(href)
        .map(|caps| caps["id"].to_string())
}

/// Finds the newest diary id on the member's profile page
///
/// The profile page lists recent diaries in `ul.articleList`, newest first.
pub fn find_latest_entry_id(profile_html: &str) -> Option<String> {
    let document = Html::parse_document(profile_html);
    let list = document.select(&selector("ul.articleList")).next()?;
    let href = list.select(&selector("a[href]")).next()?.value().attr("href")?;
    entry_id_from_href(href)
}
