//! Index page of a dump
//!
//! Lists every known diary entry, newest first, linking to the local
//! copies.

use crate::diary::EntryRecord;
use crate::html::escape;
use crate::output::OutputError;
use crate::storage::EntryStore;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// Orders diary ids newest first: numerically, then as text
fn newest_first(a: &EntryRecord, b: &EntryRecord) -> Ordering {
    match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
        (Ok(x), Ok(y)) => y.cmp(&x),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.id.cmp(&a.id),
    }
}

/// Renders the index page for the given records
pub fn render_index(records: &[&EntryRecord]) -> String {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| newest_first(a, b));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html>\n<head>\n");
    html.push_str("<meta charset=\"utf-8\"/>\n");
    html.push_str("<title>Index of diary</title>\n");
    html.push_str("</head>\n<body>\n");
    html.push_str("<h1>Index of diary</h1>\n");
    html.push_str("<table>\n");
    html.push_str("<tr><th>Date</th><th>Title</th></tr>\n");

    for record in sorted {
        html.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"./{}.html\">{}</a></td></tr>\n",
            record.display_date(),
            escape(&record.id),
            escape(&record.title)
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Writes `index.html` for every record of the store
///
/// # Arguments
///
/// * `store` - The entry store of the dump
/// * `path` - Where to write the index page
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the index
/// * `Err(OutputError)` - Failed to write the file
pub fn write_index(store: &dyn EntryStore, path: &Path) -> Result<(), OutputError> {
    let html = render_index(&store.records());

    fs::write(path, html).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote index of {} diaries to {}", store.len(), path.display());
    Ok(())
}
