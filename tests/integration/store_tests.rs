//! Entry store and index tests on a real dump directory

use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;
use tslove_dump::output::{write_index, OutputLayout};
use tslove_dump::storage::{open_store, EntryStore, StoreError, STORE_FILE_NAME};
use tslove_dump::EntryRecord;

fn record(id: &str, title: &str, predecessor: Option<&str>) -> EntryRecord {
    EntryRecord {
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(2011, 3, 4)
            .unwrap()
            .and_hms_opt(21, 5, 0)
            .unwrap(),
        predecessor_id: predecessor.map(str::to_string),
        id: id.to_string(),
    }
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let mut store = open_store(dir.path()).unwrap();
    assert!(store.is_empty());
    store.insert(record("2", "二つ目", Some("1")));
    store.insert(record("1", "最初", None));
    store.save().unwrap();

    let reopened = open_store(dir.path()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.get("2"), Some(&record("2", "二つ目", Some("1"))));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(STORE_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(json["1"]["date"], "2011-03-04 21:05:00");
    assert_eq!(json["1"]["prev_diary_id"], serde_json::Value::Null);
}

#[test]
fn test_record_under_wrong_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STORE_FILE_NAME),
        r#"{"5": {"title": "t", "date": "2011-03-04 21:05:00", "prev_diary_id": null, "diary_id": "6"}}"#,
    )
    .unwrap();

    assert!(matches!(
        open_store(dir.path()),
        Err(StoreError::Inconsistent { .. })
    ));
}

#[test]
fn test_index_lists_newest_first() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    layout.prepare().unwrap();

    let mut store = open_store(&layout.tools_dir()).unwrap();
    store.insert(record("9", "九", Some("10")));
    store.insert(record("10", "十", None));
    store.insert(record("100", "百 & more", Some("9")));

    write_index(&store, &layout.index_file()).unwrap();

    let index = fs::read_to_string(layout.index_file()).unwrap();
    let pos = |needle: &str| index.find(needle).unwrap();
    assert!(pos("./100.html") < pos("./10.html"));
    assert!(pos("./10.html") < pos("./9.html"));
    assert!(index.contains("百 &amp; more"));
}
