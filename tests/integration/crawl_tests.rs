//! Crawl tests: walking the diary chain, resuming and stopping

use crate::common::{diary_page, fast_pacer, fast_retry, site_config, ScriptedForum};
use std::fs;
use tempfile::TempDir;
use tslove_dump::crawler::{dump_stylesheet, find_start_id, Coordinator, CrawlRange, Interrupt};
use tslove_dump::diary::NO_SUCH_ENTRY_MARKER;
use tslove_dump::output::{OutputLayout, StopReason};
use tslove_dump::rewrite::DocumentRewriter;
use tslove_dump::storage::{open_store, EntryStore, JsonStore};
use tslove_dump::{Session, TsloveError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prepared_layout(dir: &TempDir) -> OutputLayout {
    let layout = OutputLayout::new(dir.path());
    layout.prepare().unwrap();
    layout
}

fn coordinator<'a>(
    forum: &'a ScriptedForum,
    layout: &OutputLayout,
    store: JsonStore,
    interrupt: Interrupt,
) -> Coordinator<'a, ScriptedForum, DocumentRewriter, JsonStore> {
    Coordinator::new(
        forum,
        DocumentRewriter::new(layout.base(), Vec::new()),
        store,
        layout.clone(),
        fast_pacer(),
        interrupt,
    )
}

#[tokio::test]
async fn test_crawl_walks_chain_to_first_diary() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let forum = ScriptedForum::new()
        .with_diary("30", Some("20"))
        .with_diary("20", Some("10"))
        .with_diary("10", None);
    let store = open_store(&layout.tools_dir()).unwrap();

    let mut crawl = coordinator(&forum, &layout, store, Interrupt::new());
    let stats = crawl.run(&CrawlRange::new("30", None)).await.unwrap();

    assert_eq!(forum.requested(), vec!["30", "20", "10"]);
    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.stop_reason, StopReason::ChainStart);

    for id in ["30", "20", "10"] {
        assert!(layout.entry_file(id).exists(), "page {} missing", id);
    }

    // The store was flushed to disk
    let reopened = open_store(&layout.tools_dir()).unwrap();
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.get("20").unwrap().predecessor_id.as_deref(), Some("10"));
    assert_eq!(reopened.get("10").unwrap().predecessor_id, None);
}

#[tokio::test]
async fn test_crawl_stops_at_end_id() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let forum = ScriptedForum::new()
        .with_diary("30", Some("20"))
        .with_diary("20", Some("10"))
        .with_diary("10", None);

    let mut crawl = coordinator(&forum, &layout, JsonStore::new_in_memory(), Interrupt::new());
    let stats = crawl
        .run(&CrawlRange::new("30", Some("20".to_string())))
        .await
        .unwrap();

    assert_eq!(forum.requested(), vec!["30", "20"]);
    assert_eq!(stats.stop_reason, StopReason::ReachedEnd);
    assert!(!layout.entry_file("10").exists());
}

#[tokio::test]
async fn test_second_run_skips_recorded_diaries() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let forum = ScriptedForum::new()
        .with_diary("2", Some("1"))
        .with_diary("1", None);

    let store = open_store(&layout.tools_dir()).unwrap();
    coordinator(&forum, &layout, store, Interrupt::new())
        .run(&CrawlRange::new("2", None))
        .await
        .unwrap();

    let rerun = ScriptedForum::new();
    let store = open_store(&layout.tools_dir()).unwrap();
    let stats = coordinator(&rerun, &layout, store, Interrupt::new())
        .run(&CrawlRange::new("2", None))
        .await
        .unwrap();

    assert!(rerun.requested().is_empty());
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.fetched, 0);
    assert_eq!(stats.stop_reason, StopReason::ChainStart);
}

#[tokio::test]
async fn test_local_page_without_record_is_recovered() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    fs::write(layout.entry_file("5"), diary_page("5", "手元の日記", Some("4"))).unwrap();
    let forum = ScriptedForum::new().with_diary("4", None);

    let mut crawl = coordinator(&forum, &layout, JsonStore::new_in_memory(), Interrupt::new());
    let stats = crawl.run(&CrawlRange::new("5", None)).await.unwrap();

    assert_eq!(forum.requested(), vec!["4"]);
    assert_eq!(stats.recovered, 1);
    assert_eq!(stats.fetched, 1);
    assert_eq!(crawl.store().get("5").unwrap().title, "手元の日記");
}

#[tokio::test]
async fn test_interrupt_before_first_diary() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let forum = ScriptedForum::new().with_diary("9", None);
    let interrupt = Interrupt::new();
    interrupt.trigger();

    let mut crawl = coordinator(&forum, &layout, JsonStore::new_in_memory(), interrupt);
    let stats = crawl.run(&CrawlRange::new("9", None)).await.unwrap();

    assert!(forum.requested().is_empty());
    assert_eq!(stats.stop_reason, StopReason::Interrupted);
    assert_eq!(stats.visited(), 0);
}

#[tokio::test]
async fn test_looping_chain_stops() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let forum = ScriptedForum::new()
        .with_diary("2", Some("1"))
        .with_diary("1", Some("2"));

    let mut crawl = coordinator(&forum, &layout, JsonStore::new_in_memory(), Interrupt::new());
    let stats = crawl.run(&CrawlRange::new("2", None)).await.unwrap();

    assert_eq!(forum.requested(), vec!["2", "1"]);
    assert_eq!(stats.stop_reason, StopReason::Cycle);
}

#[tokio::test]
async fn test_missing_diary_aborts_and_keeps_progress() {
    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let missing = format!(
        "<html><head><title>日記</title></head><body><table><tr>{}</tr></table></body></html>",
        NO_SUCH_ENTRY_MARKER
    );
    let forum = ScriptedForum::new()
        .with_diary("8", Some("7"))
        .with_page("7", &missing);
    let store = open_store(&layout.tools_dir()).unwrap();

    let mut crawl = coordinator(&forum, &layout, store, Interrupt::new());
    let result = crawl.run(&CrawlRange::new("8", None)).await;

    match result {
        Err(TsloveError::Entry { id, .. }) => assert_eq!(id, "7"),
        other => panic!("expected a failed entry, got {:?}", other.map(|s| s.stop_reason)),
    }
    assert!(!layout.entry_file("7").exists());

    let reopened = open_store(&layout.tools_dir()).unwrap();
    assert!(reopened.contains("8"));
    assert!(!reopened.contains("7"));
}

#[tokio::test]
async fn test_crawl_through_session() {
    let server = MockServer::start().await;
    for (id, prev) in [("12", Some("11")), ("11", None)] {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("a", "page_fh_diary"))
            .and(query_param("target_c_diary_id", id))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                diary_page(id, &format!("日記{}", id), prev).into_bytes(),
                "text/html",
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();

    let mut crawl = Coordinator::new(
        &session,
        DocumentRewriter::new(layout.base(), Vec::new()),
        JsonStore::new_in_memory(),
        layout.clone(),
        fast_pacer(),
        Interrupt::new(),
    );
    let stats = crawl.run(&CrawlRange::new("12", None)).await.unwrap();

    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.retries, 0);

    let page = fs::read_to_string(layout.entry_file("12")).unwrap();
    assert!(page.contains("./stylesheet/tslove.css"));
    assert!(page.contains("./11.html"));
}

#[tokio::test]
async fn test_recorded_start_id_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let seed = ScriptedForum::new().with_diary("3", None);
    let store = open_store(&layout.tools_dir()).unwrap();
    coordinator(&seed, &layout, store, Interrupt::new())
        .run(&CrawlRange::new("3", None))
        .await
        .unwrap();

    let session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    let mut crawl = Coordinator::new(
        &session,
        DocumentRewriter::new(layout.base(), Vec::new()),
        open_store(&layout.tools_dir()).unwrap(),
        layout.clone(),
        fast_pacer(),
        Interrupt::new(),
    );
    let stats = crawl.run(&CrawlRange::new("3", None)).await.unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.fetched, 0);
}

#[tokio::test]
async fn test_start_id_from_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("a", "page_h_prof"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            br#"<html><head><title>T's LOVE</title></head><body>
            <ul class="articleList"><li><a href="./?m=pc&amp;a=page_fh_diary&amp;target_c_diary_id=4321">x</a></li></ul>
            </body></html>"#
                .to_vec(),
            "text/html",
        ))
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(1)).unwrap();
    assert_eq!(find_start_id(&session).await.unwrap(), "4321");
}

#[tokio::test]
async fn test_member_without_diary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><head><title>T's LOVE</title></head><body></body></html>".to_vec(),
            "text/html",
        ))
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(1)).unwrap();
    assert!(matches!(
        find_start_id(&session).await,
        Err(TsloveError::NoDiary)
    ));
}

#[tokio::test]
async fn test_dump_stylesheet_with_images() {
    let server = MockServer::start().await;
    let css = "body { background: url(./img.php?m=pc&amp;filename=skin_bg.gif); }\n\
               .logo { background: url(\"./skin/default/img/logo.png\"); }";
    Mock::given(method("GET"))
        .and(path("/xhtml_style.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(css.as_bytes().to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img.php"))
        .and(query_param("filename", "skin_bg.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"GIF89a".to_vec(), "image/gif"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/skin/default/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let layout = prepared_layout(&dir);
    let session = Session::new(&site_config(&server), &fast_retry(2)).unwrap();

    assert!(dump_stylesheet(&session, &layout, &[]).await.unwrap());

    let written = fs::read_to_string(layout.stylesheet_file()).unwrap();
    assert!(written.contains("url(./skin_bg.gif)"));
    assert!(written.contains("url(./logo.png)"));
    assert_eq!(
        fs::read(layout.stylesheet_dir().join("skin_bg.gif")).unwrap(),
        b"GIF89a"
    );
    assert!(layout.stylesheet_dir().join("logo.png").exists());

    // A second dump keeps the existing stylesheet
    assert!(!dump_stylesheet(&session, &layout, &[]).await.unwrap());
}
