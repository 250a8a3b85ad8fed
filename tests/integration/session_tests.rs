//! Session tests against a mock forum: login, validation and retries

use crate::common::{fast_retry, site_config};
use tslove_dump::crawler::PageFetcher;
use tslove_dump::web::{FetchedImage, WebError, SOFT_FAILURE_TITLE};
use tslove_dump::{Credentials, Session};
use tslove_dump::config::SiteConfig;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROFILE_WITH_TOKEN: &str = r#"<html><head><title>T's LOVE - プロフィール</title></head><body>
<ul id="globalNav"><li><a href="./?m=pc&amp;a=do_inc_page_header_logout&amp;sessid=token42">ログアウト</a></li></ul>
<ul class="articleList"><li><a href="./?m=pc&amp;a=page_fh_diary&amp;target_c_diary_id=777">最新の日記</a></li></ul>
</body></html>"#;

const PROFILE_WITHOUT_TOKEN: &str =
    r#"<html><head><title>T's LOVE - ログイン</title></head><body><form></form></body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

async fn mount_profile(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("m", "pc"))
        .and(query_param("a", "page_h_prof"))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_session_id_login_finds_token() {
    let server = MockServer::start().await;
    mount_profile(&server, PROFILE_WITH_TOKEN).await;

    let mut session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    let logged_in = session
        .login(&Credentials::SessionId("abc".to_string()))
        .await
        .unwrap();

    assert!(logged_in);
    assert!(session.is_authenticated());
    assert_eq!(session.php_session_id(), Some("abc"));
    assert_eq!(session.sns_session_id(), Some("token42"));
}

#[tokio::test]
async fn test_session_id_without_token_is_rejected() {
    let server = MockServer::start().await;
    mount_profile(&server, PROFILE_WITHOUT_TOKEN).await;

    let mut session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    let logged_in = session
        .login(&Credentials::SessionId("stale".to_string()))
        .await
        .unwrap();

    assert!(!logged_in);
    assert!(!session.is_authenticated());
    assert_eq!(session.sns_session_id(), None);
}

#[tokio::test]
async fn test_password_login_sets_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("a=do_o_login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "./?m=pc&a=page_h_home")
                .insert_header("Set-Cookie", "PHPSESSID=fresh; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, PROFILE_WITH_TOKEN).await;

    let mut session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    let logged_in = session
        .login(&Credentials::Password {
            username: "member".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert!(logged_in);
    assert_eq!(session.php_session_id(), Some("fresh"));
    assert_eq!(session.sns_session_id(), Some("token42"));
}

#[tokio::test]
async fn test_password_after_rejected_session_id() {
    let server = MockServer::start().await;
    // A sign-in carrying the rejected id would be refused
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("cookie", "PHPSESSID=stale"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Set-Cookie", "PHPSESSID=fresh; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("a", "page_h_prof"))
        .respond_with(html(PROFILE_WITHOUT_TOKEN))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_profile(&server, PROFILE_WITH_TOKEN).await;

    let mut session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    assert!(!session
        .login(&Credentials::SessionId("stale".to_string()))
        .await
        .unwrap());

    let logged_in = session
        .login(&Credentials::Password {
            username: "member".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert!(logged_in);
    assert_eq!(session.php_session_id(), Some("fresh"));
}

#[tokio::test]
async fn test_refused_password_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "./?m=pc&a=page_o_login"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(&site_config(&server), &fast_retry(5)).unwrap();
    let logged_in = session
        .login(&Credentials::Password {
            username: "member".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap();

    assert!(!logged_in);
    assert_eq!(session.total_retries(), 0);
}

#[tokio::test]
async fn test_empty_credentials_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(302))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = Session::new(&site_config(&server), &fast_retry(3)).unwrap();
    let logged_in = session
        .login(&Credentials::Password {
            username: String::new(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert!(!logged_in);
}

#[tokio::test]
async fn test_invalid_pages_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"maintenance".to_vec(), "text/plain"),
        )
        .expect(10)
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(10)).unwrap();
    let result = session.fetch_diary("100").await;

    match result {
        Err(WebError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 10),
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(session.total_retries(), 9);
}

#[tokio::test]
async fn test_unreachable_forum_is_transport_error() {
    let site = SiteConfig {
        base_url: "http://127.0.0.1:1/".to_string(),
        ..SiteConfig::default()
    };
    let session = Session::new(&site, &fast_retry(10)).unwrap();

    let result = session.fetch_diary("100").await;

    assert!(matches!(result, Err(WebError::Transport { .. })));
    assert_eq!(session.total_retries(), 0);
}

#[tokio::test]
async fn test_error_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("target_c_diary_id", "100"))
        .respond_with(
            ResponseTemplate::new(503).set_body_raw(
                b"<html><head><title>503 Service Unavailable</title></head></html>".to_vec(),
                "text/html",
            ),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("target_c_diary_id", "100"))
        .respond_with(html("<html><head><title>日記</title></head><body>本文</body></html>"))
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(5)).unwrap();
    let page = session.fetch_diary("100").await.unwrap();

    assert!(page.contains("本文"));
    assert_eq!(session.total_retries(), 1);
}

#[tokio::test]
async fn test_soft_failure_page_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("target_c_diary_id", "100"))
        .respond_with(html(&format!(
            "<html><head><title>{}</title></head><body></body></html>",
            SOFT_FAILURE_TITLE
        )))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("target_c_diary_id", "100"))
        .respond_with(html("<html><head><title>日記</title></head><body>ok</body></html>"))
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(5)).unwrap();
    let page = session.fetch_diary("100").await.unwrap();

    assert!(page.contains("ok"));
    assert_eq!(session.total_retries(), 2);
}

#[tokio::test]
async fn test_diary_request_asks_for_ascending_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("m", "pc"))
        .and(query_param("a", "page_fh_diary"))
        .and(query_param("target_c_diary_id", "55"))
        .and(query_param("order", "asc"))
        .and(query_param("page_size", "100"))
        .respond_with(html("<html><head><title>日記</title></head></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(1)).unwrap();
    session.fetch_diary("55").await.unwrap();
}

#[tokio::test]
async fn test_empty_image_becomes_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img.php"))
        .and(query_param("filename", "empty.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(5)).unwrap();
    let image = session
        .fetch_image("img.php", &[("m", "pc"), ("filename", "empty.jpg")])
        .await
        .unwrap();

    assert_eq!(image, FetchedImage::Placeholder);
    assert_eq!(session.total_retries(), 0);
}

#[tokio::test]
async fn test_image_data_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1, 2, 3], "image/jpeg"))
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(2)).unwrap();
    let image = session
        .fetch_image("img.php", &[("m", "pc"), ("filename", "a.jpg")])
        .await
        .unwrap();

    assert_eq!(image, FetchedImage::Data(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_stylesheet_requires_css() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xhtml_style.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"body{}".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::new(&site_config(&server), &fast_retry(2)).unwrap();
    assert_eq!(session.fetch_stylesheet().await.unwrap(), "body{}");
}
