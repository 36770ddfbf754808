//! End-to-end client behavior against a mock Graph API

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use threads::models::{CarouselItem, CarouselPostContent, LocationId, PostId, TextPostContent};
use threads::{Client, ClientConfig, PollConfig, RetryConfig, TokenInfo};

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new("test-id", "test-secret", "https://example.com/callback");
    config.base_url = server.uri();
    config.retry = RetryConfig::disabled();
    config.poll = PollConfig {
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    };
    config
}

fn client(server: &MockServer) -> Client {
    let client = Client::new(config(server)).unwrap();
    client.set_token_info(TokenInfo::new("test-token", "1000", Some(3600)));
    client
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

#[tokio::test]
async fn test_get_post_with_empty_id_sends_nothing() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client.get_post(&PostId::new("")).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.validation_field(), Some("post_id"));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_get_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/123456789"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "123456789",
            "media_type": "TEXT",
            "text": "Hello, Threads!",
            "username": "testuser",
            "permalink": "https://www.threads.net/@testuser/post/abc",
            "timestamp": "2024-06-15T10:30:00+0000",
            "is_quote_post": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let post = client(&server)
        .get_post(&PostId::new("123456789"))
        .await
        .unwrap();
    assert_eq!(post.id.as_str(), "123456789");
    assert_eq!(post.text.as_deref(), Some("Hello, Threads!"));
    assert_eq!(post.username.as_deref(), Some("testuser"));
    assert_eq!(post.timestamp.unwrap().to_string(), "2024-06-15T10:30:00Z");
}

#[tokio::test]
async fn test_location_search_without_parameters_sends_nothing() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client.search_locations(None, None, None).await.unwrap_err();
    assert_eq!(err.validation_field(), Some("search_params"));
    assert_eq!(request_count(&server).await, 0);

    let err = client.get_location(&LocationId::new(" ")).await.unwrap_err();
    assert_eq!(err.validation_field(), Some("location_id"));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_failed_carousel_item_aborts_before_publish() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("first.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("second.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item-2" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/item-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "item-1", "status": "FINISHED" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/item-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "item-2",
            "status": "ERROR",
            "error_message": "Unsupported image format"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("media_type=CAROUSEL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "carousel" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads_publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "post" })))
        .expect(0)
        .mount(&server)
        .await;

    let content = CarouselPostContent {
        text: "album".into(),
        items: vec![
            CarouselItem::image("https://example.com/first.jpg"),
            CarouselItem::image("https://example.com/second.jpg"),
        ],
        ..CarouselPostContent::default()
    };
    let err = client(&server)
        .create_carousel_post(&content)
        .await
        .unwrap_err();

    let api = err.as_api().expect("api error");
    assert!(api.message.contains("item-2"));
    assert_eq!(api.details, "Unsupported image format");
}

/// Decoded form fields of a recorded request, in wire order
fn form_pairs(request: &wiremock::Request) -> Vec<(String, String)> {
    let body = String::from_utf8_lossy(&request.body);
    reqwest::Url::parse(&format!("http://form.local/?{body}"))
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_carousel_publishes_after_every_item_finishes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("first.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("second.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item-2" })))
        .expect(1)
        .mount(&server)
        .await;
    for id in ["item-1", "item-2", "carousel-1"] {
        Mock::given(method("GET"))
            .and(path(format!("/v1.0/{id}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": id, "status": "FINISHED" })),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("media_type=CAROUSEL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "carousel-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads_publish"))
        .and(body_string_contains("creation_id=carousel-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "post-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/post-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "post-1", "text": "album" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let content = CarouselPostContent {
        text: "album".into(),
        items: vec![
            CarouselItem::image("https://example.com/first.jpg"),
            CarouselItem::video("https://example.com/second.mp4"),
        ],
        alt_texts: vec!["alt-one".into(), "alt-two".into(), "alt-three".into()],
        ..CarouselPostContent::default()
    };
    let post = client(&server).create_carousel_post(&content).await.unwrap();
    assert_eq!(post.id.as_str(), "post-1");

    let requests = server.received_requests().await.unwrap();
    let forms: Vec<Vec<(String, String)>> = requests.iter().map(form_pairs).collect();

    let image = forms
        .iter()
        .find(|f| form_value(f, "image_url") == Some("https://example.com/first.jpg"))
        .expect("image item request");
    assert_eq!(form_value(image, "media_type"), Some("IMAGE"));
    assert_eq!(form_value(image, "is_carousel_item"), Some("true"));
    assert_eq!(form_value(image, "alt_text"), Some("alt-one"));

    let video = forms
        .iter()
        .find(|f| form_value(f, "video_url") == Some("https://example.com/second.mp4"))
        .expect("video item request");
    assert_eq!(form_value(video, "media_type"), Some("VIDEO"));
    assert_eq!(form_value(video, "alt_text"), Some("alt-two"));

    assert!(
        forms
            .iter()
            .all(|f| f.iter().all(|(_, v)| v != "alt-three"))
    );

    let carousel = forms
        .iter()
        .find(|f| form_value(f, "media_type") == Some("CAROUSEL"))
        .expect("carousel request");
    let children: Vec<&str> = carousel
        .iter()
        .filter(|(k, _)| k == "children")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(children, vec!["item-1", "item-2"]);
    assert_eq!(form_value(carousel, "children[0]"), Some("item-1"));
    assert_eq!(form_value(carousel, "children[1]"), Some("item-2"));
    assert_eq!(form_value(carousel, "text"), Some("album"));

    let position = |predicate: &dyn Fn(&wiremock::Request) -> bool| {
        requests.iter().rposition(|r| predicate(r)).unwrap()
    };
    let last_item_poll = position(&|r: &wiremock::Request| {
        r.method.as_str() == "GET" && r.url.path().starts_with("/v1.0/item-")
    });
    let carousel_created = position(&|r: &wiremock::Request| {
        String::from_utf8_lossy(&r.body).contains("media_type=CAROUSEL")
    });
    let published = position(&|r: &wiremock::Request| r.url.path() == "/v1.0/1000/threads_publish");
    assert!(last_item_poll < carousel_created);
    assert!(carousel_created < published);
}

#[tokio::test]
async fn test_text_post_publishes_and_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads"))
        .and(body_string_contains("media_type=TEXT"))
        .and(body_string_contains("text=Hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "container-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/1000/threads_publish"))
        .and(body_string_contains("creation_id=container-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "post-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/post-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "post-1", "text": "Hello" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let post = client(&server)
        .create_text_post(&TextPostContent {
            text: "Hello".into(),
            ..TextPostContent::default()
        })
        .await
        .unwrap();
    assert_eq!(post.id.as_str(), "post-1");
}

#[tokio::test]
async fn test_unauthorized_response_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Invalid OAuth access token",
                "type": "OAuthException",
                "code": 190,
                "fbtrace_id": "trace-1"
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_me().await.unwrap_err();
    let auth = err.as_authentication().expect("authentication error");
    assert_eq!(auth.code, 401);
    assert_eq!(auth.message, "Invalid OAuth access token");
    assert!(!err.is_temporary());
}

#[tokio::test]
async fn test_rate_limited_client_stops_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "120")
                .set_body_json(json!({ "error": { "message": "Too many calls", "code": 4 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.get_me().await.unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));
    assert!(client.rate_limiter().status().throttled);

    // The window is longer than the client will wait, so nothing goes out
    let err = client.get_me().await.unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "1000", "username": "ferris" })),
        )
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.retry = RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_factor: 2.0,
    };
    let client = Client::new(config).unwrap();
    client.set_token_info(TokenInfo::new("test-token", "1000", None));

    let me = client.get_me().await.unwrap();
    assert_eq!(me.username, "ferris");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_oauth_code_exchange_then_long_lived() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "short-token",
            "user_id": 12345
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/access_token"))
        .and(query_param("grant_type", "th_exchange_token"))
        .and(query_param("access_token", "short-token"))
        .and(query_param("client_secret", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "long-token",
            "token_type": "bearer",
            "expires_in": 5_184_000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config(&server)).unwrap();
    assert!(!client.is_authenticated());

    client.exchange_code_for_token("auth-code").await.unwrap();
    assert_eq!(client.token_info().unwrap().user_id, "12345");

    client.get_long_lived_token().await.unwrap();
    let info = client.token_info().unwrap();
    assert_eq!(info.access_token, "long-token");
    assert_eq!(info.user_id, "12345");
    assert!(!info.is_expiring_soon(chrono::Duration::days(59)));
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_unauthenticated_client_sends_nothing() {
    let server = MockServer::start().await;
    let client = Client::new(config(&server)).unwrap();

    let err = client.get_me().await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(request_count(&server).await, 0);
}
