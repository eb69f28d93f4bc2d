//! Image recognition against a mock Vision endpoint, plus a full upload
//! flow with both remote services mocked.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use resale_finder::{FinderError, ImageRecognizer, Recognition, ResaleFinder, Settings};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VISION_PATH: &str = "/v1/images:annotate";

fn recognize(settings: Settings, image: PathBuf) -> resale_finder::Result<Recognition> {
    let recognizer = ImageRecognizer::new(&settings, Duration::from_secs(5))?;
    recognizer.recognize_product(&image)
}

async fn recognize_blocking(
    settings: Settings,
    image: PathBuf,
) -> resale_finder::Result<Recognition> {
    tokio::task::spawn_blocking(move || recognize(settings, image))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn labels_and_web_guess_are_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VISION_PATH))
        .and(query_param("key", "vision-key"))
        .and(body_string_contains("LABEL_DETECTION"))
        .and(body_string_contains("WEB_DETECTION"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{
                "labelAnnotations": [
                    { "description": "Bottle", "score": 0.97 },
                    { "description": "Motor oil", "score": 0.91 }
                ],
                "webDetection": {
                    "bestGuessLabels": [{ "label": "mobil 1 5w-30" }]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let image = common::write_image(tmp.path(), "IMG_0042.jpg");

    let r = recognize_blocking(common::mock_settings(&server.uri()), image)
        .await
        .unwrap();
    assert_eq!(r.primary, "mobil 1 5w-30");
    assert_eq!(r.labels, vec!["mobil 1 5w-30", "Bottle", "Motor oil"]);
    assert_eq!(r.web_label.as_deref(), Some("mobil 1 5w-30"));
    assert_eq!(r.search_keywords(), "mobil 1 5w-30");
}

#[tokio::test(flavor = "multi_thread")]
async fn reported_error_falls_back_to_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VISION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "error": { "code": 3, "message": "Bad image data." } }]
        })))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let image = common::write_image(tmp.path(), "castrol-edge.png");

    let r = recognize_blocking(common::mock_settings(&server.uri()), image)
        .await
        .unwrap();
    assert_eq!(r.primary, "castrol edge");
    assert_eq!(r.labels, vec!["castrol edge"]);
    assert_eq!(r.web_label, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_failure_falls_back_to_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VISION_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let image = common::write_image(tmp.path(), "oil_filter.webp");

    let r = recognize_blocking(common::mock_settings(&server.uri()), image)
        .await
        .unwrap();
    assert_eq!(r.primary, "oil filter");
}

#[test]
fn disabled_recognizer_uses_file_name_without_reading() {
    let settings = Settings::default();
    let r = recognize(settings, PathBuf::from("/not/read/bottle_jack.gif")).unwrap();
    assert_eq!(r.primary, "bottle jack");
}

#[test]
fn enabled_recognizer_fails_on_unreadable_file() {
    let mut settings = Settings::default();
    settings.vision_api_key = "vision-key".into();
    settings.vision_api_url = "http://127.0.0.1:9/v1/images:annotate".into();

    let err = recognize(settings, PathBuf::from("/not/here/oil.jpg")).unwrap_err();
    assert!(matches!(err, FinderError::Io(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn upload_uses_vision_label_for_marketplace_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VISION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{
                "labelAnnotations": [{ "description": "Bottle" }],
                "webDetection": { "bestGuessLabels": [{ "label": "castrol edge 5w-30" }] }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .and(query_param("q", "castrol edge 5w-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "itemSummaries": [
                { "title": "A", "price": { "value": "30.00", "currency": "USD" }, "condition": "New" },
                { "title": "B", "price": { "value": "20.00", "currency": "USD" }, "condition": "Used" },
                { "title": "C", "price": { "value": "10.00", "currency": "USD" }, "condition": "New" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let image = common::write_image(tmp.path(), "IMG_1234.jpeg");
    let base = server.uri();

    let results = tokio::task::spawn_blocking(move || {
        let finder = ResaleFinder::builder()
            .settings(common::mock_settings(&base))
            .build()
            .unwrap();
        let id = finder.upload_image(&image).unwrap();
        finder.results(id).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(results.image.detected_label, "castrol edge 5w-30");
    assert_eq!(results.image.detected_labels, vec!["castrol edge 5w-30", "Bottle"]);
    let titles: Vec<&str> = results.results.iter().map(|r| r.listing.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "B", "A"]);

    let s = results.suggestion.unwrap().suggestion;
    assert_eq!(s.median_price, dec!(20.00));
    assert_eq!(s.suggested_price, dec!(19.00));
    assert_eq!(s.total_listings, 3);
}
