use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::Value;
use tower::ServiceExt;

use crate::app::SharedState;
use crate::config::AppConfig;
use crate::server::router::create_router;

const BOUNDARY: &str = "qrmark-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn app() -> Router {
    app_with(AppConfig::default())
}

fn app_with(config: AppConfig) -> Router {
    create_router(SharedState::new(config))
}

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(px)))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

async fn post(app: Router, parts: &[Part<'_>]) -> (StatusCode, String, Vec<u8>) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

fn error_message(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn plain_qr_code_has_requested_size() {
    let (status, content_type, body) = post(
        app(),
        &[Part::Text("url", "https://example.com"), Part::Text("size", "256")],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");
    let img = image::load_from_memory_with_format(&body, ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (256, 256));
}

#[tokio::test]
async fn empty_url_is_rejected() {
    let (status, content_type, body) =
        post(app(), &[Part::Text("url", ""), Part::Text("size", "256")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        serde_json::json!({ "error": "Could not determine the desired QR code content." })
    );
}

#[tokio::test]
async fn missing_url_is_rejected() {
    let (status, _, body) = post(app(), &[Part::Text("size", "256")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("content"));
}

#[tokio::test]
async fn bad_size_is_rejected() {
    for size in ["", "abc", "-10", "0"] {
        let (status, _, body) = post(
            app(),
            &[Part::Text("url", "https://example.com"), Part::Text("size", size)],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "size={size:?}");
        assert!(error_message(&body).contains("size"), "size={size:?}");
    }
}

#[tokio::test]
async fn missing_size_is_rejected() {
    let (status, _, body) = post(app(), &[Part::Text("url", "https://example.com")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("size"));
}

#[tokio::test]
async fn size_above_configured_maximum_is_rejected() {
    let config = AppConfig {
        max_size: 512,
        ..AppConfig::default()
    };
    let (status, _, body) = post(
        app_with(config),
        &[Part::Text("url", "https://example.com"), Part::Text("size", "1024")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("size"));
}

#[tokio::test]
async fn size_too_small_for_content_is_a_client_error() {
    let (status, _, body) = post(
        app(),
        &[Part::Text("url", "https://example.com"), Part::Text("size", "12")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not generate QR code."));
}

#[tokio::test]
async fn text_watermark_is_rejected() {
    let (status, content_type, body) = post(
        app(),
        &[
            Part::Text("url", "https://example.com"),
            Part::Text("size", "256"),
            Part::File("watermark", "notes.txt", b"this is not an image"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(error_message(&body).contains("not a PNG"));
}

#[tokio::test]
async fn png_watermark_is_centred() {
    let watermark = png(128, 128, [255, 0, 0, 255]);
    let (status, content_type, body) = post(
        app(),
        &[
            Part::Text("url", "https://example.com"),
            Part::Text("size", "256"),
            Part::File("watermark", "logo.png", &watermark),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");
    let img = image::load_from_memory_with_format(&body, ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (256, 256));
    assert_eq!(*img.get_pixel(128, 128), Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn fields_may_arrive_in_any_order() {
    let watermark = png(64, 64, [0, 0, 255, 255]);
    let (status, _, _) = post(
        app(),
        &[
            Part::File("watermark", "logo.png", &watermark),
            Part::Text("size", "300"),
            Part::Text("url", "https://example.com/path"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn identical_requests_produce_identical_images() {
    let watermark = png(90, 60, [20, 180, 40, 200]);
    let parts = [
        Part::Text("url", "https://example.com"),
        Part::Text("size", "256"),
        Part::File("watermark", "logo.png", &watermark),
    ];

    let (status_a, _, first) = post(app(), &parts).await;
    let (status_b, _, second) = post(app(), &parts).await;
    assert_eq!((status_a, status_b), (StatusCode::OK, StatusCode::OK));
    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_file_input_means_no_watermark() {
    let (status, content_type, _) = post(
        app(),
        &[
            Part::Text("url", "https://example.com"),
            Part::Text("size", "256"),
            Part::File("watermark", "", b""),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");
}

const UPLOAD_PREFIX: &str = "Could not upload the watermark image.";

fn small_body_limit() -> AppConfig {
    AppConfig {
        max_upload_bytes: 4096,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn oversized_watermark_is_an_upload_error() {
    let huge = vec![0x89u8; 16 * 1024];
    let (status, content_type, body) = post(
        app_with(small_body_limit()),
        &[
            Part::Text("url", "https://example.com"),
            Part::Text("size", "256"),
            Part::File("watermark", "logo.png", &huge),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(error_message(&body).starts_with(UPLOAD_PREFIX));
}

#[tokio::test]
async fn oversized_text_field_is_an_upload_error() {
    let long_url = format!("https://example.com/{}", "a".repeat(8000));
    let (status, _, body) = post(
        app_with(small_body_limit()),
        &[Part::Text("size", "256"), Part::Text("url", &long_url)],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with(UPLOAD_PREFIX));
}

#[tokio::test]
async fn truncated_multipart_body_is_an_upload_error() {
    let watermark = png(64, 64, [255, 0, 0, 255]);
    let mut body = multipart_body(&[
        Part::Text("url", "https://example.com"),
        Part::Text("size", "256"),
        Part::File("watermark", "logo.png", &watermark),
    ]);
    // Drop the closing boundary and the tail of the watermark data.
    body.truncate(body.len() - BOUNDARY.len() - 40);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(error_message(&body).starts_with(UPLOAD_PREFIX));
}

#[tokio::test]
async fn query_string_supplies_fields() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate?url=https%3A%2F%2Fexample.com&size=256")
        .body(Body::empty())
        .unwrap();
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");
    let img = image::load_from_memory_with_format(&body, ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (256, 256));
}

#[tokio::test]
async fn urlencoded_body_supplies_fields() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("url=https%3A%2F%2Fexample.com&size=128"))
        .unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory_with_format(&body, ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (128, 128));
}

#[tokio::test]
async fn body_fields_take_precedence_over_query() {
    let body = multipart_body(&[Part::Text("size", "200")]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate?url=https%3A%2F%2Fexample.com&size=999999")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory_with_format(&body, ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (200, 200));
}

#[tokio::test]
async fn unsupported_body_is_treated_as_empty_form() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("url=https://example.com&size=256"))
        .unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("content"));
}

#[tokio::test]
async fn get_is_not_allowed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/generate")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
