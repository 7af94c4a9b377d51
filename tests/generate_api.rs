use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use cartoon_headshot::{web, GeminiClient};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash-image:generateContent";

fn png_10x10() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        10,
        10,
        image::Rgb([200, 120, 80]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

async fn spawn_app(gemini: &MockServer) -> SocketAddr {
    let client = GeminiClient::builder()
        .base_url(gemini.uri())
        .api_key("test-api-key")
        .build();
    let app = web::router(web::AppState::new(Arc::new(client)), 10 * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn post_photo(addr: SocketAddr, photo: Vec<u8>, mime: &str, style: &str) -> Value {
    let form = reqwest::multipart::Form::new().text("style", style.to_string()).part(
        "image",
        reqwest::multipart::Part::bytes(photo)
            .file_name("me.png")
            .mime_str(mime)
            .unwrap(),
    );

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/generate"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn generated_headshot_is_returned_as_data_url() {
    let gemini = MockServer::start().await;
    let generated = b"cartoon headshot bytes".to_vec();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "mimeType": "image/png",
                            "data": general_purpose::STANDARD.encode(&generated)
                        }
                    }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let addr = spawn_app(&gemini).await;
    let photo = png_10x10();
    let view = post_photo(addr, photo.clone(), "image/png", "pixar style").await;

    assert_eq!(
        view["generatedImage"],
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&generated)
        )
    );
    assert_eq!(view["error"], Value::Null);
    assert_eq!(view["loading"], false);

    // The photo is forwarded untouched and the style verbatim.
    let requests = gemini.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(
        parts[0]["inlineData"]["data"],
        general_purpose::STANDARD.encode(&photo)
    );
    assert!(parts[1]["text"].as_str().unwrap().contains("pixar style"));
    assert_eq!(body["generationConfig"]["responseModalities"], json!(["IMAGE"]));
}

#[tokio::test]
async fn service_failure_is_reported_in_view() {
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "rate limited",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .mount(&gemini)
        .await;

    let addr = spawn_app(&gemini).await;
    let view = post_photo(addr, png_10x10(), "image/png", "pixar style").await;

    assert_eq!(view["error"], "Failed to generate image: rate limited");
    assert_eq!(view["loading"], false);
    assert_eq!(view["generatedImage"], Value::Null);
}

#[tokio::test]
async fn text_only_answer_is_an_error() {
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "I can't draw that." }, { "text": "Sorry." }]
                }
            }]
        })))
        .mount(&gemini)
        .await;

    let addr = spawn_app(&gemini).await;
    let view = post_photo(addr, png_10x10(), "image/png", "").await;

    assert_eq!(view["mode"], "error");
    assert_eq!(view["generatedImage"], Value::Null);
    assert_eq!(view["loading"], false);
}

#[tokio::test]
async fn non_image_upload_never_reaches_service() {
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&gemini)
        .await;

    let addr = spawn_app(&gemini).await;
    let view = post_photo(addr, b"%PDF-1.7".to_vec(), "application/pdf", "").await;

    assert_eq!(view["error"], "not an image file");
    assert_eq!(view["generatedImage"], Value::Null);
}
