use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use lan_share::config::ShareConfig;
use lan_share::{AppState, create_app};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let state = AppState::new(ShareConfig::development(dir.path()), dir.path());
    (dir, create_app(state))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_download_streams_file_with_disposition() {
    let (dir, app) = setup();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("notes.txt"), b"hello lan").unwrap();

    let response = app
        .oneshot(get("/download?id=docs/notes.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("filename*=UTF-8''notes%2Etxt"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"hello lan");
}

#[tokio::test]
async fn test_download_honours_range() {
    let (dir, app) = setup();
    std::fs::write(dir.path().join("digits.txt"), b"0123456789").unwrap();

    let request = Request::builder()
        .uri("/download?id=digits.txt")
        .header(header::RANGE, "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"2345");
}

#[tokio::test]
async fn test_download_missing_file_is_404() {
    let (_dir, app) = setup();
    let response = app.oneshot(get("/download?id=nope.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("nope.txt"));
}

#[tokio::test]
async fn test_list_files_is_recursive() {
    let (dir, app) = setup();
    std::fs::write(dir.path().join("b.bin"), vec![0u8; 42]).unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("a.txt"), b"a").unwrap();

    let response = app.oneshot(get("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["path"], "b.bin");
    assert_eq!(files[0]["size"], 42);
    assert_eq!(files[1]["path"], "sub/a.txt");
    assert_eq!(files[1]["name"], "a.txt");
}

#[tokio::test]
async fn test_delete_with_post_and_delete() {
    let (dir, app) = setup();
    std::fs::write(dir.path().join("one.txt"), b"1").unwrap();
    std::fs::write(dir.path().join("two.txt"), b"2").unwrap();

    for (method, name) in [("POST", "one.txt"), ("DELETE", "two.txt")] {
        let request = Request::builder()
            .method(method)
            .uri(format!("/delete?id={name}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["deleted"]["path"], name);
        assert!(!dir.path().join(name).exists());
    }

    let request = Request::builder()
        .method("DELETE")
        .uri("/delete?id=one.txt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_storage() {
    let (_dir, app) = setup();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "available");
}

#[tokio::test]
async fn test_openapi_document_lists_every_route() {
    let (_dir, app) = setup();
    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    let paths = &json["paths"];
    for (path, method) in [
        ("/health", "get"),
        ("/files", "get"),
        ("/download", "get"),
        ("/delete", "delete"),
        ("/delete", "post"),
        ("/upload", "post"),
        ("/upload/{name}", "put"),
        ("/upload/{name}/status", "get"),
    ] {
        assert!(paths[path][method].is_object(), "{method} {path} missing");
    }
}
