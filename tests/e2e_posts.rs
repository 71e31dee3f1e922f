//! E2E tests for posts in local mode

mod common;

use common::{PNG_BYTES, TestServer};
use serde_json::Value;

#[tokio::test]
async fn test_create_post_embeds_image_locally() {
    let server = TestServer::new().await;

    let post = server.create_post("  morning light  ").await;

    assert_eq!(post["description"], "morning light");
    assert!(post.get("imageUrl").is_none());
    assert_eq!(post["image"]["mimeType"], "image/png");
    assert!(
        post["image"]["previewUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert_eq!(post["id"].as_str().unwrap().len(), 26);
}

#[tokio::test]
async fn test_saved_post_reads_back_once() {
    let server = TestServer::new().await;
    let created = server.create_post("tea").await;

    let response = server
        .client
        .get(server.url("/api/posts"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let posts: Vec<Value> = response.json().await.unwrap();
    let matching: Vec<_> = posts.iter().filter(|p| p["id"] == created["id"]).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0]["date"], created["date"]);
    assert_eq!(matching[0]["image"]["base64"], created["image"]["base64"]);
}

#[tokio::test]
async fn test_posts_are_listed_newest_first() {
    let server = TestServer::new().await;
    let first = server.create_post("first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = server.create_post("second").await;

    let posts: Vec<Value> = server
        .client
        .get(server.url("/api/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<_> = posts.iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, vec![second["id"].clone(), first["id"].clone()]);
}

#[tokio::test]
async fn test_create_post_without_image_is_rejected() {
    let server = TestServer::new().await;
    let form = reqwest::multipart::Form::new().text("description", "no photo");

    let response = server
        .client
        .post(server.url("/api/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "validation");
}

#[tokio::test]
async fn test_create_post_rejects_non_image() {
    let server = TestServer::new().await;
    let part = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);

    let response = server
        .client
        .post(server.url("/api/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_create_post_rejects_oversized_image() {
    let server = TestServer::new().await;
    let limit = server.state.config.upload.max_image_bytes;
    let part = reqwest::multipart::Part::bytes(vec![0_u8; limit + 1])
        .file_name("big.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);

    let response = server
        .client
        .post(server.url("/api/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert!(server.state.journal.get_posts().await.unwrap().is_empty());
}
