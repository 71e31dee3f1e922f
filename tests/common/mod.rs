//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod fake_firebase;

use tempfile::TempDir;
use tokio::net::TcpListener;
use yuyu::data::CloudConfig;
use yuyu::{AppState, config};

pub use fake_firebase::FakeFirebase;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Server whose cloud endpoints point nowhere (local mode only)
    pub async fn new() -> Self {
        Self::with_cloud_endpoint("http://127.0.0.1:9").await
    }

    /// Server whose cloud endpoints point at a fake backend
    pub async fn with_fake_firebase(fake: &FakeFirebase) -> Self {
        Self::with_cloud_endpoint(&fake.url).await
    }

    async fn with_cloud_endpoint(endpoint: &str) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = test_config(db_path, endpoint);
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = yuyu::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Switch the server to cloud mode through the settings endpoint
    pub async fn enable_cloud(&self) {
        let response = self
            .client
            .put(self.url("/api/settings/cloud"))
            .json(&cloud_config())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    /// Create a post with a small PNG payload
    pub async fn create_post(&self, description: &str) -> serde_json::Value {
        let image = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec())
            .file_name("photo.png")
            .mime_str("image/png")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .part("image", image)
            .text("description", description.to_string());

        let response = self
            .client
            .post(self.url("/api/posts"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }

    /// Create a diary entry and return it
    pub async fn create_diary_entry(&self, title: &str, content: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/diary"))
            .json(&serde_json::json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}

/// Eight-byte PNG signature; content is never decoded
pub const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn cloud_config() -> CloudConfig {
    CloudConfig {
        api_key: "test-api-key".to_string(),
        auth_domain: "journal.firebaseapp.com".to_string(),
        project_id: "journal".to_string(),
        storage_bucket: "journal.appspot.com".to_string(),
        messaging_sender_id: "1234".to_string(),
        app_id: "1:1234:web:abcd".to_string(),
    }
}

fn test_config(db_path: std::path::PathBuf, endpoint: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig { path: db_path },
        cloud: config::CloudEndpointsConfig {
            firestore_url: endpoint.to_string(),
            storage_url: endpoint.to_string(),
            timeout_seconds: 5,
        },
        upload: config::UploadConfig {
            max_image_bytes: 64 * 1024,
            max_backup_bytes: 1024 * 1024,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
