//! In-process stand-in for the Firestore and Firebase Storage REST APIs
//!
//! Implements just enough of both to back the cloud store: document upsert,
//! masked updates guarded by an existence precondition, `runQuery` ordered by
//! date, delete, media upload and token-protected download.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const DOCUMENTS_MARKER: &str = "/databases/(default)/documents";

#[derive(Default)]
struct Inner {
    /// collection -> id -> fields
    documents: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    /// object name -> (token, content type, bytes)
    blobs: Mutex<HashMap<String, (String, String, Vec<u8>)>>,
    uploads: AtomicUsize,
    failing: AtomicBool,
    documents_failing: AtomicBool,
}

/// Handle to a running fake backend
#[derive(Clone)]
pub struct FakeFirebase {
    pub url: String,
    inner: Arc<Inner>,
}

impl FakeFirebase {
    /// Start the fake on an ephemeral port
    pub async fn start() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new().fallback(dispatch).with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, inner }
    }

    /// Make every following request fail with 503
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Make only Firestore requests fail with 503; Storage keeps working
    pub fn set_documents_failing(&self, failing: bool) {
        self.inner.documents_failing.store(failing, Ordering::SeqCst);
    }

    /// Fields of a stored document
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.inner
            .documents
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.inner
            .documents
            .lock()
            .unwrap()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn upload_count(&self) -> usize {
        self.inner.uploads.load(Ordering::SeqCst)
    }
}

fn error(status: StatusCode, code: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": status.as_u16(), "status": code } })),
    )
        .into_response()
}

async fn dispatch(
    State(inner): State<Arc<Inner>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if inner.failing.load(Ordering::SeqCst) {
        return error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE");
    }

    let path = uri.path();
    if let Some(rest) = path.strip_prefix("/v1/projects/") {
        if !query.contains_key("key") {
            return error(StatusCode::FORBIDDEN, "PERMISSION_DENIED");
        }
        if inner.documents_failing.load(Ordering::SeqCst) {
            return error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE");
        }
        let Some((project, rest)) = rest.split_once(DOCUMENTS_MARKER) else {
            return error(StatusCode::NOT_FOUND, "NOT_FOUND");
        };
        // Repeated parameters are collapsed by `Query`, so read the mask here
        let raw_query = uri.query().unwrap_or_default();
        let mask: Vec<String> = url::form_urlencoded::parse(raw_query.as_bytes())
            .filter(|(name, _)| name == "updateMask.fieldPaths")
            .map(|(_, path)| path.into_owned())
            .collect();
        return documents(&inner, method, project, rest, &query, &mask, &body);
    }

    if let Some(rest) = path.strip_prefix("/v0/b/") {
        return storage(&inner, method, rest, &query, &headers, body);
    }

    error(StatusCode::NOT_FOUND, "NOT_FOUND")
}

fn documents(
    inner: &Inner,
    method: Method,
    project: &str,
    rest: &str,
    query: &HashMap<String, String>,
    mask: &[String],
    body: &[u8],
) -> Response {
    let name = |collection: &str, id: &str| {
        format!("projects/{project}/databases/(default)/documents/{collection}/{id}")
    };

    if rest == ":runQuery" && method == Method::POST {
        let Ok(request) = serde_json::from_slice::<Value>(body) else {
            return error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT");
        };
        let collection = request["structuredQuery"]["from"][0]["collectionId"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let documents = inner.documents.lock().unwrap();
        let mut found: Vec<(String, Value)> = documents
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| (id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| {
            let date = |fields: &Value| {
                fields["date"]["timestampValue"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string()
            };
            date(&b.1).cmp(&date(&a.1))
        });

        if found.is_empty() {
            return Json(json!([{ "readTime": "2024-01-01T00:00:00Z" }])).into_response();
        }
        let results: Vec<Value> = found
            .into_iter()
            .map(|(id, fields)| {
                json!({
                    "document": { "name": name(&collection, &id), "fields": fields },
                    "readTime": "2024-01-01T00:00:00Z"
                })
            })
            .collect();
        return Json(Value::Array(results)).into_response();
    }

    let Some((collection, id)) = rest.trim_start_matches('/').split_once('/') else {
        return error(StatusCode::NOT_FOUND, "NOT_FOUND");
    };
    let id = urlencoding::decode(id).map(|id| id.into_owned()).unwrap_or_default();

    match method {
        Method::PATCH => {
            let Ok(request) = serde_json::from_slice::<Value>(body) else {
                return error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT");
            };
            let must_exist = query.get("currentDocument.exists").map(String::as_str) == Some("true");

            let mut documents = inner.documents.lock().unwrap();
            let docs = documents.entry(collection.to_string()).or_default();
            let existing = docs.get(&id).cloned();
            if existing.is_none() && must_exist {
                return error(StatusCode::NOT_FOUND, "NOT_FOUND");
            }

            let fields = match existing {
                Some(mut stored) if !mask.is_empty() => {
                    for path in mask {
                        match request["fields"].get(path) {
                            Some(value) => stored[path.as_str()] = value.clone(),
                            None => {
                                if let Some(map) = stored.as_object_mut() {
                                    map.remove(path);
                                }
                            }
                        }
                    }
                    stored
                }
                _ => request["fields"].clone(),
            };
            docs.insert(id.clone(), fields.clone());
            Json(json!({ "name": name(collection, &id), "fields": fields })).into_response()
        }
        Method::DELETE => {
            let mut documents = inner.documents.lock().unwrap();
            let removed = documents
                .get_mut(collection)
                .and_then(|docs| docs.remove(&id));
            let must_exist = query.get("currentDocument.exists").map(String::as_str) == Some("true");
            if removed.is_none() && must_exist {
                return error(StatusCode::NOT_FOUND, "NOT_FOUND");
            }
            Json(json!({})).into_response()
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "UNIMPLEMENTED"),
    }
}

fn storage(
    inner: &Inner,
    method: Method,
    rest: &str,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let Some((bucket, object)) = rest.split_once("/o") else {
        return error(StatusCode::NOT_FOUND, "NOT_FOUND");
    };

    if method == Method::POST && object.is_empty() {
        let Some(name) = query.get("name") else {
            return error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT");
        };
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let number = inner.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{number}");

        inner.blobs.lock().unwrap().insert(
            name.clone(),
            (token.clone(), content_type.clone(), body.to_vec()),
        );
        return Json(json!({
            "name": name,
            "bucket": bucket,
            "contentType": content_type,
            "size": body.len().to_string(),
            "downloadTokens": token,
        }))
        .into_response();
    }

    if method == Method::GET {
        let name = urlencoding::decode(object.trim_start_matches('/'))
            .map(|name| name.into_owned())
            .unwrap_or_default();
        let blobs = inner.blobs.lock().unwrap();
        return match blobs.get(&name) {
            Some((token, content_type, data)) if query.get("token") == Some(token) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.clone())],
                data.clone(),
            )
                .into_response(),
            Some(_) => error(StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            None => error(StatusCode::NOT_FOUND, "NOT_FOUND"),
        };
    }

    error(StatusCode::METHOD_NOT_ALLOWED, "UNIMPLEMENTED")
}
