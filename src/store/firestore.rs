//! Firestore REST adapter for the remote document sink.
//!
//! Documents live in one collection under the project's default database.
//! Writes create one document per record with typed `fields`; reads walk the
//! list endpoint following `nextPageToken` until the collection is exhausted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{RemoteRecord, StoredRecord};
use crate::secrets::FirebaseSecrets;

use super::remote::{DocStore, RemoteError};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Default collection, matching the historical export schema.
pub const DEFAULT_COLLECTION: &str = "llm_responses";

const PAGE_SIZE: usize = 300;

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
}

impl FirestoreStore {
    pub fn from_secrets(
        secrets: &FirebaseSecrets,
        collection: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        Self::with_config(
            &secrets.project_id,
            &secrets.access_token,
            collection,
            FIRESTORE_BASE_URL,
            Duration::from_secs(30),
        )
    }

    pub fn with_config(
        project_id: impl Into<String>,
        access_token: &str,
        collection: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| RemoteError::Decode("invalid access token format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            collection: collection.into(),
        })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, self.collection
        )
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CreateDocumentRequest {
    fields: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Document {
    /// Full resource name; the final path segment is the storage-assigned id.
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

fn string_value(s: &str) -> Value {
    serde_json::json!({ "stringValue": s })
}

fn double_value(f: f64) -> Value {
    serde_json::json!({ "doubleValue": f })
}

fn encode_fields(record: &RemoteRecord) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("id".into(), string_value(&record.id));
    fields.insert("model".into(), string_value(&record.model));
    fields.insert("prompt".into(), string_value(&record.prompt));
    fields.insert("response".into(), string_value(&record.response));
    fields.insert("time_seconds".into(), double_value(record.time_seconds));
    fields.insert("timestamp".into(), string_value(&record.timestamp));
    fields.insert("date".into(), string_value(&record.date));
    fields
}

fn decode_string(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn decode_double(fields: &serde_json::Map<String, Value>, key: &str) -> f64 {
    let Some(value) = fields.get(key) else {
        return 0.0;
    };
    // doubleValue arrives as a JSON number; integerValue as a decimal string.
    if let Some(f) = value.get("doubleValue").and_then(Value::as_f64) {
        return f;
    }
    value
        .get("integerValue")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn decode_document(doc: Document) -> Result<StoredRecord, RemoteError> {
    let doc_id = doc
        .name
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RemoteError::Decode(format!("document without id: {}", doc.name)))?
        .to_string();

    Ok(StoredRecord {
        doc_id,
        record: RemoteRecord {
            id: decode_string(&doc.fields, "id"),
            model: decode_string(&doc.fields, "model"),
            prompt: decode_string(&doc.fields, "prompt"),
            response: decode_string(&doc.fields, "response"),
            time_seconds: decode_double(&doc.fields, "time_seconds"),
            timestamp: decode_string(&doc.fields, "timestamp"),
            date: decode_string(&doc.fields, "date"),
        },
    })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// DOC STORE IMPL
// =============================================================================

#[async_trait]
impl DocStore for FirestoreStore {
    async fn add(&self, record: &RemoteRecord) -> Result<(), RemoteError> {
        let body = CreateDocumentRequest {
            fields: encode_fields(record),
        };
        let response = self
            .client
            .post(self.collection_url())
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<StoredRecord>, RemoteError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url())
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = check_status(request.send().await?).await?;
            let page: ListDocumentsResponse = response
                .json()
                .await
                .map_err(|e| RemoteError::Decode(e.to_string()))?;

            for doc in page.documents {
                records.push(decode_document(doc)?);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}
