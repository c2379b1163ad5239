use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::StoreGateway;

const RESUME_BUCKET: &str = "resumes";
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn StoreGateway>,
}

impl ResumeService {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// Store a resume and return its object key. Keys are
    /// `{user}/{millis}.{ext}` so one applicant's uploads never collide
    /// with another's.
    pub async fn upload(&self, user_id: Uuid, filename: &str, bytes: Bytes) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::BadRequest("resume file is empty".to_string()));
        }
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| Error::BadRequest("resume file has no extension".to_string()))?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::BadRequest(format!(
                "unsupported resume format: {}",
                extension
            )));
        }

        let key = format!("{}/{}.{}", user_id, Utc::now().timestamp_millis(), extension);
        self.store.put_object(RESUME_BUCKET, &key, bytes).await
    }

    pub fn public_url(&self, key: &str) -> String {
        self.store.public_url(RESUME_BUCKET, key)
    }
}
