use std::future::Future;
use std::pin::Pin;

use tender_api::{BackendError, ObjectStore};

use crate::MemoryBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryBackend {
    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    fn check_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        if self.config.buckets.iter().any(|b| b == bucket) {
            Ok(())
        } else {
            Err(BackendError::not_found(format!("Bucket not found: {bucket}")))
        }
    }
}

impl ObjectStore for MemoryBackend {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let key = (bucket.to_string(), path.to_string());
        let content_type = content_type.to_string();
        Box::pin(async move {
            self.check_bucket(&key.0)?;
            let mut objects = self.objects.write().await;
            if objects.contains_key(&key) {
                return Err(BackendError::new(format!("The resource already exists: {}", key.1)));
            }
            tracing::debug!(bucket = %key.0, path = %key.1, size = bytes.len(), "object stored");
            objects.insert(key, StoredObject { bytes, content_type });
            Ok(())
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        self.check_bucket(bucket)?;
        Ok(format!(
            "{}/{}/{}",
            self.config.public_url_base.trim_end_matches('/'),
            bucket,
            path
        ))
    }
}
