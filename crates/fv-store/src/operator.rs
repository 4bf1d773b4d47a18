//! OpenDAL-backed fragment store
//!
//! Adapts an OpenDAL `Operator` to the [`ContentStore`] contract. Blobs
//! land at `{prefix}/fragments/{blake3}`, with an existence check before
//! write so re-storing identical bytes never rewrites the object.

use opendal::Operator;
use tracing::debug;

use fv_chunks::content_id;
use fv_core::config::StorageConfig;
use fv_core::{FvError, FvResult};

use crate::ContentStore;

/// Build an OpenDAL Operator for an S3-compatible endpoint.
///
/// Uses path-style addressing (the opendal default), which SeaweedFS and
/// MinIO require. If `enforce_tls` is set and the endpoint uses HTTP, this
/// fails; otherwise a plaintext endpoint only logs a warning.
pub fn build_operator(
    storage: &StorageConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> FvResult<Operator> {
    if storage.endpoint.starts_with("http://") {
        if storage.enforce_tls {
            return Err(FvError::Store(format!(
                "endpoint uses plaintext HTTP ({}), but enforce_tls is enabled",
                storage.endpoint
            )));
        }
        tracing::warn!(
            endpoint = %storage.endpoint,
            "store endpoint uses plaintext HTTP — fragments and credentials travel unencrypted"
        );
    }

    let builder = opendal::services::S3::default()
        .endpoint(&storage.endpoint)
        .region(&storage.region)
        .bucket(&storage.bucket)
        .access_key_id(access_key_id)
        .secret_access_key(secret_access_key);

    let op = Operator::new(builder)
        .map_err(|e| FvError::Store(format!("creating store operator: {e}")))?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}

/// A [`ContentStore`] over any OpenDAL backend.
pub struct OpendalStore {
    op: Operator,
    prefix: String,
}

impl OpendalStore {
    pub fn new(op: Operator, prefix: impl Into<String>) -> Self {
        Self {
            op,
            prefix: prefix.into(),
        }
    }

    fn key(&self, cid: &str) -> String {
        if self.prefix.is_empty() {
            format!("fragments/{cid}")
        } else {
            format!("{}/fragments/{}", self.prefix, cid)
        }
    }
}

impl ContentStore for OpendalStore {
    async fn put(&self, bytes: Vec<u8>) -> FvResult<String> {
        let cid = content_id(&bytes);
        let key = self.key(&cid);

        if self.op.exists(&key).await.unwrap_or(false) {
            debug!(cid = %cid, "dedup: fragment already stored");
            return Ok(cid);
        }

        self.op
            .write(&key, bytes)
            .await
            .map_err(|e| FvError::Store(format!("writing {key}: {e}")))?;
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> FvResult<Vec<u8>> {
        let key = self.key(cid);
        match self.op.read(&key).await {
            Ok(buf) => Ok(buf.to_bytes().to_vec()),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => {
                Err(FvError::NotFound(cid.to_string()))
            }
            Err(e) => Err(FvError::Store(format!("reading {key}: {e}"))),
        }
    }
}
