//! Pipeline orchestrator: fragment → derive → encrypt → store → record
//!
//! Upload walks the source once, strictly in index order; encrypt+store for
//! distinct indices runs concurrently under a bounded pool. The manifest is
//! assembled by a single collector and ordered by index, so its content is
//! independent of completion order.
//!
//! Store failures are the only locally recoverable errors: a fragment is
//! re-encrypted (fresh nonce, same derived key) and re-put up to
//! `max_retries` times before settling at `failed`. Everything else
//! propagates with the affected index attached.

use std::io::Write;
use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use fv_chunks::{read_fragment, Fragmenter};
use fv_core::config::PipelineConfig;
use fv_core::{FragmentRecord, FragmentStatus, FvError, FvResult};
use fv_crypto::{decrypt_fragment, derive_fragment_key, encrypt_fragment, MasterSecret};
use fv_store::ContentStore;

use crate::manifest::Manifest;

/// Result of uploading one object.
#[derive(Debug)]
pub struct UploadReport {
    /// The manifest recording every fragment, in ascending index order
    pub manifest: Manifest,
    /// Total fragment count
    pub fragments: u32,
    /// Fragments that settled at `failed` after exhausting retries
    pub failed: u32,
    /// Source bytes processed
    pub bytes: u64,
}

/// Upload one object: every fragment encrypted under its own derived key
/// and stored content-addressed, with a manifest recording the outcome.
///
/// The upload itself succeeds even when individual fragments settle at
/// `failed` — partial completion is representable, and the caller decides
/// whether to persist the manifest and [`resume_object`] later. A source
/// read error aborts the whole upload: later fragments cannot be reached
/// once the stream breaks.
pub async fn upload_object<S: ContentStore>(
    store: &S,
    secret: &MasterSecret,
    object_id: &str,
    source: &Path,
    config: &PipelineConfig,
) -> FvResult<UploadReport> {
    let fragmenter = Fragmenter::new(config.chunk_size)?;
    let chunks = fragmenter.fragment(source)?;
    let workers = config.effective_workers();

    debug!(object_id, workers, chunk_size = config.chunk_size, "upload starting");

    let results: Vec<FvResult<(FragmentRecord, u64)>> = stream::iter(chunks.enumerate())
        .map(|(i, chunk)| async move {
            let plaintext = chunk?;
            let len = plaintext.len() as u64;
            let record =
                store_fragment(store, secret, i as u32, plaintext, config.max_retries).await?;
            Ok((record, len))
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    // Single-writer assembly; index, not completion order, decides position
    let mut records = Vec::with_capacity(results.len());
    let mut bytes = 0u64;
    let mut failed = 0u32;
    for result in results {
        let (record, len) = result?;
        if record.status == FragmentStatus::Failed {
            failed += 1;
        }
        bytes += len;
        records.push(record);
    }

    let manifest = Manifest::new(object_id, records)?;
    let fragments = manifest.fragments.len() as u32;

    info!(object_id, fragments, failed, bytes, "upload complete");

    Ok(UploadReport {
        manifest,
        fragments,
        failed,
        bytes,
    })
}

/// Download and reassemble one object into `dest`.
///
/// Requires every record to be `ok`. Fragments are fetched in index order,
/// decrypted under their per-index keys, and written atomically (tmp file
/// + rename), so an interrupted download never leaves a torn destination.
pub async fn download_object<S: ContentStore>(
    store: &S,
    secret: &MasterSecret,
    manifest: &Manifest,
    dest: &Path,
) -> FvResult<u64> {
    if let Some(record) = manifest.unsettled().first() {
        return Err(FvError::Other(anyhow::anyhow!(
            "object {} is not fully stored: fragment {} is {:?}",
            manifest.object_id,
            record.index,
            record.status
        )));
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = dest.with_extension("fv_tmp");
    let mut out = std::fs::File::create(&tmp)?;
    let mut bytes = 0u64;

    for record in &manifest.fragments {
        let key = derive_fragment_key(secret, record.index)?;
        let encrypted = store
            .get(&record.cid)
            .await
            .map_err(|e| attach_index(e, record.index))?;
        let plaintext = decrypt_fragment(&encrypted, &key)?;

        out.write_all(&plaintext)?;
        bytes += plaintext.len() as u64;
        debug!(index = record.index, "fragment reassembled");
    }

    drop(out);
    tokio::fs::rename(&tmp, dest).await?;

    info!(
        object_id = %manifest.object_id,
        bytes,
        dest = %dest.display(),
        "object downloaded"
    );
    Ok(bytes)
}

/// Settle the unsettled fragments of a previously uploaded object.
///
/// Re-reads exactly the byte ranges of `retry`/`failed` records, re-derives
/// the same per-index keys, re-encrypts under fresh nonces, and re-puts.
/// Records that were already `ok` come back byte-identical; settled ones
/// are replaced wholesale (fresh cid and timestamp).
pub async fn resume_object<S: ContentStore>(
    store: &S,
    secret: &MasterSecret,
    source: &Path,
    manifest: &Manifest,
    config: &PipelineConfig,
) -> FvResult<Manifest> {
    let unsettled: Vec<u32> = manifest.unsettled().iter().map(|r| r.index).collect();
    if unsettled.is_empty() {
        return Ok(manifest.clone());
    }

    info!(
        object_id = %manifest.object_id,
        unsettled = unsettled.len(),
        "resuming upload"
    );

    let workers = config.effective_workers();
    let results: Vec<FvResult<FragmentRecord>> = stream::iter(unsettled)
        .map(|index| async move {
            let plaintext = read_fragment(source, index, config.chunk_size)?;
            store_fragment(store, secret, index, plaintext, config.max_retries).await
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut updated = manifest.clone();
    for result in results {
        updated = updated.with_record(result?)?;
    }

    info!(
        object_id = %updated.object_id,
        complete = updated.is_fully_stored(),
        "resume finished"
    );
    Ok(updated)
}

/// Check every `ok` fragment against the store, demoting the ones that are
/// missing, no longer match their content id, or fail authentication.
///
/// Statuses are the only thing that changes; a transport failure aborts the
/// pass rather than condemning fragments it could not examine.
pub async fn verify_object<S: ContentStore>(
    store: &S,
    secret: &MasterSecret,
    manifest: &Manifest,
) -> FvResult<Manifest> {
    let mut updated = manifest.clone();

    for record in &manifest.fragments {
        if record.status != FragmentStatus::Ok {
            continue;
        }

        let key = derive_fragment_key(secret, record.index)?;
        let intact = match store.get(&record.cid).await {
            Ok(encrypted) => {
                fv_chunks::content_id_matches(&encrypted, &record.cid)
                    && decrypt_fragment(&encrypted, &key).is_ok()
            }
            Err(FvError::NotFound(_)) => false,
            Err(e) => return Err(attach_index(e, record.index)),
        };

        if !intact {
            warn!(index = record.index, cid = %record.cid, "fragment failed verification");
            updated = updated.with_status(record.index, FragmentStatus::Failed)?;
        }
    }

    Ok(updated)
}

/// Encrypt and store one fragment, retrying store failures.
///
/// Every attempt re-encrypts from the plaintext: the derived key is stable
/// across attempts, the nonce never is, so a retried fragment still
/// decrypts while partial store writes stay unambiguous.
async fn store_fragment<S: ContentStore>(
    store: &S,
    secret: &MasterSecret,
    index: u32,
    plaintext: Vec<u8>,
    max_retries: u32,
) -> FvResult<FragmentRecord> {
    let key = derive_fragment_key(secret, index)?;

    let mut attempt = 0u32;
    loop {
        let encrypted = encrypt_fragment(&plaintext, &key)?;
        match store.put(encrypted).await {
            Ok(cid) => {
                debug!(index, cid = %cid, attempt, "fragment stored");
                return Ok(FragmentRecord::new(index, cid, FragmentStatus::Ok));
            }
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!(index, attempt, error = %e, "store failed, retrying fragment");
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    index,
                    attempts = attempt + 1,
                    error = %e,
                    "retries exhausted, fragment marked failed"
                );
                return Ok(FragmentRecord::new(
                    index,
                    String::new(),
                    FragmentStatus::Failed,
                ));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Store and not-found errors gain the affected index so callers can
/// resume or report without guessing.
fn attach_index(err: FvError, index: u32) -> FvError {
    match err {
        FvError::Store(msg) => FvError::Store(format!("fragment {index}: {msg}")),
        FvError::NotFound(cid) => FvError::NotFound(format!("fragment {index}: {cid}")),
        other => other,
    }
}
