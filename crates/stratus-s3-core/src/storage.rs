//! Object body storage.
//!
//! The gateway keeps metadata in [`crate::state`] and bytes behind the
//! [`StorageEngine`] trait. [`MemoryEngine`] is the shipped implementation:
//! bodies below a configurable threshold stay in memory as [`Bytes`], larger
//! bodies spill to temporary files that are removed when the entry drops.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use tokio::io::AsyncReadExt;
use tracing::{debug, trace, warn};

use crate::checksums;
use crate::error::{ServiceError, ServiceResult};
use crate::range::ByteRange;

/// Composite key for an object body: `(bucket, key, version_id)`.
type BodyKey = (String, String, String);

/// Composite key for a part body: `(bucket, upload_id, part_number)`.
type PartKey = (String, String, i32);

/// Default in-memory threshold, 512 KiB.
pub const DEFAULT_MEMORY_THRESHOLD: usize = 524_288;

// ---------------------------------------------------------------------------
// WriteResult
// ---------------------------------------------------------------------------

/// What a body write produced.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// Quoted ETag of the written data.
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// Unquoted MD5 hex digest.
    pub md5_hex: String,
}

// ---------------------------------------------------------------------------
// StorageEngine
// ---------------------------------------------------------------------------

/// Byte storage for object and part bodies.
///
/// Keys mirror the metadata layer: objects by `(bucket, key, version_id)`,
/// parts by `(bucket, upload_id, part_number)`. Implementations must be safe
/// to share across request tasks.
#[async_trait]
pub trait StorageEngine: Send + Sync + std::fmt::Debug {
    /// Store an object body, returning its digest and size.
    async fn write_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        data: Bytes,
    ) -> ServiceResult<WriteResult>;

    /// Read an object body, optionally restricted to an inclusive range.
    async fn read_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        range: Option<ByteRange>,
    ) -> ServiceResult<Bytes>;

    /// Copy one object body to another location.
    async fn copy_object(
        &self,
        source: (&str, &str, &str),
        dest: (&str, &str, &str),
    ) -> ServiceResult<WriteResult>;

    /// Remove an object body. No-op when absent.
    fn delete_object(&self, bucket: &str, key: &str, version_id: &str);

    /// Store a part body.
    async fn write_part(
        &self,
        bucket: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> ServiceResult<WriteResult>;

    /// Concatenate stored parts into a final object body.
    ///
    /// Returns the composite write result plus each part's unquoted MD5
    /// digest, and removes the consumed part bodies.
    async fn assemble_parts(
        &self,
        bucket: &str,
        upload_id: &str,
        key: &str,
        version_id: &str,
        part_numbers: &[i32],
    ) -> ServiceResult<(WriteResult, Vec<String>)>;

    /// Remove every part body for an upload.
    fn abort_parts(&self, bucket: &str, upload_id: &str);

    /// Remove every object and part body for a bucket.
    fn purge_bucket(&self, bucket: &str);
}

// ---------------------------------------------------------------------------
// StoredBody
// ---------------------------------------------------------------------------

/// A stored body, in memory or spilled to a temp file.
enum StoredBody {
    /// Small bodies held directly.
    InMemory {
        /// The raw bytes.
        data: Bytes,
    },
    /// Large bodies written to a temp file.
    OnDisk {
        /// Path to the temp file.
        path: PathBuf,
        /// Body size in bytes.
        size: u64,
    },
}

impl std::fmt::Debug for StoredBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory { data } => f
                .debug_struct("InMemory")
                .field("size", &data.len())
                .finish(),
            Self::OnDisk { path, size } => f
                .debug_struct("OnDisk")
                .field("path", path)
                .field("size", size)
                .finish(),
        }
    }
}

impl Drop for StoredBody {
    fn drop(&mut self) {
        if let Self::OnDisk { path, .. } = self {
            if let Err(e) = std::fs::remove_file(path.as_path()) {
                // The file may already be gone after a reset.
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove temp file");
                }
            } else {
                trace!(path = %path.display(), "removed temp file");
            }
        }
    }
}

impl StoredBody {
    async fn read_all(&self) -> ServiceResult<Bytes> {
        match self {
            Self::InMemory { data } => Ok(data.clone()),
            Self::OnDisk { path, size } => {
                let mut file = tokio::fs::File::open(path).await.map_err(|e| {
                    ServiceError::Internal(anyhow::anyhow!(
                        "failed to open temp file {}: {e}",
                        path.display()
                    ))
                })?;
                let expected = usize::try_from(*size).unwrap_or(usize::MAX);
                let mut buf = BytesMut::with_capacity(expected);
                // read_buf may return fewer bytes than requested, so keep
                // reading until the whole spilled body is back in memory.
                while buf.len() < expected {
                    let n = file.read_buf(&mut buf).await.map_err(|e| {
                        ServiceError::Internal(anyhow::anyhow!(
                            "failed to read temp file {}: {e}",
                            path.display()
                        ))
                    })?;
                    if n == 0 {
                        return Err(ServiceError::Internal(anyhow::anyhow!(
                            "temp file {} truncated: read {} of {} bytes",
                            path.display(),
                            buf.len(),
                            expected
                        )));
                    }
                }
                Ok(buf.freeze())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryEngine
// ---------------------------------------------------------------------------

/// In-memory storage engine with temp-file spillover.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use stratus_s3_core::storage::{MemoryEngine, StorageEngine};
///
/// # tokio_test::block_on(async {
/// let engine = MemoryEngine::new(1024);
/// let result = engine
///     .write_object("photos", "cat.jpg", "null", Bytes::from("meow"))
///     .await
///     .unwrap();
/// assert_eq!(result.size, 4);
///
/// let body = engine
///     .read_object("photos", "cat.jpg", "null", None)
///     .await
///     .unwrap();
/// assert_eq!(body.as_ref(), b"meow");
/// # });
/// ```
pub struct MemoryEngine {
    /// Object bodies keyed by `(bucket, key, version_id)`.
    objects: DashMap<BodyKey, StoredBody>,
    /// Part bodies keyed by `(bucket, upload_id, part_number)`.
    parts: DashMap<PartKey, StoredBody>,
    /// Bodies above this size spill to disk.
    memory_threshold: usize,
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("objects_count", &self.objects.len())
            .field("parts_count", &self.parts.len())
            .field("memory_threshold", &self.memory_threshold)
            .finish()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_THRESHOLD)
    }
}

impl MemoryEngine {
    /// Create an engine with the given spillover threshold in bytes.
    #[must_use]
    pub fn new(memory_threshold: usize) -> Self {
        debug!(memory_threshold, "creating MemoryEngine");
        Self {
            objects: DashMap::new(),
            parts: DashMap::new(),
            memory_threshold,
        }
    }

    async fn store_body(&self, data: Bytes) -> ServiceResult<StoredBody> {
        if data.len() > self.memory_threshold {
            self.spill_to_disk(&data).await
        } else {
            Ok(StoredBody::InMemory { data })
        }
    }

    async fn spill_to_disk(&self, data: &[u8]) -> ServiceResult<StoredBody> {
        let size = data.len() as u64;

        // NamedTempFile removes its file on drop; persist first so cleanup
        // stays under StoredBody's Drop.
        let temp = tempfile::NamedTempFile::new().map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("failed to create temp file: {e}"))
        })?;
        let path = temp.path().to_path_buf();
        temp.persist(&path).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!(
                "failed to persist temp file {}: {e}",
                path.display()
            ))
        })?;

        tokio::fs::write(&path, data).await.map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!(
                "failed to write temp file {}: {e}",
                path.display()
            ))
        })?;

        trace!(path = %path.display(), size, "spilled body to disk");
        Ok(StoredBody::OnDisk { path, size })
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn write_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        data: Bytes,
    ) -> ServiceResult<WriteResult> {
        let md5_hex = checksums::compute_md5(&data);
        let etag = format!("\"{md5_hex}\"");
        let size = data.len() as u64;

        let stored = self.store_body(data).await?;
        trace!(bucket, key, version_id, size, "stored object body");
        self.objects.insert(
            (bucket.to_owned(), key.to_owned(), version_id.to_owned()),
            stored,
        );

        Ok(WriteResult { etag, size, md5_hex })
    }

    async fn read_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
        range: Option<ByteRange>,
    ) -> ServiceResult<Bytes> {
        let body_key = (bucket.to_owned(), key.to_owned(), version_id.to_owned());
        let entry = self
            .objects
            .get(&body_key)
            .ok_or_else(|| ServiceError::NoSuchKey { key: key.to_owned() })?;

        let body = entry.value().read_all().await?;
        match range {
            Some(r) => {
                let len = body.len() as u64;
                if r.start >= len || r.end >= len {
                    return Err(ServiceError::InvalidRange { size: len });
                }
                let start = usize::try_from(r.start)
                    .map_err(|_| ServiceError::InvalidRange { size: len })?;
                let end = usize::try_from(r.end)
                    .map_err(|_| ServiceError::InvalidRange { size: len })?;
                Ok(body.slice(start..=end))
            }
            None => Ok(body),
        }
    }

    async fn copy_object(
        &self,
        source: (&str, &str, &str),
        dest: (&str, &str, &str),
    ) -> ServiceResult<WriteResult> {
        let data = self.read_object(source.0, source.1, source.2, None).await?;
        debug!(
            src_bucket = source.0,
            src_key = source.1,
            dst_bucket = dest.0,
            dst_key = dest.1,
            size = data.len(),
            "copying object body"
        );
        self.write_object(dest.0, dest.1, dest.2, data).await
    }

    fn delete_object(&self, bucket: &str, key: &str, version_id: &str) {
        let body_key = (bucket.to_owned(), key.to_owned(), version_id.to_owned());
        if self.objects.remove(&body_key).is_some() {
            trace!(bucket, key, version_id, "deleted object body");
        }
    }

    async fn write_part(
        &self,
        bucket: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> ServiceResult<WriteResult> {
        let md5_hex = checksums::compute_md5(&data);
        let etag = format!("\"{md5_hex}\"");
        let size = data.len() as u64;

        let stored = self.store_body(data).await?;
        trace!(bucket, upload_id, part_number, size, "stored part body");
        self.parts.insert(
            (bucket.to_owned(), upload_id.to_owned(), part_number),
            stored,
        );

        Ok(WriteResult { etag, size, md5_hex })
    }

    async fn assemble_parts(
        &self,
        bucket: &str,
        upload_id: &str,
        key: &str,
        version_id: &str,
        part_numbers: &[i32],
    ) -> ServiceResult<(WriteResult, Vec<String>)> {
        let mut combined = BytesMut::new();
        let mut part_digests = Vec::with_capacity(part_numbers.len());

        for &part_number in part_numbers {
            let part_key = (bucket.to_owned(), upload_id.to_owned(), part_number);
            let entry = self.parts.get(&part_key).ok_or(ServiceError::InvalidPart)?;
            let data = entry.value().read_all().await?;
            part_digests.push(checksums::compute_md5(&data));
            combined.extend_from_slice(&data);
        }

        let body = combined.freeze();
        let size = body.len() as u64;
        let etag = checksums::compute_multipart_etag(&part_digests, part_numbers.len());

        let stored = self.store_body(body).await?;
        self.objects.insert(
            (bucket.to_owned(), key.to_owned(), version_id.to_owned()),
            stored,
        );
        self.abort_parts(bucket, upload_id);

        debug!(
            bucket,
            upload_id,
            key,
            version_id,
            size,
            parts = part_numbers.len(),
            "assembled multipart object"
        );

        let composite_md5 = etag
            .trim_matches('"')
            .split('-')
            .next()
            .unwrap_or_default()
            .to_owned();

        Ok((
            WriteResult {
                etag,
                size,
                md5_hex: composite_md5,
            },
            part_digests,
        ))
    }

    fn abort_parts(&self, bucket: &str, upload_id: &str) {
        self.parts.retain(|key, _| {
            let matches = key.0 == bucket && key.1 == upload_id;
            if matches {
                trace!(bucket, upload_id, part_number = key.2, "removing part body");
            }
            !matches
        });
    }

    fn purge_bucket(&self, bucket: &str) {
        let objects_before = self.objects.len();
        self.objects.retain(|key, _| key.0 != bucket);
        let parts_before = self.parts.len();
        self.parts.retain(|key, _| key.0 != bucket);
        debug!(
            bucket,
            objects_removed = objects_before - self.objects.len(),
            parts_removed = parts_before - self.parts.len(),
            "purged bucket bodies"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
