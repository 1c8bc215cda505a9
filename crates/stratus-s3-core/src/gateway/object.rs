//! Object read, write, copy, delete, and listing operations.

use chrono::Utc;
use percent_encoding::percent_decode_str;
use stratus_s3_model::error::S3Error;
use stratus_s3_model::input::{
    CopyObjectInput, DeleteObjectInput, DeleteObjectsInput, GetObjectInput, HeadObjectInput,
    ListObjectVersionsInput, ListObjectsInput, PostObjectInput, PutObjectInput,
};
use stratus_s3_model::operations::S3Operation;
use stratus_s3_model::output::{
    CopyObjectOutput, DeleteObjectOutput, DeleteObjectsOutput, GetObjectOutput,
    ListObjectVersionsOutput, ListObjectsOutput, PutObjectOutput,
};
use stratus_s3_model::types::{
    AccessControlList, CannedAcl, DeleteMarkerEntry, DeleteError, DeletedObject,
    MetadataDirective, ObjectEntry, ObjectVersionEntry, Permission,
};
use stratus_s3_policy::AccessRequest;
use tracing::{debug, info};

use super::{AclFallback, CallerContext, StratusGateway};
use crate::checksums::content_md5_matches;
use crate::conditional::Preconditions;
use crate::error::{ServiceError, ServiceResult};
use crate::metadata::filter_metadata;
use crate::multipart::clamp_listing_size;
use crate::range::resolve_range;
use crate::state::{mint_version_id, ObjectHeaders, ObjectRecord, ObjectStore, StoredVersion};

impl StratusGateway {
    /// `PUT /{bucket}/{key}`.
    pub async fn put_object(
        &self,
        caller: &CallerContext,
        input: PutObjectInput,
    ) -> ServiceResult<PutObjectOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::PutObject, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Write))?;

        if let Some(header) = input.content_md5.as_deref() {
            if !content_md5_matches(header, &input.body) {
                return Err(ServiceError::BadDigest);
            }
        }

        let versioned = bucket.versioning.read().is_versioned();
        let version_id = if bucket.is_versioning_enabled() {
            mint_version_id()
        } else {
            "null".to_owned()
        };

        let write = self
            .engine
            .write_object(&input.bucket, &input.key, &version_id, input.body)
            .await?;
        debug!(bucket = %input.bucket, key = %input.key, size = write.size, "stored object body");

        let owner = caller.as_owner();
        let record = ObjectRecord {
            key: input.key.clone(),
            version_id: version_id.clone(),
            etag: write.etag.clone(),
            size: write.size,
            last_modified: Utc::now(),
            headers: ObjectHeaders {
                content_type: input.content_type,
                cache_control: input.cache_control,
                content_disposition: input.content_disposition,
                content_encoding: input.content_encoding,
                expires: input.expires,
            },
            metadata: input.metadata,
            acl: AccessControlList::from_canned(input.acl.unwrap_or(CannedAcl::Private), &owner),
            owner,
        };
        bucket.objects.write().put(record);

        Ok(PutObjectOutput {
            etag: write.etag,
            version_id: versioned.then_some(version_id),
        })
    }

    /// `GET /{bucket}/{key}`.
    pub async fn get_object(
        &self,
        caller: &CallerContext,
        input: GetObjectInput,
    ) -> ServiceResult<GetObjectOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let record = {
            let store = bucket.objects.read();
            resolve_record(&store, &input.key, input.version_id.as_deref())?
        };
        self.authorize_object_read(caller, &input.bucket, &input.key, &record)?;

        Preconditions {
            if_match: input.if_match,
            if_none_match: input.if_none_match,
            if_modified_since: input.if_modified_since,
            if_unmodified_since: input.if_unmodified_since,
        }
        .check(&record.etag, record.last_modified)?;

        let range = resolve_range(input.range.as_deref(), record.size)?;
        let body = self
            .engine
            .read_object(&input.bucket, &input.key, &record.version_id, range)
            .await?;

        let versioned = bucket.versioning.read().is_versioned();
        Ok(render_object(record, body, range, versioned))
    }

    /// `HEAD /{bucket}/{key}`. Same semantics as GET without the body.
    pub fn head_object(
        &self,
        caller: &CallerContext,
        input: HeadObjectInput,
    ) -> ServiceResult<GetObjectOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let record = {
            let store = bucket.objects.read();
            resolve_record(&store, &input.key, input.version_id.as_deref())?
        };
        self.authorize_object_read(caller, &input.bucket, &input.key, &record)?;

        Preconditions {
            if_match: input.if_match,
            if_none_match: input.if_none_match,
            if_modified_since: input.if_modified_since,
            if_unmodified_since: input.if_unmodified_since,
        }
        .check(&record.etag, record.last_modified)?;

        // The 416 check still applies to HEAD; the body never does.
        let range = resolve_range(input.range.as_deref(), record.size)?;
        let versioned = bucket.versioning.read().is_versioned();
        Ok(render_object(record, bytes::Bytes::new(), range, versioned))
    }

    /// `DELETE /{bucket}/{key}`. Answers 204 even for a missing key.
    pub fn delete_object(
        &self,
        caller: &CallerContext,
        input: DeleteObjectInput,
    ) -> ServiceResult<DeleteObjectOutput> {
        let (output, _) = self.remove_object(caller, input)?;
        Ok(output)
    }

    /// Shared delete path. The flag reports whether the call had any
    /// effect (a version removed or a delete marker planted); the
    /// multi-object path turns a no-op into a per-key `NoSuchKey` entry.
    fn remove_object(
        &self,
        caller: &CallerContext,
        input: DeleteObjectInput,
    ) -> ServiceResult<(DeleteObjectOutput, bool)> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::DeleteObject, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Write))?;

        match input.version_id {
            Some(version_id) => {
                // Permanent removal of one version; idempotent when absent.
                let removed = bucket
                    .objects
                    .write()
                    .delete_version(&input.key, &version_id);
                let effective = removed.is_some();
                let was_marker = match removed {
                    Some(StoredVersion::Object(_)) => {
                        self.engine
                            .delete_object(&input.bucket, &input.key, &version_id);
                        false
                    }
                    Some(StoredVersion::Marker(_)) => true,
                    None => false,
                };
                Ok((
                    DeleteObjectOutput {
                        delete_marker: was_marker,
                        version_id: Some(version_id),
                    },
                    effective,
                ))
            }
            None => {
                let (marker_id, had) = bucket
                    .objects
                    .write()
                    .delete_current(&input.key, &caller.as_owner());
                if marker_id.is_none() && had {
                    self.engine.delete_object(&input.bucket, &input.key, "null");
                }
                debug!(bucket = %input.bucket, key = %input.key, marker = marker_id.is_some(), "deleted object");
                let effective = had || marker_id.is_some();
                Ok((
                    DeleteObjectOutput {
                        delete_marker: marker_id.is_some(),
                        version_id: marker_id,
                    },
                    effective,
                ))
            }
        }
    }

    /// `POST /{bucket}?delete`. Each key is processed independently.
    pub fn delete_objects(
        &self,
        caller: &CallerContext,
        input: DeleteObjectsInput,
    ) -> ServiceResult<DeleteObjectsOutput> {
        // Bucket existence is checked once; per-key failures never abort
        // the remainder.
        self.bucket(&input.bucket)?;

        let quiet = input.delete.quiet;
        let mut deleted = Vec::new();
        let mut errors = Vec::new();
        for object in input.delete.objects {
            // A no-op delete (nothing removed, no marker planted) reports
            // the key as an error entry, not a success.
            let outcome = self
                .remove_object(
                    caller,
                    DeleteObjectInput {
                        bucket: input.bucket.clone(),
                        key: object.key.clone(),
                        version_id: object.version_id.clone(),
                    },
                )
                .and_then(|(result, effective)| {
                    if effective {
                        Ok(result)
                    } else {
                        Err(ServiceError::NoSuchKey {
                            key: object.key.clone(),
                        })
                    }
                });
            match outcome {
                Ok(result) => {
                    if !quiet {
                        deleted.push(DeletedObject {
                            key: object.key,
                            version_id: object.version_id,
                            delete_marker: result.delete_marker,
                            delete_marker_version_id: result
                                .delete_marker
                                .then(|| result.version_id.clone())
                                .flatten(),
                        });
                    }
                }
                Err(err) => {
                    let wire: S3Error = err.into();
                    errors.push(DeleteError {
                        key: object.key,
                        version_id: object.version_id,
                        code: wire.code().as_str().to_owned(),
                        message: wire.message().to_owned(),
                    });
                }
            }
        }
        Ok(DeleteObjectsOutput { deleted, errors })
    }

    /// `PUT /{bucket}/{key}` with `x-amz-copy-source`.
    pub async fn copy_object(
        &self,
        caller: &CallerContext,
        input: CopyObjectInput,
    ) -> ServiceResult<CopyObjectOutput> {
        let (source_bucket_name, source_key, source_version) =
            parse_copy_source(&input.copy_source)?;

        let source_bucket = self.bucket(&source_bucket_name)?;
        let source = {
            let store = source_bucket.objects.read();
            resolve_record(&store, &source_key, source_version.as_deref())?
        };
        self.authorize_object_read(caller, &source_bucket_name, &source_key, &source)?;

        // Copy conditionals answer 412 across the board; a stale
        // modified-since never turns into a 304 here.
        Preconditions {
            if_match: input.copy_source_if_match,
            if_none_match: input.copy_source_if_none_match,
            if_modified_since: input.copy_source_if_modified_since,
            if_unmodified_since: input.copy_source_if_unmodified_since,
        }
        .check(&source.etag, source.last_modified)
        .map_err(|err| match err {
            ServiceError::NotModified => ServiceError::PreconditionFailed,
            other => other,
        })?;

        let dest_bucket = self.bucket(&input.bucket)?;
        let dest_acl = dest_bucket.acl.read().clone();
        let request = AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::PutObject, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&dest_acl, Permission::Write))?;

        let source_versioned = source_bucket.versioning.read().is_versioned();
        let dest_versioned = dest_bucket.versioning.read().is_versioned();
        let version_id = if dest_bucket.is_versioning_enabled() {
            mint_version_id()
        } else {
            "null".to_owned()
        };

        let write = self
            .engine
            .copy_object(
                (&source_bucket_name, &source_key, &source.version_id),
                (&input.bucket, &input.key, &version_id),
            )
            .await?;

        let directive = input.metadata_directive.unwrap_or_default();
        let (headers, metadata) = match directive {
            MetadataDirective::Copy => (source.headers.clone(), source.metadata.clone()),
            MetadataDirective::Replace => (
                ObjectHeaders {
                    content_type: input.content_type,
                    cache_control: input.cache_control,
                    content_disposition: input.content_disposition,
                    content_encoding: input.content_encoding,
                    expires: input.expires,
                },
                input.metadata,
            ),
        };

        let owner = caller.as_owner();
        let last_modified = Utc::now();
        let record = ObjectRecord {
            key: input.key.clone(),
            version_id: version_id.clone(),
            etag: write.etag.clone(),
            size: write.size,
            last_modified,
            headers,
            metadata,
            acl: AccessControlList::from_canned(input.acl.unwrap_or(CannedAcl::Private), &owner),
            owner,
        };
        dest_bucket.objects.write().put(record);
        info!(
            source = %input.copy_source,
            bucket = %input.bucket,
            key = %input.key,
            "copied object"
        );

        Ok(CopyObjectOutput {
            etag: write.etag,
            last_modified,
            source_version_id: source_versioned.then(|| source.version_id),
            version_id: dest_versioned.then_some(version_id),
        })
    }

    /// `POST /{bucket}` browser form upload.
    ///
    /// Authentication is deferred: the identity comes from the form's
    /// `AWSAccessKeyId` field, not from the transport caller.
    pub async fn post_object(
        &self,
        caller: &CallerContext,
        input: PostObjectInput,
    ) -> ServiceResult<PutObjectOutput> {
        let identity = self.resolve_identity(input.access_key_id.as_deref());
        let form_caller = CallerContext {
            identity,
            source_ip: caller.source_ip,
        };
        self.put_object(
            &form_caller,
            PutObjectInput {
                acl: input.acl,
                body: input.body,
                bucket: input.bucket,
                cache_control: None,
                content_disposition: None,
                content_encoding: None,
                content_md5: None,
                content_type: input.content_type,
                expires: None,
                key: input.key,
                metadata: input.metadata,
            },
        )
        .await
    }

    /// `GET /{bucket}`.
    pub fn list_objects(
        &self,
        caller: &CallerContext,
        input: ListObjectsInput,
    ) -> ServiceResult<ListObjectsOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            prefix: input.prefix.clone(),
            delimiter: input.delimiter.clone(),
            max_keys: input.max_keys,
            ..caller.access_request(S3Operation::ListObjects, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Read))?;

        let max_keys = clamp_listing_size(input.max_keys.unwrap_or(i32::MAX));
        let page = bucket.objects.read().list_objects(
            input.prefix.as_deref().unwrap_or(""),
            input.delimiter.as_deref().unwrap_or(""),
            input.marker.as_deref().unwrap_or(""),
            max_keys,
        );

        let contents = page
            .objects
            .into_iter()
            .map(|record| ObjectEntry {
                key: record.key,
                last_modified: record.last_modified,
                etag: record.etag,
                size: record.size,
                owner: Some(record.owner),
            })
            .collect();

        #[allow(clippy::cast_possible_truncation)]
        Ok(ListObjectsOutput {
            common_prefixes: page.common_prefixes,
            contents,
            delimiter: input.delimiter,
            is_truncated: page.is_truncated,
            marker: input.marker,
            max_keys: max_keys as i32,
            name: input.bucket,
            next_marker: page.next_marker,
            prefix: input.prefix,
        })
    }

    /// `GET /{bucket}?versions`.
    pub fn list_object_versions(
        &self,
        caller: &CallerContext,
        input: ListObjectVersionsInput,
    ) -> ServiceResult<ListObjectVersionsOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            prefix: input.prefix.clone(),
            delimiter: input.delimiter.clone(),
            max_keys: input.max_keys,
            ..caller.access_request(S3Operation::ListObjectVersions, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Read))?;

        let max_keys = clamp_listing_size(input.max_keys.unwrap_or(i32::MAX));
        let page = bucket.objects.read().list_versions(
            input.prefix.as_deref().unwrap_or(""),
            input.delimiter.as_deref().unwrap_or(""),
            input.key_marker.as_deref().unwrap_or(""),
            input.version_id_marker.as_deref().unwrap_or(""),
            max_keys,
        );

        let mut versions = Vec::new();
        let mut delete_markers = Vec::new();
        for entry in page.versions {
            match entry.version {
                StoredVersion::Object(record) => versions.push(ObjectVersionEntry {
                    key: record.key,
                    version_id: record.version_id,
                    is_latest: entry.is_latest,
                    last_modified: record.last_modified,
                    etag: record.etag,
                    size: record.size,
                    owner: Some(record.owner),
                }),
                StoredVersion::Marker(marker) => delete_markers.push(DeleteMarkerEntry {
                    key: marker.key,
                    version_id: marker.version_id,
                    is_latest: entry.is_latest,
                    last_modified: marker.last_modified,
                    owner: Some(marker.owner),
                }),
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok(ListObjectVersionsOutput {
            common_prefixes: page.common_prefixes,
            delete_markers,
            delimiter: input.delimiter,
            is_truncated: page.is_truncated,
            key_marker: input.key_marker,
            max_keys: max_keys as i32,
            name: input.bucket,
            next_key_marker: page.next_key_marker,
            next_version_id_marker: page.next_version_id_marker,
            prefix: input.prefix,
            version_id_marker: input.version_id_marker,
            versions,
        })
    }

    /// Read authorization against the object's own ACL.
    fn authorize_object_read(
        &self,
        caller: &CallerContext,
        bucket: &str,
        key: &str,
        record: &ObjectRecord,
    ) -> ServiceResult<()> {
        let request = AccessRequest {
            key: Some(key.to_owned()),
            ..caller.access_request(S3Operation::GetObject, bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&record.acl, Permission::Read))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a key (and optional version id) against a store to one record.
///
/// Without a version id the current version answers; a current delete
/// marker reads as `NoSuchKey`. With one, an absent version is
/// `NoSuchVersion` and a delete marker is the dedicated `DeleteMarker`
/// error so the HTTP layer can answer 405 with its flag header.
pub(crate) fn resolve_record(
    store: &ObjectStore,
    key: &str,
    version_id: Option<&str>,
) -> ServiceResult<ObjectRecord> {
    match version_id {
        None => store
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::NoSuchKey { key: key.to_owned() }),
        Some(version_id) if store.is_versioned() => match store.version_entry(key, version_id) {
            Some(StoredVersion::Object(record)) => Ok((**record).clone()),
            Some(StoredVersion::Marker(marker)) => Err(ServiceError::DeleteMarker {
                version_id: marker.version_id.clone(),
            }),
            None => Err(ServiceError::NoSuchVersion {
                key: key.to_owned(),
                version_id: version_id.to_owned(),
            }),
        },
        Some(version_id) => store
            .get_version(key, version_id)
            .cloned()
            .ok_or_else(|| ServiceError::NoSuchVersion {
                key: key.to_owned(),
                version_id: version_id.to_owned(),
            }),
    }
}

/// Split an `x-amz-copy-source` value into bucket, key, and version id.
///
/// Accepts `[/]bucket/key[?versionId=...]`, percent-decoded.
fn parse_copy_source(raw: &str) -> ServiceResult<(String, String, Option<String>)> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| ServiceError::invalid_argument("x-amz-copy-source is not valid UTF-8"))?;
    let (path, version) = match decoded.split_once('?') {
        Some((path, query)) => {
            let version = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("versionId="))
                .map(str::to_owned);
            (path, version)
        }
        None => (decoded.as_ref(), None),
    };
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket.to_owned(), key.to_owned(), version))
        }
        _ => Err(ServiceError::invalid_argument(format!(
            "x-amz-copy-source must name a bucket and key: {raw}"
        ))),
    }
}

/// Assemble the read output shared by GET and HEAD.
fn render_object(
    record: ObjectRecord,
    body: bytes::Bytes,
    range: Option<crate::range::ByteRange>,
    versioned: bool,
) -> GetObjectOutput {
    let content_range = range.map(|r| r.content_range(record.size));
    let (metadata, missing_meta) = filter_metadata(record.metadata);
    GetObjectOutput {
        body,
        cache_control: record.headers.cache_control,
        content_disposition: record.headers.content_disposition,
        content_encoding: record.headers.content_encoding,
        content_range,
        content_type: record.headers.content_type,
        etag: record.etag,
        expires: record.headers.expires,
        last_modified: record.last_modified,
        metadata,
        missing_meta,
        total_size: record.size,
        version_id: versioned.then_some(record.version_id),
    }
}
