//! Multipart upload lifecycle operations.

use chrono::Utc;
use stratus_s3_model::input::{
    AbortMultipartUploadInput, CompleteMultipartUploadInput, CreateMultipartUploadInput,
    ListMultipartUploadsInput, ListPartsInput, UploadPartInput,
};
use stratus_s3_model::operations::S3Operation;
use stratus_s3_model::output::{
    CompleteMultipartUploadOutput, CreateMultipartUploadOutput, ListMultipartUploadsOutput,
    ListPartsOutput, UploadPartOutput,
};
use stratus_s3_model::types::{
    AccessControlList, CannedAcl, MultipartUploadEntry, PartEntry, Permission,
};
use stratus_s3_policy::AccessRequest;
use tracing::{debug, info};

use super::{AclFallback, CallerContext, StratusGateway};
use crate::checksums::content_md5_matches;
use crate::error::{ServiceError, ServiceResult};
use crate::multipart::{clamp_listing_size, validate_part_number, PartRecord, UploadRow};
use crate::state::{mint_version_id, ObjectHeaders, ObjectRecord};

impl StratusGateway {
    /// `POST /{bucket}/{key}?uploads`.
    pub fn create_multipart_upload(
        &self,
        caller: &CallerContext,
        input: CreateMultipartUploadInput,
    ) -> ServiceResult<CreateMultipartUploadOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            key: Some(input.key.clone()),
            ..caller.access_request(S3Operation::CreateMultipartUpload, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Write))?;

        let headers = ObjectHeaders {
            content_type: input.content_type,
            cache_control: input.cache_control,
            content_disposition: input.content_disposition,
            content_encoding: input.content_encoding,
            expires: input.expires,
        };
        let row = self.tracker.initiate(
            &input.bucket,
            &input.key,
            caller.as_owner(),
            input.acl.unwrap_or(CannedAcl::Private),
            headers,
            input.metadata,
        );
        info!(bucket = %input.bucket, key = %input.key, upload_id = %row.upload_id, "initiated multipart upload");

        Ok(CreateMultipartUploadOutput {
            bucket: input.bucket,
            key: input.key,
            upload_id: row.upload_id.clone(),
        })
    }

    /// `PUT /{bucket}/{key}?partNumber&uploadId`.
    pub async fn upload_part(
        &self,
        caller: &CallerContext,
        input: UploadPartInput,
    ) -> ServiceResult<UploadPartOutput> {
        self.bucket(&input.bucket)?;
        validate_part_number(input.part_number)?;

        let row = self
            .tracker
            .lookup(&input.bucket, &input.key, &input.upload_id)?;
        require_initiator(caller, &row)?;

        if let Some(header) = input.content_md5.as_deref() {
            if !content_md5_matches(header, &input.body) {
                return Err(ServiceError::BadDigest);
            }
        }

        let write = self
            .engine
            .write_part(&input.bucket, &input.upload_id, input.part_number, input.body)
            .await?;
        row.record_part(PartRecord {
            part_number: input.part_number,
            etag: write.etag.clone(),
            size: write.size,
            last_modified: Utc::now(),
        })?;
        debug!(
            bucket = %input.bucket,
            upload_id = %input.upload_id,
            part_number = input.part_number,
            size = write.size,
            "stored part"
        );

        Ok(UploadPartOutput { etag: write.etag })
    }

    /// `POST /{bucket}/{key}?uploadId`.
    pub async fn complete_multipart_upload(
        &self,
        caller: &CallerContext,
        input: CompleteMultipartUploadInput,
    ) -> ServiceResult<CompleteMultipartUploadOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let row = self
            .tracker
            .lookup(&input.bucket, &input.key, &input.upload_id)?;
        require_initiator(caller, &row)?;

        row.begin_seal()?;
        let ordered = match row.validate_completion(&input.parts) {
            Ok(ordered) => ordered,
            Err(err) => {
                row.cancel_seal();
                return Err(err);
            }
        };

        let versioned = bucket.versioning.read().is_versioned();
        let version_id = if bucket.is_versioning_enabled() {
            mint_version_id()
        } else {
            "null".to_owned()
        };

        let assembled = self
            .engine
            .assemble_parts(&input.bucket, &input.upload_id, &input.key, &version_id, &ordered)
            .await;
        let (write, _part_digests) = match assembled {
            Ok(result) => result,
            Err(err) => {
                row.cancel_seal();
                return Err(err);
            }
        };

        let owner = row.initiator.clone();
        let record = ObjectRecord {
            key: input.key.clone(),
            version_id: version_id.clone(),
            etag: write.etag.clone(),
            size: write.size,
            last_modified: Utc::now(),
            headers: row.headers.clone(),
            metadata: row.metadata.clone(),
            acl: AccessControlList::from_canned(row.acl, &owner),
            owner,
        };
        bucket.objects.write().put(record);
        self.tracker.remove(&input.upload_id);
        info!(
            bucket = %input.bucket,
            key = %input.key,
            upload_id = %input.upload_id,
            parts = ordered.len(),
            size = write.size,
            "completed multipart upload"
        );

        Ok(CompleteMultipartUploadOutput {
            bucket: input.bucket.clone(),
            etag: write.etag,
            key: input.key.clone(),
            location: format!("/{}/{}", input.bucket, input.key),
            version_id: versioned.then_some(version_id),
        })
    }

    /// `DELETE /{bucket}/{key}?uploadId`.
    ///
    /// Aborting an upload id that no longer exists succeeds.
    pub fn abort_multipart_upload(
        &self,
        caller: &CallerContext,
        input: AbortMultipartUploadInput,
    ) -> ServiceResult<()> {
        self.bucket(&input.bucket)?;
        let row = match self
            .tracker
            .lookup(&input.bucket, &input.key, &input.upload_id)
        {
            Ok(row) => row,
            Err(ServiceError::NoSuchUpload { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };
        require_initiator(caller, &row)?;

        self.tracker.remove(&input.upload_id);
        self.engine.abort_parts(&input.bucket, &input.upload_id);
        info!(bucket = %input.bucket, key = %input.key, upload_id = %input.upload_id, "aborted multipart upload");
        Ok(())
    }

    /// `GET /{bucket}/{key}?uploadId`.
    ///
    /// Open to the initiator, and to anyone holding WRITE on the bucket.
    pub fn list_parts(
        &self,
        caller: &CallerContext,
        input: ListPartsInput,
    ) -> ServiceResult<ListPartsOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let row = self
            .tracker
            .lookup(&input.bucket, &input.key, &input.upload_id)?;

        if !caller.identity.owns(&row.initiator.id) {
            let bucket_acl = bucket.acl.read().clone();
            let request = AccessRequest {
                key: Some(input.key.clone()),
                ..caller.access_request(S3Operation::ListParts, &input.bucket)
            };
            self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Write))?;
        }

        let marker = input.part_number_marker.unwrap_or(0);
        let max_parts = input.max_parts.unwrap_or(i32::MAX);
        let (parts, is_truncated) = row.list_parts(marker, max_parts);
        let next_part_number_marker =
            is_truncated.then(|| parts.last().map_or(0, |p| p.part_number));

        #[allow(clippy::cast_possible_truncation)]
        Ok(ListPartsOutput {
            bucket: input.bucket,
            initiator: row.initiator.clone(),
            is_truncated,
            key: input.key,
            max_parts: clamp_listing_size(max_parts) as i32,
            next_part_number_marker,
            owner: row.initiator.clone(),
            part_number_marker: input.part_number_marker,
            parts: parts
                .into_iter()
                .map(|p| PartEntry {
                    part_number: p.part_number,
                    last_modified: p.last_modified,
                    etag: p.etag,
                    size: p.size,
                })
                .collect(),
            upload_id: input.upload_id,
        })
    }

    /// `GET /{bucket}?uploads`.
    pub fn list_multipart_uploads(
        &self,
        caller: &CallerContext,
        input: ListMultipartUploadsInput,
    ) -> ServiceResult<ListMultipartUploadsOutput> {
        let bucket = self.bucket(&input.bucket)?;
        let bucket_acl = bucket.acl.read().clone();
        let request = AccessRequest {
            prefix: input.prefix.clone(),
            delimiter: input.delimiter.clone(),
            max_keys: input.max_uploads,
            ..caller.access_request(S3Operation::ListMultipartUploads, &input.bucket)
        };
        self.authorize(caller, &request, AclFallback::Acl(&bucket_acl, Permission::Read))?;

        let max_uploads = input.max_uploads.unwrap_or(i32::MAX);
        let listing = self.tracker.list_uploads(
            &input.bucket,
            input.prefix.as_deref().unwrap_or(""),
            input.delimiter.as_deref().unwrap_or(""),
            input.key_marker.as_deref().unwrap_or(""),
            input.upload_id_marker.as_deref().unwrap_or(""),
            max_uploads,
        );

        #[allow(clippy::cast_possible_truncation)]
        Ok(ListMultipartUploadsOutput {
            bucket: input.bucket,
            common_prefixes: listing.common_prefixes,
            delimiter: input.delimiter,
            is_truncated: listing.is_truncated,
            key_marker: input.key_marker,
            max_uploads: clamp_listing_size(max_uploads) as i32,
            next_key_marker: listing.next_key_marker,
            next_upload_id_marker: listing.next_upload_id_marker,
            prefix: input.prefix,
            upload_id_marker: input.upload_id_marker,
            uploads: listing
                .uploads
                .into_iter()
                .map(|row| MultipartUploadEntry {
                    key: row.key.clone(),
                    upload_id: row.upload_id.clone(),
                    initiator: row.initiator.clone(),
                    owner: row.initiator.clone(),
                    initiated: row.initiated,
                })
                .collect(),
        })
    }
}

/// Part uploads, completion, and abort are initiator-only.
fn require_initiator(caller: &CallerContext, row: &UploadRow) -> ServiceResult<()> {
    if caller.identity.owns(&row.initiator.id) {
        Ok(())
    } else {
        Err(ServiceError::AccessDenied)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::gateway::testutil::{alice, bob, gateway};
    use bytes::Bytes;
    use stratus_s3_model::input::{
        CreateBucketInput, GetObjectInput, PutBucketVersioningInput,
    };
    use stratus_s3_model::types::{CompletedPart, VersioningStatus};

    fn setup(gw: &StratusGateway, bucket: &str) {
        gw.create_bucket(
            &alice(),
            CreateBucketInput {
                acl: None,
                bucket: bucket.to_owned(),
                location_constraint: None,
            },
        )
        .unwrap();
    }

    fn initiate(gw: &StratusGateway, bucket: &str, key: &str) -> String {
        gw.create_multipart_upload(
            &alice(),
            CreateMultipartUploadInput {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                content_type: Some("application/octet-stream".into()),
                metadata: BTreeMap::from([("x-amz-meta-stage".into(), "raw".into())]),
                ..CreateMultipartUploadInput::default()
            },
        )
        .unwrap()
        .upload_id
    }

    async fn upload(
        gw: &StratusGateway,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: &str,
    ) -> String {
        gw.upload_part(
            &alice(),
            UploadPartInput {
                body: Bytes::copy_from_slice(body.as_bytes()),
                bucket: bucket.to_owned(),
                content_md5: None,
                key: key.to_owned(),
                part_number,
                upload_id: upload_id.to_owned(),
            },
        )
        .await
        .unwrap()
        .etag
    }

    #[tokio::test]
    async fn test_should_assemble_parts_in_order() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "video.bin");
        let e1 = upload(&gw, "media", "video.bin", &upload_id, 1, "chunk-one-").await;
        let e2 = upload(&gw, "media", "video.bin", &upload_id, 2, "chunk-two").await;

        let out = gw
            .complete_multipart_upload(
                &alice(),
                CompleteMultipartUploadInput {
                    bucket: "media".into(),
                    key: "video.bin".into(),
                    parts: vec![
                        CompletedPart { part_number: 1, etag: e1 },
                        CompletedPart { part_number: 2, etag: e2 },
                    ],
                    upload_id: upload_id.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(out.location, "/media/video.bin");
        assert!(out.etag.ends_with("-2\""));
        assert!(out.version_id.is_none());

        let got = gw
            .get_object(
                &alice(),
                GetObjectInput {
                    bucket: "media".into(),
                    key: "video.bin".into(),
                    ..GetObjectInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(got.body, Bytes::from_static(b"chunk-one-chunk-two"));
        assert_eq!(got.total_size, 19);
        // Headers and metadata come from initiation, not completion.
        assert_eq!(got.content_type.as_deref(), Some("application/octet-stream"));

        // The row is gone once assembled.
        let err = gw
            .list_parts(
                &alice(),
                ListPartsInput {
                    bucket: "media".into(),
                    key: "video.bin".into(),
                    upload_id,
                    ..ListPartsInput::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoSuchUpload { .. }));
    }

    #[tokio::test]
    async fn test_should_reject_completion_with_stale_etag() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "doc");
        upload(&gw, "media", "doc", &upload_id, 1, "payload").await;

        let err = gw
            .complete_multipart_upload(
                &alice(),
                CompleteMultipartUploadInput {
                    bucket: "media".into(),
                    key: "doc".into(),
                    parts: vec![CompletedPart {
                        part_number: 1,
                        etag: "\"deadbeef\"".into(),
                    }],
                    upload_id: upload_id.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPart));

        // A failed seal rolls back, so another part upload still works.
        upload(&gw, "media", "doc", &upload_id, 2, "more").await;
    }

    #[tokio::test]
    async fn test_should_reject_part_number_out_of_range() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "doc");

        for bad in [0, -3, 10_001] {
            let err = gw
                .upload_part(
                    &alice(),
                    UploadPartInput {
                        body: Bytes::from_static(b"x"),
                        bucket: "media".into(),
                        content_md5: None,
                        key: "doc".into(),
                        part_number: bad,
                        upload_id: upload_id.clone(),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidPartNumber { .. }));
        }
    }

    #[tokio::test]
    async fn test_should_deny_part_upload_from_non_initiator() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "doc");

        let err = gw
            .upload_part(
                &bob(),
                UploadPartInput {
                    body: Bytes::from_static(b"x"),
                    bucket: "media".into(),
                    content_md5: None,
                    key: "doc".into(),
                    part_number: 1,
                    upload_id: upload_id.clone(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccessDenied));

        let err = gw
            .abort_multipart_upload(
                &bob(),
                AbortMultipartUploadInput {
                    bucket: "media".into(),
                    key: "doc".into(),
                    upload_id,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccessDenied));
    }

    #[tokio::test]
    async fn test_should_abort_idempotently() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "doc");
        upload(&gw, "media", "doc", &upload_id, 1, "bytes").await;

        let input = AbortMultipartUploadInput {
            bucket: "media".into(),
            key: "doc".into(),
            upload_id,
        };
        gw.abort_multipart_upload(&alice(), input.clone()).unwrap();
        // Second abort of the same id is a clean no-op.
        gw.abort_multipart_upload(&alice(), input).unwrap();
    }

    #[tokio::test]
    async fn test_should_page_parts_with_marker() {
        let gw = gateway();
        setup(&gw, "media");
        let upload_id = initiate(&gw, "media", "doc");
        for n in 1..=4 {
            upload(&gw, "media", "doc", &upload_id, n, "p").await;
        }

        let page = gw
            .list_parts(
                &alice(),
                ListPartsInput {
                    bucket: "media".into(),
                    key: "doc".into(),
                    max_parts: Some(2),
                    part_number_marker: None,
                    upload_id: upload_id.clone(),
                },
            )
            .unwrap();
        assert_eq!(page.max_parts, 2);
        assert!(page.is_truncated);
        assert_eq!(
            page.parts.iter().map(|p| p.part_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(page.next_part_number_marker, Some(2));

        let rest = gw
            .list_parts(
                &alice(),
                ListPartsInput {
                    bucket: "media".into(),
                    key: "doc".into(),
                    max_parts: Some(10),
                    part_number_marker: page.next_part_number_marker,
                    upload_id,
                },
            )
            .unwrap();
        assert!(!rest.is_truncated);
        assert_eq!(
            rest.parts.iter().map(|p| p.part_number).collect::<Vec<_>>(),
            vec![3, 4]
        );
    }

    #[tokio::test]
    async fn test_should_list_uploads_with_delimiter_rollup() {
        let gw = gateway();
        setup(&gw, "media");
        initiate(&gw, "media", "photos/a.jpg");
        initiate(&gw, "media", "photos/b.jpg");
        initiate(&gw, "media", "readme");

        let out = gw
            .list_multipart_uploads(
                &alice(),
                ListMultipartUploadsInput {
                    bucket: "media".into(),
                    delimiter: Some("/".into()),
                    ..ListMultipartUploadsInput::default()
                },
            )
            .unwrap();
        assert_eq!(out.common_prefixes, vec!["photos/".to_owned()]);
        assert_eq!(out.uploads.len(), 1);
        assert_eq!(out.uploads[0].key, "readme");
        assert_eq!(out.max_uploads, 1000);
        assert!(!out.is_truncated);
    }

    #[tokio::test]
    async fn test_should_mint_version_id_on_versioned_completion() {
        let gw = gateway();
        setup(&gw, "media");
        gw.put_bucket_versioning(
            &alice(),
            PutBucketVersioningInput {
                bucket: "media".into(),
                status: Some(VersioningStatus::Enabled),
            },
        )
        .unwrap();

        let upload_id = initiate(&gw, "media", "doc");
        let etag = upload(&gw, "media", "doc", &upload_id, 1, "payload").await;
        let out = gw
            .complete_multipart_upload(
                &alice(),
                CompleteMultipartUploadInput {
                    bucket: "media".into(),
                    key: "doc".into(),
                    parts: vec![CompletedPart { part_number: 1, etag }],
                    upload_id,
                },
            )
            .await
            .unwrap();
        let version_id = out.version_id.expect("versioned completion mints an id");
        assert_ne!(version_id, "null");
    }
}
