//! Encoding gateway responses as S3 XML documents.
//!
//! Provides the [`S3Serialize`] trait and implementations for every response
//! body the gateway emits, following the AWS RestXml conventions:
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 with milliseconds (`2006-02-03T16:45:09.000Z`)
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};

use stratus_s3_model::output::{
    CompleteMultipartUploadOutput, CopyObjectOutput, CreateMultipartUploadOutput,
    DeleteObjectsOutput, GetBucketLocationOutput, GetBucketVersioningOutput, ListBucketsOutput,
    ListMultipartUploadsOutput, ListObjectVersionsOutput, ListObjectsOutput, ListPartsOutput,
};
use stratus_s3_model::types::{
    AccessControlPolicy, BucketEntry, DeleteMarkerEntry, Grant, Grantee, MultipartUploadEntry,
    ObjectEntry, ObjectVersionEntry, Owner, PartEntry,
};

use crate::error::XmlError;

/// The S3 document namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// The only storage class the gateway reports.
const STORAGE_CLASS: &str = "STANDARD";

/// Trait for encoding a value as the children of an S3 XML element.
///
/// Implementors write child elements into the current context; the root
/// element and namespace are written by [`to_xml`].
///
/// Uses `io::Result` because `quick_xml::Writer` content closures require it.
pub trait S3Serialize {
    /// Writes this value as XML child elements.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying buffer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Encodes a value as a complete S3 XML document.
///
/// Writes the XML declaration, the namespaced root element, and the value's
/// content.
///
/// # Errors
///
/// Returns `XmlError` if encoding fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(quick_xml::events::BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        None,
    )))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Writing helpers
// ---------------------------------------------------------------------------

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

fn write_bool<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text_element(writer, tag, if value { "true" } else { "false" })
}

fn write_i32<W: Write>(writer: &mut Writer<W>, tag: &str, value: i32) -> io::Result<()> {
    write_text_element(writer, tag, &value.to_string())
}

fn write_optional_i32<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<i32>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_i32(writer, tag, v)?;
    }
    Ok(())
}

fn write_u64<W: Write>(writer: &mut Writer<W>, tag: &str, value: u64) -> io::Result<()> {
    write_text_element(writer, tag, &value.to_string())
}

fn write_timestamp<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &chrono::DateTime<chrono::Utc>,
) -> io::Result<()> {
    write_text_element(writer, tag, &format_timestamp(value))
}

/// Formats a timestamp the way S3 documents spell them.
fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Writes an owner-shaped element under the given tag. ListParts and
/// ListMultipartUploads reuse the shape under `<Initiator>`.
fn write_owner_as<W: Write>(writer: &mut Writer<W>, tag: &str, owner: &Owner) -> io::Result<()> {
    writer.create_element(tag).write_inner_content(|w| {
        write_text_element(w, "ID", &owner.id)?;
        write_text_element(w, "DisplayName", &owner.display_name)?;
        Ok(())
    })?;
    Ok(())
}

fn write_common_prefixes<W: Write>(writer: &mut Writer<W>, prefixes: &[String]) -> io::Result<()> {
    for prefix in prefixes {
        writer
            .create_element("CommonPrefixes")
            .write_inner_content(|w| write_text_element(w, "Prefix", prefix))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

impl S3Serialize for Owner {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_owner_as(writer, "Owner", self)
    }
}

impl S3Serialize for Grantee {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let type_attr = match self {
            Self::CanonicalUser { .. } => "CanonicalUser",
            Self::Group { .. } => "Group",
        };
        writer
            .create_element("Grantee")
            .with_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"))
            .with_attribute(("xsi:type", type_attr))
            .write_inner_content(|w| {
                match self {
                    Self::CanonicalUser { id, display_name } => {
                        write_text_element(w, "ID", id)?;
                        write_text_element(w, "DisplayName", display_name)?;
                    }
                    Self::Group { uri } => {
                        write_text_element(w, "URI", uri)?;
                    }
                }
                Ok(())
            })?;
        Ok(())
    }
}

impl S3Serialize for Grant {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Grant").write_inner_content(|w| {
            self.grantee.serialize_xml(w)?;
            write_text_element(w, "Permission", self.permission.as_str())?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for AccessControlPolicy {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        self.owner.serialize_xml(writer)?;
        writer
            .create_element("AccessControlList")
            .write_inner_content(|w| {
                for grant in &self.acl.grants {
                    grant.serialize_xml(w)?;
                }
                Ok(())
            })?;
        Ok(())
    }
}

impl S3Serialize for BucketEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Bucket").write_inner_content(|w| {
            write_text_element(w, "Name", &self.name)?;
            write_timestamp(w, "CreationDate", &self.creation_date)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ObjectEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Contents").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_timestamp(w, "LastModified", &self.last_modified)?;
            write_text_element(w, "ETag", &self.etag)?;
            write_u64(w, "Size", self.size)?;
            write_text_element(w, "StorageClass", STORAGE_CLASS)?;
            if let Some(ref owner) = self.owner {
                owner.serialize_xml(w)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ObjectVersionEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Version").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_text_element(w, "VersionId", &self.version_id)?;
            write_bool(w, "IsLatest", self.is_latest)?;
            write_timestamp(w, "LastModified", &self.last_modified)?;
            write_text_element(w, "ETag", &self.etag)?;
            write_u64(w, "Size", self.size)?;
            write_text_element(w, "StorageClass", STORAGE_CLASS)?;
            if let Some(ref owner) = self.owner {
                owner.serialize_xml(w)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for DeleteMarkerEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("DeleteMarker")
            .write_inner_content(|w| {
                write_text_element(w, "Key", &self.key)?;
                write_text_element(w, "VersionId", &self.version_id)?;
                write_bool(w, "IsLatest", self.is_latest)?;
                write_timestamp(w, "LastModified", &self.last_modified)?;
                if let Some(ref owner) = self.owner {
                    owner.serialize_xml(w)?;
                }
                Ok(())
            })?;
        Ok(())
    }
}

impl S3Serialize for MultipartUploadEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Upload").write_inner_content(|w| {
            write_text_element(w, "Key", &self.key)?;
            write_text_element(w, "UploadId", &self.upload_id)?;
            write_owner_as(w, "Initiator", &self.initiator)?;
            self.owner.serialize_xml(w)?;
            write_text_element(w, "StorageClass", STORAGE_CLASS)?;
            write_timestamp(w, "Initiated", &self.initiated)?;
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for PartEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("Part").write_inner_content(|w| {
            write_i32(w, "PartNumber", self.part_number)?;
            write_timestamp(w, "LastModified", &self.last_modified)?;
            write_text_element(w, "ETag", &self.etag)?;
            write_u64(w, "Size", self.size)?;
            Ok(())
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response documents
// ---------------------------------------------------------------------------

impl S3Serialize for ListBucketsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        self.owner.serialize_xml(writer)?;
        writer.create_element("Buckets").write_inner_content(|w| {
            for bucket in &self.buckets {
                bucket.serialize_xml(w)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl S3Serialize for ListObjectsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_optional_text(writer, "Prefix", self.prefix.as_deref())?;
        write_optional_text(writer, "Marker", self.marker.as_deref())?;
        write_optional_text(writer, "NextMarker", self.next_marker.as_deref())?;
        write_i32(writer, "MaxKeys", self.max_keys)?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for entry in &self.contents {
            entry.serialize_xml(writer)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)?;
        Ok(())
    }
}

impl S3Serialize for ListObjectVersionsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_optional_text(writer, "Prefix", self.prefix.as_deref())?;
        write_optional_text(writer, "KeyMarker", self.key_marker.as_deref())?;
        write_optional_text(writer, "VersionIdMarker", self.version_id_marker.as_deref())?;
        write_optional_text(writer, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_optional_text(
            writer,
            "NextVersionIdMarker",
            self.next_version_id_marker.as_deref(),
        )?;
        write_i32(writer, "MaxKeys", self.max_keys)?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for version in &self.versions {
            version.serialize_xml(writer)?;
        }
        for marker in &self.delete_markers {
            marker.serialize_xml(writer)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)?;
        Ok(())
    }
}

impl S3Serialize for ListMultipartUploadsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_optional_text(writer, "KeyMarker", self.key_marker.as_deref())?;
        write_optional_text(writer, "UploadIdMarker", self.upload_id_marker.as_deref())?;
        write_optional_text(writer, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_optional_text(
            writer,
            "NextUploadIdMarker",
            self.next_upload_id_marker.as_deref(),
        )?;
        write_optional_text(writer, "Prefix", self.prefix.as_deref())?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_i32(writer, "MaxUploads", self.max_uploads)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for upload in &self.uploads {
            upload.serialize_xml(writer)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)?;
        Ok(())
    }
}

impl S3Serialize for ListPartsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "UploadId", &self.upload_id)?;
        write_owner_as(writer, "Initiator", &self.initiator)?;
        self.owner.serialize_xml(writer)?;
        write_text_element(writer, "StorageClass", STORAGE_CLASS)?;
        write_optional_i32(writer, "PartNumberMarker", self.part_number_marker)?;
        write_optional_i32(
            writer,
            "NextPartNumberMarker",
            self.next_part_number_marker,
        )?;
        write_i32(writer, "MaxParts", self.max_parts)?;
        write_bool(writer, "IsTruncated", self.is_truncated)?;
        for part in &self.parts {
            part.serialize_xml(writer)?;
        }
        Ok(())
    }
}

impl S3Serialize for GetBucketLocationOutput {
    /// The location document is a root element with bare text content; the
    /// classic region renders as an empty element.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if let Some(ref constraint) = self.location_constraint {
            writer.write_event(Event::Text(BytesText::new(constraint)))?;
        }
        Ok(())
    }
}

impl S3Serialize for GetBucketVersioningOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_optional_text(writer, "Status", self.status.as_wire())?;
        Ok(())
    }
}

impl S3Serialize for DeleteObjectsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for deleted in &self.deleted {
            writer.create_element("Deleted").write_inner_content(|w| {
                write_text_element(w, "Key", &deleted.key)?;
                write_optional_text(w, "VersionId", deleted.version_id.as_deref())?;
                if deleted.delete_marker {
                    write_bool(w, "DeleteMarker", true)?;
                }
                write_optional_text(
                    w,
                    "DeleteMarkerVersionId",
                    deleted.delete_marker_version_id.as_deref(),
                )?;
                Ok(())
            })?;
        }
        for error in &self.errors {
            writer.create_element("Error").write_inner_content(|w| {
                write_text_element(w, "Key", &error.key)?;
                write_optional_text(w, "VersionId", error.version_id.as_deref())?;
                write_text_element(w, "Code", &error.code)?;
                write_text_element(w, "Message", &error.message)?;
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl S3Serialize for CreateMultipartUploadOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "UploadId", &self.upload_id)?;
        Ok(())
    }
}

impl S3Serialize for CompleteMultipartUploadOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Location", &self.location)?;
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "ETag", &self.etag)?;
        Ok(())
    }
}

impl S3Serialize for CopyObjectOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "ETag", &self.etag)?;
        write_timestamp(writer, "LastModified", &self.last_modified)?;
        Ok(())
    }
}
