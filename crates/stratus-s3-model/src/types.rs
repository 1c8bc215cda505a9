//! Shared wire shapes: owners, grants, versioning state, and list entries.
//!
//! These types appear in request and response documents and inside the
//! gateway's persisted records, so the access-control types derive serde
//! alongside their wire conversions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// URI identifying the all-users group in ACL grants.
pub const ALL_USERS_GROUP: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// URI identifying the authenticated-users group in ACL grants.
pub const AUTHENTICATED_USERS_GROUP: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

// ---------------------------------------------------------------------------
// Owners and grants
// ---------------------------------------------------------------------------

/// A canonical account, used for bucket owners, object owners, and upload
/// initiators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Canonical user id (the access key in this gateway).
    pub id: String,
    /// Display name shown in listings.
    pub display_name: String,
}

impl Owner {
    /// Creates an owner whose display name equals its id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
        }
    }
}

/// Access granted by a single ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    /// List the bucket or read the object.
    Read,
    /// Write objects into the bucket.
    Write,
    /// Read the ACL itself.
    ReadAcp,
    /// Replace the ACL itself.
    WriteAcp,
    /// All of the above.
    FullControl,
}

impl Permission {
    /// Wire spelling, as used in `<Permission>` elements.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
            Self::FullControl => "FULL_CONTROL",
        }
    }

    /// Parses the wire spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "READ_ACP" => Some(Self::ReadAcp),
            "WRITE_ACP" => Some(Self::WriteAcp),
            "FULL_CONTROL" => Some(Self::FullControl),
            _ => None,
        }
    }

    /// Whether a grant of `self` satisfies a request for `wanted`.
    #[must_use]
    pub fn implies(self, wanted: Permission) -> bool {
        self == Self::FullControl || self == wanted
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The party a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grantee {
    /// A specific account, identified by canonical id.
    CanonicalUser {
        /// Canonical user id.
        id: String,
        /// Display name, echoed in ACL documents.
        display_name: String,
    },
    /// A predefined group, identified by URI.
    Group {
        /// Group URI; one of [`ALL_USERS_GROUP`] or [`AUTHENTICATED_USERS_GROUP`].
        uri: String,
    },
}

impl Grantee {
    /// Grantee for a concrete account.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::CanonicalUser {
            display_name: id.clone(),
            id,
        }
    }

    /// Grantee for every requester, including anonymous ones.
    #[must_use]
    pub fn all_users() -> Self {
        Self::Group {
            uri: ALL_USERS_GROUP.to_string(),
        }
    }

    /// Grantee for every requester that presented credentials.
    #[must_use]
    pub fn authenticated_users() -> Self {
        Self::Group {
            uri: AUTHENTICATED_USERS_GROUP.to_string(),
        }
    }

    /// Whether this grantee covers the given caller.
    ///
    /// `caller` is `None` for anonymous requests. Group URIs other than the
    /// two predefined groups never match.
    #[must_use]
    pub fn covers(&self, caller: Option<&str>) -> bool {
        match self {
            Self::CanonicalUser { id, .. } => caller == Some(id.as_str()),
            Self::Group { uri } => match uri.as_str() {
                ALL_USERS_GROUP => true,
                AUTHENTICATED_USERS_GROUP => caller.is_some(),
                _ => false,
            },
        }
    }
}

/// One `<Grant>` entry of an ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Who the grant applies to.
    pub grantee: Grantee,
    /// What the grant allows.
    pub permission: Permission,
}

/// Canned ACLs accepted in `x-amz-acl` headers and form fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CannedAcl {
    /// Owner gets full control, nobody else gets anything.
    #[default]
    Private,
    /// Owner gets full control, everyone may read.
    PublicRead,
    /// Owner gets full control, everyone may read and write.
    PublicReadWrite,
    /// Owner gets full control, authenticated users may read.
    AuthenticatedRead,
}

impl CannedAcl {
    /// Wire spelling of the canned ACL.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
        }
    }

    /// Parses an `x-amz-acl` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Self::Private),
            "public-read" => Some(Self::PublicRead),
            "public-read-write" => Some(Self::PublicReadWrite),
            "authenticated-read" => Some(Self::AuthenticatedRead),
            _ => None,
        }
    }
}

impl std::fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered list of grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    /// The grants, in document order.
    pub grants: Vec<Grant>,
}

impl AccessControlList {
    /// Expands a canned ACL into explicit grants for the given owner.
    #[must_use]
    pub fn from_canned(canned: CannedAcl, owner: &Owner) -> Self {
        let mut grants = vec![Grant {
            grantee: Grantee::user(owner.id.clone()),
            permission: Permission::FullControl,
        }];
        match canned {
            CannedAcl::Private => {}
            CannedAcl::PublicRead => grants.push(Grant {
                grantee: Grantee::all_users(),
                permission: Permission::Read,
            }),
            CannedAcl::PublicReadWrite => {
                grants.push(Grant {
                    grantee: Grantee::all_users(),
                    permission: Permission::Read,
                });
                grants.push(Grant {
                    grantee: Grantee::all_users(),
                    permission: Permission::Write,
                });
            }
            CannedAcl::AuthenticatedRead => grants.push(Grant {
                grantee: Grantee::authenticated_users(),
                permission: Permission::Read,
            }),
        }
        Self { grants }
    }

    /// Whether any grant gives `caller` the `wanted` permission.
    ///
    /// `FULL_CONTROL` satisfies every permission. `caller` is `None` for
    /// anonymous requests.
    #[must_use]
    pub fn permits(&self, caller: Option<&str>, wanted: Permission) -> bool {
        self.grants
            .iter()
            .any(|g| g.permission.implies(wanted) && g.grantee.covers(caller))
    }
}

/// The full ACL document: owner plus grant list.
///
/// This is the body of `GET ?acl` responses and `PUT ?acl` requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPolicy {
    /// The resource owner.
    pub owner: Owner,
    /// The grant list.
    pub acl: AccessControlList,
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Bucket versioning state.
///
/// A bucket starts out unversioned; once versioning has been enabled it can
/// only move between `Enabled` and `Suspended`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// Versioning was never enabled on the bucket.
    #[default]
    Unversioned,
    /// New writes create versions.
    Enabled,
    /// New writes overwrite the `null` version; history is retained.
    Suspended,
}

impl VersioningStatus {
    /// The `<Status>` element value, absent for unversioned buckets.
    #[must_use]
    pub fn as_wire(self) -> Option<&'static str> {
        match self {
            Self::Unversioned => None,
            Self::Enabled => Some("Enabled"),
            Self::Suspended => Some("Suspended"),
        }
    }

    /// Parses a `<Status>` element value. Anything but the two documented
    /// values is rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Enabled" => Some(Self::Enabled),
            "Suspended" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Whether object writes should mint fresh version ids.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    /// Whether the bucket has ever had versioning enabled.
    #[must_use]
    pub fn is_versioned(self) -> bool {
        !matches!(self, Self::Unversioned)
    }
}

/// Body of a `PUT /{bucket}` request, when one is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateBucketConfiguration {
    /// Requested region; empty or absent means the classic region.
    pub location_constraint: Option<String>,
}

/// Body of a `PUT ?versioning` request.
///
/// `status` is kept as raw text so an unrecognized value can be rejected as
/// an invalid configuration rather than as malformed XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersioningConfiguration {
    /// Raw `<Status>` text; `None` when the document omits the element.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Copy and delete shapes
// ---------------------------------------------------------------------------

/// `x-amz-metadata-directive` values for CopyObject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataDirective {
    /// Copy metadata from the source object.
    #[default]
    Copy,
    /// Use the metadata supplied with the copy request.
    Replace,
}

impl MetadataDirective {
    /// Parses the header value, case sensitively as AWS does.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COPY" => Some(Self::Copy),
            "REPLACE" => Some(Self::Replace),
            _ => None,
        }
    }
}

/// One object named in a multi-object delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIdentifier {
    /// Object key.
    pub key: String,
    /// Specific version to delete, when versioning is involved.
    pub version_id: Option<String>,
}

/// Body of a `POST ?delete` request.
#[derive(Debug, Clone, Default)]
pub struct Delete {
    /// The objects to remove.
    pub objects: Vec<ObjectIdentifier>,
    /// Quiet mode suppresses per-key success entries in the response.
    pub quiet: bool,
}

/// Successful entry in a multi-object delete response.
#[derive(Debug, Clone, Default)]
pub struct DeletedObject {
    /// Object key.
    pub key: String,
    /// Version removed, when one was named.
    pub version_id: Option<String>,
    /// Whether the delete created a delete marker.
    pub delete_marker: bool,
    /// Version id of the created delete marker.
    pub delete_marker_version_id: Option<String>,
}

/// Failed entry in a multi-object delete response.
#[derive(Debug, Clone, Default)]
pub struct DeleteError {
    /// Object key.
    pub key: String,
    /// Version named in the request, when one was.
    pub version_id: Option<String>,
    /// Machine-readable code, e.g. `AccessDenied`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Multipart shapes
// ---------------------------------------------------------------------------

/// One `<Part>` of a CompleteMultipartUpload request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedPart {
    /// Part number between 1 and 10000.
    pub part_number: i32,
    /// ETag returned by the corresponding UploadPart.
    pub etag: String,
}

/// Body of a `POST ?uploadId` request: the part manifest, in document order.
#[derive(Debug, Clone, Default)]
pub struct CompletedMultipartUpload {
    /// The parts the client wants assembled.
    pub parts: Vec<CompletedPart>,
}

// ---------------------------------------------------------------------------
// List entries
// ---------------------------------------------------------------------------

/// One bucket row of a ListBuckets response.
#[derive(Debug, Clone)]
pub struct BucketEntry {
    /// Bucket name.
    pub name: String,
    /// Creation timestamp.
    pub creation_date: DateTime<Utc>,
}

/// One `<Contents>` row of a ListObjects response.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// Object key.
    pub key: String,
    /// Last modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Quoted entity tag.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// Owner of the object.
    pub owner: Option<Owner>,
}

/// One `<Version>` row of a ListObjectVersions response.
#[derive(Debug, Clone)]
pub struct ObjectVersionEntry {
    /// Object key.
    pub key: String,
    /// Version id, `null` for the unversioned version.
    pub version_id: String,
    /// Whether this row is the current version of the key.
    pub is_latest: bool,
    /// Last modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Quoted entity tag.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// Owner of the version.
    pub owner: Option<Owner>,
}

/// One `<DeleteMarker>` row of a ListObjectVersions response.
#[derive(Debug, Clone)]
pub struct DeleteMarkerEntry {
    /// Object key.
    pub key: String,
    /// Version id of the marker.
    pub version_id: String,
    /// Whether the marker is the current version of the key.
    pub is_latest: bool,
    /// When the marker was planted.
    pub last_modified: DateTime<Utc>,
    /// Who planted the marker.
    pub owner: Option<Owner>,
}

/// One `<Upload>` row of a ListMultipartUploads response.
#[derive(Debug, Clone)]
pub struct MultipartUploadEntry {
    /// Target object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Who started the upload.
    pub initiator: Owner,
    /// Who will own the assembled object.
    pub owner: Owner,
    /// When the upload was started.
    pub initiated: DateTime<Utc>,
}

/// One `<Part>` row of a ListParts response.
#[derive(Debug, Clone)]
pub struct PartEntry {
    /// Part number.
    pub part_number: i32,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
    /// Quoted entity tag of the part.
    pub etag: String,
    /// Part size in bytes.
    pub size: u64,
}
