//! Decoding S3 XML request bodies into model types.
//!
//! Provides the [`S3Deserialize`] trait and implementations for every request
//! document the gateway accepts. Elements are matched by local name, so
//! namespace-prefixed documents (`<ns2:AccessControlPolicy>`) parse the same
//! as unprefixed ones. Unknown elements are skipped.

use quick_xml::Reader;
use quick_xml::events::Event;

use stratus_s3_model::types::{
    AccessControlList, AccessControlPolicy, CompletedMultipartUpload, CompletedPart,
    CreateBucketConfiguration, Delete, Grant, Grantee, ObjectIdentifier, Owner, Permission,
    VersioningConfiguration,
};

use crate::error::XmlError;

/// Trait for decoding a value from the children of an S3 XML element.
///
/// The reader is positioned just after the value's opening tag; the
/// implementation consumes through the matching end tag.
pub trait S3Deserialize: Sized {
    /// Decodes an instance from the given reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or a required element is
    /// missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Decodes a complete S3 XML document into a typed value.
///
/// Skips the declaration and any leading comments, then delegates to the
/// type's [`S3Deserialize`] implementation for the root element's content.
///
/// # Errors
///
/// Returns `XmlError` if the document is malformed or has no root element.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    // Self-closed elements become start/end pairs so implementations never
    // need to handle Event::Empty.
    reader.config_mut().expand_empty_elements = true;

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reading helpers
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

fn parse_i32(s: &str) -> Result<i32, XmlError> {
    s.parse::<i32>()
        .map_err(|e| XmlError::ParseError(format!("invalid integer '{s}': {e}")))
}

/// Walks one element's children, dispatching on each child's local name.
///
/// `handle` receives the child's name with the reader positioned inside the
/// child; it must consume through the child's end tag.
fn for_each_child<F>(reader: &mut Reader<&[u8]>, context: &str, mut handle: F) -> Result<(), XmlError>
where
    F: FnMut(&str, &mut Reader<&[u8]>) -> Result<(), XmlError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let tag = std::str::from_utf8(name.as_ref())
                    .map_err(|err| XmlError::ParseError(err.to_string()))?
                    .to_string();
                handle(&tag, reader)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in {context}"
                )));
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// S3Deserialize implementations
// ---------------------------------------------------------------------------

impl S3Deserialize for Owner {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut id = String::new();
        let mut display_name = None;

        for_each_child(reader, "Owner", |tag, r| {
            match tag {
                "ID" => id = read_text_content(r)?,
                "DisplayName" => display_name = Some(read_text_content(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(Owner {
            display_name: display_name.unwrap_or_else(|| id.clone()),
            id,
        })
    }
}

impl S3Deserialize for Grantee {
    /// The `xsi:type` attribute sits on the already-consumed opening tag, so
    /// the variant is inferred from which identifying child is present: a
    /// `URI` makes a group, an `ID` makes a canonical user.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut id = None;
        let mut display_name = None;
        let mut uri = None;

        for_each_child(reader, "Grantee", |tag, r| {
            match tag {
                "ID" => id = Some(read_text_content(r)?),
                "DisplayName" => display_name = Some(read_text_content(r)?),
                "URI" => uri = Some(read_text_content(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        if let Some(uri) = uri {
            return Ok(Grantee::Group { uri });
        }
        if let Some(id) = id {
            return Ok(Grantee::CanonicalUser {
                display_name: display_name.unwrap_or_else(|| id.clone()),
                id,
            });
        }
        Err(XmlError::MissingElement(
            "Grantee requires an ID or URI".to_string(),
        ))
    }
}

impl S3Deserialize for Grant {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut grantee = None;
        let mut permission = None;

        for_each_child(reader, "Grant", |tag, r| {
            match tag {
                "Grantee" => grantee = Some(Grantee::deserialize_xml(r)?),
                "Permission" => {
                    let text = read_text_content(r)?;
                    permission = Some(Permission::parse(&text).ok_or_else(|| {
                        XmlError::ParseError(format!("invalid permission: {text}"))
                    })?);
                }
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(Grant {
            grantee: grantee
                .ok_or_else(|| XmlError::MissingElement("Grant requires a Grantee".to_string()))?,
            permission: permission.ok_or_else(|| {
                XmlError::MissingElement("Grant requires a Permission".to_string())
            })?,
        })
    }
}

impl S3Deserialize for AccessControlList {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut grants = Vec::new();

        for_each_child(reader, "AccessControlList", |tag, r| {
            match tag {
                "Grant" => grants.push(Grant::deserialize_xml(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(AccessControlList { grants })
    }
}

impl S3Deserialize for AccessControlPolicy {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut owner = None;
        let mut acl = None;

        for_each_child(reader, "AccessControlPolicy", |tag, r| {
            match tag {
                "Owner" => owner = Some(Owner::deserialize_xml(r)?),
                "AccessControlList" => acl = Some(AccessControlList::deserialize_xml(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(AccessControlPolicy {
            owner: owner.unwrap_or_default(),
            acl: acl.ok_or_else(|| {
                XmlError::MissingElement("AccessControlPolicy requires an AccessControlList".to_string())
            })?,
        })
    }
}

impl S3Deserialize for CreateBucketConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut location_constraint = None;

        for_each_child(reader, "CreateBucketConfiguration", |tag, r| {
            match tag {
                "LocationConstraint" => {
                    let text = read_text_content(r)?;
                    if !text.is_empty() {
                        location_constraint = Some(text);
                    }
                }
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(CreateBucketConfiguration {
            location_constraint,
        })
    }
}

impl S3Deserialize for VersioningConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut status = None;

        for_each_child(reader, "VersioningConfiguration", |tag, r| {
            match tag {
                "Status" => status = Some(read_text_content(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(VersioningConfiguration { status })
    }
}

impl S3Deserialize for ObjectIdentifier {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut version_id = None;

        for_each_child(reader, "Object", |tag, r| {
            match tag {
                "Key" => key = Some(read_text_content(r)?),
                "VersionId" => {
                    let text = read_text_content(r)?;
                    if !text.is_empty() {
                        version_id = Some(text);
                    }
                }
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(ObjectIdentifier {
            key: key.ok_or_else(|| XmlError::MissingElement("Object requires a Key".to_string()))?,
            version_id,
        })
    }
}

impl S3Deserialize for Delete {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut objects = Vec::new();
        let mut quiet = false;

        for_each_child(reader, "Delete", |tag, r| {
            match tag {
                "Object" => objects.push(ObjectIdentifier::deserialize_xml(r)?),
                "Quiet" => {
                    let text = read_text_content(r)?;
                    quiet = parse_bool(&text)?;
                }
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(Delete { objects, quiet })
    }
}

impl S3Deserialize for CompletedPart {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut part_number = None;
        let mut etag = None;

        for_each_child(reader, "Part", |tag, r| {
            match tag {
                "PartNumber" => {
                    let text = read_text_content(r)?;
                    part_number = Some(parse_i32(&text)?);
                }
                "ETag" => etag = Some(read_text_content(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(CompletedPart {
            part_number: part_number.ok_or_else(|| {
                XmlError::MissingElement("Part requires a PartNumber".to_string())
            })?,
            etag: etag
                .ok_or_else(|| XmlError::MissingElement("Part requires an ETag".to_string()))?,
        })
    }
}

impl S3Deserialize for CompletedMultipartUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut parts = Vec::new();

        for_each_child(reader, "CompleteMultipartUpload", |tag, r| {
            match tag {
                "Part" => parts.push(CompletedPart::deserialize_xml(r)?),
                _ => skip_element(r)?,
            }
            Ok(())
        })?;

        Ok(CompletedMultipartUpload { parts })
    }
}
