//! Bucket policy document model.
//!
//! Policies arrive as JSON on `PUT ?policy` and are parsed eagerly: a
//! document that fails to parse or validate is rejected whole, leaving any
//! prior policy in place. The model covers the subset of the access policy
//! language the gateway evaluates: effect, principal, action, resource, and
//! condition blocks. Statement fields outside that subset (`NotAction`,
//! `NotResource`) are rejected at parse time rather than silently ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{PolicyError, PolicyResult};
use crate::glob;

/// Policy language versions accepted on PUT.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["2008-10-17", "2012-10-17"];

/// ARN prefix for S3 resources; stripped before glob matching.
pub const ARN_PREFIX: &str = "arn:aws:s3:::";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A parsed bucket policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketPolicy {
    /// Optional document identifier.
    #[serde(rename = "Id", alias = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Policy language version; empty when the document omits it.
    #[serde(rename = "Version", default)]
    pub version: String,

    /// Statements, evaluated deny-first.
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

impl BucketPolicy {
    /// Parse and validate a policy document.
    pub fn from_json(text: &str) -> PolicyResult<Self> {
        let policy: Self = serde_json::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Structural validation beyond what the schema enforces.
    pub fn validate(&self) -> PolicyResult<()> {
        if !self.version.is_empty() && !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(PolicyError::Invalid(format!(
                "unsupported policy version {:?}",
                self.version
            )));
        }
        if self.statements.is_empty() {
            return Err(PolicyError::Invalid("policy has no statements".to_owned()));
        }
        for statement in &self.statements {
            statement.validate()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statement {
    /// Optional statement identifier, echoed in deny diagnostics.
    #[serde(rename = "Sid", default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Allow or Deny.
    #[serde(rename = "Effect")]
    pub effect: Effect,

    /// Who the statement applies to.
    #[serde(rename = "Principal")]
    pub principal: Principal,

    /// Action patterns, `s3:` namespaced or `*`.
    #[serde(rename = "Action")]
    pub actions: ValueList,

    /// Resource ARN patterns.
    #[serde(rename = "Resource")]
    pub resources: ValueList,

    /// Condition block, operator → key → values.
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionBlock>,
}

impl Statement {
    fn validate(&self) -> PolicyResult<()> {
        if self.principal.ids.is_empty() {
            return Err(PolicyError::Invalid("statement has no principal".to_owned()));
        }
        if self.actions.is_empty() {
            return Err(PolicyError::Invalid("statement has no actions".to_owned()));
        }
        for action in self.actions.iter() {
            if action != "*" && !action.starts_with("s3:") {
                return Err(PolicyError::Invalid(format!("unrecognized action {action:?}")));
            }
        }
        if self.resources.is_empty() {
            return Err(PolicyError::Invalid("statement has no resources".to_owned()));
        }
        for resource in self.resources.iter() {
            if resource != "*" && !resource.starts_with(ARN_PREFIX) {
                return Err(PolicyError::Invalid(format!(
                    "resource {resource:?} is not an {ARN_PREFIX} ARN"
                )));
            }
        }
        Ok(())
    }
}

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grants the matched request.
    Allow,
    /// Refuses the matched request; authoritative over any Allow.
    Deny,
}

// ---------------------------------------------------------------------------
// Principals
// ---------------------------------------------------------------------------

/// The identities a statement applies to.
///
/// The wire forms `"Principal": "*"`, `{"AWS": ...}` and
/// `{"CanonicalUser": ...}` all collapse to a flat ID list; `*` as an entry
/// matches every caller including anonymous ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Principal {
    /// Canonical user IDs, possibly containing glob patterns.
    pub ids: Vec<String>,
}

impl Principal {
    /// Whether the statement applies to `caller` (`None` = anonymous).
    #[must_use]
    pub fn covers(&self, caller: Option<&str>) -> bool {
        self.ids.iter().any(|pattern| {
            pattern == "*" || caller.is_some_and(|id| glob::matches(pattern, id))
        })
    }
}

impl Serialize for Principal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("AWS", &self.ids)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PrincipalVisitor;

        impl<'de> Visitor<'de> for PrincipalVisitor {
            type Value = Principal;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("\"*\" or a map of principal types")
            }

            fn visit_str<E>(self, v: &str) -> Result<Principal, E>
            where
                E: de::Error,
            {
                Ok(Principal { ids: vec![v.to_owned()] })
            }

            fn visit_map<A>(self, mut map: A) -> Result<Principal, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut ids = Vec::new();
                while let Some((kind, list)) = map.next_entry::<String, ValueList>()? {
                    if kind != "AWS" && kind != "CanonicalUser" {
                        return Err(de::Error::custom(format!(
                            "unsupported principal type {kind:?}"
                        )));
                    }
                    ids.extend(list.0);
                }
                Ok(Principal { ids })
            }
        }

        deserializer.deserialize_any(PrincipalVisitor)
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A string-or-array JSON value, flattened to a list of strings.
///
/// The policy language allows `"Action": "s3:GetObject"` and
/// `"Action": ["s3:GetObject"]` interchangeably; numbers and booleans in
/// condition values are carried as their decimal/`true`/`false` text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueList(pub Vec<String>);

impl std::ops::Deref for ValueList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for ValueList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueListVisitor;

        impl<'de> Visitor<'de> for ValueListVisitor {
            type Value = ValueList;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a scalar or an array of scalars")
            }

            fn visit_str<E>(self, v: &str) -> Result<ValueList, E>
            where
                E: de::Error,
            {
                Ok(ValueList(vec![v.to_owned()]))
            }

            fn visit_bool<E>(self, v: bool) -> Result<ValueList, E>
            where
                E: de::Error,
            {
                Ok(ValueList(vec![v.to_string()]))
            }

            fn visit_i64<E>(self, v: i64) -> Result<ValueList, E>
            where
                E: de::Error,
            {
                Ok(ValueList(vec![v.to_string()]))
            }

            fn visit_u64<E>(self, v: u64) -> Result<ValueList, E>
            where
                E: de::Error,
            {
                Ok(ValueList(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<ValueList, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<Scalar>()? {
                    values.push(value.0);
                }
                Ok(ValueList(values))
            }
        }

        deserializer.deserialize_any(ValueListVisitor)
    }
}

/// One scalar inside a [`ValueList`] array.
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string, number, or boolean")
            }

            fn visit_str<E>(self, v: &str) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(v.to_owned()))
            }

            fn visit_bool<E>(self, v: bool) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Raw condition block: operator name → condition key → values.
///
/// Operators and keys are interpreted at evaluation time; unknown ones make
/// the enclosing statement non-matching rather than failing the parse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionBlock(pub BTreeMap<String, BTreeMap<String, ValueList>>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_minimal_policy() {
        let text = r#"{
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": "arn:aws:s3:::photos/*"
            }]
        }"#;
        let policy = BucketPolicy::from_json(text).unwrap();
        assert_eq!(policy.version, "2012-10-17");
        assert_eq!(policy.statements.len(), 1);
        let statement = &policy.statements[0];
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.principal.ids, vec!["*"]);
        assert_eq!(&*statement.actions, ["s3:GetObject"]);
        assert_eq!(&*statement.resources, ["arn:aws:s3:::photos/*"]);
    }

    #[test]
    fn test_should_parse_lists_and_conditions() {
        let text = r#"{
            "Id": "doc-1",
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "restrict-listing",
                "Effect": "Deny",
                "Principal": {"AWS": ["acct-1", "acct-2"]},
                "Action": ["s3:ListBucket", "s3:ListBucketVersions"],
                "Resource": ["arn:aws:s3:::photos"],
                "Condition": {
                    "StringEquals": {"s3:prefix": ["private/"]},
                    "IpAddress": {"aws:SourceIp": "10.0.0.0/8"}
                }
            }]
        }"#;
        let policy = BucketPolicy::from_json(text).unwrap();
        assert_eq!(policy.id.as_deref(), Some("doc-1"));
        let statement = &policy.statements[0];
        assert_eq!(statement.sid.as_deref(), Some("restrict-listing"));
        assert_eq!(statement.principal.ids, vec!["acct-1", "acct-2"]);
        let conditions = statement.conditions.as_ref().unwrap();
        assert_eq!(conditions.0.len(), 2);
        assert_eq!(
            &*conditions.0["StringEquals"]["s3:prefix"],
            ["private/"]
        );
    }

    #[test]
    fn test_should_parse_canonical_user_principal() {
        let text = r#"{
            "Statement": [{
                "Effect": "Allow",
                "Principal": {"CanonicalUser": "acct-9"},
                "Action": "s3:GetObject",
                "Resource": "*"
            }]
        }"#;
        let policy = BucketPolicy::from_json(text).unwrap();
        assert_eq!(policy.statements[0].principal.ids, vec!["acct-9"]);
    }

    #[test]
    fn test_should_carry_numeric_condition_values_as_text() {
        let text = r#"{
            "Statement": [{
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:ListBucket",
                "Resource": "arn:aws:s3:::photos",
                "Condition": {"StringEquals": {"s3:max-keys": 10}}
            }]
        }"#;
        let policy = BucketPolicy::from_json(text).unwrap();
        let conditions = policy.statements[0].conditions.as_ref().unwrap();
        assert_eq!(&*conditions.0["StringEquals"]["s3:max-keys"], ["10"]);
    }

    #[test]
    fn test_should_reject_not_action_statements() {
        let text = r#"{
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "NotAction": "s3:DeleteObject",
                "Resource": "*"
            }]
        }"#;
        assert!(matches!(
            BucketPolicy::from_json(text),
            Err(PolicyError::Parse(_))
        ));
    }

    #[test]
    fn test_should_reject_unsupported_version() {
        let text = r#"{
            "Version": "2022-01-01",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": "*"
            }]
        }"#;
        assert!(matches!(
            BucketPolicy::from_json(text),
            Err(PolicyError::Invalid(_))
        ));
    }

    #[test]
    fn test_should_reject_empty_statement_list() {
        let result = BucketPolicy::from_json(r#"{"Statement": []}"#);
        assert!(matches!(result, Err(PolicyError::Invalid(_))));
    }

    #[test]
    fn test_should_reject_foreign_action_namespace() {
        let text = r#"{
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "ec2:RunInstances",
                "Resource": "*"
            }]
        }"#;
        assert!(matches!(
            BucketPolicy::from_json(text),
            Err(PolicyError::Invalid(_))
        ));
    }

    #[test]
    fn test_should_reject_bare_resource_name() {
        let text = r#"{
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": "photos/*"
            }]
        }"#;
        assert!(matches!(
            BucketPolicy::from_json(text),
            Err(PolicyError::Invalid(_))
        ));
    }

    #[test]
    fn test_should_match_principal_globs() {
        let principal = Principal {
            ids: vec!["acct-*".to_owned()],
        };
        assert!(principal.covers(Some("acct-42")));
        assert!(!principal.covers(Some("other")));
        assert!(!principal.covers(None));

        let anyone = Principal {
            ids: vec!["*".to_owned()],
        };
        assert!(anyone.covers(None));
        assert!(anyone.covers(Some("acct-42")));
    }

    #[test]
    fn test_should_serialize_principal_as_aws_map() {
        let policy = BucketPolicy {
            id: None,
            version: "2012-10-17".to_owned(),
            statements: vec![Statement {
                sid: None,
                effect: Effect::Allow,
                principal: Principal {
                    ids: vec!["acct-1".to_owned()],
                },
                actions: ValueList(vec!["s3:GetObject".to_owned()]),
                resources: ValueList(vec!["arn:aws:s3:::photos/*".to_owned()]),
                conditions: None,
            }],
        };
        let text = serde_json::to_string(&policy).unwrap();
        assert!(text.contains(r#""Principal":{"AWS":["acct-1"]}"#));
        let back = BucketPolicy::from_json(&text).unwrap();
        assert_eq!(back, policy);
    }
}
