//! The application record and its public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::password::PasswordHash;

/// A hosted HTML application as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    /// Generated public id; immutable.
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arbitrary HTML, stored and served verbatim.
    pub html_content: String,
    /// Salted credential gating update and delete.
    pub password: PasswordHash,
    pub created_at: DateTime<Utc>,
    /// Never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// Every record field except the credential. This is the only shape that
/// leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicApp {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub html_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppRecord> for PublicApp {
    fn from(record: AppRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            version: record.version,
            description: record.description,
            html_content: record.html_content,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Fields changed by an authenticated update. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub version: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub html_content: Option<String>,
}

impl RecordPatch {
    /// Apply the patch and refresh `updated_at`.
    ///
    /// `updated_at` is clamped to `created_at` so a clock step backwards
    /// cannot break the ordering invariant.
    pub fn apply(self, record: &mut AppRecord, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(version) = self.version {
            record.version = version;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(html) = self.html_content {
            record.html_content = html;
        }
        record.updated_at = now.max(record.created_at);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn record() -> AppRecord {
        let now = Utc::now();
        AppRecord {
            id: "abc123XYZ0".to_owned(),
            name: "Demo".to_owned(),
            version: "1.0.0".to_owned(),
            description: Some("first".to_owned()),
            html_content: "<b>hi</b>".to_owned(),
            password: PasswordHash::new("abcd").unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_json_is_camel_case_without_password() {
        let public = PublicApp::from(record());
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["htmlContent"], "<b>hi</b>");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn absent_description_is_omitted() {
        let mut rec = record();
        rec.description = None;
        let json = serde_json::to_value(PublicApp::from(rec)).unwrap();
        assert!(json.get("description").is_none());
    }

    #[test]
    fn patch_changes_only_submitted_fields() {
        let mut rec = record();
        let created = rec.created_at;
        let later = created + Duration::seconds(5);

        RecordPatch {
            version: Some("1.1.0".to_owned()),
            ..RecordPatch::default()
        }
        .apply(&mut rec, later);

        assert_eq!(rec.name, "Demo");
        assert_eq!(rec.version, "1.1.0");
        assert_eq!(rec.description.as_deref(), Some("first"));
        assert_eq!(rec.created_at, created);
        assert_eq!(rec.updated_at, later);
    }

    #[test]
    fn patch_can_clear_description() {
        let mut rec = record();
        RecordPatch {
            description: Some(None),
            ..RecordPatch::default()
        }
        .apply(&mut rec, Utc::now());
        assert!(rec.description.is_none());
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let mut rec = record();
        let earlier = rec.created_at - Duration::hours(1);
        RecordPatch::default().apply(&mut rec, earlier);
        assert_eq!(rec.updated_at, rec.created_at);
    }
}
