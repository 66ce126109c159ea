use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DocumentId, UserId};

/// Lifecycle status of a submitted document.
///
/// The only legal transitions are `Pending -> Approved` and
/// `Pending -> Rejected`; both target states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// Return a string representation of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status permits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Document {
    pub id: DocumentId,
    /// Human-readable title, e.g. "Partiel Micro 2023 Session 1".
    pub title: String,
    /// Faculty the document belongs to.
    pub faculty: String,
    /// Course subject.
    pub subject: String,
    /// Academic year.
    pub year: i32,
    /// Kind of document (exam, resit, tutorial, ...). Free-form.
    pub kind: String,
    /// Who submitted it.
    pub uploader_id: UserId,
    /// Credits charged per download. Always >= 1.
    pub credits_cost: u64,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Opaque handle to the blob content. Set at creation, immutable.
    pub storage_locator: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// Submission payload for a new document. The registry assigns the id,
/// forces status to `Pending` and defaults `credits_cost` when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub faculty: String,
    pub subject: String,
    pub year: i32,
    pub kind: String,
    pub uploader_id: UserId,
    pub credits_cost: Option<u64>,
    pub storage_locator: String,
}

/// Client-evaluated predicate over approved documents.
///
/// Faculty and year match exactly (faculty case-insensitively); subject is a
/// case-insensitive substring match. Empty filter matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DocumentFilter {
    pub faculty: Option<String>,
    pub subject: Option<String>,
    pub year: Option<i32>,
}

impl DocumentFilter {
    /// Whether the document satisfies every populated field of the filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(ref faculty) = self.faculty
            && !doc.faculty.eq_ignore_ascii_case(faculty)
        {
            return false;
        }
        if let Some(ref subject) = self.subject
            && !doc
                .subject
                .to_lowercase()
                .contains(&subject.to_lowercase())
        {
            return false;
        }
        if let Some(year) = self.year
            && doc.year != year
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Document {
        Document {
            id: DocumentId::new("doc-1"),
            title: "Partiel Micro 2023".to_owned(),
            faculty: "Economics".to_owned(),
            subject: "Microeconomics".to_owned(),
            year: 2023,
            kind: "exam".to_owned(),
            uploader_id: UserId::new("uid-1"),
            credits_cost: 1,
            status: DocumentStatus::Approved,
            storage_locator: "blob-1".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_terminality() {
        assert!(!DocumentStatus::Pending.is_terminal());
        assert!(DocumentStatus::Approved.is_terminal());
        assert!(DocumentStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serde_is_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn empty_filter_matches() {
        assert!(DocumentFilter::default().matches(&sample_doc()));
    }

    #[test]
    fn filter_faculty_exact_case_insensitive() {
        let filter = DocumentFilter {
            faculty: Some("economics".to_owned()),
            ..DocumentFilter::default()
        };
        assert!(filter.matches(&sample_doc()));

        let filter = DocumentFilter {
            faculty: Some("econ".to_owned()),
            ..DocumentFilter::default()
        };
        assert!(!filter.matches(&sample_doc()), "faculty is not a substring match");
    }

    #[test]
    fn filter_subject_substring() {
        let filter = DocumentFilter {
            subject: Some("micro".to_owned()),
            ..DocumentFilter::default()
        };
        assert!(filter.matches(&sample_doc()));
    }

    #[test]
    fn filter_year_exact() {
        let filter = DocumentFilter {
            year: Some(2022),
            ..DocumentFilter::default()
        };
        assert!(!filter.matches(&sample_doc()));
    }

    #[test]
    fn filter_all_fields_must_match() {
        let filter = DocumentFilter {
            faculty: Some("Economics".to_owned()),
            subject: Some("macro".to_owned()),
            year: Some(2023),
        };
        assert!(!filter.matches(&sample_doc()));
    }

    #[test]
    fn document_roundtrip() {
        let doc = sample_doc();
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
