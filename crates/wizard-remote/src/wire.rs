//! Wire types exchanged with the census backend
//!
//! - `GET /v1/census?school_id=&section=` answers `{ "data": <payload> }`,
//!   where the payload may be string-encoded
//! - `POST /v1/census` takes a [`SubmissionPayload`]
//! - `GET /v1/schools?id=` answers `{ "data": <school record> }` carrying
//!   the shift flags

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use wizard_snapshot::{FormSnapshot, SectionId, Shift, SubjectId};

/// Status attached to a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Intermediate step saved
    #[default]
    Draft,
    /// Final step saved; the census is complete
    Completed,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// Body of a record submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Subject the record belongs to
    #[serde(rename = "school_id")]
    pub subject: SubjectId,
    /// Section being submitted
    pub section: SectionId,
    /// Census year
    pub year: u16,
    /// Submission status
    pub status: SubmissionStatus,
    /// Full field mapping of the section
    pub data: Map<String, Value>,
}

impl SubmissionPayload {
    /// Build payload from a settled snapshot
    #[must_use]
    pub fn new(
        subject: SubjectId,
        section: SectionId,
        year: u16,
        status: SubmissionStatus,
        snapshot: &FormSnapshot,
    ) -> Self {
        Self {
            subject,
            section,
            year,
            status,
            data: snapshot.to_json_map(),
        }
    }
}

/// `{ "data": ... }` envelope around a school record
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SchoolEnvelope {
    pub(crate) data: Option<SchoolRecord>,
}

/// School record fields the wizard cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SchoolRecord {
    #[serde(default)]
    pub(crate) nome_escola: Option<String>,
    #[serde(default)]
    pub(crate) turno_manha: bool,
    #[serde(default)]
    pub(crate) turno_tarde: bool,
    #[serde(default)]
    pub(crate) turno_noite: bool,
    #[serde(default)]
    pub(crate) turno_integral: bool,
}

/// What the backend knows about a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMetadata {
    /// Subject identifier
    pub subject: SubjectId,
    /// Display name, if known
    pub name: Option<String>,
    /// Shifts the subject offers
    pub shifts: Vec<Shift>,
}

impl SubjectMetadata {
    /// Metadata under which every shift is offered
    #[must_use]
    pub fn all_shifts(subject: SubjectId) -> Self {
        Self {
            subject,
            name: None,
            shifts: Shift::ALL.to_vec(),
        }
    }

    /// Whether the subject offers `shift`
    #[inline]
    #[must_use]
    pub fn offers(&self, shift: Shift) -> bool {
        self.shifts.contains(&shift)
    }

    pub(crate) fn from_record(subject: SubjectId, record: SchoolRecord) -> Self {
        let shifts = [
            (record.turno_manha, Shift::Morning),
            (record.turno_tarde, Shift::Afternoon),
            (record.turno_noite, Shift::Night),
            (record.turno_integral, Shift::FullTime),
        ]
        .into_iter()
        .filter_map(|(offered, shift)| offered.then_some(shift))
        .collect();

        Self {
            subject,
            name: record.nome_escola,
            shifts,
        }
    }
}
