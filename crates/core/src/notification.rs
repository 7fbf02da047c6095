//! Versioned cancer registry notifications.
//!
//! A notification record is one submission of a report. Records sharing a `reportGroupId` are
//! successive revisions of the same report; the one with the greatest `versionNumber` is
//! authoritative. The structured payload mirrors the registry export nesting
//! (patient, then report, then tumour assignment); every level may be absent in raw data, and
//! the accessors here turn an absent required value into a [`CoreError::MissingField`].
//!
//! Parsing the registry XML into this structure is done upstream.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// One versioned report submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Key shared by all revisions of the same report.
    pub report_group_id: i64,

    /// Revision number, increasing within a report group.
    pub version_number: i32,

    /// Patient reference number as exported by the registry, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ReportPayload>,
}

/// Structured report content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSection>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Why the notification was issued, for example `diagnose` or `behandlungsende`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_assignment: Option<TumorAssignment>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TumorAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_case_id: Option<String>,
}

impl NotificationRecord {
    /// Builds a record with a fully populated payload.
    pub fn new(
        report_group_id: i64,
        version_number: i32,
        reason_code: impl Into<String>,
        tumor_case_id: impl Into<String>,
    ) -> Self {
        Self {
            report_group_id,
            version_number,
            reference_number: None,
            payload: Some(ReportPayload {
                patient: Some(PatientSection {
                    report: Some(Report {
                        reason_code: Some(reason_code.into()),
                        tumor_assignment: Some(TumorAssignment {
                            tumor_case_id: Some(tumor_case_id.into()),
                        }),
                    }),
                }),
            }),
        }
    }

    fn report(&self) -> Option<&Report> {
        self.payload.as_ref()?.patient.as_ref()?.report.as_ref()
    }

    /// The report reason code.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if any level of the payload path is absent.
    pub fn report_reason_code(&self) -> CoreResult<&str> {
        self.report()
            .and_then(|r| r.reason_code.as_deref())
            .ok_or(CoreError::MissingField {
                report_group_id: self.report_group_id,
                field: "reportReasonCode",
            })
    }

    /// The tumour case identifier linking this report to a clinical case.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] if any level of the payload path is absent.
    pub fn tumor_case_id(&self) -> CoreResult<&str> {
        self.report()
            .and_then(|r| r.tumor_assignment.as_ref())
            .and_then(|t| t.tumor_case_id.as_deref())
            .ok_or(CoreError::MissingField {
                report_group_id: self.report_group_id,
                field: "tumorCaseId",
            })
    }
}

/// An unordered collection of notification records, typically all revisions for one case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationBatch {
    records: Vec<NotificationRecord>,
}

impl NotificationBatch {
    pub fn new(records: Vec<NotificationRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: NotificationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a batch from a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedBatch`] naming the failing path (for example
    /// `[2].reportGroupId`) if the JSON does not match the record schema.
    pub fn from_json(json_text: &str) -> CoreResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(batch) => Ok(batch),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(CoreError::MalformedBatch(format!(
                    "schema mismatch at {path}: {source}"
                )))
            }
        }
    }
}

impl FromIterator<NotificationRecord> for NotificationBatch {
    fn from_iter<I: IntoIterator<Item = NotificationRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NotificationBatch {
    type Item = &'a NotificationRecord;
    type IntoIter = std::slice::Iter<'a, NotificationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::reason;

    #[test]
    fn accessors_walk_the_payload_path() {
        let record = NotificationRecord::new(7, 1, reason::DIAGNOSIS, "tumor-1");
        assert_eq!(record.report_reason_code().expect("reason"), "diagnose");
        assert_eq!(record.tumor_case_id().expect("tumor id"), "tumor-1");
    }

    #[test]
    fn missing_payload_levels_are_reported() {
        let record = NotificationRecord {
            report_group_id: 42,
            version_number: 1,
            reference_number: None,
            payload: Some(ReportPayload {
                patient: Some(PatientSection { report: None }),
            }),
        };

        let err = record.report_reason_code().expect_err("no report");
        match err {
            CoreError::MissingField {
                report_group_id,
                field,
            } => {
                assert_eq!(report_group_id, 42);
                assert_eq!(field, "reportReasonCode");
            }
            other => panic!("expected MissingField error, got {other:?}"),
        }
        assert!(record.tumor_case_id().is_err());
    }

    #[test]
    fn parses_batch_json() {
        let input = r#"[
            {
                "reportGroupId": 101,
                "versionNumber": 2,
                "referenceNumber": "0000123456789",
                "payload": {
                    "patient": {
                        "report": {
                            "reasonCode": "behandlungsende",
                            "tumorAssignment": { "tumorCaseId": "1" }
                        }
                    }
                }
            },
            { "reportGroupId": 102, "versionNumber": 1 }
        ]"#;

        let batch = NotificationBatch::from_json(input).expect("parse batch");
        assert_eq!(batch.len(), 2);
        let first = &batch.records()[0];
        assert_eq!(first.reference_number.as_deref(), Some("0000123456789"));
        assert_eq!(first.report_reason_code().expect("reason"), "behandlungsende");
        assert!(batch.records()[1].payload.is_none());
    }

    #[test]
    fn missing_group_id_is_malformed() {
        let input = r#"[
            { "reportGroupId": 1, "versionNumber": 1 },
            { "versionNumber": 2 }
        ]"#;

        let err = NotificationBatch::from_json(input).expect_err("group id required");
        match err {
            CoreError::MalformedBatch(msg) => {
                assert!(msg.contains("[1]"), "path should name the record: {msg}");
                assert!(msg.contains("reportGroupId"));
            }
            other => panic!("expected MalformedBatch error, got {other:?}"),
        }
    }

    #[test]
    fn empty_array_is_an_empty_batch() {
        let batch = NotificationBatch::from_json("[]").expect("parse empty batch");
        assert!(batch.is_empty());
    }
}
