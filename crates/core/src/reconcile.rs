//! Latest-version reconciliation and priority ordering of notification records.
//!
//! The pipeline is: raw batch, then one record per report group (the latest version), then
//! those records sorted by report reason.
//!
//! # Ranking
//!
//! The caller's priority order is reversed into a working copy and each record is keyed by the
//! position of its reason code in that reversed copy, with "not listed" ranking below every
//! position. Records are then sorted ascending (stable). The resulting precedence is:
//!
//! - the **last** listed reason is emitted **first**, the first listed reason last;
//! - reasons missing from the order are emitted before all listed reasons;
//! - records with equal keys keep their relative order.
//!
//! Mappers rely on this exact order (for example to pick the first emitted resource as the root
//! that later ones reference via part-of), so it must not be "corrected".
//!
//! # Version ties
//!
//! Version numbers are expected to be unique within a group. On a tie the record seen first in
//! the batch keeps its slot; a warning is logged. Callers must not rely on tie behaviour.

use crate::{CoreResult, NotificationBatch, NotificationRecord};
use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

/// Caller-defined ordering of report reason codes.
///
/// The order is held as given and never mutated; ranking works on an internal reversed copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriorityOrder {
    codes: Vec<String>,
}

impl PriorityOrder {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// The codes in the order the caller supplied them.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    fn reversed(&self) -> Vec<&str> {
        self.codes.iter().rev().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PriorityOrder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl FromStr for PriorityOrder {
    type Err = Infallible;

    /// Parses a comma-separated list, ignoring blank items.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .collect())
    }
}

/// Keeps the latest version of every report group.
///
/// Groups appear in the order their first record appears in the batch.
pub fn latest_versions(batch: &NotificationBatch) -> Vec<&NotificationRecord> {
    let mut latest: Vec<&NotificationRecord> = Vec::new();
    let mut slot_by_group: HashMap<i64, usize> = HashMap::new();

    for record in batch {
        match slot_by_group.get(&record.report_group_id) {
            None => {
                slot_by_group.insert(record.report_group_id, latest.len());
                latest.push(record);
            }
            Some(&slot) => {
                let current = latest[slot];
                if record.version_number > current.version_number {
                    latest[slot] = record;
                } else if record.version_number == current.version_number {
                    tracing::warn!(
                        "report group {} has duplicate version {}; keeping the first record seen",
                        record.report_group_id,
                        record.version_number
                    );
                }
            }
        }
    }

    latest
}

/// Sorts reports by the inverted priority ranking described in the module docs.
///
/// # Errors
///
/// Returns [`crate::CoreError::MissingField`] if a report has no reason code.
pub fn order_by_priority<'a>(
    reports: Vec<&'a NotificationRecord>,
    priority_order: &PriorityOrder,
) -> CoreResult<Vec<&'a NotificationRecord>> {
    let reversed = priority_order.reversed();

    // `None` (not listed) orders before every `Some(position)`.
    let mut keyed = reports
        .into_iter()
        .map(|record| -> CoreResult<(Option<usize>, &'a NotificationRecord)> {
            let reason = record.report_reason_code()?;
            let rank = reversed.iter().position(|code| *code == reason);
            Ok((rank, record))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    keyed.sort_by_key(|(rank, _)| *rank);

    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}

/// Reconciles a batch to its latest versions and orders them by priority.
///
/// An empty batch yields an empty sequence.
///
/// # Errors
///
/// Returns [`crate::CoreError::MissingField`] if a surviving record has no reason code. The
/// error aborts this call only.
pub fn reconcile_and_order<'a>(
    batch: &'a NotificationBatch,
    priority_order: &PriorityOrder,
) -> CoreResult<Vec<&'a NotificationRecord>> {
    let latest = latest_versions(batch);
    tracing::debug!(
        "reconciled {} records into {} report groups",
        batch.len(),
        latest.len()
    );
    order_by_priority(latest, priority_order)
}
