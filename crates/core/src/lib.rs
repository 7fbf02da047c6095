//! # Onko Core
//!
//! Reconciliation and assembly primitives for versioned cancer registry notifications.
//!
//! This crate contains the pure logic every resource-specific mapper builds on:
//! - collapsing report revisions to the latest version per report group
//! - ordering the surviving reports by a caller-supplied reason-code ranking
//! - salted one-way pseudonymisation of identifiers
//! - extraction of canonical 9-character identifiers from legacy strings
//! - upsert-addressed bundle assembly (delegating to the `fhir` crate)
//!
//! **No I/O concerns**: parsing registry XML, transport of notification batches and persistence
//! of bundles belong to the callers. Everything here is synchronous and side-effect free apart
//! from `tracing` diagnostics, and safe to call concurrently.

pub mod config;
pub mod constants;
mod error;
pub mod identifier;
pub mod notification;
pub mod pseudonym;
pub mod reconcile;

pub use config::{CoreConfig, IdentifierSystems};
pub use error::{CoreError, CoreResult};
pub use identifier::{find_canonical_identifier, normalize_identifier};
pub use notification::{
    NotificationBatch, NotificationRecord, PatientSection, Report, ReportPayload, TumorAssignment,
};
pub use pseudonym::{IdentifierKind, Pseudonymizer};
pub use reconcile::{latest_versions, order_by_priority, reconcile_and_order, PriorityOrder};

pub use fhir::{Bundle, Resource};
pub use onko_types::Sha256Hash;

/// Appends `resource` to `bundle` as an upsert entry and returns the bundle for chaining.
///
/// See [`fhir::Bundle::add_entry`].
pub fn add_entry<'b, R: Resource + ?Sized>(
    bundle: &'b mut Bundle,
    resource: &R,
) -> CoreResult<&'b mut Bundle> {
    Ok(bundle.add_entry(resource)?)
}

/// Reconciliation operations bound to one configuration.
///
/// Construct once at startup and share by reference (or clone) across threads; it holds only
/// immutable state.
#[derive(Clone, Debug)]
pub struct ReconciliationService {
    config: CoreConfig,
    pseudonymizer: Pseudonymizer,
}

impl ReconciliationService {
    /// Creates a service, resolving the per-kind salts from `config`.
    pub fn new(config: CoreConfig) -> Self {
        let pseudonymizer = Pseudonymizer::new(&config);
        Self {
            config,
            pseudonymizer,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// See [`identifier::normalize_identifier`].
    pub fn normalize_identifier(&self, raw: &str) -> String {
        normalize_identifier(raw)
    }

    /// See [`Pseudonymizer::pseudonymize`].
    pub fn pseudonymize(&self, kind: IdentifierKind, value: &str) -> Option<Sha256Hash> {
        self.pseudonymizer.pseudonymize(kind, value)
    }

    /// See [`reconcile::reconcile_and_order`].
    pub fn reconcile_and_order<'a>(
        &self,
        batch: &'a NotificationBatch,
        priority_order: &PriorityOrder,
    ) -> CoreResult<Vec<&'a NotificationRecord>> {
        reconcile_and_order(batch, priority_order)
    }

    /// See [`add_entry`].
    pub fn add_entry<'b, R: Resource + ?Sized>(
        &self,
        bundle: &'b mut Bundle,
        resource: &R,
    ) -> CoreResult<&'b mut Bundle> {
        add_entry(bundle, resource)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for asserting on diagnostics.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("log buffer poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs `f` under a scoped subscriber and returns its result with the captured log text.
    pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().map(|b| b.clone()).unwrap_or_default();
        (result, String::from_utf8_lossy(&bytes).into_owned())
    }
}
