use anyhow::Context;
use clap::{Parser, Subcommand};
use onko_core::{
    CoreConfig, IdentifierKind, NotificationBatch, NotificationRecord, PriorityOrder,
    ReconciliationService,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onko")]
#[command(about = "Oncology notification reconciliation CLI")]
struct Cli {
    /// YAML configuration file (overrides ONKO_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a JSON notification batch to the latest reports, in priority order
    Reconcile {
        /// Path to a JSON array of notification records
        batch: PathBuf,
        /// Comma-separated report reason codes; the last one is emitted first
        #[arg(long, default_value = "")]
        priority: String,
    },
    /// Extract the canonical 9-character identifier from a raw string
    NormaliseId {
        /// Raw identifier
        raw: String,
    },
    /// Hash an identifier (kind: Patient, Condition, Observation or Surrogate)
    Pseudonymise {
        /// Identifier kind tag
        kind: String,
        /// Raw identifier value
        value: String,
    },
}

/// One line of `reconcile` output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportSummary<'a> {
    report_group_id: i64,
    version_number: i32,
    report_reason_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tumor_case_id: Option<&'a str>,
}

impl<'a> ReportSummary<'a> {
    fn from_record(record: &'a NotificationRecord) -> anyhow::Result<Self> {
        Ok(Self {
            report_group_id: record.report_group_id,
            version_number: record.version_number,
            report_reason_code: record.report_reason_code()?,
            tumor_case_id: record.tumor_case_id().ok(),
        })
    }
}

/// Resolve configuration from an explicit file, or from `ONKO_*` environment variables.
fn load_config(path: Option<&Path>) -> anyhow::Result<CoreConfig> {
    if let Some(path) = path {
        return CoreConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }

    Ok(CoreConfig::from_env_values(
        std::env::var("ONKO_PATIENT_ID_SYSTEM").ok(),
        std::env::var("ONKO_CONDITION_ID_SYSTEM").ok(),
        std::env::var("ONKO_OBSERVATION_ID_SYSTEM").ok(),
    )?)
}

/// Run one command, returning the text to print.
fn execute(command: Commands, service: &ReconciliationService) -> anyhow::Result<String> {
    match command {
        Commands::Reconcile { batch, priority } => {
            let text = std::fs::read_to_string(&batch)
                .with_context(|| format!("reading batch {}", batch.display()))?;
            let batch = NotificationBatch::from_json(&text)?;
            let order: PriorityOrder = priority.parse()?;

            let reports = service.reconcile_and_order(&batch, &order)?;
            tracing::info!(
                "{} records reconciled to {} reports",
                batch.len(),
                reports.len()
            );

            let lines = reports
                .into_iter()
                .map(|record| -> anyhow::Result<String> {
                    let summary = ReportSummary::from_record(record)?;
                    Ok(serde_json::to_string(&summary)?)
                })
                .collect::<anyhow::Result<Vec<String>>>()?;
            Ok(lines.join("\n"))
        }
        Commands::NormaliseId { raw } => Ok(service.normalize_identifier(&raw)),
        Commands::Pseudonymise { kind, value } => {
            match service.pseudonymize(IdentifierKind::from_tag(&kind), &value) {
                Some(hash) => Ok(hash.to_string()),
                None => Ok(format!("identifier kind '{kind}' is not pseudonymised")),
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("onko=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'onko --help' for commands");
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let service = ReconciliationService::new(config);

    println!("{}", execute(command, &service)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use onko_core::IdentifierSystems;
    use std::io::Write;

    fn service() -> ReconciliationService {
        ReconciliationService::new(
            CoreConfig::new(IdentifierSystems {
                patient_id: "p".into(),
                condition_id: "c".into(),
                observation_id: "o".into(),
            })
            .expect("valid config"),
        )
    }

    #[test]
    fn reconcile_prints_ordered_summaries() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[
                {{"reportGroupId": 1, "versionNumber": 1, "payload": {{"patient": {{"report": {{"reasonCode": "diagnose"}}}}}}}},
                {{"reportGroupId": 2, "versionNumber": 1, "payload": {{"patient": {{"report": {{"reasonCode": "tod"}}}}}}}},
                {{"reportGroupId": 1, "versionNumber": 2, "payload": {{"patient": {{"report": {{"reasonCode": "diagnose"}}}}}}}}
            ]"#
        )
        .expect("write batch");

        let output = execute(
            Commands::Reconcile {
                batch: file.path().to_path_buf(),
                priority: "tod,diagnose".into(),
            },
            &service(),
        )
        .expect("reconcile");

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"reportGroupId":1,"versionNumber":2,"reportReasonCode":"diagnose"}"#,
                r#"{"reportGroupId":2,"versionNumber":1,"reportReasonCode":"tod"}"#,
            ]
        );
    }

    #[test]
    fn reconcile_reports_malformed_batches() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"versionNumber": 1}}]"#).expect("write batch");

        let err = execute(
            Commands::Reconcile {
                batch: file.path().to_path_buf(),
                priority: String::new(),
            },
            &service(),
        )
        .expect_err("group id missing");
        assert!(err.to_string().contains("malformed notification batch"));
    }

    #[test]
    fn normalise_id_prints_canonical_identifier() {
        let output = execute(
            Commands::NormaliseId {
                raw: "0000123456789".into(),
            },
            &service(),
        )
        .expect("normalise");
        assert_eq!(output, "123456789");
    }

    #[test]
    fn pseudonymise_handles_unknown_kinds() {
        let hashed = execute(
            Commands::Pseudonymise {
                kind: "Patient".into(),
                value: "123".into(),
            },
            &service(),
        )
        .expect("pseudonymise");
        assert_eq!(hashed.len(), 64);

        let skipped = execute(
            Commands::Pseudonymise {
                kind: "Encounter".into(),
                value: "123".into(),
            },
            &service(),
        )
        .expect("pseudonymise");
        assert!(skipped.contains("not pseudonymised"));
    }

    #[test]
    fn config_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "systems:\n  patientIdSystem: from-file\n  conditionIdSystem: c\n  observationIdSystem: o"
        )
        .expect("write config");

        let config = load_config(Some(file.path())).expect("load config");
        assert_eq!(config.systems().patient_id, "from-file");
    }
}
