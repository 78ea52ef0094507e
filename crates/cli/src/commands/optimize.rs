//! Fleet-wide optimization command

use anyhow::{Context, Result};
use colored::Colorize;
use optimizer_lib::{
    ApplyMode, ClusterStatus, HttpDirectory, PolicySettings, Reconciler, RunReport,
    StructuredLogger, WorkspaceContext,
};
use std::path::Path;
use tabled::Tabled;

use crate::output::{color_status, format_delta, print_error, print_info, print_success, OutputFormat};

/// Row for the outcomes table
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Cluster ID")]
    cluster_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

/// Run the full pipeline over every cluster in scope
pub async fn run(
    context: WorkspaceContext,
    settings: &PolicySettings,
    metrics_file: Option<&Path>,
    show_unchanged: bool,
    format: OutputFormat,
) -> Result<()> {
    let policy = settings.validate()?;
    context.check_scope(policy.scope())?;

    let logger = StructuredLogger::new(context.host().as_str());
    let directory = HttpDirectory::new(context)?;
    let reconciler = Reconciler::new(directory, policy)?.with_logger(logger);

    let report = reconciler.run().await?;

    if let Some(path) = metrics_file {
        let rendered = reconciler.metrics().render()?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        OutputFormat::Table => print_report(&report, show_unchanged),
    }

    Ok(())
}

fn print_report(report: &RunReport, show_unchanged: bool) {
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .filter(|o| show_unchanged || o.status != ClusterStatus::Unchanged)
        .map(|o| OutcomeRow {
            cluster_id: o.cluster_id.clone(),
            status: color_status(o.status.label()),
            changes: match &o.status {
                ClusterStatus::Skipped { reason } => reason.clone(),
                ClusterStatus::Failed {
                    stage,
                    error,
                    delta,
                } => {
                    let attempted = delta.as_ref().map(format_delta).unwrap_or_default();
                    format!("{} failed: {}\n{}", stage, error, attempted)
                        .trim_end()
                        .to_string()
                }
                status => status.delta().map(format_delta).unwrap_or_default(),
            },
        })
        .collect();

    if rows.is_empty() {
        print_info("All clusters already comply with policy");
    } else {
        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
    }

    let summary = report.summary();
    println!(
        "\n{} processed, {} changed, {} unchanged, {} skipped, {} failed",
        summary.processed,
        summary.changed().to_string().bold(),
        summary.unchanged,
        summary.skipped,
        summary.failed
    );

    if summary.failed > 0 {
        print_error(&format!(
            "{} cluster(s) could not be processed, see the table above",
            summary.failed
        ));
    }

    match report.mode {
        ApplyMode::Update => print_success("Everything has been optimized"),
        ApplyMode::View => print_success("Review complete, rerun with --action update to apply"),
    }
}
