//! Single-cluster inspection command

use anyhow::{bail, Result};
use colored::Colorize;
use optimizer_lib::{diff, ClusterPlan, HttpDirectory, PolicySettings, Reconciler};
use serde_json::json;
use tabled::Tabled;

use crate::output::{print_info, print_success, print_warning, OutputFormat};

/// Row for the field changes table
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    path: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Desired")]
    desired: String,
}

/// Show the desired configuration and delta for one cluster
pub async fn show_plan(
    directory: HttpDirectory,
    settings: &PolicySettings,
    cluster_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let policy = settings.validate()?;
    let reconciler = Reconciler::new(directory, policy)?;

    let plan = reconciler.plan_cluster(cluster_id).await;

    match plan {
        ClusterPlan::Failed { stage, error } => {
            bail!("{} failed for cluster {}: {}", stage, cluster_id, error)
        }
        ClusterPlan::Excluded => match format {
            OutputFormat::Json => {
                println!("{}", json!({"cluster_id": cluster_id, "status": "excluded"}))
            }
            OutputFormat::Table => print_info(&format!(
                "Cluster {} is managed by the job scheduler and is never updated",
                cluster_id
            )),
        },
        ClusterPlan::Skipped { reason } => match format {
            OutputFormat::Json => println!(
                "{}",
                json!({"cluster_id": cluster_id, "status": "skipped", "reason": reason})
            ),
            OutputFormat::Table => {
                print_warning(&format!("Cluster {} is skipped: {}", cluster_id, reason))
            }
        },
        ClusterPlan::Ready { desired, delta } => match format {
            OutputFormat::Json => {
                let status = if delta.is_empty() { "unchanged" } else { "changed" };
                let body = json!({
                    "cluster_id": cluster_id,
                    "status": status,
                    "desired": desired,
                    "delta": delta,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Table => {
                println!("{}", "Desired configuration".bold());
                println!("{}", "=".repeat(50));
                println!("{}", serde_json::to_string_pretty(&desired)?);
                println!();

                if delta.is_empty() {
                    print_success(&format!("Cluster {} already complies with policy", cluster_id));
                    return Ok(());
                }

                let rows: Vec<FieldRow> = delta
                    .flatten()
                    .into_iter()
                    .map(|change| FieldRow {
                        path: change.path,
                        current: diff::render(change.old.as_ref()),
                        desired: diff::render(change.new.as_ref()),
                    })
                    .collect();

                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        },
    }

    Ok(())
}
