use crate::infra::{build_services, seed_demo_requests, seed_demo_store, DEMO_PERIOD};
use chrono::{Duration, Utc};
use clap::Args;
use nomina::config::AppConfig;
use nomina::error::AppError;
use nomina::workflows::approvals::{ApproverRole, SweepReport};
use nomina::workflows::imports::IncidenceImporter;
use nomina::workflows::prenomina::{BulkOutcome, EmployeeSelector, PeriodId};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Incidence CSV export to load on top of the seeded incidences.
    #[arg(long)]
    pub(crate) incidences: Option<PathBuf>,
    /// Print the bulk calculation report as JSON instead of a summary table.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Run the sweep this many hours after the demo requests were filed.
    /// Defaults to one hour past the configured threshold.
    #[arg(long)]
    pub(crate) after_hours: Option<i64>,
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = seed_demo_store(&config.payroll)?;
    let (approvals, _) = build_services(&store, &config);

    let filed_at = Utc::now();
    let requests = seed_demo_requests(&approvals, filed_at)?;
    let after_hours = args
        .after_hours
        .unwrap_or_else(|| i64::from(config.escalation.threshold_hours) + 1);
    let sweep_at = filed_at + Duration::hours(after_hours);

    println!(
        "Filed {} demo requests, sweeping {} hours later",
        requests.len(),
        after_hours
    );
    let report = approvals.engine().process_pending_escalations(sweep_at)?;
    print_json(&report)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = seed_demo_store(&config.payroll)?;

    if let Some(path) = args.incidences {
        let incidences = IncidenceImporter::from_path(&path)?;
        let stored = store.extend_incidences(incidences)?;
        println!("Imported {} incidences from {}", stored, path.display());
    }

    let (approvals, prenomina) = build_services(&store, &config);
    let now = Utc::now();

    let period_id = PeriodId::new(DEMO_PERIOD);
    let bulk = prenomina.bulk_calculate(&period_id, &EmployeeSelector::AllActive, "demo", now)?;
    if args.json {
        print_json(&bulk)?;
    } else {
        println!("Prenomina for period {}", bulk.period_id);
        for item in &bulk.results {
            match &item.outcome {
                BulkOutcome::Success {
                    gross_income,
                    net_income,
                } => println!(
                    "- {}: gross {} | net {}",
                    item.employee_id, gross_income, net_income
                ),
                BulkOutcome::Failed { error } => {
                    println!("- {}: failed ({})", item.employee_id, error)
                }
            }
        }
        println!(
            "Totals: {} calculated, {} failed | gross {} | net {}",
            bulk.succeeded, bulk.failed, bulk.total_gross, bulk.total_net
        );
    }

    let requests = seed_demo_requests(&approvals, now)?;
    if let Some(first) = requests.first() {
        let approved = approvals.approve(&first.id, ApproverRole::Supervisor, now)?;
        println!(
            "\nSupervisor signed {}; now at {}",
            approved.id, approved.current_approval_stage
        );
    }

    let sweep_at = now + config.escalation.policy().threshold + Duration::hours(1);
    let report = approvals.engine().process_pending_escalations(sweep_at)?;
    render_sweep(&report);

    for request in &requests {
        let history = approvals.engine().escalation_history(&request.id)?;
        let trail: Vec<String> = history
            .iter()
            .map(|entry| format!("{} -> {}", entry.from_stage, entry.to_stage))
            .collect();
        println!("History {}: {}", request.id, trail.join(", "));
    }

    Ok(())
}

fn render_sweep(report: &SweepReport) {
    println!(
        "\nEscalation sweep: {} scanned | {} fresh | {} escalated | {} skipped",
        report.scanned,
        report.fresh,
        report.escalated.len(),
        report.skipped.len()
    );
    for item in &report.escalated {
        println!(
            "- {}: {} -> {}",
            item.request_id, item.from_stage, item.to_stage
        );
    }
    for item in &report.skipped {
        println!("- {} skipped at {}: {}", item.request_id, item.stage, item.reason);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
