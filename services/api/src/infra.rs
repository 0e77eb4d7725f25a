use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use nomina::error::AppError;
use nomina::store::InMemoryStore;
use nomina::workflows::approvals::{
    AbsenceRequest, AbsenceSubmission, AbsenceType, ApprovalError, ApprovalService,
};
use nomina::workflows::employees::{Employee, EmployeeClass, EmployeeId};
use nomina::workflows::prenomina::{
    CalculationMethod, EffectType, Incidence, IncidenceCategory, IncidenceId, IncidenceStatus,
    PayrollPeriod, PayrollRates, PeriodId, PeriodStatus, PrenominaError, PrenominaService,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Approvals = ApprovalService<InMemoryStore, InMemoryStore, InMemoryStore>;
pub(crate) type Prenomina =
    PrenominaService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

pub(crate) const DEMO_PERIOD: &str = "2025-21";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Both workflow services share one store so approvals and metrics see the same directory.
pub(crate) fn build_services(
    store: &InMemoryStore,
    config: &nomina::config::AppConfig,
) -> (Arc<Approvals>, Arc<Prenomina>) {
    let shared = Arc::new(store.clone());
    let approvals = ApprovalService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        config.escalation.policy(),
    );
    let prenomina = PrenominaService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
        config.payroll,
    );
    (Arc::new(approvals), Arc::new(prenomina))
}

/// Directory, one open period and a handful of incidences for local runs.
pub(crate) fn seed_demo_store(rates: &PayrollRates) -> Result<InMemoryStore, AppError> {
    let store = InMemoryStore::new();

    for (id, name, class, daily_salary) in [
        ("emp-100", "Lucia Herrera", EmployeeClass::WhiteCollar, dec!(850)),
        ("emp-200", "Ramon Ibarra", EmployeeClass::BlueCollar, dec!(420)),
        ("emp-300", "Sofia Medina", EmployeeClass::GrayCollar, dec!(560)),
    ] {
        store.insert_employee(Employee {
            id: EmployeeId::new(id),
            name: name.to_string(),
            class,
            daily_salary,
            integrated_daily_salary: rates
                .integrated_daily_salary(daily_salary)
                .map_err(PrenominaError::from)?,
            active: true,
        })?;
    }

    store.insert_period(PayrollPeriod {
        id: PeriodId::new(DEMO_PERIOD),
        code: "2025-Q21".to_string(),
        start_date: demo_date(2025, 11, 1),
        end_date: demo_date(2025, 11, 15),
        status: PeriodStatus::Open,
    })?;

    let incidences = [
        demo_incidence(
            "emp-100",
            IncidenceCategory::Overtime,
            EffectType::Positive,
            CalculationMethod::HourlyDouble,
            dec!(4),
            Decimal::ZERO,
        ),
        demo_incidence(
            "emp-100",
            IncidenceCategory::Bonus,
            EffectType::Positive,
            CalculationMethod::Fixed,
            Decimal::ONE,
            dec!(1500),
        ),
        demo_incidence(
            "emp-200",
            IncidenceCategory::Absence,
            EffectType::Negative,
            CalculationMethod::Daily,
            dec!(2),
            Decimal::ZERO,
        ),
        demo_incidence(
            "emp-200",
            IncidenceCategory::Delay,
            EffectType::Negative,
            CalculationMethod::Fixed,
            dec!(35),
            Decimal::ZERO,
        ),
        demo_incidence(
            "emp-300",
            IncidenceCategory::Loan,
            EffectType::Negative,
            CalculationMethod::Fixed,
            Decimal::ONE,
            dec!(800),
        ),
    ];
    store.extend_incidences(incidences)?;

    Ok(store)
}

/// One pending request per collar type, all filed at `now`.
pub(crate) fn seed_demo_requests(
    approvals: &Approvals,
    now: DateTime<Utc>,
) -> Result<Vec<AbsenceRequest>, ApprovalError> {
    let start = now.date_naive() + Duration::days(7);
    [
        ("emp-100", AbsenceType::Vacation, 5, "family trip"),
        ("emp-200", AbsenceType::Personal, 1, "paperwork"),
        ("emp-300", AbsenceType::SickLeave, 2, "medical appointment"),
    ]
    .into_iter()
    .map(|(employee_id, request_type, days, reason)| {
        approvals.submit(
            AbsenceSubmission {
                employee_id: EmployeeId::new(employee_id),
                request_type,
                start_date: start,
                end_date: start + Duration::days(days - 1),
                reason: reason.to_string(),
            },
            now,
        )
    })
    .collect()
}

fn demo_incidence(
    employee_id: &str,
    category: IncidenceCategory,
    effect: EffectType,
    method: CalculationMethod,
    quantity: Decimal,
    amount: Decimal,
) -> Incidence {
    Incidence {
        id: IncidenceId(format!("{DEMO_PERIOD}-{employee_id}-{}", category.label())),
        employee_id: EmployeeId::new(employee_id),
        period_id: PeriodId::new(DEMO_PERIOD),
        category,
        effect,
        method,
        quantity,
        amount,
        status: IncidenceStatus::Approved,
    }
}

fn demo_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
