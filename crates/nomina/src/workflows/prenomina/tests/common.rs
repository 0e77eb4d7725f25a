use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::employees::{Employee, EmployeeClass, EmployeeId};
use crate::workflows::prenomina::{
    CalculationMethod, EffectType, Incidence, IncidenceCategory, IncidenceId, IncidenceStatus,
    MetricRepository, PayrollPeriod, PayrollRates, PeriodId, PeriodStatus, PrenominaMetric,
    PrenominaService,
};

pub(super) const OPEN: &str = "2025-05";
pub(super) const CLOSED: &str = "2025-04";
pub(super) const ANA: &str = "emp-001";
pub(super) const BETO: &str = "emp-002";
pub(super) const CARLA: &str = "emp-003";

pub(super) type MemoryService =
    PrenominaService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 16, 8, 30, 0).unwrap()
}

fn employee(id: &str, class: EmployeeClass, daily: Decimal, active: bool) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        name: format!("Employee {id}"),
        class,
        daily_salary: daily,
        integrated_daily_salary: daily,
        active,
    }
}

fn period(id: &str, start_day: u32, status: PeriodStatus) -> PayrollPeriod {
    PayrollPeriod {
        id: PeriodId::new(id),
        code: format!("Q-{id}"),
        start_date: NaiveDate::from_ymd_opt(2025, 3, start_day).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, start_day + 14).unwrap(),
        status,
    }
}

pub(super) fn incidence(
    id: &str,
    employee_id: &str,
    category: IncidenceCategory,
    method: CalculationMethod,
    quantity: Decimal,
    amount: Decimal,
) -> Incidence {
    Incidence {
        id: IncidenceId(id.to_string()),
        employee_id: EmployeeId::new(employee_id),
        period_id: PeriodId::new(OPEN),
        category,
        effect: EffectType::Negative,
        method,
        quantity,
        amount,
        status: IncidenceStatus::Approved,
    }
}

/// Ana (white collar, 500/day) has an absence, overtime, a bonus and a loan in the
/// open period. Beto (blue collar, 400/day) has nothing. Carla is inactive.
pub(super) fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_employee(employee(ANA, EmployeeClass::WhiteCollar, dec!(500.00), true))
        .unwrap();
    store
        .insert_employee(employee(BETO, EmployeeClass::BlueCollar, dec!(400.00), true))
        .unwrap();
    store
        .insert_employee(employee(CARLA, EmployeeClass::GrayCollar, dec!(450.00), false))
        .unwrap();
    store.insert_period(period(OPEN, 1, PeriodStatus::Open)).unwrap();
    store
        .insert_period(period(CLOSED, 16, PeriodStatus::Closed))
        .unwrap();
    store
        .extend_incidences([
            incidence(
                "inc-1",
                ANA,
                IncidenceCategory::Absence,
                CalculationMethod::Daily,
                dec!(1),
                dec!(0),
            ),
            incidence(
                "inc-2",
                ANA,
                IncidenceCategory::Overtime,
                CalculationMethod::Hourly,
                dec!(2),
                dec!(0),
            ),
            incidence(
                "inc-3",
                ANA,
                IncidenceCategory::Bonus,
                CalculationMethod::Fixed,
                dec!(1),
                dec!(750.00),
            ),
            incidence(
                "inc-4",
                ANA,
                IncidenceCategory::Loan,
                CalculationMethod::Fixed,
                dec!(1),
                dec!(400.00),
            ),
        ])
        .unwrap();
    store
}

pub(super) fn build_service(store: &InMemoryStore) -> MemoryService {
    let shared = Arc::new(store.clone());
    PrenominaService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
        PayrollRates::default(),
    )
}

/// Reads through to the store but refuses every metric write.
pub(super) struct UnwritableMetrics(pub(super) InMemoryStore);

impl MetricRepository for UnwritableMetrics {
    fn fetch(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<Option<PrenominaMetric>, RepositoryError> {
        MetricRepository::fetch(&self.0, employee_id, period_id)
    }

    fn save(
        &self,
        _metric: PrenominaMetric,
        _expected_revision: Option<u64>,
    ) -> Result<PrenominaMetric, RepositoryError> {
        Err(RepositoryError::Unavailable("metric store offline".to_string()))
    }

    fn list_for_period(
        &self,
        period_id: &PeriodId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<PrenominaMetric>, usize), RepositoryError> {
        self.0.list_for_period(period_id, offset, limit)
    }
}

pub(super) fn build_service_without_metric_writes(
    store: &InMemoryStore,
) -> PrenominaService<InMemoryStore, InMemoryStore, InMemoryStore, UnwritableMetrics> {
    let shared = Arc::new(store.clone());
    PrenominaService::new(
        shared.clone(),
        shared.clone(),
        shared,
        Arc::new(UnwritableMetrics(store.clone())),
        PayrollRates::default(),
    )
}

pub(super) fn employee_id(id: &str) -> EmployeeId {
    EmployeeId::new(id)
}

pub(super) fn period_id(id: &str) -> PeriodId {
    PeriodId::new(id)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
