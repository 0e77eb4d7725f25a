//! Pre-payroll calculation scenarios exercised through `PrenominaService` over the
//! in-memory store.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use nomina::store::InMemoryStore;
use nomina::workflows::employees::{Employee, EmployeeClass, EmployeeId, EmployeeRepository};
use nomina::workflows::prenomina::{
    BulkOutcome, CalculationMethod, EffectType, EmployeeSelector, Incidence, IncidenceCategory,
    IncidenceId, IncidenceStatus, MetricStatus, PayrollPeriod, PayrollRates, PeriodId,
    PeriodStatus, PrenominaError, PrenominaService,
};

const PERIOD: &str = "2025-13";

type Service = PrenominaService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 16, 7, 0, 0).unwrap()
}

fn period_id() -> PeriodId {
    PeriodId::new(PERIOD)
}

fn incidence(
    seq: u32,
    category: IncidenceCategory,
    effect: EffectType,
    method: CalculationMethod,
    quantity: Decimal,
    amount: Decimal,
    status: IncidenceStatus,
) -> Incidence {
    Incidence {
        id: IncidenceId(format!("inc-{seq}")),
        employee_id: EmployeeId::new("emp-1"),
        period_id: period_id(),
        category,
        effect,
        method,
        quantity,
        amount,
        status,
    }
}

fn seeded() -> (InMemoryStore, Service) {
    let store = InMemoryStore::new();
    store
        .insert_employee(Employee {
            id: EmployeeId::new("emp-1"),
            name: "Marisol Vega".to_string(),
            class: EmployeeClass::WhiteCollar,
            daily_salary: dec!(600),
            integrated_daily_salary: dec!(600),
            active: true,
        })
        .unwrap();
    store
        .insert_employee(Employee {
            id: EmployeeId::new("emp-2"),
            name: "Tomas Rivas".to_string(),
            class: EmployeeClass::BlueCollar,
            daily_salary: dec!(320),
            integrated_daily_salary: dec!(320),
            active: true,
        })
        .unwrap();
    store
        .insert_period(PayrollPeriod {
            id: period_id(),
            code: "2025-Q13".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            status: PeriodStatus::Open,
        })
        .unwrap();

    use CalculationMethod::{Daily, Fixed, Hourly};
    use EffectType::{Negative, Positive};
    use IncidenceCategory::{Advance, Bonus, Commission, Delay, Loan, Overtime, Vacation};
    use IncidenceStatus::{Approved, Cancelled, Pending, Processed};
    let zero = Decimal::ZERO;
    let one = Decimal::ONE;
    store
        .extend_incidences([
            incidence(1, Vacation, Positive, Daily, dec!(2), zero, Approved),
            incidence(2, Overtime, Positive, Hourly, dec!(3), zero, Approved),
            incidence(3, Delay, Negative, Fixed, dec!(30), zero, Approved),
            incidence(4, Commission, Positive, Fixed, one, dec!(1200), Approved),
            incidence(5, Advance, Negative, Fixed, one, dec!(500), Processed),
            incidence(6, Bonus, Positive, Fixed, one, dec!(999), Pending),
            incidence(7, Loan, Negative, Fixed, one, dec!(300), Cancelled),
        ])
        .unwrap();

    let shared = Arc::new(store.clone());
    let service = PrenominaService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
        PayrollRates::default(),
    );
    (store, service)
}

#[test]
fn calculation_combines_work_and_money_incidences() {
    let (_store, service) = seeded();

    let response = service
        .calculate(&EmployeeId::new("emp-1"), &period_id(), false, "clerk-7", now())
        .expect("calculation succeeds");

    assert!(response.created);
    assert_eq!(response.incidences_counted, 5);
    assert_eq!(response.incidences_ignored, 2);

    let work = &response.metric.work;
    assert_eq!(work.vacation_days, dec!(2));
    assert_eq!(work.worked_days, dec!(13));
    assert_eq!(work.regular_hours, dec!(104));
    assert_eq!(work.overtime_hours, dec!(3));
    assert_eq!(work.delay_count, 1);
    assert_eq!(work.delay_minutes, dec!(30));

    let pay = &response.metric.pay;
    assert_eq!(pay.regular_salary, dec!(7800.00));
    assert_eq!(pay.overtime_amount, dec!(337.50));
    assert_eq!(pay.delay_deduction, dec!(37.50));
    assert_eq!(pay.commission_amount, dec!(1200.00));
    assert_eq!(pay.advance_deduction, dec!(500.00));
    assert_eq!(pay.bonus_amount, Decimal::ZERO);
    assert_eq!(pay.loan_deduction, Decimal::ZERO);
    assert_eq!(pay.total_extras, dec!(1537.50));
    assert_eq!(pay.total_deductions, dec!(537.50));
    assert_eq!(pay.gross_income, dec!(9337.50));
    assert_eq!(pay.net_income, dec!(8800.00));
    assert_eq!(response.metric.calculation_status, MetricStatus::Calculated);
    assert_eq!(response.metric.calculated_by, "clerk-7");
}

#[test]
fn recalculation_refreshes_integrated_salary_when_asked() {
    let (store, service) = seeded();
    let employee_id = EmployeeId::new("emp-1");

    let first = service
        .calculate(&employee_id, &period_id(), false, "clerk-7", now())
        .unwrap();
    assert_eq!(first.integrated_daily_salary, dec!(600));

    let second = service
        .calculate(&employee_id, &period_id(), true, "clerk-7", now())
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.integrated_daily_salary, dec!(629.59));
    assert_eq!(second.metric.pay, first.metric.pay);
    assert!(second.metric.revision > first.metric.revision);

    let stored = EmployeeRepository::fetch(&store, &employee_id)
        .unwrap()
        .expect("employee still present");
    assert_eq!(stored.integrated_daily_salary, dec!(629.59));
}

#[test]
fn approved_metric_is_frozen() {
    let (_store, service) = seeded();
    let employee_id = EmployeeId::new("emp-2");

    service
        .calculate(&employee_id, &period_id(), false, "clerk-7", now())
        .unwrap();
    let approved = service
        .approve(&employee_id, &period_id(), "lead-2", now())
        .expect("approval succeeds");
    assert_eq!(approved.calculation_status, MetricStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("lead-2"));

    let err = service
        .calculate(&employee_id, &period_id(), false, "clerk-7", now())
        .expect_err("approved metrics are not recalculated");
    assert!(matches!(err, PrenominaError::MetricAlreadyApproved { .. }));
}

#[test]
fn bulk_run_totals_every_active_employee() {
    let (_store, service) = seeded();

    let report = service
        .bulk_calculate(&period_id(), &EmployeeSelector::AllActive, "clerk-7", now())
        .expect("bulk succeeds");

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(report.skipped.is_empty());
    // emp-2 has no incidences: 15 days at 320.
    assert_eq!(report.total_net, dec!(8800.00) + dec!(4800.00));
    assert!(report
        .results
        .iter()
        .all(|item| matches!(item.outcome, BulkOutcome::Success { .. })));

    let page = service.list(&period_id(), 1, 1).expect("page");
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].employee_id, EmployeeId::new("emp-1"));
}

#[test]
fn unknown_period_fails_the_whole_bulk_run() {
    let (_store, service) = seeded();

    let err = service
        .bulk_calculate(
            &PeriodId::new("1999-01"),
            &EmployeeSelector::AllActive,
            "clerk-7",
            now(),
        )
        .expect_err("unknown period");
    assert!(matches!(err, PrenominaError::PeriodNotFound(_)));
}
