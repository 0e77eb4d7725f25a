//! End-to-end behavior of the absence approval chain and the escalation sweep, driven
//! through the public service facade and the HTTP router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use tower::ServiceExt;

use nomina::store::InMemoryStore;
use nomina::workflows::approvals::{
    approvals_router, AbsenceSubmission, AbsenceType, ApprovalService, ApprovalStage,
    ApproverRole, EscalationPolicy, EscalationTrigger, RequestStatus, TransitionTable,
};
use nomina::workflows::employees::{Employee, EmployeeClass, EmployeeId};

type Service = ApprovalService<InMemoryStore, InMemoryStore, InMemoryStore>;

fn filed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

fn hours_later(hours: i64) -> DateTime<Utc> {
    filed_at() + Duration::hours(hours)
}

fn store_with(employees: &[(&str, EmployeeClass)]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for (id, class) in employees {
        store
            .insert_employee(Employee {
                id: EmployeeId::new(*id),
                name: format!("Employee {id}"),
                class: *class,
                daily_salary: dec!(500),
                integrated_daily_salary: dec!(524.66),
                active: true,
            })
            .expect("employee seeded");
    }
    store
}

fn service(store: &InMemoryStore, policy: EscalationPolicy) -> Service {
    let shared = Arc::new(store.clone());
    ApprovalService::new(shared.clone(), shared.clone(), shared, policy)
}

fn submission(employee_id: &str) -> AbsenceSubmission {
    AbsenceSubmission {
        employee_id: EmployeeId::new(employee_id),
        request_type: AbsenceType::Vacation,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
        reason: "summer break".to_string(),
    }
}

#[test]
fn idle_white_collar_request_climbs_to_payroll_and_stops() {
    let store = store_with(&[("emp-w", EmployeeClass::WhiteCollar)]);
    let approvals = service(&store, EscalationPolicy::default());
    let request = approvals
        .submit(submission("emp-w"), filed_at())
        .expect("submitted");
    assert_eq!(request.total_days, 5);

    for day in 1..=4 {
        let report = approvals
            .engine()
            .process_pending_escalations(hours_later(24 * day))
            .expect("sweep runs");
        assert_eq!(report.escalated.len(), 1, "day {day}");
    }

    let stuck = approvals
        .engine()
        .process_pending_escalations(hours_later(24 * 5))
        .expect("sweep runs");
    assert!(stuck.escalated.is_empty());
    assert_eq!(stuck.skipped.len(), 1);
    assert_eq!(stuck.skipped[0].stage, ApprovalStage::Payroll);

    let current = approvals.get(&request.id).expect("request stored");
    assert_eq!(current.current_approval_stage, ApprovalStage::Payroll);
    assert_eq!(current.status, RequestStatus::Pending);
    assert_eq!(current.escalation_count, 4);
    assert!(current.is_escalated);

    let history = approvals
        .engine()
        .escalation_history(&request.id)
        .expect("history");
    let path: Vec<_> = history
        .iter()
        .map(|entry| (entry.from_stage, entry.to_stage))
        .collect();
    assert_eq!(
        path,
        vec![
            (ApprovalStage::Supervisor, ApprovalStage::Manager),
            (ApprovalStage::Manager, ApprovalStage::Hr),
            (ApprovalStage::Hr, ApprovalStage::GeneralManager),
            (ApprovalStage::GeneralManager, ApprovalStage::Payroll),
        ]
    );
    assert!(history
        .iter()
        .all(|entry| entry.trigger == EscalationTrigger::Automatic));
}

#[test]
fn blue_collar_skips_general_manager_unless_configured_otherwise() {
    let store = store_with(&[("emp-b", EmployeeClass::BlueCollar)]);
    let short_chain = service(&store, EscalationPolicy::default());
    let request = short_chain
        .submit(submission("emp-b"), filed_at())
        .expect("submitted");

    for day in 1..=3 {
        short_chain
            .engine()
            .process_pending_escalations(hours_later(24 * day))
            .expect("sweep runs");
    }
    let history = short_chain
        .engine()
        .escalation_history(&request.id)
        .expect("history");
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].from_stage, ApprovalStage::Hr);
    assert_eq!(history[2].to_stage, ApprovalStage::Payroll);

    let long_chain = EscalationPolicy {
        threshold: Duration::hours(24),
        table: TransitionTable::with_blue_gray_skip_general_manager(false),
    };
    assert_eq!(
        long_chain
            .table
            .next_stage(ApprovalStage::Hr, EmployeeClass::BlueCollar)
            .expect("hr routes onward"),
        ApprovalStage::GeneralManager
    );
}

#[test]
fn human_approval_resets_the_idle_clock() {
    let store = store_with(&[("emp-g", EmployeeClass::GrayCollar)]);
    let approvals = service(&store, EscalationPolicy::default());
    let request = approvals
        .submit(submission("emp-g"), filed_at())
        .expect("submitted");

    let signed = approvals
        .approve(&request.id, ApproverRole::Supervisor, hours_later(20))
        .expect("supervisor signs");
    assert_eq!(signed.current_approval_stage, ApprovalStage::Manager);

    let report = approvals
        .engine()
        .process_pending_escalations(hours_later(30))
        .expect("sweep runs");
    assert_eq!(report.fresh, 1);
    assert!(report.escalated.is_empty());

    let wrong_desk = approvals
        .approve(&request.id, ApproverRole::HrWhite, hours_later(31))
        .expect_err("hr is not the manager");
    assert!(wrong_desk.to_string().contains("manager"));

    approvals
        .approve(&request.id, ApproverRole::Manager, hours_later(31))
        .expect("manager signs");
    approvals
        .approve(&request.id, ApproverRole::HrBlueGray, hours_later(32))
        .expect("hr signs");
    let done = approvals
        .approve(&request.id, ApproverRole::Payroll, hours_later(33))
        .expect("payroll signs");
    assert_eq!(done.current_approval_stage, ApprovalStage::Completed);
    assert_eq!(done.status, RequestStatus::Approved);

    let later = approvals
        .engine()
        .process_pending_escalations(hours_later(200))
        .expect("sweep runs");
    assert_eq!(later.scanned, 0);
}

#[test]
fn rejected_requests_leave_the_sweep() {
    let store = store_with(&[("emp-w", EmployeeClass::WhiteCollar)]);
    let approvals = service(&store, EscalationPolicy::default());
    let request = approvals
        .submit(submission("emp-w"), filed_at())
        .expect("submitted");

    let rejected = approvals
        .reject(&request.id, ApproverRole::Supervisor, hours_later(2))
        .expect("supervisor rejects");
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.current_approval_stage, ApprovalStage::Rejected);

    let report = approvals
        .engine()
        .process_pending_escalations(hours_later(72))
        .expect("sweep runs");
    assert_eq!(report.scanned, 0);
    assert!(approvals
        .engine()
        .escalate_request(&request.id, hours_later(73))
        .is_err());
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn router_submits_escalates_and_reports_history() {
    let store = store_with(&[("emp-w", EmployeeClass::WhiteCollar)]);
    let router = approvals_router(Arc::new(service(&store, EscalationPolicy::default())));

    let created = router
        .clone()
        .oneshot(
            Request::post("/api/v1/absence-requests")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "employee_id": "emp-w",
                        "request_type": "vacation",
                        "start_date": "2025-06-16",
                        "end_date": "2025-06-17",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = json_body(created).await;
    assert_eq!(body["stage"], "pending_supervisor");
    assert_eq!(body["total_days"], 2);
    let request_id = body["request_id"].as_str().expect("id").to_string();

    let escalated = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/absence-requests/{request_id}/escalate"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(escalated.status(), StatusCode::OK);
    let entry = json_body(escalated).await;
    assert_eq!(entry["to_stage"], "pending_manager");
    assert_eq!(entry["trigger"], "manual");

    let history = router
        .oneshot(
            Request::get(format!("/api/v1/absence-requests/{request_id}/escalations"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    let entries = json_body(history).await;
    assert_eq!(entries.as_array().map(Vec::len), Some(1));
    assert_eq!(entries[0]["from_stage"], "pending_supervisor");
}
