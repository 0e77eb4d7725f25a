use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::employees::EmployeeId;
use crate::workflows::{normalize_token, UnknownToken};

/// Identifier wrapper for absence requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsenceRequestId(pub String);

impl fmt::Display for AbsenceRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    Vacation,
    SickLeave,
    Personal,
    Maternity,
    Paternity,
    Bereavement,
    Unpaid,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of a request in the approval chain.
///
/// `Completed` and `Rejected` are terminal markers; every other stage names the
/// approver desk the request is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStage {
    #[serde(rename = "pending_supervisor")]
    Supervisor,
    #[serde(rename = "pending_manager")]
    Manager,
    #[serde(rename = "pending_hr")]
    Hr,
    #[serde(rename = "pending_gm")]
    GeneralManager,
    #[serde(rename = "pending_payroll")]
    Payroll,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "rejected")]
    Rejected,
}

impl ApprovalStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Supervisor,
            Self::Manager,
            Self::Hr,
            Self::GeneralManager,
            Self::Payroll,
            Self::Completed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Supervisor => "pending_supervisor",
            Self::Manager => "pending_manager",
            Self::Hr => "pending_hr",
            Self::GeneralManager => "pending_gm",
            Self::Payroll => "pending_payroll",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApprovalStage {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "pending_supervisor" | "supervisor" => Ok(Self::Supervisor),
            "pending_manager" | "manager" => Ok(Self::Manager),
            "pending_hr" | "hr" => Ok(Self::Hr),
            "pending_gm" | "gm" | "general_manager" => Ok(Self::GeneralManager),
            "pending_payroll" | "payroll" => Ok(Self::Payroll),
            "completed" => Ok(Self::Completed),
            "rejected" | "declined" => Ok(Self::Rejected),
            _ => Err(UnknownToken::new("approval stage", value)),
        }
    }
}

/// Role allowed to act on a pending stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Supervisor,
    Manager,
    HrBlueGray,
    HrWhite,
    Gm,
    Payroll,
}

impl ApproverRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::Manager => "manager",
            Self::HrBlueGray => "hr_blue_gray",
            Self::HrWhite => "hr_white",
            Self::Gm => "gm",
            Self::Payroll => "payroll",
        }
    }
}

impl fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApproverRole {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "supervisor" => Ok(Self::Supervisor),
            "manager" => Ok(Self::Manager),
            "hr_blue_gray" => Ok(Self::HrBlueGray),
            "hr_white" => Ok(Self::HrWhite),
            "gm" => Ok(Self::Gm),
            "payroll" => Ok(Self::Payroll),
            _ => Err(UnknownToken::new("approver role", value)),
        }
    }
}

/// Payload accepted when an employee files a new absence request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceSubmission {
    pub employee_id: EmployeeId,
    pub request_type: AbsenceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRequest {
    pub id: AbsenceRequestId,
    pub employee_id: EmployeeId,
    pub request_type: AbsenceType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub reason: String,
    pub status: RequestStatus,
    pub current_approval_stage: ApprovalStage,
    pub escalation_count: u32,
    pub is_escalated: bool,
    pub last_action_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every write; writers must present the value they read.
    pub version: u64,
}

impl AbsenceRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    Automatic,
    Manual,
}

/// Append-only audit entry for one stage transition caused by escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationLogEntry {
    /// Assigned by the store on append.
    pub sequence: u64,
    pub request_id: AbsenceRequestId,
    pub from_stage: ApprovalStage,
    pub to_stage: ApprovalStage,
    pub trigger: EscalationTrigger,
    pub previous_action_at: DateTime<Utc>,
    pub escalated_at: DateTime<Utc>,
}
