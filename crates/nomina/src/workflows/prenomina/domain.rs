use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflows::employees::EmployeeId;
use crate::workflows::{normalize_token, UnknownToken};

/// Identifier wrapper for payroll periods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodId(pub String);

impl PeriodId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Open,
    Calculated,
    Closed,
    Paid,
}

impl PeriodStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Calculated => "calculated",
            Self::Closed => "closed",
            Self::Paid => "paid",
        }
    }

    pub const fn accepts_calculation(self) -> bool {
        matches!(self, Self::Open | Self::Calculated)
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    pub id: PeriodId,
    /// Human code printed on payroll reports, e.g. `2025-Q03`.
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
}

impl PayrollPeriod {
    /// Inclusive day count. A period whose end precedes its start has zero days.
    pub fn calendar_days(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days() + 1;
        u32::try_from(days).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IncidenceId(pub String);

impl fmt::Display for IncidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidenceCategory {
    Absence,
    Sick,
    Vacation,
    UnpaidLeave,
    Attendance,
    Overtime,
    Delay,
    EarlyDeparture,
    Bonus,
    Commission,
    OtherIncome,
    Deduction,
    Loan,
    Advance,
}

impl IncidenceCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Absence => "absence",
            Self::Sick => "sick",
            Self::Vacation => "vacation",
            Self::UnpaidLeave => "unpaid_leave",
            Self::Attendance => "attendance",
            Self::Overtime => "overtime",
            Self::Delay => "delay",
            Self::EarlyDeparture => "early_departure",
            Self::Bonus => "bonus",
            Self::Commission => "commission",
            Self::OtherIncome => "other_income",
            Self::Deduction => "deduction",
            Self::Loan => "loan",
            Self::Advance => "advance",
        }
    }
}

impl FromStr for IncidenceCategory {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "absence" => Ok(Self::Absence),
            "sick" | "sick_leave" => Ok(Self::Sick),
            "vacation" => Ok(Self::Vacation),
            "unpaid_leave" => Ok(Self::UnpaidLeave),
            "attendance" => Ok(Self::Attendance),
            "overtime" => Ok(Self::Overtime),
            "delay" | "tardiness" => Ok(Self::Delay),
            "early_departure" => Ok(Self::EarlyDeparture),
            "bonus" => Ok(Self::Bonus),
            "commission" => Ok(Self::Commission),
            "other_income" => Ok(Self::OtherIncome),
            "deduction" => Ok(Self::Deduction),
            "loan" => Ok(Self::Loan),
            "advance" => Ok(Self::Advance),
            _ => Err(UnknownToken::new("incidence category", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Positive,
    Negative,
}

impl FromStr for EffectType {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            _ => Err(UnknownToken::new("effect type", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Fixed,
    Daily,
    Hourly,
    HourlyDouble,
    HourlyTriple,
    Percentage,
}

impl FromStr for CalculationMethod {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "fixed" => Ok(Self::Fixed),
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "hourly_double" | "double" => Ok(Self::HourlyDouble),
            "hourly_triple" | "triple" => Ok(Self::HourlyTriple),
            "percentage" | "percent" => Ok(Self::Percentage),
            _ => Err(UnknownToken::new("calculation method", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidenceStatus {
    Pending,
    Approved,
    Processed,
    Rejected,
    Cancelled,
}

impl FromStr for IncidenceStatus {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "processed" => Ok(Self::Processed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownToken::new("incidence status", value)),
        }
    }
}

/// A recorded event that affects pay for one employee in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incidence {
    pub id: IncidenceId,
    pub employee_id: EmployeeId,
    pub period_id: PeriodId,
    pub category: IncidenceCategory,
    pub effect: EffectType,
    pub method: CalculationMethod,
    /// Days, hours, minutes or occurrences depending on the category.
    pub quantity: Decimal,
    pub amount: Decimal,
    pub status: IncidenceStatus,
}

impl Incidence {
    pub fn counts_toward_payroll(&self) -> bool {
        matches!(
            self.status,
            IncidenceStatus::Approved | IncidenceStatus::Processed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Calculated,
    Approved,
}

impl MetricStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Calculated => "calculated",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time and attendance side of a prenomina metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkMetrics {
    pub worked_days: Decimal,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub double_overtime_hours: Decimal,
    pub triple_overtime_hours: Decimal,
    pub absence_days: Decimal,
    pub sick_days: Decimal,
    pub vacation_days: Decimal,
    pub unpaid_leave_days: Decimal,
    pub delay_count: u32,
    pub delay_minutes: Decimal,
    pub early_departure_count: u32,
}

/// Money side of a prenomina metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryMetrics {
    pub regular_salary: Decimal,
    pub overtime_amount: Decimal,
    pub double_overtime_amount: Decimal,
    pub triple_overtime_amount: Decimal,
    pub delay_deduction: Decimal,
    pub bonus_amount: Decimal,
    pub commission_amount: Decimal,
    pub other_extra_amount: Decimal,
    pub loan_deduction: Decimal,
    pub advance_deduction: Decimal,
    pub other_deduction: Decimal,
    pub total_extras: Decimal,
    pub total_deductions: Decimal,
    pub gross_income: Decimal,
    pub net_income: Decimal,
}

impl MonetaryMetrics {
    /// Recomputes the four totals from their components.
    pub fn recompute_totals(&mut self) -> Result<(), MetricOverflow> {
        self.total_extras = checked_sum(
            "total_extras",
            [
                self.overtime_amount,
                self.double_overtime_amount,
                self.triple_overtime_amount,
                self.bonus_amount,
                self.commission_amount,
                self.other_extra_amount,
            ],
        )?;
        self.total_deductions = checked_sum(
            "total_deductions",
            [
                self.delay_deduction,
                self.loan_deduction,
                self.advance_deduction,
                self.other_deduction,
            ],
        )?;
        self.gross_income = checked_sum("gross_income", [self.regular_salary, self.total_extras])?;
        self.net_income = self
            .gross_income
            .checked_sub(self.total_deductions)
            .ok_or(MetricOverflow::new("net_income"))?;
        Ok(())
    }
}

/// A metric figure left the range payroll can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{field} is out of range")]
pub struct MetricOverflow {
    pub field: &'static str,
}

impl MetricOverflow {
    pub const fn new(field: &'static str) -> Self {
        Self { field }
    }
}

pub(crate) fn checked_sum(
    field: &'static str,
    values: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, MetricOverflow> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .ok_or(MetricOverflow::new(field))
}

/// Aggregate per (employee, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrenominaMetric {
    pub employee_id: EmployeeId,
    pub period_id: PeriodId,
    pub period_code: String,
    pub work: WorkMetrics,
    pub pay: MonetaryMetrics,
    pub calculation_status: MetricStatus,
    pub calculated_at: DateTime<Utc>,
    pub calculated_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Bumped by the store on every write.
    pub revision: u64,
}

impl PrenominaMetric {
    pub fn is_approved(&self) -> bool {
        self.calculation_status == MetricStatus::Approved
    }
}
