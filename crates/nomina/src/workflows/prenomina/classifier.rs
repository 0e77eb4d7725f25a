use rust_decimal::Decimal;

use super::domain::{
    CalculationMethod, EffectType, Incidence, IncidenceCategory, MetricOverflow, MonetaryMetrics,
    WorkMetrics,
};

/// Metric field an incidence feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricBucket {
    WorkedDays,
    AbsenceDays,
    SickDays,
    VacationDays,
    UnpaidLeaveDays,
    OvertimeHours,
    DoubleOvertimeHours,
    TripleOvertimeHours,
    Delay,
    EarlyDeparture,
    Bonus,
    Commission,
    OtherExtra,
    LoanDeduction,
    AdvanceDeduction,
    OtherDeduction,
    /// Recorded for audit only, e.g. a justified absence.
    NoEffect,
}

pub fn classify(
    category: IncidenceCategory,
    effect: EffectType,
    method: CalculationMethod,
) -> MetricBucket {
    match category {
        IncidenceCategory::Absence => match effect {
            EffectType::Negative => MetricBucket::AbsenceDays,
            EffectType::Positive => MetricBucket::NoEffect,
        },
        IncidenceCategory::Sick => MetricBucket::SickDays,
        IncidenceCategory::Vacation => MetricBucket::VacationDays,
        IncidenceCategory::UnpaidLeave => MetricBucket::UnpaidLeaveDays,
        IncidenceCategory::Attendance => MetricBucket::WorkedDays,
        IncidenceCategory::Overtime => match method {
            CalculationMethod::HourlyDouble => MetricBucket::DoubleOvertimeHours,
            CalculationMethod::HourlyTriple => MetricBucket::TripleOvertimeHours,
            CalculationMethod::Hourly
            | CalculationMethod::Fixed
            | CalculationMethod::Daily
            | CalculationMethod::Percentage => MetricBucket::OvertimeHours,
        },
        IncidenceCategory::Delay => MetricBucket::Delay,
        IncidenceCategory::EarlyDeparture => MetricBucket::EarlyDeparture,
        IncidenceCategory::Bonus => MetricBucket::Bonus,
        IncidenceCategory::Commission => MetricBucket::Commission,
        IncidenceCategory::OtherIncome => MetricBucket::OtherExtra,
        IncidenceCategory::Deduction => MetricBucket::OtherDeduction,
        IncidenceCategory::Loan => MetricBucket::LoanDeduction,
        IncidenceCategory::Advance => MetricBucket::AdvanceDeduction,
    }
}

/// Adds one incidence to the running metric. Day and hour buckets take the quantity,
/// money buckets take the amount, counters take one occurrence.
pub fn accumulate(
    bucket: MetricBucket,
    incidence: &Incidence,
    work: &mut WorkMetrics,
    pay: &mut MonetaryMetrics,
) -> Result<(), MetricOverflow> {
    let quantity = incidence.quantity;
    let amount = incidence.amount;
    match bucket {
        MetricBucket::WorkedDays => add(&mut work.worked_days, quantity, "worked_days"),
        MetricBucket::AbsenceDays => add(&mut work.absence_days, quantity, "absence_days"),
        MetricBucket::SickDays => add(&mut work.sick_days, quantity, "sick_days"),
        MetricBucket::VacationDays => add(&mut work.vacation_days, quantity, "vacation_days"),
        MetricBucket::UnpaidLeaveDays => {
            add(&mut work.unpaid_leave_days, quantity, "unpaid_leave_days")
        }
        MetricBucket::OvertimeHours => add(&mut work.overtime_hours, quantity, "overtime_hours"),
        MetricBucket::DoubleOvertimeHours => add(
            &mut work.double_overtime_hours,
            quantity,
            "double_overtime_hours",
        ),
        MetricBucket::TripleOvertimeHours => add(
            &mut work.triple_overtime_hours,
            quantity,
            "triple_overtime_hours",
        ),
        MetricBucket::Delay => {
            work.delay_count = work.delay_count.saturating_add(1);
            add(&mut work.delay_minutes, quantity, "delay_minutes")
        }
        MetricBucket::EarlyDeparture => {
            work.early_departure_count = work.early_departure_count.saturating_add(1);
            Ok(())
        }
        MetricBucket::Bonus => add(&mut pay.bonus_amount, amount, "bonus_amount"),
        MetricBucket::Commission => add(&mut pay.commission_amount, amount, "commission_amount"),
        MetricBucket::OtherExtra => add(&mut pay.other_extra_amount, amount, "other_extra_amount"),
        MetricBucket::LoanDeduction => add(&mut pay.loan_deduction, amount, "loan_deduction"),
        MetricBucket::AdvanceDeduction => {
            add(&mut pay.advance_deduction, amount, "advance_deduction")
        }
        MetricBucket::OtherDeduction => add(&mut pay.other_deduction, amount, "other_deduction"),
        MetricBucket::NoEffect => Ok(()),
    }
}

fn add(target: &mut Decimal, value: Decimal, field: &'static str) -> Result<(), MetricOverflow> {
    *target = target
        .checked_add(value)
        .ok_or(MetricOverflow::new(field))?;
    Ok(())
}
