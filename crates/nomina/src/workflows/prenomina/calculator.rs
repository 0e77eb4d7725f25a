use rust_decimal::Decimal;

use super::classifier::{accumulate, classify};
use super::domain::{
    checked_sum, Incidence, MetricOverflow, MonetaryMetrics, PayrollPeriod, WorkMetrics,
};
use super::rates::{round_money, PayrollRates, MONEY_CEILING};
use crate::workflows::employees::Employee;

const HOURS_PER_SHIFT: u32 = 8;
const MINUTES_PER_HOUR: u32 = 60;
const TRIPLE_OVERTIME_FACTOR: u32 = 3;

/// Figures produced for one (employee, period) before they are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricComputation {
    pub work: WorkMetrics,
    pub pay: MonetaryMetrics,
    /// Incidences in approved or processed status that fed the figures.
    pub counted: usize,
    pub ignored: usize,
}

/// Pure transformation from incidences to work and pay figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricCalculator {
    rates: PayrollRates,
}

impl MetricCalculator {
    pub fn new(rates: PayrollRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &PayrollRates {
        &self.rates
    }

    /// Fails with [`MetricOverflow`] when a figure leaves the decimal range or a money
    /// figure passes [`MONEY_CEILING`].
    pub fn compute(
        &self,
        employee: &Employee,
        period: &PayrollPeriod,
        incidences: &[Incidence],
    ) -> Result<MetricComputation, MetricOverflow> {
        let mut work = WorkMetrics::default();
        let mut pay = MonetaryMetrics::default();
        let mut counted = 0;
        let mut ignored = 0;

        for incidence in incidences {
            if !incidence.counts_toward_payroll() {
                ignored += 1;
                continue;
            }
            let bucket = classify(incidence.category, incidence.effect, incidence.method);
            accumulate(bucket, incidence, &mut work, &mut pay)?;
            counted += 1;
        }

        let shift = Decimal::from(HOURS_PER_SHIFT);
        if work.worked_days.is_zero() {
            let away = checked_sum(
                "worked_days",
                [
                    work.absence_days,
                    work.sick_days,
                    work.vacation_days,
                    work.unpaid_leave_days,
                ],
            )?;
            work.worked_days = Decimal::from(period.calendar_days())
                .checked_sub(away)
                .ok_or(MetricOverflow::new("worked_days"))?
                .max(Decimal::ZERO);
        }
        if work.regular_hours.is_zero() {
            work.regular_hours = work
                .worked_days
                .checked_mul(shift)
                .ok_or(MetricOverflow::new("regular_hours"))?;
        }

        let hourly = employee.daily_salary / shift;
        let hundred = Decimal::ONE_HUNDRED;
        pay.regular_salary = priced(
            "regular_salary",
            &[work.regular_hours, hourly],
            Decimal::ONE,
        )?;
        pay.overtime_amount = priced(
            "overtime_amount",
            &[work.overtime_hours, hourly, self.rates.overtime_rate_pct],
            hundred,
        )?;
        pay.double_overtime_amount = priced(
            "double_overtime_amount",
            &[
                work.double_overtime_hours,
                hourly,
                self.rates.double_overtime_rate_pct,
            ],
            hundred,
        )?;
        pay.triple_overtime_amount = priced(
            "triple_overtime_amount",
            &[
                work.triple_overtime_hours,
                hourly,
                Decimal::from(TRIPLE_OVERTIME_FACTOR),
            ],
            Decimal::ONE,
        )?;
        pay.delay_deduction = priced(
            "delay_deduction",
            &[work.delay_minutes, hourly],
            Decimal::from(MINUTES_PER_HOUR),
        )?;

        for (field, value) in [
            ("bonus_amount", &mut pay.bonus_amount),
            ("commission_amount", &mut pay.commission_amount),
            ("other_extra_amount", &mut pay.other_extra_amount),
            ("loan_deduction", &mut pay.loan_deduction),
            ("advance_deduction", &mut pay.advance_deduction),
            ("other_deduction", &mut pay.other_deduction),
        ] {
            *value = priced(field, &[*value], Decimal::ONE)?;
        }
        pay.recompute_totals()?;

        Ok(MetricComputation {
            work,
            pay,
            counted,
            ignored,
        })
    }
}

/// Multiplies the factors, divides by `divisor` and rounds to cents. The result must stay
/// within [`MONEY_CEILING`].
fn priced(
    field: &'static str,
    factors: &[Decimal],
    divisor: Decimal,
) -> Result<Decimal, MetricOverflow> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, factor| acc.checked_mul(*factor))
        .and_then(|value| value.checked_div(divisor))
        .map(round_money)
        .filter(|value| value.abs() <= MONEY_CEILING)
        .ok_or(MetricOverflow::new(field))
}
