use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::domain::MetricOverflow;

/// Largest magnitude any single money figure of a metric may reach.
pub const MONEY_CEILING: Decimal = dec!(1000000000000);

/// Statutory and contractual rates applied by the metric calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRates {
    /// Percent of the hourly rate paid per overtime hour.
    pub overtime_rate_pct: Decimal,
    pub double_overtime_rate_pct: Decimal,
    /// Year-end bonus days.
    pub aguinaldo_days: Decimal,
    pub vacation_days: Decimal,
    pub vacation_premium_pct: Decimal,
}

impl Default for PayrollRates {
    fn default() -> Self {
        Self {
            overtime_rate_pct: dec!(150),
            double_overtime_rate_pct: dec!(200),
            aguinaldo_days: dec!(15),
            vacation_days: dec!(12),
            vacation_premium_pct: dec!(25),
        }
    }
}

impl PayrollRates {
    /// `1 + (aguinaldo + vacation days x premium) / 365`, or `None` when the configured
    /// rates do not fit a decimal.
    pub fn integration_factor(&self) -> Option<Decimal> {
        let premium_days = self
            .vacation_days
            .checked_mul(self.vacation_premium_pct)?
            .checked_div(Decimal::ONE_HUNDRED)?;
        let share = self
            .aguinaldo_days
            .checked_add(premium_days)?
            .checked_div(dec!(365))?;
        Decimal::ONE.checked_add(share)
    }

    /// Integrated daily salary (SDI) for a base daily salary, rounded to cents.
    pub fn integrated_daily_salary(
        &self,
        daily_salary: Decimal,
    ) -> Result<Decimal, MetricOverflow> {
        self.integration_factor()
            .and_then(|factor| daily_salary.checked_mul(factor))
            .map(round_money)
            .filter(|salary| salary.abs() <= MONEY_CEILING)
            .ok_or(MetricOverflow::new("integrated_daily_salary"))
    }
}

/// Rounds to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
