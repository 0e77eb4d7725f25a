//! Incidence CSV import.
//!
//! Reads the header-driven export produced by time clocks and HR desks
//! (`employee_id, period_id, category, effect, method, quantity, amount, status`,
//! plus an optional `id`) into typed incidences ready for the store.

mod mapping;
mod parser;

use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::workflows::employees::EmployeeId;
use crate::workflows::prenomina::{
    CalculationMethod, EffectType, Incidence, IncidenceId, IncidenceStatus, PeriodId,
    MONEY_CEILING,
};
use parser::IncidenceRow;

/// Largest day, hour or minute count a single incidence may carry.
pub const MAX_QUANTITY: Decimal = dec!(100000);

#[derive(Debug)]
pub enum IncidenceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for IncidenceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidenceImportError::Io(err) => write!(f, "failed to read incidence export: {}", err),
            IncidenceImportError::Csv(err) => write!(f, "invalid incidence CSV data: {}", err),
            IncidenceImportError::InvalidRow { line, reason } => {
                write!(f, "incidence on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for IncidenceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IncidenceImportError::Io(err) => Some(err),
            IncidenceImportError::Csv(err) => Some(err),
            IncidenceImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for IncidenceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IncidenceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct IncidenceImporter;

impl IncidenceImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Incidence>, IncidenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses every row or fails on the first invalid one; nothing is partially returned.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Incidence>, IncidenceImportError> {
        parser::parse_rows(reader)?
            .into_iter()
            .map(to_incidence)
            .collect()
    }
}

fn to_incidence(row: IncidenceRow) -> Result<Incidence, IncidenceImportError> {
    let line = row.line;
    let invalid = |reason: String| IncidenceImportError::InvalidRow { line, reason };

    let category = mapping::category_for(&row.category)
        .ok_or_else(|| invalid(format!("unrecognized incidence category '{}'", row.category)))?;
    let effect = row
        .effect
        .parse::<EffectType>()
        .map_err(|err| invalid(err.to_string()))?;
    let method = match row.method.as_deref() {
        Some(value) => value
            .parse::<CalculationMethod>()
            .map_err(|err| invalid(err.to_string()))?,
        None => CalculationMethod::Fixed,
    };
    let status = row
        .status
        .parse::<IncidenceStatus>()
        .map_err(|err| invalid(err.to_string()))?;
    let quantity = parse_decimal("quantity", row.quantity.as_deref())
        .and_then(|value| within("quantity", value, MAX_QUANTITY))
        .map_err(invalid)?;
    let amount = parse_decimal("amount", row.amount.as_deref())
        .and_then(|value| within("amount", value, MONEY_CEILING))
        .map_err(invalid)?;

    let id = row
        .id
        .unwrap_or_else(|| format!("{}-{}-{}", row.period_id, row.employee_id, line));

    Ok(Incidence {
        id: IncidenceId(id),
        employee_id: EmployeeId(row.employee_id),
        period_id: PeriodId(row.period_id),
        category,
        effect,
        method,
        quantity,
        amount,
        status,
    })
}

fn parse_decimal(field: &str, value: Option<&str>) -> Result<Decimal, String> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(raw) => raw
            .replace(',', "")
            .parse::<Decimal>()
            .map_err(|_| format!("{field} '{raw}' is not a number")),
    }
}

/// The effect column carries the sign, so figures are never negative.
fn within(field: &str, value: Decimal, ceiling: Decimal) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(format!("{field} {value} must not be negative"))
    } else if value > ceiling {
        Err(format!("{field} {value} exceeds {ceiling}"))
    } else {
        Ok(value)
    }
}
