use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{normalize_token, UnknownToken};
use crate::store::RepositoryError;

/// Identifier wrapper for employees owned by the HR directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collar classification. Drives HR routing in the approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeClass {
    WhiteCollar,
    BlueCollar,
    GrayCollar,
}

impl EmployeeClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::WhiteCollar => "white_collar",
            Self::BlueCollar => "blue_collar",
            Self::GrayCollar => "gray_collar",
        }
    }

    /// Blue and gray collar staff share the operational HR desk.
    pub const fn is_operational(self) -> bool {
        matches!(self, Self::BlueCollar | Self::GrayCollar)
    }
}

impl fmt::Display for EmployeeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmployeeClass {
    type Err = UnknownToken;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_token(value).as_str() {
            "white_collar" => Ok(Self::WhiteCollar),
            "blue_collar" => Ok(Self::BlueCollar),
            "gray_collar" | "grey_collar" => Ok(Self::GrayCollar),
            _ => Err(UnknownToken::new("employee class", value)),
        }
    }
}

/// The slice of an employee record the payroll core reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub class: EmployeeClass,
    pub daily_salary: Decimal,
    pub integrated_daily_salary: Decimal,
    pub active: bool,
}

/// Directory lookups consumed by both workflows.
pub trait EmployeeRepository: Send + Sync {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    /// Active employees ordered by id.
    fn active(&self) -> Result<Vec<Employee>, RepositoryError>;
    fn update_integrated_salary(
        &self,
        id: &EmployeeId,
        integrated_daily_salary: Decimal,
    ) -> Result<(), RepositoryError>;
}
