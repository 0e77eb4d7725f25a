use super::domain::{ApprovalStage, ApproverRole};
use crate::workflows::employees::EmployeeClass;
use crate::workflows::UnknownToken;

/// Failures raised by the routing table. None of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("rejected requests cannot be escalated")]
    RejectedRequest,
    #[error("request at stage {0} cannot advance further")]
    TerminalStage(ApprovalStage),
    #[error("stage {0} has no required approver")]
    NoApprover(ApprovalStage),
    #[error(transparent)]
    InvalidToken(#[from] UnknownToken),
}

/// Pure routing policy for the absence approval chain.
///
/// White collar requests pass through the general manager after HR. Blue and gray
/// collar requests go from HR straight to payroll unless
/// `blue_gray_skip_general_manager` is switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTable {
    blue_gray_skip_general_manager: bool,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransitionTable {
    pub const fn standard() -> Self {
        Self {
            blue_gray_skip_general_manager: true,
        }
    }

    pub const fn with_blue_gray_skip_general_manager(skip: bool) -> Self {
        Self {
            blue_gray_skip_general_manager: skip,
        }
    }

    pub const fn blue_gray_skips_general_manager(&self) -> bool {
        self.blue_gray_skip_general_manager
    }

    pub fn next_stage(
        &self,
        stage: ApprovalStage,
        class: EmployeeClass,
    ) -> Result<ApprovalStage, RoutingError> {
        match stage {
            ApprovalStage::Rejected => Err(RoutingError::RejectedRequest),
            ApprovalStage::Completed => Err(RoutingError::TerminalStage(stage)),
            ApprovalStage::Supervisor => Ok(ApprovalStage::Manager),
            ApprovalStage::Manager => Ok(ApprovalStage::Hr),
            ApprovalStage::Hr if class.is_operational() && self.blue_gray_skip_general_manager => {
                Ok(ApprovalStage::Payroll)
            }
            ApprovalStage::Hr => Ok(ApprovalStage::GeneralManager),
            ApprovalStage::GeneralManager => Ok(ApprovalStage::Payroll),
            ApprovalStage::Payroll => Ok(ApprovalStage::Completed),
        }
    }

    pub fn required_approver(
        &self,
        stage: ApprovalStage,
        class: EmployeeClass,
    ) -> Result<ApproverRole, RoutingError> {
        match stage {
            ApprovalStage::Supervisor => Ok(ApproverRole::Supervisor),
            ApprovalStage::Manager => Ok(ApproverRole::Manager),
            ApprovalStage::Hr if class.is_operational() => Ok(ApproverRole::HrBlueGray),
            ApprovalStage::Hr => Ok(ApproverRole::HrWhite),
            ApprovalStage::GeneralManager => Ok(ApproverRole::Gm),
            ApprovalStage::Payroll => Ok(ApproverRole::Payroll),
            ApprovalStage::Completed | ApprovalStage::Rejected => {
                Err(RoutingError::NoApprover(stage))
            }
        }
    }

    /// Label-based variant of [`Self::next_stage`] for callers holding raw tokens.
    pub fn next_stage_for(&self, stage: &str, class: &str) -> Result<ApprovalStage, RoutingError> {
        let (stage, class) = parse_pair(stage, class)?;
        self.next_stage(stage, class)
    }

    /// Label-based variant of [`Self::required_approver`] for callers holding raw tokens.
    pub fn required_approver_for(
        &self,
        stage: &str,
        class: &str,
    ) -> Result<ApproverRole, RoutingError> {
        let (stage, class) = parse_pair(stage, class)?;
        self.required_approver(stage, class)
    }

    /// Full chain of pending stages a request walks for the given class, ending at `Completed`.
    pub fn chain(&self, class: EmployeeClass) -> Vec<ApprovalStage> {
        let mut stages = vec![ApprovalStage::Supervisor];
        let mut current = ApprovalStage::Supervisor;
        while let Ok(next) = self.next_stage(current, class) {
            stages.push(next);
            current = next;
        }
        stages
    }
}

fn parse_pair(stage: &str, class: &str) -> Result<(ApprovalStage, EmployeeClass), RoutingError> {
    Ok((stage.parse()?, class.parse()?))
}
