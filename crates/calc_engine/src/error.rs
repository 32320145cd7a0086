use thiserror::Error;

use crate::budget::BudgetExceeded;

#[derive(Error, Debug, Clone)]
pub enum CasError {
    #[error("{0}")]
    BudgetExceeded(#[from] BudgetExceeded),
}
