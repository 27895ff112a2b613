use miette::Diagnostic;

use crate::execution::ExecutionError;
use crate::model::transfer::TransferError;
use crate::plan::PlanError;
use crate::templating::TemplateError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(Box<TemplateError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plan(Box<PlanError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transfer(Box<TransferError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Execution(Box<ExecutionError>),
}

impl From<TemplateError> for Error {
    fn from(error: TemplateError) -> Self {
        Error::Template(Box::new(error))
    }
}

impl From<PlanError> for Error {
    fn from(error: PlanError) -> Self {
        Error::Plan(Box::new(error))
    }
}

impl From<TransferError> for Error {
    fn from(error: TransferError) -> Self {
        Error::Transfer(Box::new(error))
    }
}

impl From<ExecutionError> for Error {
    fn from(error: ExecutionError) -> Self {
        Error::Execution(Box::new(error))
    }
}
