use thiserror::Error;

use crate::domain::Defect;
use crate::typed::RegistryError;

/// Crate-level error for callers that collapse an exit into a plain
/// `Result` (see [`settle`](crate::app::settle)).
#[derive(Debug, Error)]
pub enum FaultlineError {
    #[error("unrecovered failure: tag={tag}")]
    Unrecovered { tag: &'static str },

    #[error("defect: {0}")]
    Defect(#[from] Defect),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
