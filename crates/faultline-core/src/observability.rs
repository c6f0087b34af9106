//! Run summaries.
//!
//! This module is architecture-agnostic: it only describes what an
//! interpreter run did, in a shape that can be logged or serialized.

use serde::{Deserialize, Serialize};

use crate::app::Exit;
use crate::app::interpreter::Counts;
use crate::domain::{FailureSet, TypedResult};

/// How a run ended.
///
/// Serialized as SCREAMING_SNAKE_CASE: SUCCESS / FAILURE / DEFECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
    Defect,
}

/// Summary of a single interpreter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: OutcomeKind,

    /// Steps and recovery stages chained in the effect.
    pub stages: usize,

    pub steps_run: usize,

    /// Steps that never ran because of a failure or defect before them.
    pub steps_skipped: usize,

    pub recoveries_applied: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,
}

impl RunReport {
    pub(crate) fn new<V, F: FailureSet>(exit: &Exit<V, F>, counts: Counts) -> Self {
        let (outcome, failure_tag, defect) = match exit {
            Ok(TypedResult::Success(_)) => (OutcomeKind::Success, None, None),
            Ok(TypedResult::Failure(failure)) => {
                (OutcomeKind::Failure, Some(failure.tag().to_string()), None)
            }
            Err(defect) => (OutcomeKind::Defect, None, Some(defect.to_string())),
        };
        Self {
            outcome,
            stages: counts.stages,
            steps_run: counts.steps_run,
            steps_skipped: counts.steps - counts.steps_run,
            recoveries_applied: counts.recoveries_applied,
            failure_tag,
            defect,
        }
    }
}
