//! Interpreter - Effect のステージ列を順番に実行するループ
//!
//! # 二層構造
//! - **表層（Typed）**: `Effect<V, F>` - ステージ間の型はコンパイラが保証
//! - **内部（Dyn）**: `Stage` - 値と失敗は `Box<dyn Any>` に型消去して `Vec` に並べる
//!
//! # 実行ルール
//! - 現在の状態 (`Cursor`) は常に 1 つ
//! - 成功なら次の step を実行、失敗なら後続の step は一切実行しない
//! - 失敗を受け取れるのは recovery stage だけ。残っていなければその場で終了
//! - defect が起きたら何も実行せずに終了

use std::any::{Any, type_name};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::config::RunConfig;
use crate::domain::{Defect, FailureSet, TypedResult};
use crate::error::FaultlineError;

/// Terminal result of an interpreter run.
///
/// The `Err` arm is the defect channel. It is structurally separate from
/// the typed failures in `TypedResult`, so it can never be matched by tag.
pub type Exit<V, F> = Result<TypedResult<V, F>, Defect>;

pub(crate) type Erased = Box<dyn Any>;

/// Converts an erased failure, identified by the stage that produced it,
/// into the declared failure union.
pub(crate) type Widen<F> = Box<dyn FnOnce(usize, Erased) -> Result<F, Defect>>;

pub(crate) type StepFn = Box<dyn FnOnce(Erased, &RunConfig) -> StageOutput>;
pub(crate) type RecoverFn = Box<dyn FnOnce(usize, Erased) -> StageOutput>;

pub(crate) enum StageOutput {
    Value(Erased),
    Failed(Erased),
    Defected(Defect),
}

pub(crate) enum Stage {
    /// Runs on a success value.
    Step(StepFn),
    /// Runs on a failure; receives the position of the stage that failed.
    Recover(RecoverFn),
}

/// Interpreter state between two stages. Position 0 is the start value.
pub(crate) enum Cursor {
    Value(Erased),
    Failed { origin: usize, failure: Erased },
    Defected(Defect),
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counts {
    pub stages: usize,
    pub steps: usize,
    pub steps_run: usize,
    pub recoveries_applied: usize,
}

pub(crate) fn downcast<T: 'static>(position: usize, erased: Erased) -> Result<T, Defect> {
    erased.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        Defect::Internal(format!(
            "stage {position} carried a value that is not {}",
            type_name::<T>()
        ))
    })
}

/// Step-at-a-time driver over an ordered list of stages.
pub(crate) struct Machine<'a> {
    config: &'a RunConfig,
    cursor: Option<Cursor>,
    stages: std::iter::Enumerate<std::vec::IntoIter<Stage>>,
    recoveries_left: usize,
    counts: Counts,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(config: &'a RunConfig, start: Cursor, stages: Vec<Stage>) -> Self {
        let recoveries_left = stages
            .iter()
            .filter(|stage| matches!(stage, Stage::Recover(_)))
            .count();
        let counts = Counts {
            stages: stages.len(),
            steps: stages.len() - recoveries_left,
            ..Counts::default()
        };
        Self {
            config,
            cursor: Some(start),
            stages: stages.into_iter().enumerate(),
            recoveries_left,
            counts,
        }
    }

    /// Runs (or skips) the next stage. Returns `false` once the run is over.
    ///
    /// The boundary between two calls is the suspension point used by
    /// `Effect::run_async`.
    pub(crate) fn advance(&mut self) -> bool {
        match &self.cursor {
            None | Some(Cursor::Defected(_)) => return false,
            Some(Cursor::Failed { .. }) if self.recoveries_left == 0 => return false,
            _ => {}
        }
        let Some((index, stage)) = self.stages.next() else {
            return false;
        };
        let Some(cursor) = self.cursor.take() else {
            return false;
        };
        let position = index + 1;

        let next = match (stage, cursor) {
            (Stage::Step(run), Cursor::Value(value)) => {
                self.counts.steps_run += 1;
                if self.config.trace_steps {
                    debug!(stage = position, "running step");
                }
                let config = self.config;
                match self.guard(position, move || run(value, config)) {
                    StageOutput::Value(value) => Cursor::Value(value),
                    StageOutput::Failed(failure) => {
                        warn!(stage = position, "step failed; later steps will not run");
                        Cursor::Failed {
                            origin: position,
                            failure,
                        }
                    }
                    StageOutput::Defected(defect) => Cursor::Defected(defect),
                }
            }
            (Stage::Recover(recover), Cursor::Failed { origin, failure }) => {
                self.recoveries_left -= 1;
                if self.config.trace_steps {
                    debug!(stage = position, origin, "offering failure to recovery stage");
                }
                match self.guard(position, move || recover(origin, failure)) {
                    StageOutput::Value(value) => {
                        self.counts.recoveries_applied += 1;
                        Cursor::Value(value)
                    }
                    StageOutput::Failed(failure) => Cursor::Failed {
                        origin: position,
                        failure,
                    },
                    StageOutput::Defected(defect) => Cursor::Defected(defect),
                }
            }
            (Stage::Recover(_), cursor) => {
                self.recoveries_left -= 1;
                cursor
            }
            (Stage::Step(_), cursor) => cursor,
        };
        self.cursor = Some(next);
        true
    }

    pub(crate) fn run_to_end(&mut self) {
        while self.advance() {}
    }

    /// Turns the final cursor into a typed exit.
    pub(crate) fn finish<V: 'static, F>(self, widen: Widen<F>) -> (Exit<V, F>, Counts) {
        let exit = match self.cursor {
            Some(Cursor::Value(value)) => downcast::<V>(self.counts.stages, value).map(TypedResult::Success),
            Some(Cursor::Failed { origin, failure }) => widen(origin, failure).map(TypedResult::Failure),
            Some(Cursor::Defected(defect)) => Err(defect),
            None => Err(Defect::Internal("interpreter lost its cursor".to_string())),
        };
        (exit, self.counts)
    }

    fn guard(&self, position: usize, f: impl FnOnce() -> StageOutput) -> StageOutput {
        if !self.config.catch_panics {
            return f();
        }
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(output) => output,
            Err(payload) => StageOutput::Defected(Defect::from_panic(position, payload)),
        }
    }
}

/// Collapses an exit into a plain `Result` for callers that do not want to
/// handle the remaining failures themselves.
pub fn settle<V, F: FailureSet>(exit: Exit<V, F>) -> Result<V, FaultlineError> {
    match exit? {
        TypedResult::Success(value) => Ok(value),
        TypedResult::Failure(failure) => Err(FaultlineError::Unrecovered { tag: failure.tag() }),
    }
}
