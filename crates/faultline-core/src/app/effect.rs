//! Effect - 依存関係のある step を順番につなげる遅延計算
//!
//! # 学習ポイント
//! - Builder パターン: `step` を呼ぶたびに `Effect<V, F>` の型が変わる
//! - 失敗型は `Append` で静的に広がる（実行時には高々 1 つしか発生しない）
//! - 実行は `run` を呼んだときに 1 回だけ（`self` を消費する）
//!
//! # 使用例
//! ```
//! use faultline_core::{Effect, Failures, Tagged, TypedResult};
//!
//! #[derive(Debug)]
//! struct FooError;
//! impl Tagged for FooError {
//!     const TAG: &'static str = "FooError";
//! }
//!
//! fn may_fail(n: u32) -> TypedResult<String, Failures![FooError]> {
//!     if n > 10 { TypedResult::raise(FooError) } else { TypedResult::Success(n.to_string()) }
//! }
//!
//! let exit = Effect::succeed(3_u32)
//!     .map(|n| n * n)
//!     .step(may_fail)
//!     .catch_tag(|_: FooError| "too big".to_string())
//!     .run_value();
//! assert_eq!(exit.unwrap(), "9");
//! ```

use std::marker::PhantomData;

use tracing::{error, info};

use super::config::RunConfig;
use super::interpreter::{Cursor, Erased, Exit, Machine, Stage, StageOutput, Widen, downcast};
use crate::domain::{Append, Defect, Embed, FailureSet, Inject, Nil, Or, Tagged, TypedResult};
use crate::observability::RunReport;

type DefectObserver = Box<dyn FnOnce(&Defect)>;

/// A lazily composed chain of dependent steps.
///
/// `V` is the success value of the last stage and `F` the union of every
/// failure a stage may produce, in order of introduction.
pub struct Effect<V, F> {
    pub(crate) start: Cursor,
    pub(crate) stages: Vec<Stage>,
    pub(crate) widen: Widen<F>,
    pub(crate) defect_observers: Vec<DefectObserver>,
    _marker: PhantomData<fn() -> V>,
}

fn from_start<F: 'static>() -> Widen<F> {
    Box::new(|origin, erased| downcast::<F>(origin, erased))
}

impl<V: 'static> Effect<V, Nil> {
    pub fn succeed(value: V) -> Self {
        Self::from_cursor(Cursor::Value(Box::new(value)))
    }
}

impl<V: 'static, E: Tagged> Effect<V, Or<E, Nil>> {
    pub fn fail(error: E) -> Self {
        Self::from_cursor(Cursor::Failed {
            origin: 0,
            failure: Box::new(Or::<E, Nil>::Head(error)),
        })
    }
}

impl<V: 'static, F: 'static> Effect<V, F> {
    fn from_cursor(start: Cursor) -> Self {
        Self {
            start,
            stages: Vec::new(),
            widen: from_start(),
            defect_observers: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn from_result(result: TypedResult<V, F>) -> Self {
        Self::from_cursor(match result {
            TypedResult::Success(value) => Cursor::Value(Box::new(value)),
            TypedResult::Failure(failure) => Cursor::Failed {
                origin: 0,
                failure: Box::new(failure),
            },
        })
    }

    /// Fails with one member of `F`.
    pub fn raise<E, I>(error: E) -> Self
    where
        F: Inject<E, I>,
    {
        Self::from_result(TypedResult::raise(error))
    }

    /// An effect that dies with `defect` without running anything.
    pub fn die(defect: Defect) -> Self {
        Self::from_cursor(Cursor::Defected(defect))
    }

    /// Number of stages (steps and recoveries) chained so far.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn next_position(&self) -> usize {
        self.stages.len() + 1
    }

    /// Appends one stage. `build` receives the current failure widening and
    /// returns the new stage together with the widening for the longer chain.
    pub(crate) fn push<V2, F2>(
        mut self,
        build: impl FnOnce(Widen<F>) -> (Stage, Widen<F2>),
    ) -> Effect<V2, F2> {
        let (stage, widen) = build(self.widen);
        self.stages.push(stage);
        Effect {
            start: self.start,
            stages: self.stages,
            widen,
            defect_observers: self.defect_observers,
            _marker: PhantomData,
        }
    }

    /// Appends an infallible step.
    pub fn map<V2: 'static>(self, f: impl FnOnce(V) -> V2 + 'static) -> Effect<V2, F> {
        let position = self.next_position();
        let stage = Stage::Step(Box::new(move |erased: Erased, _: &RunConfig| {
            match downcast::<V>(position, erased) {
                Ok(value) => StageOutput::Value(Box::new(f(value))),
                Err(defect) => StageOutput::Defected(defect),
            }
        }));
        self.push(|widen| (stage, widen))
    }

    /// Appends a fallible step. The failure type becomes `F | F2`.
    pub fn step<V2, F2>(
        self,
        f: impl FnOnce(V) -> TypedResult<V2, F2> + 'static,
    ) -> Effect<V2, <F as Append<F2>>::Output>
    where
        V2: 'static,
        F2: 'static,
        F: Append<F2>,
    {
        let position = self.next_position();
        let stage = Stage::Step(Box::new(move |erased: Erased, _: &RunConfig| {
            match downcast::<V>(position, erased) {
                Ok(value) => erase(f(value)),
                Err(defect) => StageOutput::Defected(defect),
            }
        }));
        self.push(move |previous| (stage, appended::<F, F2>(previous, position)))
    }

    /// Appends a step that is itself an effect. The nested effect runs to
    /// completion inside this stage, with the same configuration; its
    /// defects are forwarded.
    pub fn step_effect<V2, F2>(
        self,
        f: impl FnOnce(V) -> Effect<V2, F2> + 'static,
    ) -> Effect<V2, <F as Append<F2>>::Output>
    where
        V2: 'static,
        F2: 'static,
        F: Append<F2>,
    {
        let position = self.next_position();
        let stage = Stage::Step(Box::new(move |erased: Erased, config: &RunConfig| {
            let value = match downcast::<V>(position, erased) {
                Ok(value) => value,
                Err(defect) => return StageOutput::Defected(defect),
            };
            match f(value).run_with(config) {
                Ok(result) => erase(result),
                Err(defect) => StageOutput::Defected(defect),
            }
        }));
        self.push(move |previous| (stage, appended::<F, F2>(previous, position)))
    }

    /// Appends a step whose failures are already declared in `F`.
    pub fn and_then<V2, F2, I>(
        self,
        f: impl FnOnce(V) -> TypedResult<V2, F2> + 'static,
    ) -> Effect<V2, F>
    where
        V2: 'static,
        F2: Embed<F, I> + 'static,
        I: 'static,
    {
        let position = self.next_position();
        let stage = Stage::Step(Box::new(move |erased: Erased, _: &RunConfig| {
            match downcast::<V>(position, erased) {
                Ok(value) => erase(f(value)),
                Err(defect) => StageOutput::Defected(defect),
            }
        }));
        self.push(move |previous| {
            let widen: Widen<F> = Box::new(move |origin, erased| {
                if origin == position {
                    downcast::<F2>(origin, erased).map(<F2 as Embed<F, I>>::embed)
                } else {
                    previous(origin, erased)
                }
            });
            (stage, widen)
        })
    }

    /// Registers an observer for defects. Observers run in registration order
    /// once the run has ended with a defect; the defect still escapes.
    pub fn catch_all_defect(mut self, observer: impl FnOnce(&Defect) + 'static) -> Self {
        self.defect_observers.push(Box::new(observer));
        self
    }

    /// Logs any defect at error level.
    pub fn log_defects(self) -> Self {
        self.catch_all_defect(|defect| {
            error!(kind = defect.kind(), %defect, "defect escaped the typed failure channel");
        })
    }

    pub fn run(self) -> Exit<V, F> {
        self.run_with(&RunConfig::default())
    }

    pub fn run_with(self, config: &RunConfig) -> Exit<V, F> {
        let Effect {
            start,
            stages,
            widen,
            defect_observers,
            ..
        } = self;
        let mut machine = Machine::new(config, start, stages);
        machine.run_to_end();
        let (exit, _) = machine.finish(widen);
        notify(exit, defect_observers)
    }

    /// Runs and also returns a summary of what the interpreter did.
    pub fn run_with_report(self, config: &RunConfig) -> (Exit<V, F>, RunReport)
    where
        F: FailureSet,
    {
        let Effect {
            start,
            stages,
            widen,
            defect_observers,
            ..
        } = self;
        let mut machine = Machine::new(config, start, stages);
        machine.run_to_end();
        let (exit, counts) = machine.finish(widen);
        let report = RunReport::new(&exit, counts);
        info!(
            outcome = ?report.outcome,
            steps_run = report.steps_run,
            steps_skipped = report.steps_skipped,
            failure_tag = report.failure_tag.as_deref(),
            "effect finished"
        );
        (notify(exit, defect_observers), report)
    }

    /// Same as [`run_with`](Self::run_with), but yields to the tokio
    /// scheduler at every stage boundary.
    ///
    /// The effect holds non-`Send` closures, so this future is meant for a
    /// current-thread runtime.
    pub async fn run_async(self, config: &RunConfig) -> Exit<V, F> {
        let Effect {
            start,
            stages,
            widen,
            defect_observers,
            ..
        } = self;
        let mut machine = Machine::new(config, start, stages);
        while machine.advance() {
            tokio::task::yield_now().await;
        }
        let (exit, _) = machine.finish(widen);
        notify(exit, defect_observers)
    }
}

impl<V: 'static> Effect<V, Nil> {
    /// Runs an effect whose failure set is empty. Only defects remain.
    pub fn run_value(self) -> Result<V, Defect> {
        self.run().map(TypedResult::into_value)
    }
}

fn erase<V: 'static, F: 'static>(result: TypedResult<V, F>) -> StageOutput {
    match result {
        TypedResult::Success(value) => StageOutput::Value(Box::new(value)),
        TypedResult::Failure(failure) => StageOutput::Failed(Box::new(failure)),
    }
}

/// Widening for a new stage at `position` that fails with `F2`.
fn appended<F, F2>(previous: Widen<F>, position: usize) -> Widen<<F as Append<F2>>::Output>
where
    F: Append<F2> + 'static,
    F2: 'static,
{
    Box::new(move |origin, erased| {
        if origin == position {
            downcast::<F2>(origin, erased).map(<F as Append<F2>>::right)
        } else {
            previous(origin, erased).map(<F as Append<F2>>::left)
        }
    })
}

fn notify<V, F>(exit: Exit<V, F>, observers: Vec<DefectObserver>) -> Exit<V, F> {
    if let Err(defect) = &exit {
        for observer in observers {
            observer(defect);
        }
    }
    exit
}
