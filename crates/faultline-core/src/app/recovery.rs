//! Tag-based recovery.
//!
//! `catch_tag` takes one failure type out of the union: the handler receives
//! the narrowed error by value and returns a replacement success value. Any
//! other failure passes through unchanged, now typed as the smaller union.
//! Once every tag is gone the failure type is `Nil` and the value can be
//! unwrapped without further handling.
//!
//! Recovery handlers cannot fail. A handler that needs to report a new
//! failure should be written as a regular step after a `catch_all`.

use tracing::debug;

use super::effect::Effect;
use super::interpreter::{Erased, Stage, StageOutput, Widen, downcast};
use crate::domain::{Defect, Nil, Pluck, Tagged, TypedResult};

impl<V, F> TypedResult<V, F> {
    /// Recovers from the failure tagged `E::TAG`, removing `E` from the union.
    pub fn catch_tag<E, I>(self, handler: impl FnOnce(E) -> V) -> TypedResult<V, F::Remainder>
    where
        E: Tagged,
        F: Pluck<E, I>,
    {
        match self {
            TypedResult::Success(value) => TypedResult::Success(value),
            TypedResult::Failure(failure) => match failure.pluck() {
                Ok(error) => TypedResult::Success(handler(error)),
                Err(rest) => TypedResult::Failure(rest),
            },
        }
    }

    /// Recovers from every remaining expected failure at once.
    pub fn catch_all(self, handler: impl FnOnce(F) -> V) -> TypedResult<V, Nil> {
        match self {
            TypedResult::Success(value) => TypedResult::Success(value),
            TypedResult::Failure(failure) => TypedResult::Success(handler(failure)),
        }
    }
}

impl<V: 'static, F: 'static> Effect<V, F> {
    /// Adds a recovery stage for the failure tagged `E::TAG`.
    ///
    /// Defects never reach the handler.
    pub fn catch_tag<E, I>(self, handler: impl FnOnce(E) -> V + 'static) -> Effect<V, F::Remainder>
    where
        E: Tagged,
        I: 'static,
        F: Pluck<E, I>,
        F::Remainder: 'static,
    {
        let position = self.len() + 1;
        self.recover(move |failure: F| match failure.pluck() {
            Ok(error) => {
                debug!(stage = position, tag = E::TAG, "recovered failure");
                StageOutput::Value(Box::new(handler(error)))
            }
            Err(rest) => StageOutput::Failed(Box::new(rest)),
        })
    }

    /// Adds a recovery stage that handles whatever expected failure is left.
    pub fn catch_all(self, handler: impl FnOnce(F) -> V + 'static) -> Effect<V, Nil> {
        self.recover(move |failure: F| StageOutput::Value(Box::new(handler(failure))))
    }

    /// Appends a recovery stage. Every failure raised before it flows through
    /// `on_failure`; whatever it lets through is typed as `F2` from here on.
    fn recover<F2: 'static>(
        self,
        on_failure: impl FnOnce(F) -> StageOutput + 'static,
    ) -> Effect<V, F2> {
        let position = self.len() + 1;
        self.push(move |previous| {
            let stage = Stage::Recover(Box::new(move |origin, erased| {
                match previous(origin, erased) {
                    Ok(failure) => on_failure(failure),
                    Err(defect) => StageOutput::Defected(defect),
                }
            }));
            let widen: Widen<F2> = Box::new(move |origin, erased: Erased| {
                if origin == position {
                    downcast::<F2>(origin, erased)
                } else {
                    Err(Defect::Internal(format!(
                        "failure from stage {origin} bypassed recovery stage {position}"
                    )))
                }
            });
            (stage, widen)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::Failures;
    use crate::app::RunConfig;
    use crate::domain::FailureSet;
    use crate::domain::tag::fixtures::{BarError, DivideByZeroError, FooError};

    type Declared = Failures![DivideByZeroError, FooError, BarError];

    fn divide(a: f64, b: f64) -> TypedResult<f64, Failures![DivideByZeroError]> {
        if b == 0.0 {
            TypedResult::raise(DivideByZeroError { a, b })
        } else {
            TypedResult::Success(a / b)
        }
    }

    #[test]
    fn divide_by_zero_is_recovered_with_payload() {
        let message = divide(10.0, 0.0)
            .map(|n| n.to_string())
            .catch_tag(|e: DivideByZeroError| format!("recovered from a: {} and b: {}", e.a, e.b))
            .into_value();
        assert_eq!(message, "recovered from a: 10 and b: 0");
    }

    #[test]
    fn catch_tag_removes_exactly_one_tag() {
        let r: TypedResult<u8, Declared> = TypedResult::raise(BarError {
            input: "x".to_string(),
        });
        let narrowed: TypedResult<u8, Failures![DivideByZeroError, BarError]> =
            r.catch_tag(|_: FooError| 0);
        assert_eq!(narrowed.failure_tag(), Some("BarError"));
        assert_eq!(
            <Failures![DivideByZeroError, BarError]>::tags(),
            vec!["DivideByZeroError", "BarError"]
        );
    }

    #[test]
    fn unmatched_failure_keeps_payload() {
        let r: TypedResult<u8, Declared> = TypedResult::raise(BarError {
            input: "payload".to_string(),
        });
        let rest = r.catch_tag(|_: DivideByZeroError| 0).failure().unwrap();
        let bar: BarError = rest.pluck().unwrap();
        assert_eq!(bar.input, "payload");
    }

    #[test]
    fn success_skips_handler() {
        let called = Cell::new(false);
        let r: TypedResult<u8, Declared> = TypedResult::Success(7);
        let out = r
            .catch_tag(|_: FooError| {
                called.set(true);
                0
            })
            .catch_all(|_| 0)
            .into_value();
        assert_eq!(out, 7);
        assert!(!called.get());
    }

    #[test]
    fn exhaustive_recovery_reaches_nil() {
        let r: TypedResult<&str, Declared> = TypedResult::raise(FooError {});
        let value = r
            .catch_tag(|_: DivideByZeroError| "div")
            .catch_tag(|_: BarError| "bar")
            .catch_tag(|_: FooError| "foo")
            .into_value();
        assert_eq!(value, "foo");
    }

    #[test]
    fn effect_recovery_then_more_steps() {
        let exit = Effect::from_result(divide(10.0, 0.0))
            .map(|n| n * n)
            .catch_tag(|e: DivideByZeroError| e.a)
            .map(|n| n + 1.0)
            .run_value();
        assert_eq!(exit.unwrap(), 11.0);
    }

    #[test]
    fn effect_failure_after_recovery_keeps_remaining_tags() {
        let exit = Effect::<u8, Failures![DivideByZeroError]>::from_result(TypedResult::Success(1))
            .catch_tag(|_: DivideByZeroError| 0)
            .step(|_| TypedResult::<u8, Failures![FooError]>::raise(FooError {}))
            .run()
            .unwrap();
        assert_eq!(exit.failure_tag(), Some("FooError"));
    }

    #[test]
    fn effect_unmatched_failure_passes_through_recovery() {
        let exit = Effect::<u8, Declared>::raise(BarError {
            input: "b".to_string(),
        })
        .catch_tag(|_: FooError| 0)
        .map(|n| n + 1)
        .run()
        .unwrap();
        assert_eq!(exit.failure_tag(), Some("BarError"));
    }

    #[test]
    fn defect_bypasses_catch_tag() {
        let handled = Rc::new(Cell::new(false));
        let observed = Rc::new(Cell::new(false));
        let (h, o) = (handled.clone(), observed.clone());
        let exit = Effect::succeed(1_u8)
            .step(|_: u8| -> TypedResult<u8, Failures![FooError]> { panic!("bug") })
            .catch_tag(move |_: FooError| {
                h.set(true);
                0
            })
            .catch_all_defect(move |_| o.set(true))
            .run_with(&RunConfig::default());
        assert!(matches!(exit, Err(Defect::Panic { stage: 1, .. })));
        assert!(!handled.get());
        assert!(observed.get());
    }

    #[test]
    fn catch_all_on_effect() {
        let exit = Effect::<u8, Declared>::raise(FooError {})
            .catch_all(|failure| failure.tag().len() as u8)
            .run_value();
        assert_eq!(exit.unwrap(), "FooError".len() as u8);
    }
}
