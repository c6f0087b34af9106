//! デモ用の collaborator
//!
//! divide → square → may_fail_1 → may_fail_2 の順につなぐパイプラインと、
//! そこで起こりうる失敗型を定義します。

use faultline_core::{Effect, Failures, Tagged, TypedResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivideByZeroError {
    pub a: f64,
    pub b: f64,
}

impl Tagged for DivideByZeroError {
    const TAG: &'static str = "DivideByZeroError";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooError {
    pub n: f64,
}

impl Tagged for FooError {
    const TAG: &'static str = "FooError";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarError {
    pub input: String,
}

impl Tagged for BarError {
    const TAG: &'static str = "BarError";
}

pub type DemoFailures = Failures![DivideByZeroError, FooError, BarError];

/// 故意に起こす失敗
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub fail_foo: bool,
    pub fail_bar: bool,
    pub panic: bool,
}

pub fn divide(a: f64, b: f64) -> TypedResult<f64, Failures![DivideByZeroError]> {
    if b == 0.0 {
        TypedResult::raise(DivideByZeroError { a, b })
    } else {
        TypedResult::Success(a / b)
    }
}

/// Fails for anything above 20.
pub fn may_fail_1(n: f64, faults: Faults) -> TypedResult<f64, Failures![FooError]> {
    if faults.fail_foo || n > 20.0 {
        TypedResult::raise(FooError { n })
    } else {
        TypedResult::Success(n)
    }
}

pub fn may_fail_2(n: f64, faults: Faults) -> TypedResult<String, Failures![BarError]> {
    if faults.panic {
        panic!("may_fail_2: injected bug");
    }
    if faults.fail_bar {
        return TypedResult::raise(BarError {
            input: n.to_string(),
        });
    }
    TypedResult::Success(format!("result: {n}"))
}

pub fn recovered_divide(a: f64, b: f64) -> TypedResult<String, faultline_core::Nil> {
    divide(a, b)
        .map(|n| n.to_string())
        .catch_tag(|e: DivideByZeroError| format!("recovered from a: {} and b: {}", e.a, e.b))
}

pub fn pipeline(a: f64, b: f64, faults: Faults) -> Effect<String, DemoFailures> {
    Effect::from_result(divide(a, b))
        .map(|n| n * n)
        .step(move |n| may_fail_1(n, faults))
        .step(move |n| may_fail_2(n, faults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{Defect, RunConfig};
    use rstest::rstest;

    #[rstest]
    #[case::foo_after_square(10.0, 2.0, Faults::default(), Some("FooError"))]
    #[case::divide_by_zero(10.0, 0.0, Faults::default(), Some("DivideByZeroError"))]
    #[case::forced_bar(4.0, 2.0, Faults { fail_bar: true, ..Faults::default() }, Some("BarError"))]
    #[case::clean(4.0, 2.0, Faults::default(), None)]
    fn pipeline_outcomes(
        #[case] a: f64,
        #[case] b: f64,
        #[case] faults: Faults,
        #[case] expected: Option<&str>,
    ) {
        let exit = pipeline(a, b, faults).run().unwrap();
        assert_eq!(exit.failure_tag(), expected);
    }

    #[test]
    fn recovered_divide_message() {
        assert_eq!(recovered_divide(10.0, 0.0).into_value(), "recovered from a: 10 and b: 0");
        assert_eq!(recovered_divide(10.0, 4.0).into_value(), "2.5");
    }

    #[test]
    fn injected_panic_is_defect() {
        let faults = Faults {
            panic: true,
            ..Faults::default()
        };
        let exit = pipeline(4.0, 2.0, faults).run_with(&RunConfig::default());
        assert!(matches!(exit, Err(Defect::Panic { stage: 3, .. })));
    }
}
