use std::cell::{Cell, RefCell};
use std::rc::Rc;

use faultline_core::{
    Defect, DynFailure, Effect, Failures, FaultlineError, Nil, OutcomeKind, RunConfig, Tagged,
    TypedResult, settle,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DivideByZeroError {
    a: f64,
    b: f64,
}

impl Tagged for DivideByZeroError {
    const TAG: &'static str = "DivideByZeroError";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FooError {}

impl Tagged for FooError {
    const TAG: &'static str = "FooError";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BarError {
    input: String,
}

impl Tagged for BarError {
    const TAG: &'static str = "BarError";
}

type Declared = Failures![DivideByZeroError, FooError, BarError];

fn divide(a: f64, b: f64) -> TypedResult<f64, Failures![DivideByZeroError]> {
    if b == 0.0 {
        TypedResult::raise(DivideByZeroError { a, b })
    } else {
        TypedResult::Success(a / b)
    }
}

fn may_fail_1(n: f64) -> TypedResult<f64, Failures![FooError]> {
    if n > 20.0 {
        TypedResult::raise(FooError {})
    } else {
        TypedResult::Success(n)
    }
}

fn may_fail_2(n: f64) -> TypedResult<String, Failures![BarError]> {
    if n < 0.0 {
        TypedResult::raise(BarError {
            input: n.to_string(),
        })
    } else {
        TypedResult::Success(format!("{n}"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[test]
fn divide_square_then_foo_short_circuits() {
    init_tracing();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (s1, s2) = (seen.clone(), seen.clone());
    let last_ran = Rc::new(Cell::new(false));
    let flag = last_ran.clone();

    let effect: Effect<String, Declared> = Effect::from_result(divide(10.0, 2.0))
        .map(move |n| {
            s1.borrow_mut().push(n);
            n * n
        })
        .step(move |n| {
            s2.borrow_mut().push(n);
            may_fail_1(n)
        })
        .step(move |n| {
            flag.set(true);
            may_fail_2(n)
        });

    let (exit, report) = effect.run_with_report(&RunConfig::default());
    assert_eq!(*seen.borrow(), vec![5.0, 25.0]);
    assert!(!last_ran.get());
    assert_eq!(exit.unwrap().failure_tag(), Some("FooError"));
    assert_eq!(report.outcome, OutcomeKind::Failure);
    assert_eq!(report.steps_skipped, 1);
}

#[test]
fn divide_by_zero_recovered_by_tag() {
    let exit = Effect::from_result(divide(10.0, 0.0))
        .map(|n| n.to_string())
        .catch_tag(|e: DivideByZeroError| format!("recovered from a: {} and b: {}", e.a, e.b))
        .run_value();
    assert_eq!(exit.unwrap(), "recovered from a: 10 and b: 0");
}

#[test]
fn unknown_fault_goes_to_defect_handler_only() {
    let tag_handler_called = Rc::new(Cell::new(false));
    let defect_seen = Rc::new(RefCell::new(None));
    let (h, d) = (tag_handler_called.clone(), defect_seen.clone());

    let exit: Result<TypedResult<String, Nil>, Defect> =
        Effect::<String, Declared>::from_dyn(Err(DynFailure::new("UnknownFault")))
            .catch_tag(move |_: FooError| {
                h.set(true);
                "foo".to_string()
            })
            .catch_all(|_| "anything".to_string())
            .catch_all_defect(move |defect| *d.borrow_mut() = Some(defect.kind()))
            .run();

    assert!(!tag_handler_called.get());
    assert_eq!(*defect_seen.borrow(), Some("unknown_tag"));
    assert!(matches!(exit, Err(Defect::UnknownTag { ref tag, .. }) if tag == "UnknownFault"));
}

#[test]
fn settle_reports_unrecovered_tag() {
    let exit = Effect::<u8, Declared>::raise(BarError {
        input: "x".to_string(),
    })
    .run();
    let err = settle(exit).unwrap_err();
    assert!(matches!(err, FaultlineError::Unrecovered { tag: "BarError" }));
}

#[tokio::test(flavor = "current_thread")]
async fn async_run_agrees_with_sync_run() {
    let build = || {
        Effect::from_result(divide(3.0, 1.0))
            .map(|n| n * n)
            .step(may_fail_1)
            .step(may_fail_2)
    };
    let sync = build().run().unwrap();
    let asynchronous = build().run_async(&RunConfig::default()).await.unwrap();
    assert_eq!(sync, asynchronous);
    assert_eq!(asynchronous.success().as_deref(), Some("9"));
}
