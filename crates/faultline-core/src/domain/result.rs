//! TypedResult: a success value or one failure out of a closed union.
//!
//! The failure side is never inspected by the sequencing combinators. A
//! `Failure` produced anywhere in a chain travels to the end of the chain
//! untouched; only the recovery combinators in `app::recovery` look at it.

use serde::Serialize;

use super::tag::Tagged;
use super::union::{Append, Embed, FailureSet, Inject, Nil, Or};

/// A two-variant result whose failure type is a closed union of tagged
/// failures.
///
/// Serialized as `{"_tag": "Success", "value": ...}` or
/// `{"_tag": "Failure", "value": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "_tag", content = "value")]
pub enum TypedResult<V, F> {
    Success(V),
    Failure(F),
}

/// Starts a success track. The failure set is empty.
pub fn succeed<V>(value: V) -> TypedResult<V, Nil> {
    TypedResult::Success(value)
}

/// Starts a failure track. The success type is empty.
pub fn fail<E: Tagged>(error: E) -> TypedResult<Nil, Or<E, Nil>> {
    TypedResult::Failure(Or::Head(error))
}

/// Starts a failure track from a prebuilt union.
pub fn fail_with<F>(failure: F) -> TypedResult<Nil, F> {
    TypedResult::Failure(failure)
}

impl<V, F> TypedResult<V, F> {
    /// Fails with `error`, placed at its position in `F`.
    pub fn raise<E, I>(error: E) -> Self
    where
        F: Inject<E, I>,
    {
        TypedResult::Failure(F::inject(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TypedResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TypedResult::Failure(_))
    }

    pub fn success(self) -> Option<V> {
        match self {
            TypedResult::Success(value) => Some(value),
            TypedResult::Failure(_) => None,
        }
    }

    pub fn failure(self) -> Option<F> {
        match self {
            TypedResult::Success(_) => None,
            TypedResult::Failure(error) => Some(error),
        }
    }

    pub fn as_ref(&self) -> TypedResult<&V, &F> {
        match self {
            TypedResult::Success(value) => TypedResult::Success(value),
            TypedResult::Failure(error) => TypedResult::Failure(error),
        }
    }

    pub fn into_result(self) -> Result<V, F> {
        self.into()
    }

    /// Transforms the success value. `f` runs at most once, and never on a
    /// failure.
    pub fn map<V2>(self, f: impl FnOnce(V) -> V2) -> TypedResult<V2, F> {
        match self {
            TypedResult::Success(value) => TypedResult::Success(f(value)),
            TypedResult::Failure(error) => TypedResult::Failure(error),
        }
    }

    /// Sequences a fallible step. The failure type becomes `F | F2`.
    pub fn flat_map<V2, F2>(
        self,
        f: impl FnOnce(V) -> TypedResult<V2, F2>,
    ) -> TypedResult<V2, <F as Append<F2>>::Output>
    where
        F: Append<F2>,
    {
        match self {
            TypedResult::Success(value) => match f(value) {
                TypedResult::Success(next) => TypedResult::Success(next),
                TypedResult::Failure(error) => TypedResult::Failure(F::right(error)),
            },
            TypedResult::Failure(error) => TypedResult::Failure(error.left()),
        }
    }

    /// Sequences a step whose failures are already declared in `F`.
    ///
    /// Use this instead of [`flat_map`](Self::flat_map) when a failure type
    /// shows up a second time in a chain; appending it again would declare
    /// the same tag twice.
    pub fn and_then<V2, F2, I>(self, f: impl FnOnce(V) -> TypedResult<V2, F2>) -> TypedResult<V2, F>
    where
        F2: Embed<F, I>,
    {
        match self {
            TypedResult::Success(value) => f(value).embed(),
            TypedResult::Failure(error) => TypedResult::Failure(error),
        }
    }

    /// Declares more failures without producing any: `F` becomes `F | F2`.
    pub fn widen<F2>(self) -> TypedResult<V, <F as Append<F2>>::Output>
    where
        F: Append<F2>,
    {
        match self {
            TypedResult::Success(value) => TypedResult::Success(value),
            TypedResult::Failure(error) => TypedResult::Failure(error.left()),
        }
    }

    /// Moves the failure into a larger union that contains every member of `F`.
    pub fn embed<F2, I>(self) -> TypedResult<V, F2>
    where
        F: Embed<F2, I>,
    {
        match self {
            TypedResult::Success(value) => TypedResult::Success(value),
            TypedResult::Failure(error) => TypedResult::Failure(error.embed()),
        }
    }

    pub fn inspect(self, f: impl FnOnce(&V)) -> Self {
        if let TypedResult::Success(value) = &self {
            f(value);
        }
        self
    }

    pub fn inspect_failure(self, f: impl FnOnce(&F)) -> Self {
        if let TypedResult::Failure(error) = &self {
            f(error);
        }
        self
    }
}

impl<V, F: FailureSet> TypedResult<V, F> {
    /// Tag of the failure, if this is one.
    pub fn failure_tag(&self) -> Option<&'static str> {
        match self {
            TypedResult::Success(_) => None,
            TypedResult::Failure(error) => Some(error.tag()),
        }
    }
}

impl<V> TypedResult<V, Nil> {
    /// Unwraps a result whose failure set is empty.
    ///
    /// Only exists once every tag has been recovered, so forgetting one is a
    /// type error:
    ///
    /// ```compile_fail
    /// use faultline_core::{Failures, Tagged, TypedResult};
    ///
    /// struct FooError;
    /// impl Tagged for FooError {
    ///     const TAG: &'static str = "FooError";
    /// }
    ///
    /// let r: TypedResult<u32, Failures![FooError]> = TypedResult::Success(1);
    /// let _ = r.into_value();
    /// ```
    pub fn into_value(self) -> V {
        match self {
            TypedResult::Success(value) => value,
            TypedResult::Failure(never) => match never {},
        }
    }
}

impl<F> TypedResult<Nil, F> {
    /// Gives a pure failure track any success type.
    pub fn cast<V>(self) -> TypedResult<V, F> {
        match self {
            TypedResult::Success(never) => match never {},
            TypedResult::Failure(error) => TypedResult::Failure(error),
        }
    }
}

impl<V, F> From<Result<V, F>> for TypedResult<V, F> {
    fn from(result: Result<V, F>) -> Self {
        match result {
            Ok(value) => TypedResult::Success(value),
            Err(error) => TypedResult::Failure(error),
        }
    }
}

impl<V, F> From<TypedResult<V, F>> for Result<V, F> {
    fn from(result: TypedResult<V, F>) -> Self {
        match result {
            TypedResult::Success(value) => Ok(value),
            TypedResult::Failure(error) => Err(error),
        }
    }
}
