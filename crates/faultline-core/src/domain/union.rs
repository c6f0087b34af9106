//! Closed failure unions encoded as type-level lists.
//!
//! `Failures![A, B, C]` expands to `Or<A, Or<B, Or<C, Nil>>>`. The list is
//! closed: a value of that type is exactly one of `A`, `B` or `C`, and `Nil`
//! has no values at all, so an empty union can never be constructed.
//!
//! # 学習ポイント
//! - 型レベルリスト (`Or` / `Nil`) で union を表現する
//! - index 型 (`Here` / `There<I>`) で「何番目の型か」をコンパイラに推論させる
//! - `Append` で union を静的に広げ、`Pluck` で 1 つだけ取り除く

use std::fmt;
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

use super::tag::Tagged;

/// The empty failure set. Uninhabited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nil {}

/// One link of a failure union: either the head type or something in the tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Or<H, T> {
    Head(H),
    Tail(T),
}

/// Index marker: the wanted type is the head of the list.
pub struct Here;

/// Index marker: the wanted type is somewhere in the tail, at index `I`.
pub struct There<I>(PhantomData<I>);

/// Builds a closed failure union type from a list of tagged types.
///
/// ```
/// use faultline_core::{Failures, FailureSet, Tagged};
///
/// struct FooError;
/// impl Tagged for FooError {
///     const TAG: &'static str = "FooError";
/// }
///
/// struct BarError;
/// impl Tagged for BarError {
///     const TAG: &'static str = "BarError";
/// }
///
/// type Errors = Failures![FooError, BarError];
/// assert_eq!(<Errors as FailureSet>::tags(), vec!["FooError", "BarError"]);
/// ```
#[macro_export]
macro_rules! Failures {
    () => { $crate::domain::union::Nil };
    ($head:ty $(, $tail:ty)* $(,)?) => {
        $crate::domain::union::Or<$head, $crate::Failures![$($tail),*]>
    };
}

/// A closed set of tagged failures.
pub trait FailureSet: Sized + 'static {
    /// Discriminant of the populated variant.
    fn tag(&self) -> &'static str;

    /// Every declared tag, in declaration order.
    fn tags() -> Vec<&'static str>;
}

impl FailureSet for Nil {
    fn tag(&self) -> &'static str {
        match *self {}
    }

    fn tags() -> Vec<&'static str> {
        Vec::new()
    }
}

impl<H: Tagged, T: FailureSet> FailureSet for Or<H, T> {
    fn tag(&self) -> &'static str {
        match self {
            Or::Head(_) => H::TAG,
            Or::Tail(tail) => tail.tag(),
        }
    }

    fn tags() -> Vec<&'static str> {
        let mut tags = vec![H::TAG];
        tags.extend(T::tags());
        tags
    }
}

/// Places a single failure `E` into the union, at index `I`.
pub trait Inject<E, I> {
    fn inject(error: E) -> Self;
}

impl<H, T> Inject<H, Here> for Or<H, T> {
    fn inject(error: H) -> Self {
        Or::Head(error)
    }
}

impl<H, T, E, I> Inject<E, There<I>> for Or<H, T>
where
    T: Inject<E, I>,
{
    fn inject(error: E) -> Self {
        Or::Tail(T::inject(error))
    }
}

/// Takes `E` out of the union.
///
/// On a miss the value comes back unchanged as `Remainder`, the same union
/// without `E`.
pub trait Pluck<E, I>: Sized {
    type Remainder;

    fn pluck(self) -> Result<E, Self::Remainder>;
}

impl<H, T> Pluck<H, Here> for Or<H, T> {
    type Remainder = T;

    fn pluck(self) -> Result<H, T> {
        match self {
            Or::Head(head) => Ok(head),
            Or::Tail(tail) => Err(tail),
        }
    }
}

impl<H, T, E, I> Pluck<E, There<I>> for Or<H, T>
where
    T: Pluck<E, I>,
{
    type Remainder = Or<H, T::Remainder>;

    fn pluck(self) -> Result<E, Self::Remainder> {
        match self {
            Or::Head(head) => Err(Or::Head(head)),
            Or::Tail(tail) => tail.pluck().map_err(Or::Tail),
        }
    }
}

/// Static union of two failure sets: `Self | R`, keeping declaration order.
///
/// This is list concatenation. Putting the same tagged type in twice is a
/// design error and shows up as an ambiguous index at the recovery site.
pub trait Append<R>: Sized {
    type Output;

    /// A failure of `Self`, seen as the widened union.
    fn left(self) -> Self::Output;

    /// A failure of `R`, seen as the widened union.
    fn right(other: R) -> Self::Output;
}

impl<R> Append<R> for Nil {
    type Output = R;

    fn left(self) -> R {
        match self {}
    }

    fn right(other: R) -> R {
        other
    }
}

impl<H, T, R> Append<R> for Or<H, T>
where
    T: Append<R>,
{
    type Output = Or<H, T::Output>;

    fn left(self) -> Self::Output {
        match self {
            Or::Head(head) => Or::Head(head),
            Or::Tail(tail) => Or::Tail(tail.left()),
        }
    }

    fn right(other: R) -> Self::Output {
        Or::Tail(T::right(other))
    }
}

/// Moves every failure of `Self` into the larger union `Target`.
///
/// `Indices` is inferred; it records where each member of `Self` lives in
/// `Target`.
pub trait Embed<Target, Indices> {
    fn embed(self) -> Target;
}

impl<Target> Embed<Target, ()> for Nil {
    fn embed(self) -> Target {
        match self {}
    }
}

impl<H, T, Target, HI, TI> Embed<Target, (HI, TI)> for Or<H, T>
where
    Target: Inject<H, HI>,
    T: Embed<Target, TI>,
{
    fn embed(self) -> Target {
        match self {
            Or::Head(head) => Target::inject(head),
            Or::Tail(tail) => tail.embed(),
        }
    }
}

impl Serialize for Nil {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        match *self {}
    }
}

impl fmt::Display for Nil {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl<H: fmt::Display, T: fmt::Display> fmt::Display for Or<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Or::Head(head) => head.fmt(f),
            Or::Tail(tail) => tail.fmt(f),
        }
    }
}
