//! Tagged trait - 失敗型と discriminant (tag) の対応付け
//!
//! # 学習ポイント
//! - Associated Constants (`const TAG`)
//! - tag は型ごとに 1 つだけ。union の中で重複させるのは設計ミス

/// Tagged は具体的な失敗型に一意な tag を与える
///
/// # 使用例
/// ```
/// use faultline_core::Tagged;
///
/// #[derive(Debug)]
/// struct DivideByZeroError {
///     a: f64,
///     b: f64,
/// }
///
/// impl Tagged for DivideByZeroError {
///     const TAG: &'static str = "DivideByZeroError";
/// }
///
/// assert_eq!(DivideByZeroError::TAG, "DivideByZeroError");
/// ```
///
/// # Trait Bounds
/// - `'static`: interpreter の中で `Box<dyn Any>` として型消去されるため
pub trait Tagged: 'static {
    /// recovery dispatch に使う discriminant
    const TAG: &'static str;
}

/// Returns the tag of `E` without needing a value.
pub fn tag_of<E: Tagged>() -> &'static str {
    E::TAG
}
