//! faultline-core
//!
//! Typed-failure computation core.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TypedResult, failure union, tag, defect）
//! - **app**: 実行層（Effect, interpreter, recovery, RunConfig）
//! - **typed**: 型のない失敗との境界（DynFailure, TagRegistry）
//! - **observability**: 実行サマリ（RunReport）
//! - **error**: crate レベルのエラー型

pub mod app;
pub mod domain;
pub mod error;
pub mod observability;
pub mod typed;

pub use app::{Effect, Exit, RunConfig, settle};
pub use domain::{
    Append, Defect, Embed, FailureSet, Inject, Nil, Or, Pluck, Tagged, TypedResult, fail, fail_with,
    succeed,
};
pub use error::FaultlineError;
pub use observability::{OutcomeKind, RunReport};
pub use typed::{DecodeFailure, DynFailure, EncodeFailure, RegistryError, TagRegistry};
