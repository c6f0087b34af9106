//! Defects - 宣言された union の外側で起きた失敗
//!
//! Defect は expected failure と混ぜてはいけない。`Tagged` を実装しないので
//! `catch_tag` に渡ることは型の上で起こり得ない。

use std::any::Any;

use thiserror::Error;

/// A failure outside the declared failure set of a chain.
///
/// Defects are never dispatched by tag. The only thing a caller can do with
/// one is observe it (log it) and let it escape.
#[derive(Debug, Error)]
pub enum Defect {
    #[error("stage {stage} panicked: {message}")]
    Panic { stage: usize, message: String },

    #[error("undeclared failure tag '{tag}' (declared: {declared:?})")]
    UnknownTag {
        tag: String,
        declared: Vec<&'static str>,
    },

    #[error("payload for tag '{tag}' is malformed: {reason}")]
    MalformedPayload { tag: String, reason: String },

    #[error("interpreter invariant broken: {0}")]
    Internal(String),

    #[error(transparent)]
    Fault(Box<dyn std::error::Error + Send + Sync>),
}

impl Defect {
    /// Wraps a fault from a layer the chain did not model.
    pub fn fault(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Defect::Fault(err.into())
    }

    /// Builds a defect from a caught panic payload.
    pub fn from_panic(stage: usize, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Defect::Panic { stage, message }
    }

    /// Short machine-friendly name of the defect kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Defect::Panic { .. } => "panic",
            Defect::UnknownTag { .. } => "unknown_tag",
            Defect::MalformedPayload { .. } => "malformed_payload",
            Defect::Internal(_) => "internal",
            Defect::Fault(_) => "fault",
        }
    }
}
