//! JSON rendering of a run for stdout.

use anyhow::Context as _;
use faultline_core::{DynFailure, EncodeFailure, Exit, RunReport, TypedResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Rendered<'a, V> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a V>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<DynFailure>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a RunReport>,
}

impl<'a, V: Serialize> Rendered<'a, V> {
    pub fn new<F: EncodeFailure>(
        exit: &'a Exit<V, F>,
        report: Option<&'a RunReport>,
    ) -> anyhow::Result<Self> {
        let mut rendered = Self {
            value: None,
            failure: None,
            defect: None,
            report,
        };
        match exit {
            Ok(TypedResult::Success(value)) => rendered.value = Some(value),
            Ok(TypedResult::Failure(failure)) => {
                rendered.failure = Some(failure.encode().context("encode failure")?);
            }
            Err(defect) => rendered.defect = Some(defect.to_string()),
        }
        Ok(rendered)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serialize output")
    }
}
