//! Untyped failure boundary.
//!
//! Failures that arrive from a layer the chain did not model come in as
//! `DynFailure`: a tag plus a JSON payload, e.g.
//! `{"_tag": "DivideByZeroError", "a": 10, "b": 0}`. Decoding one into a
//! declared union either yields an expected failure or a [`Defect`]; an
//! unknown tag is never treated as an expected failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::TagRegistry;
use crate::app::{Effect, Exit};
use crate::domain::{Defect, FailureSet, Nil, Or, Tagged, TypedResult};

/// A failure whose type is only known by its tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynFailure {
    #[serde(rename = "_tag")]
    pub tag: String,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl DynFailure {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decoding from a `DynFailure` into a closed union.
pub trait DecodeFailure: FailureSet {
    /// `Ok(None)` when no member of this (sub)list carries `failure.tag`.
    fn try_decode(failure: &DynFailure) -> Result<Option<Self>, Defect>;

    /// Decodes `failure`, routing undeclared tags and bad payloads to the
    /// defect channel.
    fn decode(failure: DynFailure) -> Result<Self, Defect> {
        let registry = TagRegistry::of::<Self>().map_err(|err| Defect::Internal(err.to_string()))?;
        if !registry.contains(&failure.tag) {
            return Err(Defect::UnknownTag {
                tag: failure.tag,
                declared: registry.registered_tags(),
            });
        }
        Self::try_decode(&failure)?.ok_or_else(|| {
            Defect::Internal(format!("tag '{}' is registered but not decodable", failure.tag))
        })
    }
}

impl DecodeFailure for Nil {
    fn try_decode(_failure: &DynFailure) -> Result<Option<Self>, Defect> {
        Ok(None)
    }
}

impl<H, T> DecodeFailure for Or<H, T>
where
    H: Tagged + DeserializeOwned,
    T: DecodeFailure,
{
    fn try_decode(failure: &DynFailure) -> Result<Option<Self>, Defect> {
        if failure.tag != H::TAG {
            return Ok(T::try_decode(failure)?.map(Or::Tail));
        }
        decode_payload::<H>(&failure.payload)
            .map(|head| Some(Or::Head(head)))
            .map_err(|err| Defect::MalformedPayload {
                tag: failure.tag.clone(),
                reason: err.to_string(),
            })
    }
}

/// Payloads are stored as JSON objects. Unit structs encode to `null` and
/// non-object values are wrapped as `{"value": ...}`, so both shapes are
/// tried as fallbacks.
fn decode_payload<H: DeserializeOwned>(payload: &Map<String, Value>) -> Result<H, serde_json::Error> {
    let err = match serde_json::from_value(Value::Object(payload.clone())) {
        Ok(head) => return Ok(head),
        Err(err) => err,
    };
    if payload.is_empty() {
        return serde_json::from_value(Value::Null).map_err(|_| err);
    }
    match payload.get("value") {
        Some(inner) if payload.len() == 1 => serde_json::from_value(inner.clone()).map_err(|_| err),
        _ => Err(err),
    }
}

/// Encoding a member of a closed union as a `DynFailure`.
pub trait EncodeFailure: FailureSet {
    fn encode(&self) -> Result<DynFailure, Defect>;
}

impl EncodeFailure for Nil {
    fn encode(&self) -> Result<DynFailure, Defect> {
        match *self {}
    }
}

impl<H, T> EncodeFailure for Or<H, T>
where
    H: Tagged + Serialize,
    T: EncodeFailure,
{
    fn encode(&self) -> Result<DynFailure, Defect> {
        let head = match self {
            Or::Head(head) => head,
            Or::Tail(tail) => return tail.encode(),
        };
        let value = serde_json::to_value(head).map_err(|err| Defect::MalformedPayload {
            tag: H::TAG.to_string(),
            reason: err.to_string(),
        })?;
        let payload = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Ok(DynFailure {
            tag: H::TAG.to_string(),
            payload,
        })
    }
}

impl<V, F: DecodeFailure> TypedResult<V, F> {
    /// Lifts an untyped result into the declared union.
    pub fn from_dyn(result: Result<V, DynFailure>) -> Exit<V, F> {
        match result {
            Ok(value) => Ok(TypedResult::Success(value)),
            Err(failure) => F::decode(failure).map(TypedResult::Failure),
        }
    }
}

impl<V, F: EncodeFailure> TypedResult<V, F> {
    /// Erases the failure type, keeping its tag and payload.
    pub fn into_dyn(self) -> Result<Result<V, DynFailure>, Defect> {
        match self {
            TypedResult::Success(value) => Ok(Ok(value)),
            TypedResult::Failure(failure) => failure.encode().map(Err),
        }
    }
}

impl<V: 'static, F: DecodeFailure> Effect<V, F> {
    /// Starts an effect from an untyped result. An undeclared tag makes the
    /// effect die with [`Defect::UnknownTag`] before any step runs.
    pub fn from_dyn(result: Result<V, DynFailure>) -> Self {
        match TypedResult::from_dyn(result) {
            Ok(result) => Effect::from_result(result),
            Err(defect) => Effect::die(defect),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::Failures;
    use crate::domain::tag::fixtures::{BarError, DivideByZeroError, FooError};
    use rstest::rstest;

    type Declared = Failures![DivideByZeroError, FooError, BarError];

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marker;

    impl Tagged for Marker {
        const TAG: &'static str = "Marker";
    }

    #[test]
    fn dyn_failure_json_shape() {
        let d = DynFailure::from_json(r#"{"_tag":"DivideByZeroError","a":10.0,"b":0.0}"#).unwrap();
        assert_eq!(d.tag, "DivideByZeroError");
        assert_eq!(d.payload.len(), 2);

        let back = d.to_json().unwrap();
        let v: Value = serde_json::from_str(&back).unwrap();
        assert_eq!(v["_tag"], "DivideByZeroError");
        assert_eq!(v["a"], 10.0);
    }

    #[test]
    fn decode_known_tag() {
        let d = DynFailure::new("DivideByZeroError")
            .with_field("a", 10.0)
            .with_field("b", 0.0);
        let failure = Declared::decode(d).unwrap();
        assert_eq!(failure.tag(), "DivideByZeroError");
        assert_eq!(failure, Or::Head(DivideByZeroError { a: 10.0, b: 0.0 }));
    }

    #[test]
    fn decode_unknown_tag_is_defect() {
        let defect = Declared::decode(DynFailure::new("UnknownFault")).unwrap_err();
        match defect {
            Defect::UnknownTag { tag, declared } => {
                assert_eq!(tag, "UnknownFault");
                assert_eq!(declared, vec!["DivideByZeroError", "FooError", "BarError"]);
            }
            other => panic!("unexpected defect: {other}"),
        }
    }

    #[test]
    fn decode_bad_payload_is_defect() {
        let d = DynFailure::new("BarError").with_field("input", 42);
        let defect = Declared::decode(d).unwrap_err();
        assert!(matches!(defect, Defect::MalformedPayload { ref tag, .. } if tag == "BarError"));
    }

    #[rstest]
    #[case::empty_struct(DynFailure::new("FooError"), "FooError")]
    #[case::unit_struct(DynFailure::new("Marker"), "Marker")]
    fn decode_payloadless_failures(#[case] input: DynFailure, #[case] expected: &str) {
        let failure = <Failures![FooError, Marker]>::decode(input).unwrap();
        assert_eq!(failure.tag(), expected);
    }

    #[test]
    fn encode_keeps_tag_and_fields() {
        let failure: Declared = Or::Tail(Or::Tail(Or::Head(BarError {
            input: "abc".to_string(),
        })));
        let d = failure.encode().unwrap();
        assert_eq!(d.tag, "BarError");
        assert_eq!(d.payload["input"], "abc");

        let unit: Failures![Marker] = Or::Head(Marker);
        assert!(unit.encode().unwrap().payload.is_empty());
    }

    #[test]
    fn typed_result_into_dyn_and_back() {
        let r: TypedResult<u8, Declared> = TypedResult::raise(FooError {});
        let erased = r.into_dyn().unwrap();
        let again: TypedResult<u8, Declared> = TypedResult::from_dyn(erased).unwrap();
        assert_eq!(again.failure_tag(), Some("FooError"));
    }

    #[test]
    fn effect_from_dyn_unknown_tag_dies_before_steps() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let exit = Effect::<u8, Declared>::from_dyn(Err(DynFailure::new("UnknownFault")))
            .map(move |n| {
                flag.set(true);
                n
            })
            .catch_tag(|_: FooError| 0)
            .run();
        assert!(!ran.get());
        assert!(matches!(exit, Err(Defect::UnknownTag { .. })));
    }
}
