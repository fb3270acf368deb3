//! The uniform `{data, errmsg, errno}` wrapper every endpoint responds with.
//!
//! Failure detection is two-layered. A 4xx/5xx transport status fails
//! immediately with the status text and the body is never read as an
//! envelope. A 2xx status is decoded, and a non-zero `errno` inside it is
//! still a failure.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::Error;

/// Decoded response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub errmsg: String,
    pub errno: i64,
}

/// The `data` member of a successful envelope, with typed projections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseData(Value);

impl ResponseData {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The whole payload as an object. A `null` payload is an empty map.
    pub fn into_map(self) -> Result<Map<String, Value>, Error> {
        match self.0 {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(Error::shape("data", "an object")),
        }
    }

    /// Look up a top-level key of an object payload.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Project a string field.
    pub fn str_field(&self, key: &str) -> Result<&str, Error> {
        self.field(key)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::shape(key, "a string"))
    }

    /// Project an array field, taking ownership of its elements.
    pub fn take_array(&mut self, key: &str) -> Result<Vec<Value>, Error> {
        match self.0.get_mut(key).map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(Error::shape(key, "an array")),
        }
    }
}

/// Check a response's status and body and return its `data` member.
pub fn unpack(status: StatusCode, body: &[u8]) -> Result<ResponseData, Error> {
    if status.as_u16() >= 400 {
        return Err(Error::Server {
            status: Some(status.as_u16()),
            message: status.to_string(),
        });
    }

    let envelope: BaseResponse =
        serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))?;

    if envelope.errno != 0 {
        return Err(Error::Server {
            status: None,
            message: envelope.errmsg,
        });
    }

    Ok(ResponseData(envelope.data))
}

/// Read a response to completion and [`unpack`] it.
pub async fn unpack_response(response: reqwest::Response) -> Result<ResponseData, Error> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return unpack(status, &[]);
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;
    unpack(status, &body)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn transport_failure_skips_body() {
        let err = unpack(StatusCode::INTERNAL_SERVER_ERROR, b"definitely not json").unwrap_err();
        match err {
            Error::Server { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "500 Internal Server Error");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_ignores_structured_body() {
        let body = br#"{"errno":0,"errmsg":"","data":{"id":"abc"}}"#;
        let err = unpack(StatusCode::NOT_FOUND, body).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn application_failure_uses_errmsg() {
        let body = br#"{"errno":1,"errmsg":"x","data":null}"#;
        let err = unpack(StatusCode::OK, body).unwrap_err();
        match err {
            Error::Server { status, message } => {
                assert_eq!(status, None);
                assert_eq!(message, "x");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn success_exposes_data() {
        let body = br#"{"errno":0,"data":{"id":"abc"}}"#;
        let data = unpack(StatusCode::OK, body).unwrap();
        assert_eq!(data.str_field("id").unwrap(), "abc");
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = unpack(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn body_without_errno_is_decode_error() {
        let err = unpack(StatusCode::OK, br#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn null_data_is_empty_map() {
        let data = unpack(StatusCode::OK, br#"{"errno":0,"errmsg":"","data":null}"#).unwrap();
        assert!(data.into_map().unwrap().is_empty());
    }

    #[test]
    fn projections_report_shape_errors() {
        let mut data = ResponseData::new(json!({"id": 7, "ids": "nope"}));
        assert!(matches!(
            data.str_field("id"),
            Err(Error::ResponseShape { .. })
        ));
        assert!(matches!(
            data.str_field("missing"),
            Err(Error::ResponseShape { .. })
        ));
        assert!(matches!(
            data.take_array("ids"),
            Err(Error::ResponseShape { .. })
        ));
    }

    #[test]
    fn take_array_moves_elements_out() {
        let mut data = ResponseData::new(json!({"ids": ["a", "b"]}));
        let ids = data.take_array("ids").unwrap();
        assert_eq!(ids, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn list_payload_is_not_an_object() {
        let data = ResponseData::new(json!([1, 2]));
        assert!(data.into_map().is_err());
    }
}
