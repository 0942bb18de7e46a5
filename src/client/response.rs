//! Fully-read upstream responses and envelope decoding.

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::client::error::ClientError;
use crate::envelope::BaseResponse;

/// Substitute for an empty-bodied 401.
const UNAUTHORIZED_ENVELOPE: &[u8] = br#"{"code":401,"status":"error","message":"Unauthorized","data":null}"#;

/// An upstream response whose body has been drained into memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    ///
    /// An empty body is `EmptyBody`, except for 401 where a fixed
    /// unauthorized envelope is decoded instead.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let body: &[u8] = if self.body.is_empty() {
            if self.status != 401 {
                return Err(ClientError::EmptyBody { status: self.status });
            }
            UNAUTHORIZED_ENVELOPE
        } else {
            &self.body
        };

        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            status: self.status,
            source,
        })
    }

    /// Decode the body as a response envelope.
    pub fn decode_envelope<T>(&self) -> Result<BaseResponse<T>, ClientError>
    where
        T: DeserializeOwned + Default,
    {
        self.decode_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResponseStatus;
    use serde_json::{json, Value};

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn decodes_envelope() {
        let envelope: BaseResponse = response(200, r#"{"code":200,"status":"success","message":"ok","data":{"id":1}}"#)
            .decode_envelope()
            .unwrap();
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data, json!({"id": 1}));
    }

    #[test]
    fn non_2xx_envelope_is_still_decoded() {
        let resp = response(404, r#"{"code":404,"status":"error","message":"no such org","data":null}"#);
        assert!(!resp.is_success());
        let envelope: BaseResponse = resp.decode_envelope().unwrap();
        assert_eq!(envelope.code, 404);
        assert_eq!(envelope.status, ResponseStatus::Error);
    }

    #[test]
    fn empty_401_becomes_unauthorized_envelope() {
        let envelope: BaseResponse = response(401, "").decode_envelope().unwrap();
        assert_eq!(envelope.code, 401);
        assert_eq!(envelope.message, "Unauthorized");
        assert_eq!(envelope.data, Value::Null);
    }

    #[test]
    fn empty_body_with_other_status_is_an_error() {
        let err = response(204, "").decode_envelope::<Value>().unwrap_err();
        assert!(matches!(err, ClientError::EmptyBody { status: 204 }));
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = response(502, "<html>bad gateway</html>").decode_envelope::<Value>().unwrap_err();
        assert!(matches!(err, ClientError::Decode { status: 502, .. }));
    }
}
