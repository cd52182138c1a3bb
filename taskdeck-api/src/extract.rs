/// Extractors whose rejections speak the wire envelope
///
/// Axum's stock `Json`, `Path`, and `Query` extractors answer malformed
/// input with plain-text bodies before a handler ever runs. These
/// wrappers route every rejection through [`ApiError`] instead, so a
/// client always receives the `{"code": ..., "msg": ...}` envelope no
/// matter where in the request pipeline the failure happened.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON body extractor with enveloped rejections
///
/// A syntactically invalid body or a body that fails deserialization
/// becomes a 400 envelope; a missing `Content-Type: application/json`
/// becomes a 415 envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor with enveloped rejections
///
/// A path segment that fails to parse (e.g. a non-UUID task id) becomes
/// a 400 envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor with enveloped rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusBody;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;

    async fn envelope_of(err: ApiError) -> (StatusCode, StatusBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_json_body_uses_envelope() {
        let req = Request::builder()
            .method("POST")
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not valid json"))
            .unwrap();

        let err = ApiJson::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();

        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);
        assert!(!body.msg.is_empty());
    }

    #[tokio::test]
    async fn test_missing_json_content_type_uses_envelope() {
        let req = Request::builder()
            .method("POST")
            .uri("/users")
            .body(Body::from("{}"))
            .unwrap();

        let err = ApiJson::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();

        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body.code, 415);
    }

    #[tokio::test]
    async fn test_bad_query_value_uses_envelope() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            completed: Option<bool>,
        }

        let (mut parts, _) = Request::builder()
            .uri("/tasks?completed=banana")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let err = ApiQuery::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);
    }
}
