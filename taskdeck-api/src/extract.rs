/// Request extractors
///
/// - [`ValidatedJson`]: JSON body that has passed its `validator` rules
/// - [`parse_id`]: path ID parsing with a 400 distinct from the ownership 404

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body deserialized and validated before the handler runs
///
/// Malformed JSON, a wrong content type and failed validation rules all
/// reject with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Parses a path segment as a resource ID
///
/// Anything that is not a positive integer is rejected with
/// "Invalid {kind} ID" before any ownership check runs.
pub fn parse_id(raw: &str, kind: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} ID", kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Body1 {
        #[validate(length(min = 3))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "task").unwrap(), 42);

        for raw in ["0", "-1", "abc", "", "4.2", "99999999999999999999"] {
            let err = parse_id(raw, "task").unwrap_err();
            assert_eq!(err.to_string(), "Bad request: Invalid task ID", "{raw}");
        }
    }

    #[tokio::test]
    async fn test_validated_json_accepts_valid_body() {
        let ValidatedJson(body) =
            ValidatedJson::<Body1>::from_request(json_request(r#"{"name": "abc"}"#), &())
                .await
                .unwrap();
        assert_eq!(body.name, "abc");
    }

    #[tokio::test]
    async fn test_validated_json_rejections_are_bad_request() {
        for raw in [r#"{"name": "ab"}"#, r#"{"name": 5}"#, "not json"] {
            let err = ValidatedJson::<Body1>::from_request(json_request(raw), &())
                .await
                .unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}
