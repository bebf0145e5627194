//! Request body extraction with validation

use crate::error::ApiError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use devconnector_shared::validation::{collect_messages, FieldOrder};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON becomes a 400 with the parser's message; rule failures
/// become a 400 listing every message in field declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|errors| ApiError::Validation(collect_messages(&errors, T::FIELDS)))?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};
    use devconnector_shared::{ExperienceRequest, RegisterRequest};

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let req = json_request(r#"{"name":"Ada","email":"a@b.com","password":"secret1"}"#);
        let ValidatedJson(body) = ValidatedJson::<RegisterRequest>::from_request(req, &())
            .await
            .unwrap();

        assert_eq!(body.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_rule_failures_are_listed() {
        let req = json_request(r#"{"name":"","email":"nope","password":"123"}"#);
        let rejection = ValidatedJson::<RegisterRequest>::from_request(req, &())
            .await
            .unwrap_err();

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        let messages: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["msg"].as_str().unwrap())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Name is required",
                "Please include a valid email",
                "Please enter a password with 6 or more characters",
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_date_is_listed_as_validation_error() {
        let req = json_request(r#"{"title":"Engineer","company":"Acme","from":"31/01/2020"}"#);
        let rejection = ValidatedJson::<ExperienceRequest>::from_request(req, &())
            .await
            .unwrap_err();

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["msg"], "From date is not a valid date");
        assert!(body.get("msg").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = json_request("{not json");
        let rejection = ValidatedJson::<RegisterRequest>::from_request(req, &())
            .await
            .unwrap_err();

        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
