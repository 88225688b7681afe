use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::shared::utils::validation::FieldError;

/// JSON request body whose decode failures are reported as validation errors.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

const DECODE_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let detail = err.body_text();
                let detail = detail.strip_prefix(DECODE_PREFIX).unwrap_or(&detail);
                ApiError::Validation(vec![field_error(detail)])
            }
            JsonRejection::JsonSyntaxError(_) => ApiError::Validation(vec![FieldError {
                field: "body".to_string(),
                message: "Request body is not valid JSON".to_string(),
            }]),
            JsonRejection::MissingJsonContentType(_) => ApiError::Validation(vec![FieldError {
                field: "body".to_string(),
                message: "Expected a JSON request body".to_string(),
            }]),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Split a decode message such as `priority: unknown variant ...` or
/// ``missing field `title` at line 1`` into the offending field and message.
fn field_error(detail: &str) -> FieldError {
    if let Some((path, message)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(char::is_whitespace) {
            return FieldError {
                field: path.to_string(),
                message: message.to_string(),
            };
        }
    }

    let field = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "body".to_string());

    FieldError {
        field,
        message: detail.to_string(),
    }
}
