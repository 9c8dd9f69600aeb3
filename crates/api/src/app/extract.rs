use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::app::errors::ApiError;

/// JSON request body whose rejections use the API error envelope.
///
/// Plain `Json` answers a bad body with a text 400/415/422. This wrapper turns
/// every body failure into a 400 `validation_error`, so clients see one shape
/// for all input problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
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

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            message: rejection.body_text(),
            fields: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{self, header, StatusCode};

    use folio_auth::RegistrationForm;
    use folio_library::BookForm;

    use super::*;

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_fields_reach_form_validation() {
        let ApiJson(mut form) = ApiJson::<RegistrationForm>::from_request(
            json_request(r#"{"username":"alice","password1":"long-enough-1","password2":"long-enough-1"}"#),
            &(),
        )
        .await
        .unwrap();

        let err = ApiError::from(form.clean().unwrap_err());
        let ApiError::Validation { fields: Some(fields), .. } = err else {
            panic!("expected field errors");
        };
        assert_eq!(fields.get("email").unwrap(), ["This field is required.".to_string()]);
    }

    #[tokio::test]
    async fn malformed_ids_are_validation_errors() {
        let err = ApiJson::<BookForm>::from_request(
            json_request(r#"{"title":"Dune","author_id":"not-a-uuid","library_id":"also-not"}"#),
            &(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn wrong_content_type_is_a_validation_error() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("content=hi"))
            .unwrap();

        let err = ApiJson::<folio_blog::CommentForm>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn syntax_errors_are_validation_errors() {
        let err = ApiJson::<folio_blog::CommentForm>::from_request(json_request("{\"content\":"), &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }
}
