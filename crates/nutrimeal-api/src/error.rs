use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nutrimeal_db::StoreError;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can report, with its HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Transient(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", capitalize(what))),
            StoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Transient(detail) => {
                error!("Store unavailable: {}", detail);
                ApiError::Transient("Service temporarily unavailable, try again".into())
            }
            StoreError::Corrupt(detail) => {
                error!("Corrupt row: {}", detail);
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor; a malformed id is a 400 in the API error body.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        let cases = [
            (StoreError::invalid("bad"), StatusCode::BAD_REQUEST),
            (StoreError::NotFound("recipe"), StatusCode::NOT_FOUND),
            (StoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (StoreError::conflict("dup"), StatusCode::CONFLICT),
            (StoreError::Transient("busy".into()), StatusCode::SERVICE_UNAVAILABLE),
            (StoreError::Corrupt("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (store, status) in cases {
            assert_eq!(ApiError::from(store).status(), status);
        }
    }

    #[test]
    fn transient_detail_is_not_leaked() {
        let err = ApiError::from(StoreError::Transient("disk I/O error at page 7".into()));
        assert!(!err.to_string().contains("page 7"));
    }

    #[test]
    fn not_found_names_the_record() {
        let err = ApiError::from(StoreError::NotFound("recipe"));
        assert_eq!(err.to_string(), "Recipe not found");
    }
}
