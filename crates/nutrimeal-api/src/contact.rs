use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use nutrimeal_types::api::{ContactRequest, ContactResponse};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson};
use crate::store::blocking;

/// POST /api/contact
pub async fn submit_query(
    State(state): State<AppState>,
    AppJson(req): AppJson<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query_id = blocking(&state, move |db| {
        db.submit_query(req.name.as_deref(), req.email.as_deref(), req.message.as_deref())
    })
    .await?;

    info!("Contact query {} received", query_id);
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            query_id,
            message: "Thanks, we'll get back to you soon".into(),
        }),
    ))
}
