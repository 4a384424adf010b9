use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use nutrimeal_types::api::{Claims, MealPlanRequest, MealPlanResponse, MessageResponse};
use nutrimeal_types::models::{Day, ExportRow, MealPlanEntry, MealSlot};

use crate::auth::AppState;
use crate::error::{ApiError, AppJson, AppPath};
use crate::export;
use crate::store::blocking;

const EMPTY_PLAN: &str = "Your meal plan is empty. Nothing to download.";

/// POST /api/mealplan
///
/// Fills the (day, slot) cell, replacing any recipe already there.
pub async fn upsert_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<MealPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe_id = req
        .recipe_id
        .ok_or_else(|| ApiError::invalid("recipe_id is required"))?;
    let day: Day = req
        .day_of_week
        .as_deref()
        .ok_or_else(|| ApiError::invalid("day_of_week is required"))?
        .parse()
        .map_err(|e| ApiError::invalid(format!("{}", e)))?;
    let slot: MealSlot = req
        .meal_type
        .as_deref()
        .ok_or_else(|| ApiError::invalid("meal_type is required"))?
        .parse()
        .map_err(|e| ApiError::invalid(format!("{}", e)))?;

    let user_id = claims.sub;
    let entry_id = blocking(&state, move |db| db.assign_meal(user_id, day, slot, recipe_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(MealPlanResponse {
            entry_id,
            message: format!("{} {} updated", day, slot),
        }),
    ))
}

/// GET /api/mealplan
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MealPlanEntry>>, ApiError> {
    let user_id = claims.sub;
    let entries = blocking(&state, move |db| db.list_meals(user_id)).await?;
    Ok(Json(entries))
}

/// DELETE /api/mealplan/{id}
pub async fn remove_entry(
    State(state): State<AppState>,
    AppPath(entry_id): AppPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = claims.sub;
    blocking(&state, move |db| db.remove_meal(entry_id, user_id)).await?;
    Ok(Json(MessageResponse::new("Meal removed from plan")))
}

/// GET /api/mealplan/download
pub async fn download_csv(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, claims.sub).await?;

    let body = export::to_csv(&rows).map_err(|e| {
        error!("CSV export failed: {}", e);
        ApiError::Internal
    })?;

    Ok(attachment("text/csv; charset=utf-8", "mealplan.csv", body))
}

/// GET /api/mealplan/pdf
pub async fn download_pdf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let rows = export_rows(&state, claims.sub).await?;

    // Layout is CPU-bound and reads font files.
    let font_dir = state.pdf_font_dir.clone();
    let body = tokio::task::spawn_blocking(move || export::to_pdf(&rows, &font_dir))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("PDF export failed: {}", e);
            ApiError::Internal
        })?;

    Ok(attachment("application/pdf", "MealPlan.pdf", body))
}

async fn export_rows(state: &AppState, user_id: Uuid) -> Result<Vec<ExportRow>, ApiError> {
    let rows = blocking(state, move |db| db.export_meals(user_id)).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(EMPTY_PLAN.into()));
    }
    Ok(rows)
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
