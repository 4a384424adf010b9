use nutrimeal_db::{Database, StoreError};
use tracing::{error, warn};

use crate::auth::AppState;
use crate::error::ApiError;

/// Runs a blocking store call off the async runtime, bounded by the
/// configured store timeout. An elapsed timeout is reported as `Transient`.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.clone();
    let limit = state.store_timeout;
    let task = tokio::task::spawn_blocking(move || f(&db.db));

    match tokio::time::timeout(limit, task).await {
        Err(_) => {
            warn!("Store call exceeded {:?}", limit);
            Err(ApiError::Transient("Service temporarily unavailable, try again".into()))
        }
        Ok(Err(e)) => {
            error!("spawn_blocking join error: {}", e);
            Err(ApiError::Internal)
        }
        Ok(Ok(result)) => result.map_err(ApiError::from),
    }
}
