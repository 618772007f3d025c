use arcd_core::service::EnterArena;
use arcd_sdk::objects::WagerRequest;
use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// `POST /arenas`: enter the open arena, or open one.
pub(super) async fn enter_arena(
    state: State<AppState>,
    Json(payload): Json<WagerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(EnterArena {
            user: payload.user,
            wager: payload.wager,
        })
        .await?;
    Ok(Json(summary))
}
