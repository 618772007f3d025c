use arcd_core::service::EnterHeist;
use arcd_sdk::objects::WagerRequest;
use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// `POST /heists`: join the gathering crew, or plan a new heist.
pub(super) async fn enter_heist(
    state: State<AppState>,
    Json(payload): Json<WagerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(EnterHeist {
            user: payload.user,
            wager: payload.wager,
        })
        .await?;
    Ok(Json(summary))
}
