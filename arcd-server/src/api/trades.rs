use arcd_core::service::{AcceptTrade, OfferTrade};
use arcd_sdk::objects::{OfferTradeRequest, UserRequest};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// `POST /trades`: put a card up for trade. The card is held until the
/// trade completes or expires.
pub(super) async fn offer_trade(
    state: State<AppState>,
    Json(payload): Json<OfferTradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(OfferTrade {
            user: payload.user,
            offered_card: payload.offered_card,
            ask: payload.ask,
            target: payload.target,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// `POST /trades/accept`
pub(super) async fn accept_trade(
    state: State<AppState>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(AcceptTrade { user: payload.user })
        .await?;
    Ok(Json(summary))
}
