use arcd_core::service::{CloseAuction, PlaceBid, StartAuction};
use arcd_sdk::objects::{BidRequest, StartAuctionRequest, UserRequest};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use std::time::Duration;

use super::ApiError;
use crate::state::AppState;

/// `POST /auctions`: open an auction, timed when `duration_secs` is given.
pub(super) async fn start_auction(
    state: State<AppState>,
    Json(payload): Json<StartAuctionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(StartAuction {
            host: payload.host,
            item: payload.item,
            minimum_bid: payload.minimum_bid,
            duration: payload.duration_secs.map(Duration::from_secs),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// `POST /auctions/bid`
pub(super) async fn place_bid(
    state: State<AppState>,
    Json(payload): Json<BidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(PlaceBid {
            user: payload.user,
            amount: payload.amount,
        })
        .await?;
    Ok(Json(summary))
}

/// `POST /auctions/close`: only the host may close early.
pub(super) async fn close_auction(
    state: State<AppState>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(CloseAuction { user: payload.user })
        .await?;
    Ok(Json(summary))
}
