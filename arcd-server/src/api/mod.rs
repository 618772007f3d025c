//! Command API handlers.
//!
//! A thin HTTP transport for the [`GameService`](arcd_core::service::GameService)
//! commands. There is no authentication; the server is meant to sit behind
//! the chat bot that forwards commands.
//!
//! # Endpoints
//!
//! - `GET  /events`          – list tracked events, optionally `?kind=`
//! - `GET  /balances/{user}` – point balance of a user
//! - `POST /duels`           – challenge someone (or anyone) to a duel
//! - `POST /duels/accept`    – accept a pending duel
//! - `POST /duels/weapon`    – pick rock, paper or scissors
//! - `POST /heists`          – join the gathering heist or start one
//! - `POST /auctions`        – open an auction
//! - `POST /auctions/bid`    – bid on the running auction
//! - `POST /auctions/close`  – close the auction (host only)
//! - `POST /arenas`          – enter the open arena or open one
//! - `POST /trades`          – offer a card
//! - `POST /trades/accept`   – accept the pending trade

use arcd_core::events::EventError;
use arcd_core::ledger::LedgerError;
use arcd_core::service::CommandError;
use arcd_sdk::objects::MessageResponse;
use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;

mod arenas;
mod auctions;
mod duels;
mod events;
mod heists;
mod trades;

/// Build the command API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(events::list_events))
        .route("/balances/{user}", get(events::get_balance))
        .route("/duels", post(duels::start_duel))
        .route("/duels/accept", post(duels::accept_duel))
        .route("/duels/weapon", post(duels::choose_weapon))
        .route("/heists", post(heists::enter_heist))
        .route("/auctions", post(auctions::start_auction))
        .route("/auctions/bid", post(auctions::place_bid))
        .route("/auctions/close", post(auctions::close_auction))
        .route("/arenas", post(arenas::enter_arena))
        .route("/trades", post(trades::offer_trade))
        .route("/trades/accept", post(trades::accept_trade))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// A refused command. The body carries the chat-ready message.
#[derive(Debug)]
pub(crate) struct ApiError(CommandError);

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CommandError::Rejected(_) => StatusCode::CONFLICT,
            CommandError::NoEvent(_) => StatusCode::NOT_FOUND,
            CommandError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            CommandError::Invalid(EventError::EventGone(_)) => StatusCode::NOT_FOUND,
            CommandError::Invalid(EventError::Ledger(LedgerError::Backend(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CommandError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Command API ledger error");
            "internal server error".to_string()
        } else {
            tracing::debug!(status = %status, error = %self.0, "Command refused");
            self.0.to_string()
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
