use arcd_core::service::{AcceptDuel, ChooseWeapon, StartDuel};
use arcd_sdk::objects::{ChooseWeaponRequest, StartDuelRequest, UserRequest};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// `POST /duels`: challenge a user, or anyone when no target is given.
pub(super) async fn start_duel(
    state: State<AppState>,
    Json(payload): Json<StartDuelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(StartDuel {
            challenger: payload.challenger,
            target: payload.target,
            wager: payload.wager,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// `POST /duels/accept`: accept the duel aimed at the user, or an open one.
pub(super) async fn accept_duel(
    state: State<AppState>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(AcceptDuel { user: payload.user })
        .await?;
    Ok(Json(summary))
}

/// `POST /duels/weapon`
pub(super) async fn choose_weapon(
    state: State<AppState>,
    Json(payload): Json<ChooseWeaponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .service
        .process(ChooseWeapon {
            user: payload.user,
            weapon: payload.weapon,
        })
        .await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{TestApp, decode};
    use arcd_sdk::objects::{EventState, EventSummary, MessageResponse};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_duel_flow() {
        let app = TestApp::new(&[("alice", 100), ("bob", 100)], &[]);

        let (status, started) = app
            .post(
                "/api/v1/duels",
                json!({ "challenger": "Alice", "target": "@bob", "wager": 30 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let started: EventSummary = decode(started);
        assert_eq!(started.state, EventState::BoardingCompleted);
        assert_eq!(started.participants.len(), 1);

        let (status, _) = app
            .post("/api/v1/duels/accept", json!({ "user": "bob" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        app.post("/api/v1/duels/weapon", json!({ "user": "alice", "weapon": "rock" }))
            .await;
        let (status, resolved) = app
            .post("/api/v1/duels/weapon", json!({ "user": "bob", "weapon": "scissors" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let resolved: EventSummary = decode(resolved);
        assert_eq!(resolved.id, started.id);
        assert_eq!(resolved.state, EventState::Ended);

        let (_, balance) = app.get("/api/v1/balances/alice").await;
        assert_eq!(balance["points"], 130);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_duel_conflicts() {
        let app = TestApp::new(&[("alice", 100), ("carol", 100)], &[]);
        app.post("/api/v1/duels", json!({ "challenger": "alice", "wager": 10 }))
            .await;

        let (status, body) = app
            .post("/api/v1/duels", json!({ "challenger": "carol", "wager": 10 }))
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        let message: MessageResponse = decode(body);
        assert!(!message.message.is_empty());
        let (_, balance) = app.get("/api/v1/balances/carol").await;
        assert_eq!(balance["points"], 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_weapon_without_duel() {
        let app = TestApp::new(&[("alice", 100)], &[]);

        let (status, _) = app
            .post("/api/v1/duels/weapon", json!({ "user": "alice", "weapon": "paper" }))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_weapon_is_rejected_by_extractor() {
        let app = TestApp::new(&[("alice", 100)], &[]);

        let (status, _) = app
            .post("/api/v1/duels/weapon", json!({ "user": "alice", "weapon": "lizard" }))
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
