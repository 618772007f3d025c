use arcd_core::service::{GetBalance, ListEvents};
use arcd_sdk::objects::{ListEventsQuery, UserName};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// `GET /events`: every tracked event, cooling ones included.
pub(super) async fn list_events(
    state: State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state
        .service
        .process(ListEvents { kind: query.kind })
        .await?;
    Ok(Json(summaries))
}

/// `GET /balances/{user}`
pub(super) async fn get_balance(
    state: State<AppState>,
    Path(user): Path<UserName>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.service.process(GetBalance { user }).await?;
    Ok(Json(balance))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{TestApp, decode};
    use arcd_sdk::objects::{BalanceResponse, EventKind, EventSummary};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_list_events_filters_by_kind() {
        let app = TestApp::new(&[("alice", 100), ("bob", 100)], &[]);
        app.post("/api/v1/duels", json!({ "challenger": "alice", "wager": 10 }))
            .await;
        app.post("/api/v1/arenas", json!({ "user": "bob", "wager": 10 }))
            .await;

        let (status, all) = app.get("/api/v1/events").await;
        assert_eq!(status, StatusCode::OK);
        let all: Vec<EventSummary> = decode(all);
        assert_eq!(all.len(), 2);

        let (_, duels) = app.get("/api/v1/events?kind=duel").await;
        let duels: Vec<EventSummary> = decode(duels);
        assert_eq!(duels.len(), 1);
        assert_eq!(duels[0].kind, EventKind::Duel);

        let (status, _) = app.get("/api/v1/events?kind=lottery").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balance_normalises_user() {
        let app = TestApp::new(&[("alice", 42)], &[]);

        let (status, body) = app.get("/api/v1/balances/Alice").await;

        assert_eq!(status, StatusCode::OK);
        let balance: BalanceResponse = decode(body);
        assert_eq!(balance.user.as_str(), "alice");
        assert_eq!(balance.points, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_shutdown() {
        let app = TestApp::new(&[("alice", 100)], &[]);
        app.post("/api/v1/heists", json!({ "user": "alice", "wager": 40 }))
            .await;

        app.state.service.registry().shutdown().await;

        let (_, balance) = app.get("/api/v1/balances/alice").await;
        assert_eq!(balance["points"], 100);
        let (status, _) = app
            .post("/api/v1/arenas", json!({ "user": "alice", "wager": 10 }))
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
