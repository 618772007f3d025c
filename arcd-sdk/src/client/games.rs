use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use crate::objects::{
    BalanceResponse, BidRequest, ChooseWeaponRequest, EventKind, EventSummary, MessageResponse,
    OfferTradeRequest, StartAuctionRequest, StartDuelRequest, UserName, UserRequest, WagerRequest,
};

/// Typed HTTP client for the command API served under `/api/v1`.
#[derive(Debug, Clone)]
pub struct GamesClient {
    http: Client,
    base_url: Url,
}

impl GamesClient {
    /// * `base_url` – root URL of the server (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/events` – list tracked events, optionally of one kind.
    pub async fn list_events(&self, kind: Option<EventKind>) -> Result<Vec<EventSummary>, ClientError> {
        let mut url = self.base_url.join("/api/v1/events")?;
        if let Some(kind) = kind {
            let kind = serde_json::to_value(kind)?;
            if let Some(kind) = kind.as_str() {
                url.query_pairs_mut().append_pair("kind", kind);
            }
        }
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/balances/{user}`
    pub async fn balance(&self, user: &UserName) -> Result<BalanceResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/balances/{}", user.as_str()))?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/duels`
    pub async fn start_duel(&self, request: &StartDuelRequest) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/duels", request).await
    }

    /// `POST /api/v1/duels/accept`
    pub async fn accept_duel(&self, user: UserName) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/duels/accept", &UserRequest { user }).await
    }

    /// `POST /api/v1/duels/weapon`
    pub async fn choose_weapon(
        &self,
        request: &ChooseWeaponRequest,
    ) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/duels/weapon", request).await
    }

    /// `POST /api/v1/heists` – join the gathering heist or start one.
    pub async fn enter_heist(&self, request: &WagerRequest) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/heists", request).await
    }

    /// `POST /api/v1/auctions`
    pub async fn start_auction(
        &self,
        request: &StartAuctionRequest,
    ) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/auctions", request).await
    }

    /// `POST /api/v1/auctions/bid`
    pub async fn bid(&self, request: &BidRequest) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/auctions/bid", request).await
    }

    /// `POST /api/v1/auctions/close`
    pub async fn close_auction(&self, user: UserName) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/auctions/close", &UserRequest { user }).await
    }

    /// `POST /api/v1/arenas` – join the open arena or open one.
    pub async fn enter_arena(&self, request: &WagerRequest) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/arenas", request).await
    }

    /// `POST /api/v1/trades`
    pub async fn offer_trade(
        &self,
        request: &OfferTradeRequest,
    ) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/trades", request).await
    }

    /// `POST /api/v1/trades/accept`
    pub async fn accept_trade(&self, user: UserName) -> Result<EventSummary, ClientError> {
        self.post("/api/v1/trades/accept", &UserRequest { user }).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self.http.post(url).json(body).send().await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageResponse>(&body)
            .map(|m| m.message)
            .unwrap_or(body);
        return Err(ClientError::Api { status, message });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
