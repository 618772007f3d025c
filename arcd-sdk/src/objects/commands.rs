//! Request and response bodies of the command API.

use crate::objects::games::{EventKind, EventState, TradeAsk, Weapon};
use crate::objects::user::UserName;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDuelRequest {
    pub challenger: UserName,
    /// Leave empty for an open challenge anyone may accept.
    #[serde(default)]
    pub target: Option<UserName>,
    pub wager: i64,
}

/// Body of actions that only need to know who is acting
/// (accepting a duel or a trade, closing an auction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub user: UserName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooseWeaponRequest {
    pub user: UserName,
    pub weapon: Weapon,
}

/// Entering a heist or an arena: joins the open one or starts a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerRequest {
    pub user: UserName,
    pub wager: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAuctionRequest {
    pub host: UserName,
    pub item: String,
    #[serde(default)]
    pub minimum_bid: i64,
    /// Without a duration the auction runs until the host closes it.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    pub user: UserName,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTradeRequest {
    pub user: UserName,
    pub offered_card: String,
    pub ask: TradeAsk,
    #[serde(default)]
    pub target: Option<UserName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub kind: Option<EventKind>,
}

/// Snapshot of a tracked event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub kind: EventKind,
    pub state: EventState,
    /// The event has concluded and is holding back new events of its kind.
    pub cooling_down: bool,
    pub participants: Vec<UserName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user: UserName,
    pub points: i64,
}

/// Error body; `message` is ready to be relayed to chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_trade_parsing() {
        let json = r#"{
            "user": "Alice",
            "offered_card": "Golden Kappa",
            "ask": { "points": 500 }
        }"#;
        let request: OfferTradeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.user.as_str(), "alice");
        assert_eq!(request.ask, TradeAsk::Points(500));
        assert!(request.target.is_none());
    }

    #[test]
    fn test_auction_defaults() {
        let json = r#"{ "host": "streamer", "item": "Signed mousepad" }"#;
        let request: StartAuctionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.minimum_bid, 0);
        assert_eq!(request.duration_secs, None);
    }
}
