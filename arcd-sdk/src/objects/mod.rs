pub mod commands;
pub mod games;
pub mod user;

pub use commands::{
    BalanceResponse, BidRequest, ChooseWeaponRequest, EventSummary, ListEventsQuery,
    MessageResponse, OfferTradeRequest, StartAuctionRequest, StartDuelRequest, UserRequest,
    WagerRequest,
};
pub use games::{EventKind, EventState, InvalidWeapon, TradeAsk, Weapon};
pub use user::{InvalidUserName, UserName};
