//! Event kinds and the lifecycle they share.
//!
//! Every event runs Open → BoardingCompleted → Ended. Callbacks never reach
//! back into the registry; they return [`Directives`] that the
//! [`EventRegistry`](crate::registry::EventRegistry) applies after the
//! callback has released the event.

pub mod arena;
pub mod auction;
pub mod bank_heist;
pub mod card_trade;
pub mod duel;
pub mod game_event;
pub mod participation;

pub use arena::Arena;
pub use auction::Auction;
pub use bank_heist::BankHeist;
pub use card_trade::CardTrade;
pub use duel::{Duel, Duelist};
pub use game_event::GameEvent;
pub use participation::{Entrant, Participant, Participation, SharedState};

use crate::announcements::Notifier;
use crate::ledger::{CardInventory, LedgerError, PointLedger};
use arcd_sdk::objects::{EventKind, EventState, UserName, Weapon};
use async_trait::async_trait;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub type EventId = Uuid;

/// Everything an event needs from the outside world.
#[derive(Clone)]
pub struct EventContext {
    pub ledger: Arc<dyn PointLedger>,
    pub inventory: Arc<dyn CardInventory>,
    pub notifier: Arc<dyn Notifier>,
    pub channel: CompactString,
}

impl EventContext {
    pub fn new(
        ledger: Arc<dyn PointLedger>,
        inventory: Arc<dyn CardInventory>,
        notifier: Arc<dyn Notifier>,
        channel: impl Into<CompactString>,
    ) -> Self {
        Self {
            ledger,
            inventory,
            notifier,
            channel: channel.into(),
        }
    }

    pub fn announce(&self, message: impl Into<String>) {
        self.notifier.send(&self.channel, message.into());
    }
}

/// Rejections of user actions. The messages are written for the chat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("the wager must be a positive number of points, got {0}")]
    InvalidWager(i64),
    #[error("the minimum bid cannot be negative, got {0}")]
    InvalidMinimumBid(i64),
    #[error("an auction needs an item to sell")]
    EmptyItem,
    #[error("name the card you want to trade")]
    EmptyCard,
    #[error("no heist targets are configured")]
    NoHeistTiers,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("@{0}, you are already taking part")]
    AlreadyJoined(UserName),
    #[error("this {0} is no longer accepting participants")]
    NotJoinable(EventKind),
    #[error("@{0}, you are not part of this event")]
    NotParticipant(UserName),
    #[error("you cannot target yourself")]
    SelfTarget,
    #[error("@{0}, you cannot accept your own offer")]
    SelfAccept(UserName),
    #[error("@{user}, this is meant for @{target}")]
    WrongTarget { user: UserName, target: UserName },
    #[error("@{0}, you cannot bid on your own auction")]
    OwnAuction(UserName),
    #[error("the minimum bid is {minimum} points")]
    BidBelowMinimum { minimum: i64 },
    #[error("you have to bid more than the current {highest} points")]
    BidNotHigher { highest: i64 },
    #[error("@{0}, you already chose your weapon")]
    WeaponAlreadyChosen(UserName),
    #[error("weapons are chosen once the duel has been accepted")]
    DuelNotAccepted,
    #[error("@{user}, only @{host} can close this auction")]
    NotHost { user: UserName, host: UserName },
    #[error("{action} is not possible in a {kind}")]
    Unsupported { action: &'static str, kind: EventKind },
    #[error("that {0} is already over")]
    EventGone(EventKind),
}

/// Result of a conflict check against an ongoing event of the same kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected(String),
}

/// What an admission check may know about an existing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OngoingEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub state: EventState,
    pub cooling_down: bool,
}

/// Follow-up actions routed to a live event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Join { user: UserName, wager: i64 },
    Accept { user: UserName },
    Bid { user: UserName, amount: i64 },
    ChooseWeapon { user: UserName, weapon: Weapon },
    Close { user: UserName },
}

impl EventAction {
    pub fn user(&self) -> &UserName {
        match self {
            EventAction::Join { user, .. }
            | EventAction::Accept { user }
            | EventAction::Bid { user, .. }
            | EventAction::ChooseWeapon { user, .. }
            | EventAction::Close { user } => user,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventAction::Join { .. } => "joining",
            EventAction::Accept { .. } => "accepting",
            EventAction::Bid { .. } => "bidding",
            EventAction::ChooseWeapon { .. } => "choosing a weapon",
            EventAction::Close { .. } => "closing",
        }
    }

    pub(crate) fn unsupported(&self, kind: EventKind) -> EventError {
        EventError::Unsupported {
            action: self.name(),
            kind,
        }
    }
}

/// Event-specific timers, beyond the participation window and cooldown
/// that the registry runs for every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTimer {
    WeaponDeadline,
    AuctionTick,
    AuctionStatus,
    Reveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Schedule { timer: EventTimer, after: Duration },
    /// Deregister now, no cooldown.
    Stop,
    /// Stay tracked, non-joinable, until the cooldown elapses.
    Cooldown,
}

pub type Directives = SmallVec<[Directive; 2]>;

pub(crate) fn schedule(timer: EventTimer, after: Duration) -> Directives {
    smallvec::smallvec![Directive::Schedule { timer, after }]
}

pub(crate) fn stop() -> Directives {
    smallvec::smallvec![Directive::Stop]
}

pub(crate) fn cooldown() -> Directives {
    smallvec::smallvec![Directive::Cooldown]
}

#[async_trait]
pub trait ParticipationEvent: Send {
    fn kind(&self) -> EventKind;

    fn shared_state(&self) -> SharedState;

    fn state(&self) -> EventState {
        self.shared_state().get()
    }

    /// `None` when the event has no fixed join phase.
    fn participation_window(&self) -> Option<Duration>;

    fn cooldown(&self) -> Duration;

    fn participants(&self) -> Vec<UserName>;

    /// Decide whether this event may start while `other` is tracked.
    ///
    /// Only called for events of the same kind. Must not have side effects.
    fn check_for_ongoing_event(&self, other: &OngoingEvent, user: &UserName) -> Admission;

    /// Initial broadcast and first escrow. Runs once, right after admission.
    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError>;

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError>;

    /// Fires once when the participation window elapses, unless the event
    /// already ended by other means.
    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError>;

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        let _ = (timer, ctx);
        Ok(Directives::new())
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext);

    /// Return everything held in escrow. Used on shutdown.
    async fn abort(&mut self, ctx: &EventContext);
}
