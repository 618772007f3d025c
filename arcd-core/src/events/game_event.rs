use super::{
    Admission, Arena, Auction, BankHeist, CardTrade, Directives, Duel, EventAction, EventContext,
    EventError, EventTimer, OngoingEvent, ParticipationEvent, SharedState,
};
use arcd_sdk::objects::{EventKind, UserName};
use async_trait::async_trait;
use std::time::Duration;

/// Any event the registry can track.
pub enum GameEvent {
    Duel(Duel),
    BankHeist(BankHeist),
    Auction(Auction),
    Arena(Arena),
    CardTrade(CardTrade),
}

macro_rules! dispatch {
    ($self:expr, $event:ident => $body:expr) => {
        match $self {
            GameEvent::Duel($event) => $body,
            GameEvent::BankHeist($event) => $body,
            GameEvent::Auction($event) => $body,
            GameEvent::Arena($event) => $body,
            GameEvent::CardTrade($event) => $body,
        }
    };
}

impl GameEvent {
    pub fn as_duel(&self) -> Option<&Duel> {
        match self {
            GameEvent::Duel(duel) => Some(duel),
            _ => None,
        }
    }
}

#[async_trait]
impl ParticipationEvent for GameEvent {
    fn kind(&self) -> EventKind {
        dispatch!(self, event => event.kind())
    }

    fn shared_state(&self) -> SharedState {
        dispatch!(self, event => event.shared_state())
    }

    fn participation_window(&self) -> Option<Duration> {
        dispatch!(self, event => event.participation_window())
    }

    fn cooldown(&self) -> Duration {
        dispatch!(self, event => event.cooldown())
    }

    fn participants(&self) -> Vec<UserName> {
        dispatch!(self, event => event.participants())
    }

    fn check_for_ongoing_event(&self, other: &OngoingEvent, user: &UserName) -> Admission {
        dispatch!(self, event => event.check_for_ongoing_event(other, user))
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        dispatch!(self, event => event.start(ctx).await)
    }

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        dispatch!(self, event => event.handle(action, ctx).await)
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        dispatch!(self, event => event.participation_period_ended(ctx).await)
    }

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        dispatch!(self, event => event.on_timer(timer, ctx).await)
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext) {
        dispatch!(self, event => event.on_cooldown_complete(ctx).await)
    }

    async fn abort(&mut self, ctx: &EventContext) {
        dispatch!(self, event => event.abort(ctx).await)
    }
}

impl From<Duel> for GameEvent {
    fn from(event: Duel) -> Self {
        GameEvent::Duel(event)
    }
}

impl From<BankHeist> for GameEvent {
    fn from(event: BankHeist) -> Self {
        GameEvent::BankHeist(event)
    }
}

impl From<Auction> for GameEvent {
    fn from(event: Auction) -> Self {
        GameEvent::Auction(event)
    }
}

impl From<Arena> for GameEvent {
    fn from(event: Arena) -> Self {
        GameEvent::Arena(event)
    }
}

impl From<CardTrade> for GameEvent {
    fn from(event: CardTrade) -> Self {
        GameEvent::CardTrade(event)
    }
}
