//! Card trades.
//!
//! The offered card leaves the initiator's inventory when the trade opens
//! and is held until someone accepts or the window runs out.

use super::participation::{Entrant, Participation, settle};
use super::{
    Admission, Directives, EventAction, EventContext, EventError, OngoingEvent,
    ParticipationEvent, SharedState, stop,
};
use crate::config::TradeConfig;
use crate::utils::validate_wager;
use arcd_sdk::objects::{EventKind, EventState, TradeAsk, UserName};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

pub struct CardTrade {
    base: Participation<Entrant>,
    initiator: UserName,
    offered_card: String,
    ask: TradeAsk,
    target: Option<UserName>,
}

impl CardTrade {
    pub fn new(
        initiator: UserName,
        offered_card: impl Into<String>,
        ask: TradeAsk,
        target: Option<UserName>,
        config: &TradeConfig,
    ) -> Result<Self, EventError> {
        let offered_card = offered_card.into().trim().to_string();
        if offered_card.is_empty() {
            return Err(EventError::EmptyCard);
        }
        let ask = match ask {
            TradeAsk::Card(card) if card.trim().is_empty() => return Err(EventError::EmptyCard),
            TradeAsk::Card(card) => TradeAsk::Card(card.trim().to_string()),
            TradeAsk::Points(points) => TradeAsk::Points(validate_wager(points)?),
        };
        if target.as_ref() == Some(&initiator) {
            return Err(EventError::SelfTarget);
        }
        Ok(Self {
            base: Participation::new(Some(config.accept_window()), Duration::ZERO),
            initiator,
            offered_card,
            ask,
            target,
        })
    }

    pub fn initiator(&self) -> &UserName {
        &self.initiator
    }

    pub fn target(&self) -> Option<&UserName> {
        self.target.as_ref()
    }

    pub fn offered_card(&self) -> &str {
        &self.offered_card
    }

    pub fn ask(&self) -> &TradeAsk {
        &self.ask
    }

    async fn accept(&mut self, user: UserName, ctx: &EventContext) -> Result<Directives, EventError> {
        if !self.base.is_open() {
            return Err(EventError::EventGone(EventKind::CardTrade));
        }
        if user == self.initiator {
            return Err(EventError::SelfAccept(user));
        }
        if let Some(target) = &self.target
            && *target != user
        {
            return Err(EventError::WrongTarget {
                user,
                target: target.clone(),
            });
        }

        // Collect the counter asset first; a failure leaves everything as it was.
        match &self.ask {
            TradeAsk::Card(card) => ctx.inventory.take_card(&user, card).await?,
            TradeAsk::Points(points) => {
                ctx.ledger.change_points(&user, -points, "card trade").await?;
            }
        }
        self.base
            .add_participant(Entrant::new(user.clone(), 0), false, ctx.ledger.as_ref(), "card trade")
            .await?;
        self.base.advance(EventState::Ended);

        if let Err(e) = ctx.inventory.give_card(&user, &self.offered_card).await {
            error!(%user, card = %self.offered_card, error = %e, "Failed to hand over traded card");
        }
        match &self.ask {
            TradeAsk::Card(card) => {
                if let Err(e) = ctx.inventory.give_card(&self.initiator, card).await {
                    error!(user = %self.initiator, card = %card, error = %e, "Failed to hand over traded card");
                }
            }
            TradeAsk::Points(points) => {
                settle(ctx, &self.initiator, *points, "card trade").await;
            }
        }

        info!(initiator = %self.initiator, acceptor = %user, card = %self.offered_card, "Card trade completed");
        ctx.announce(format!(
            "Trade complete! @{user} receives \"{}\" and @{} receives {}.",
            self.offered_card, self.initiator, self.ask
        ));
        Ok(stop())
    }

    async fn return_card(&self, ctx: &EventContext) {
        if let Err(e) = ctx.inventory.give_card(&self.initiator, &self.offered_card).await {
            error!(user = %self.initiator, card = %self.offered_card, error = %e, "Failed to return escrowed card");
        }
    }
}

#[async_trait]
impl ParticipationEvent for CardTrade {
    fn kind(&self) -> EventKind {
        EventKind::CardTrade
    }

    fn shared_state(&self) -> SharedState {
        self.base.shared_state()
    }

    fn participation_window(&self) -> Option<Duration> {
        self.base.participation_window()
    }

    fn cooldown(&self) -> Duration {
        self.base.cooldown()
    }

    fn participants(&self) -> Vec<UserName> {
        self.base.usernames()
    }

    fn check_for_ongoing_event(&self, _other: &OngoingEvent, _user: &UserName) -> Admission {
        Admission::Rejected("Another card trade is pending, wait until it is settled.".to_string())
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        ctx.inventory.take_card(&self.initiator, &self.offered_card).await?;
        self.base
            .add_participant(Entrant::new(self.initiator.clone(), 0), false, ctx.ledger.as_ref(), "card trade")
            .await?;

        let window = self.base.participation_window().unwrap_or_default().as_secs();
        let message = match &self.target {
            Some(target) => format!(
                "@{} offers \"{}\" to @{target} for {}. @{target}, type !accept within {window} seconds.",
                self.initiator, self.offered_card, self.ask
            ),
            None => format!(
                "@{} offers \"{}\" for {}. Type !accept within {window} seconds to trade.",
                self.initiator, self.offered_card, self.ask
            ),
        };
        ctx.announce(message);
        Ok(Directives::new())
    }

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match action {
            EventAction::Accept { user } => self.accept(user, ctx).await,
            other => Err(other.unsupported(EventKind::CardTrade)),
        }
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if !self.base.advance(EventState::Ended) {
            return Ok(Directives::new());
        }
        self.return_card(ctx).await;
        info!(initiator = %self.initiator, card = %self.offered_card, "Card trade expired");
        ctx.announce(format!(
            "Nobody accepted the trade. @{}, \"{}\" is back in your collection.",
            self.initiator, self.offered_card
        ));
        Ok(stop())
    }

    async fn on_cooldown_complete(&mut self, _ctx: &EventContext) {}

    async fn abort(&mut self, ctx: &EventContext) {
        if self.base.advance(EventState::Ended) {
            self.return_card(ctx).await;
        }
    }
}
