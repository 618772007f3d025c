//! Command interface for the chat layer.
//!
//! Each command is a request struct processed by [`GameService`]. Starting
//! commands build an event from the current [`GamesConfig`] and hand it to
//! the registry; follow-up commands locate the live event they apply to.

use crate::config::{ConfigStore, GamesConfig};
use crate::events::{
    Arena, Auction, BankHeist, CardTrade, Duel, EventAction, EventError, GameEvent,
    ParticipationEvent,
};
use crate::registry::{EventHandle, EventRegistry, StartError};
use arcd_sdk::objects::{
    BalanceResponse, EventKind, EventState, EventSummary, TradeAsk, UserName, Weapon,
};
use kanau::processor::Processor;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// An event of the same kind is running or cooling down.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Invalid(#[from] EventError),
    /// Nothing the command could apply to.
    #[error("{0}")]
    NoEvent(String),
    #[error("the arcade is closing, no new events can start")]
    ShuttingDown,
}

impl From<StartError> for CommandError {
    fn from(e: StartError) -> Self {
        match e {
            StartError::Rejected(message) => CommandError::Rejected(message),
            StartError::Failed(e) => CommandError::Invalid(e),
            StartError::ShuttingDown => CommandError::ShuttingDown,
        }
    }
}

#[derive(Clone)]
pub struct GameService {
    registry: EventRegistry,
    config: ConfigStore<GamesConfig>,
}

impl GameService {
    pub fn new(registry: EventRegistry, config: ConfigStore<GamesConfig>) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConfigStore<GamesConfig> {
        &self.config
    }

    async fn start(
        &self,
        event: impl Into<GameEvent>,
        user: &UserName,
    ) -> Result<EventSummary, CommandError> {
        let handle = self.registry.request_start(event, user).await?;
        Ok(self.registry.summary(&handle).await)
    }

    async fn act(
        &self,
        handle: &EventHandle,
        action: EventAction,
    ) -> Result<EventSummary, CommandError> {
        self.registry.act(handle, action).await?;
        Ok(self.registry.summary(handle).await)
    }

    /// Join the open event of `kind`, or start a new one with `build`.
    async fn enter(
        &self,
        kind: EventKind,
        user: UserName,
        wager: i64,
        build: impl FnOnce(&GamesConfig) -> Result<GameEvent, EventError>,
    ) -> Result<EventSummary, CommandError> {
        if let Some(handle) = self.open_event(kind).await {
            debug!(%kind, %user, "Joining open event");
            return self.act(&handle, EventAction::Join { user, wager }).await;
        }
        let event = build(&*self.config.read().await)?;
        match self.registry.request_start(event, &user).await {
            Ok(handle) => Ok(self.registry.summary(&handle).await),
            // Lost a race against another start; join the winner instead.
            Err(StartError::Rejected(message)) => match self.open_event(kind).await {
                Some(handle) => self.act(&handle, EventAction::Join { user, wager }).await,
                None => Err(CommandError::Rejected(message)),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn open_event(&self, kind: EventKind) -> Option<EventHandle> {
        self.registry
            .find(kind, |event| event.state() == EventState::Open)
            .await
    }

    async fn live_event(&self, kind: EventKind, missing: impl FnOnce() -> String) -> Result<EventHandle, CommandError> {
        self.registry
            .find(kind, |_| true)
            .await
            .ok_or_else(|| CommandError::NoEvent(missing()))
    }
}

pub struct StartDuel {
    pub challenger: UserName,
    pub target: Option<UserName>,
    pub wager: i64,
}

pub struct AcceptDuel {
    pub user: UserName,
}

pub struct ChooseWeapon {
    pub user: UserName,
    pub weapon: Weapon,
}

pub struct EnterHeist {
    pub user: UserName,
    pub wager: i64,
}

pub struct StartAuction {
    pub host: UserName,
    pub item: String,
    pub minimum_bid: i64,
    pub duration: Option<Duration>,
}

pub struct PlaceBid {
    pub user: UserName,
    pub amount: i64,
}

pub struct CloseAuction {
    pub user: UserName,
}

pub struct EnterArena {
    pub user: UserName,
    pub wager: i64,
}

pub struct OfferTrade {
    pub user: UserName,
    pub offered_card: String,
    pub ask: TradeAsk,
    pub target: Option<UserName>,
}

pub struct AcceptTrade {
    pub user: UserName,
}

pub struct ListEvents {
    pub kind: Option<EventKind>,
}

pub struct GetBalance {
    pub user: UserName,
}

impl Processor<StartDuel> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:StartDuel")]
    async fn process(&self, cmd: StartDuel) -> Result<EventSummary, CommandError> {
        let duel = {
            let config = self.config.read().await;
            Duel::new(cmd.challenger.clone(), cmd.target, cmd.wager, &config.duel)?
        };
        self.start(duel, &cmd.challenger).await
    }
}

impl Processor<AcceptDuel> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:AcceptDuel")]
    async fn process(&self, cmd: AcceptDuel) -> Result<EventSummary, CommandError> {
        let user = cmd.user;
        let directed = self
            .registry
            .find(EventKind::Duel, |event| {
                event
                    .as_duel()
                    .is_some_and(|duel| duel.target() == Some(&user) && duel.is_acceptable_by(&user))
            })
            .await;
        let handle = match directed {
            Some(handle) => handle,
            None => self
                .registry
                .find(EventKind::Duel, |event| {
                    event
                        .as_duel()
                        .is_some_and(|duel| duel.target().is_none() && duel.is_acceptable_by(&user))
                })
                .await
                .ok_or_else(|| {
                    CommandError::NoEvent(format!("@{user}, there is no duel waiting for you."))
                })?,
        };
        self.act(&handle, EventAction::Accept { user }).await
    }
}

impl Processor<ChooseWeapon> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:ChooseWeapon")]
    async fn process(&self, cmd: ChooseWeapon) -> Result<EventSummary, CommandError> {
        let handle = self
            .registry
            .find_by_participant(EventKind::Duel, &cmd.user)
            .await
            .ok_or_else(|| CommandError::NoEvent(format!("@{}, you are not in a duel.", cmd.user)))?;
        self.act(
            &handle,
            EventAction::ChooseWeapon {
                user: cmd.user,
                weapon: cmd.weapon,
            },
        )
        .await
    }
}

impl Processor<EnterHeist> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:EnterHeist")]
    async fn process(&self, cmd: EnterHeist) -> Result<EventSummary, CommandError> {
        let initiator = cmd.user.clone();
        self.enter(EventKind::BankHeist, cmd.user, cmd.wager, |config| {
            BankHeist::new(initiator, cmd.wager, &config.heist).map(GameEvent::from)
        })
        .await
    }
}

impl Processor<StartAuction> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:StartAuction")]
    async fn process(&self, cmd: StartAuction) -> Result<EventSummary, CommandError> {
        let auction = {
            let config = self.config.read().await;
            Auction::new(
                cmd.host.clone(),
                cmd.item,
                cmd.minimum_bid,
                cmd.duration,
                &config.auction,
            )?
        };
        self.start(auction, &cmd.host).await
    }
}

impl Processor<PlaceBid> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:PlaceBid")]
    async fn process(&self, cmd: PlaceBid) -> Result<EventSummary, CommandError> {
        let handle = self
            .live_event(EventKind::Auction, || "There is no auction running.".to_string())
            .await?;
        self.act(
            &handle,
            EventAction::Bid {
                user: cmd.user,
                amount: cmd.amount,
            },
        )
        .await
    }
}

impl Processor<CloseAuction> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:CloseAuction")]
    async fn process(&self, cmd: CloseAuction) -> Result<EventSummary, CommandError> {
        let handle = self
            .live_event(EventKind::Auction, || "There is no auction running.".to_string())
            .await?;
        self.act(&handle, EventAction::Close { user: cmd.user }).await
    }
}

impl Processor<EnterArena> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:EnterArena")]
    async fn process(&self, cmd: EnterArena) -> Result<EventSummary, CommandError> {
        let initiator = cmd.user.clone();
        self.enter(EventKind::Arena, cmd.user, cmd.wager, |config| {
            Arena::new(initiator, cmd.wager, &config.arena).map(GameEvent::from)
        })
        .await
    }
}

impl Processor<OfferTrade> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:OfferTrade")]
    async fn process(&self, cmd: OfferTrade) -> Result<EventSummary, CommandError> {
        let trade = {
            let config = self.config.read().await;
            CardTrade::new(
                cmd.user.clone(),
                cmd.offered_card,
                cmd.ask,
                cmd.target,
                &config.trade,
            )?
        };
        self.start(trade, &cmd.user).await
    }
}

impl Processor<AcceptTrade> for GameService {
    type Output = EventSummary;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:AcceptTrade")]
    async fn process(&self, cmd: AcceptTrade) -> Result<EventSummary, CommandError> {
        let user = cmd.user;
        let handle = self
            .live_event(EventKind::CardTrade, || {
                format!("@{user}, there is no trade to accept.")
            })
            .await?;
        self.act(&handle, EventAction::Accept { user }).await
    }
}

impl Processor<ListEvents> for GameService {
    type Output = Vec<EventSummary>;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:ListEvents")]
    async fn process(&self, query: ListEvents) -> Result<Vec<EventSummary>, CommandError> {
        let mut summaries = self.registry.summaries().await;
        if let Some(kind) = query.kind {
            summaries.retain(|s| s.kind == kind);
        }
        Ok(summaries)
    }
}

impl Processor<GetBalance> for GameService {
    type Output = BalanceResponse;
    type Error = CommandError;

    #[tracing::instrument(skip_all, err, name = "Game:GetBalance")]
    async fn process(&self, query: GetBalance) -> Result<BalanceResponse, CommandError> {
        let points = self
            .registry
            .context()
            .ledger
            .balance(&query.user)
            .await
            .map_err(EventError::from)?;
        Ok(BalanceResponse {
            user: query.user,
            points,
        })
    }
}
