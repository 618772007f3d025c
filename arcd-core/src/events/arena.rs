//! Arena tournaments.
//!
//! Fighters pool their wagers. Once the window closes, three distinct
//! fighters are drawn as the podium and split the pool.

use super::participation::{Entrant, Participation, settle};
use super::{
    Admission, Directives, EventAction, EventContext, EventError, EventTimer, OngoingEvent,
    ParticipationEvent, SharedState, cooldown, schedule, stop,
};
use crate::config::ArenaConfig;
use crate::utils::{GameRng, validate_wager};
use arcd_sdk::objects::{EventKind, EventState, UserName};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const PODIUM: usize = 3;

/// Split `pool` into first, second and third prize. Third place absorbs
/// whatever rounding leaves over.
pub fn podium_split(pool: i64, first_percent: u8, second_percent: u8) -> [i64; PODIUM] {
    let first = pool * i64::from(first_percent) / 100;
    let second = pool * i64::from(second_percent) / 100;
    [first, second, pool - first - second]
}

/// Rounds a champion would need to win in a bracket of `fighters`. Only
/// used for the announcement.
pub fn wins_needed(fighters: usize) -> u32 {
    fighters.checked_ilog2().unwrap_or(0)
}

pub struct Arena {
    base: Participation<Entrant>,
    initiator: UserName,
    initiator_wager: i64,
    min_participants: usize,
    first_place_percent: u8,
    second_place_percent: u8,
    suspense: Duration,
    rng: GameRng,
}

impl Arena {
    pub fn new(initiator: UserName, wager: i64, config: &ArenaConfig) -> Result<Self, EventError> {
        let wager = validate_wager(wager)?;
        Ok(Self {
            base: Participation::new(Some(config.join_window()), config.cooldown()),
            initiator,
            initiator_wager: wager,
            min_participants: config.min_participants.max(PODIUM),
            first_place_percent: config.first_place_percent,
            second_place_percent: config.second_place_percent,
            suspense: config.suspense(),
            rng: GameRng::from_entropy(),
        })
    }

    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn pool(&self) -> i64 {
        self.base.total_wagers()
    }

    async fn join(
        &mut self,
        user: UserName,
        wager: i64,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if !self.base.is_open() {
            return Err(EventError::NotJoinable(EventKind::Arena));
        }
        let wager = validate_wager(wager)?;
        if !self
            .base
            .add_participant(Entrant::new(user.clone(), wager), true, ctx.ledger.as_ref(), "arena wager")
            .await?
        {
            return Err(EventError::AlreadyJoined(user));
        }
        debug!(%user, wager, fighters = self.base.len(), "Entered arena");
        Ok(Directives::new())
    }

    async fn crown(&mut self, ctx: &EventContext) -> Directives {
        if !self.base.advance(EventState::Ended) {
            return Directives::new();
        }
        let fighters = self.base.participants();
        let drawn = self.rng.draw_distinct(fighters.len(), PODIUM);
        let prizes = podium_split(
            self.base.total_wagers(),
            self.first_place_percent,
            self.second_place_percent,
        );

        let mut placings = Vec::with_capacity(PODIUM);
        for (rank, (&index, &prize)) in drawn.iter().zip(prizes.iter()).enumerate() {
            let Some(fighter) = fighters.get(index) else {
                continue;
            };
            settle(ctx, &fighter.user, prize, "arena prize").await;
            placings.push(format!("#{} @{} ({prize})", rank + 1, fighter.user));
        }

        info!(fighters = fighters.len(), pool = self.base.total_wagers(), "Arena resolved");
        ctx.announce(format!(
            "The dust settles over the arena! {}",
            placings.join(", ")
        ));
        cooldown()
    }
}

#[async_trait]
impl ParticipationEvent for Arena {
    fn kind(&self) -> EventKind {
        EventKind::Arena
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

    fn check_for_ongoing_event(&self, other: &OngoingEvent, _user: &UserName) -> Admission {
        let message = if other.cooling_down {
            "The arena is being cleaned up after the last tournament. Try again later."
        } else if other.state == EventState::Open {
            "An arena is already open. Type !arena <points> to enter it."
        } else {
            "A tournament is already being fought."
        };
        Admission::Rejected(message.to_string())
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        let initiator = Entrant::new(self.initiator.clone(), self.initiator_wager);
        self.base
            .add_participant(initiator, true, ctx.ledger.as_ref(), "arena wager")
            .await?;
        ctx.announce(format!(
            "@{} opens the arena! Type !arena <points> within {} seconds to fight. At least {} fighters are needed.",
            self.initiator,
            self.base.participation_window().unwrap_or_default().as_secs(),
            self.min_participants
        ));
        Ok(Directives::new())
    }

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match action {
            EventAction::Join { user, wager } => self.join(user, wager, ctx).await,
            other => Err(other.unsupported(EventKind::Arena)),
        }
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if self.base.is_ended() {
            return Ok(Directives::new());
        }
        let fighters = self.base.len();
        if fighters < self.min_participants {
            self.base.advance(EventState::Ended);
            self.base.refund_all(ctx, "arena cancelled").await;
            info!(fighters, required = self.min_participants, "Arena cancelled");
            ctx.announce(format!(
                "Only {fighters} of the {} required fighters showed up. The arena is closed and all wagers are refunded.",
                self.min_participants
            ));
            return Ok(stop());
        }

        self.base.advance(EventState::BoardingCompleted);
        ctx.announce(format!(
            "{fighters} fighters enter the arena for a pool of {} points! A champion needs {} wins...",
            self.pool(),
            wins_needed(fighters)
        ));
        Ok(schedule(EventTimer::Reveal, self.suspense))
    }

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match timer {
            EventTimer::Reveal => Ok(self.crown(ctx).await),
            _ => Ok(Directives::new()),
        }
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext) {
        ctx.announce("The arena is ready for new challengers. Type !arena <points> to open it.");
    }

    async fn abort(&mut self, ctx: &EventContext) {
        if !self.base.advance(EventState::Ended) {
            return;
        }
        self.base.refund_all(ctx, "arena aborted").await;
        ctx.announce("The arena has been closed. Every wager has been refunded.");
    }
}
