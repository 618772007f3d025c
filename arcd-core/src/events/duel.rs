//! Rock, paper, scissors for points.
//!
//! A duel is either directed at a named user or open to whoever accepts
//! first. The acceptor's wager is escrowed at acceptance, after which both
//! duelists have a limited time to pick a weapon.

use super::participation::{Participant, Participation, settle};
use super::{
    Admission, Directives, EventAction, EventContext, EventError, EventTimer, OngoingEvent,
    ParticipationEvent, SharedState, cooldown, schedule, stop,
};
use crate::config::DuelConfig;
use crate::utils::{percent_of, validate_wager};
use arcd_sdk::objects::{EventKind, EventState, UserName, Weapon};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duelist {
    pub user: UserName,
    pub wager: i64,
    pub weapon: Option<Weapon>,
    pub accepted: bool,
}

impl Participant for Duelist {
    fn user(&self) -> &UserName {
        &self.user
    }

    fn wager(&self) -> i64 {
        self.wager
    }
}

pub struct Duel {
    base: Participation<Duelist>,
    challenger: UserName,
    target: Option<UserName>,
    wager: i64,
    weapon_window: Duration,
    draw_fee_percent: u8,
}

impl Duel {
    pub fn new(
        challenger: UserName,
        target: Option<UserName>,
        wager: i64,
        config: &DuelConfig,
    ) -> Result<Self, EventError> {
        let wager = validate_wager(wager)?;
        if target.as_ref() == Some(&challenger) {
            return Err(EventError::SelfTarget);
        }
        Ok(Self {
            base: Participation::new(Some(config.accept_window()), config.cooldown()),
            challenger,
            target,
            wager,
            weapon_window: config.weapon_window(),
            draw_fee_percent: config.draw_fee_percent,
        })
    }

    pub fn challenger(&self) -> &UserName {
        &self.challenger
    }

    pub fn target(&self) -> Option<&UserName> {
        self.target.as_ref()
    }

    pub fn wager(&self) -> i64 {
        self.wager
    }

    /// Whether `user` may still accept this duel.
    pub fn is_acceptable_by(&self, user: &UserName) -> bool {
        self.base.len() < 2
            && !self.base.is_ended()
            && *user != self.challenger
            && self.target.as_ref().is_none_or(|t| t == user)
    }

    /// Points returned to each duelist on a draw.
    pub fn draw_refund(&self) -> i64 {
        self.wager - percent_of(self.wager, self.draw_fee_percent)
    }

    async fn accept(&mut self, user: UserName, ctx: &EventContext) -> Result<Directives, EventError> {
        if self.base.is_ended() {
            return Err(EventError::EventGone(EventKind::Duel));
        }
        if self.base.len() >= 2 {
            return Err(EventError::NotJoinable(EventKind::Duel));
        }
        if user == self.challenger {
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

        let duelist = Duelist {
            user: user.clone(),
            wager: self.wager,
            weapon: None,
            accepted: true,
        };
        if !self
            .base
            .add_participant(duelist, true, ctx.ledger.as_ref(), "duel wager")
            .await?
        {
            return Err(EventError::AlreadyJoined(user));
        }
        self.base.advance(EventState::BoardingCompleted);

        info!(challenger = %self.challenger, opponent = %user, wager = self.wager, "Duel accepted");
        ctx.announce(format!(
            "@{user} accepts the duel against @{}! Both of you, whisper !rock, !paper or !scissors within {} seconds.",
            self.challenger,
            self.weapon_window.as_secs()
        ));
        Ok(schedule(EventTimer::WeaponDeadline, self.weapon_window))
    }

    async fn choose_weapon(
        &mut self,
        user: UserName,
        weapon: Weapon,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if self.base.is_ended() {
            return Err(EventError::EventGone(EventKind::Duel));
        }
        if self.base.len() < 2 {
            return Err(EventError::DuelNotAccepted);
        }
        let Some(duelist) = self.base.find_mut(&user) else {
            return Err(EventError::NotParticipant(user));
        };
        if duelist.weapon.is_some() {
            return Err(EventError::WeaponAlreadyChosen(user));
        }
        duelist.weapon = Some(weapon);
        debug!(%user, "Weapon chosen");
        ctx.announce(format!("@{user} has chosen a weapon."));

        match self.weapons() {
            Some((first, second)) => Ok(self.resolve(first, second, ctx).await),
            None => Ok(Directives::new()),
        }
    }

    fn weapons(&self) -> Option<(Weapon, Weapon)> {
        match self.base.participants() {
            [a, b] => Some((a.weapon?, b.weapon?)),
            _ => None,
        }
    }

    async fn resolve(&mut self, first: Weapon, second: Weapon, ctx: &EventContext) -> Directives {
        if !self.base.advance(EventState::Ended) {
            return Directives::new();
        }
        let users = self.base.usernames();
        let [challenger, opponent] = users.as_slice() else {
            return stop();
        };

        if first == second {
            let refund = self.draw_refund();
            if let Err(e) = ctx
                .ledger
                .change_points_for_users(&users, refund, "duel draw")
                .await
            {
                warn!(error = %e, "Batch draw refund failed, refunding one by one");
                for user in &users {
                    settle(ctx, user, refund, "duel draw").await;
                }
            }
            info!(%challenger, %opponent, %first, refund, "Duel ended in a draw");
            ctx.announce(format!(
                "@{challenger} and @{opponent} both picked {first}! It's a draw, each of you gets {refund} points back."
            ));
            return cooldown();
        }

        let (winner, loser, winning, losing) = if first.beats(second) {
            (challenger, opponent, first, second)
        } else {
            (opponent, challenger, second, first)
        };
        let prize = self.wager * 2;
        settle(ctx, winner, prize, "duel win").await;
        info!(%winner, %loser, prize, "Duel won");
        ctx.announce(format!(
            "{winning} beats {losing}! @{winner} defeats @{loser} and wins {prize} points."
        ));
        cooldown()
    }

    async fn weapon_deadline(&mut self, ctx: &EventContext) -> Directives {
        if self.weapons().is_some() || !self.base.advance(EventState::Ended) {
            return Directives::new();
        }
        let idle = self
            .base
            .participants()
            .iter()
            .filter(|d| d.weapon.is_none())
            .map(|d| format!("@{}", d.user))
            .collect::<Vec<_>>()
            .join(" and ");
        self.base.refund_all(ctx, "duel cancelled").await;
        info!(challenger = %self.challenger, "Duel cancelled, weapon missing");
        ctx.announce(format!(
            "The duel is cancelled because {idle} did not choose a weapon in time. All wagers have been refunded."
        ));
        stop()
    }
}

#[async_trait]
impl ParticipationEvent for Duel {
    fn kind(&self) -> EventKind {
        EventKind::Duel
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
        if other.cooling_down {
            Admission::Rejected("Duels are on cooldown, try again in a little while.".to_string())
        } else {
            Admission::Rejected("A duel is already in progress, wait for it to finish.".to_string())
        }
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        let challenger = Duelist {
            user: self.challenger.clone(),
            wager: self.wager,
            weapon: None,
            accepted: true,
        };
        self.base
            .add_participant(challenger, true, ctx.ledger.as_ref(), "duel wager")
            .await?;

        let window = self.base.participation_window().unwrap_or_default().as_secs();
        match &self.target {
            Some(target) => {
                self.base.advance(EventState::BoardingCompleted);
                ctx.announce(format!(
                    "@{} challenges @{target} to a duel for {} points! @{target}, type !accept within {window} seconds.",
                    self.challenger, self.wager
                ));
            }
            None => {
                ctx.announce(format!(
                    "@{} wants to duel anyone for {} points! Type !accept within {window} seconds.",
                    self.challenger, self.wager
                ));
            }
        }
        Ok(Directives::new())
    }

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match action {
            EventAction::Accept { user } | EventAction::Join { user, .. } => {
                self.accept(user, ctx).await
            }
            EventAction::ChooseWeapon { user, weapon } => {
                self.choose_weapon(user, weapon, ctx).await
            }
            other => Err(other.unsupported(EventKind::Duel)),
        }
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if self.base.len() >= 2 || !self.base.advance(EventState::Ended) {
            return Ok(Directives::new());
        }
        self.base.refund_all(ctx, "duel not accepted").await;
        info!(challenger = %self.challenger, "Duel expired without acceptance");
        let message = match &self.target {
            Some(target) => format!(
                "@{target} did not accept the duel. @{}, your {} points have been refunded.",
                self.challenger, self.wager
            ),
            None => format!(
                "Nobody accepted the duel. @{}, your {} points have been refunded.",
                self.challenger, self.wager
            ),
        };
        ctx.announce(message);
        Ok(stop())
    }

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match timer {
            EventTimer::WeaponDeadline => Ok(self.weapon_deadline(ctx).await),
            _ => Ok(Directives::new()),
        }
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext) {
        ctx.announce("The dueling grounds are open again. Challenge someone with !duel.");
    }

    async fn abort(&mut self, ctx: &EventContext) {
        if !self.base.advance(EventState::Ended) {
            return;
        }
        self.base.refund_all(ctx, "duel aborted").await;
        ctx.announce("The duel has been called off and all wagers refunded.");
    }
}
