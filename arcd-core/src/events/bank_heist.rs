//! Bank heists.
//!
//! The crew grows during the join window. The bigger the crew, the bigger
//! the bank it can hit: each tier has its own odds and payout multiplier,
//! and the tier is chosen from the final crew size alone. Every member then
//! succeeds or fails on their own roll.

use super::participation::{Entrant, Participation, settle};
use super::{
    Admission, Directives, EventAction, EventContext, EventError, EventTimer, OngoingEvent,
    ParticipationEvent, SharedState, cooldown, schedule,
};
use crate::config::{HeistConfig, HeistTier};
use crate::utils::{GameRng, validate_wager};
use arcd_sdk::objects::{EventKind, EventState, UserName};
use async_trait::async_trait;
use itertools::Itertools;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Index of the tier a crew of `crew_size` qualifies for.
///
/// Tiers are ordered by ascending `min_users`; the last one the crew reaches
/// wins.
pub fn tier_for(tiers: &[HeistTier], crew_size: usize) -> Option<usize> {
    tiers.iter().rposition(|tier| tier.min_users <= crew_size)
}

/// Points paid to a successful member.
pub fn heist_payout(wager: i64, multiplier: f64) -> i64 {
    (wager as f64 * multiplier).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeistOutcome {
    AllWon,
    SomeWon,
    SingleWon,
    NoneWon,
    SingleLost,
}

impl HeistOutcome {
    pub fn classify(crew_size: usize, winners: usize) -> Self {
        match (crew_size, winners) {
            (1, 1) => HeistOutcome::SingleWon,
            (1, _) => HeistOutcome::SingleLost,
            (_, 0) => HeistOutcome::NoneWon,
            (n, w) if w >= n => HeistOutcome::AllWon,
            _ => HeistOutcome::SomeWon,
        }
    }

    /// Flavour lines. `{user}` is replaced by the solo robber.
    fn pool(self) -> &'static [&'static str] {
        match self {
            HeistOutcome::AllWon => &[
                "The vault doors swing open and the whole crew walks out rich!",
                "Not a single alarm! Every member of the crew got away with the loot.",
                "A flawless job. The police are still looking for the getaway car.",
            ],
            HeistOutcome::SomeWon => &[
                "The alarms went off halfway through. Some of the crew made it out with the money.",
                "The guards caught a few of you, but the rest escaped with bags full of cash.",
                "Not everyone made it to the van, but the survivors are counting their share.",
            ],
            HeistOutcome::SingleWon => &[
                "{user} slipped past every guard and emptied the vault alone!",
                "A one-person job, executed perfectly. {user} is rich!",
            ],
            HeistOutcome::NoneWon => &[
                "The police were waiting. The whole crew is behind bars.",
                "Someone tripped the alarm in the lobby. Nobody got away.",
                "The vault was a decoy. The entire crew has been arrested.",
            ],
            HeistOutcome::SingleLost => &[
                "{user} tried to rob the bank alone and got caught at the front door.",
                "The security guard recognised {user} immediately. Busted!",
            ],
        }
    }
}

pub struct BankHeist {
    base: Participation<Entrant>,
    initiator: UserName,
    initiator_wager: i64,
    tiers: Vec<HeistTier>,
    suspense: Duration,
    rng: GameRng,
}

impl BankHeist {
    pub fn new(initiator: UserName, wager: i64, config: &HeistConfig) -> Result<Self, EventError> {
        let wager = validate_wager(wager)?;
        if config.tiers.is_empty() {
            return Err(EventError::NoHeistTiers);
        }
        Ok(Self {
            base: Participation::new(Some(config.join_window()), config.cooldown()),
            initiator,
            initiator_wager: wager,
            tiers: config.tiers.clone(),
            suspense: config.suspense(),
            rng: GameRng::from_entropy(),
        })
    }

    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn crew_size(&self) -> usize {
        self.base.len()
    }

    /// The tier the crew currently qualifies for.
    pub fn current_tier(&self) -> Option<&HeistTier> {
        tier_for(&self.tiers, self.base.len()).and_then(|i| self.tiers.get(i))
    }

    async fn join(
        &mut self,
        user: UserName,
        wager: i64,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if !self.base.is_open() {
            return Err(EventError::NotJoinable(EventKind::BankHeist));
        }
        let wager = validate_wager(wager)?;
        let before = tier_for(&self.tiers, self.base.len());
        if !self
            .base
            .add_participant(Entrant::new(user.clone(), wager), true, ctx.ledger.as_ref(), "heist wager")
            .await?
        {
            return Err(EventError::AlreadyJoined(user));
        }
        debug!(%user, wager, crew = self.base.len(), "Joined heist");

        let after = tier_for(&self.tiers, self.base.len());
        if after > before
            && let Some(tier) = after.and_then(|i| self.tiers.get(i))
        {
            ctx.announce(format!(
                "The crew now has {} members and is ready for a bigger target: the {}!",
                self.base.len(),
                tier.name
            ));
        }
        Ok(Directives::new())
    }

    async fn reveal(&mut self, ctx: &EventContext) -> Directives {
        if !self.base.advance(EventState::Ended) {
            return Directives::new();
        }
        let Some(tier) = self.current_tier().cloned() else {
            warn!(crew = self.base.len(), "No heist tier matches, refunding crew");
            self.base.refund_all(ctx, "heist refund").await;
            return cooldown();
        };

        let mut winners = Vec::new();
        for member in self.base.participants() {
            if self.rng.chance(tier.win_chance) {
                winners.push((member.user.clone(), heist_payout(member.wager, tier.payout_multiplier)));
            }
        }
        for (user, payout) in &winners {
            settle(ctx, user, *payout, "heist loot").await;
        }

        let outcome = HeistOutcome::classify(self.base.len(), winners.len());
        info!(
            bank = %tier.name,
            crew = self.base.len(),
            winners = winners.len(),
            ?outcome,
            "Heist resolved"
        );

        let line = self
            .rng
            .pick(outcome.pool())
            .copied()
            .unwrap_or_default()
            .replace("{user}", &format!("@{}", self.initiator));
        ctx.announce(line);
        if !winners.is_empty() {
            let list = winners
                .iter()
                .map(|(user, payout)| format!("@{user} ({payout})"))
                .join(", ");
            ctx.announce(format!("Heist payouts: {list}"));
        }
        cooldown()
    }
}

#[async_trait]
impl ParticipationEvent for BankHeist {
    fn kind(&self) -> EventKind {
        EventKind::BankHeist
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
            "The banks are on high alert after the last heist. Try again later."
        } else if other.state == EventState::Open {
            "A crew is already being assembled. Type !heist <points> to join it."
        } else {
            "A heist is already underway."
        };
        Admission::Rejected(message.to_string())
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        let initiator = Entrant::new(self.initiator.clone(), self.initiator_wager);
        self.base
            .add_participant(initiator, true, ctx.ledger.as_ref(), "heist wager")
            .await?;
        let target = self
            .current_tier()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        ctx.announce(format!(
            "@{} is assembling a crew to rob the {target}! Type !heist <points> within {} seconds to join.",
            self.initiator,
            self.base.participation_window().unwrap_or_default().as_secs()
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
            other => Err(other.unsupported(EventKind::BankHeist)),
        }
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if !self.base.advance(EventState::BoardingCompleted) {
            return Ok(Directives::new());
        }
        let bank = self
            .current_tier()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        let message = if self.base.len() == 1 {
            format!("@{} heads into the {bank} alone...", self.initiator)
        } else {
            format!("The crew of {} heads into the {bank}...", self.base.len())
        };
        ctx.announce(message);
        Ok(schedule(EventTimer::Reveal, self.suspense))
    }

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match timer {
            EventTimer::Reveal => Ok(self.reveal(ctx).await),
            _ => Ok(Directives::new()),
        }
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext) {
        ctx.announce("The banks have reopened. Type !heist <points> to start a new heist.");
    }

    async fn abort(&mut self, ctx: &EventContext) {
        if !self.base.advance(EventState::Ended) {
            return;
        }
        self.base.refund_all(ctx, "heist aborted").await;
        ctx.announce("The heist has been called off. Every wager has been refunded.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Directive;
    use crate::testing::{Fixture, user};

    fn tier(min_users: usize, win_chance: f64) -> HeistTier {
        HeistTier {
            name: format!("bank-{min_users}"),
            min_users,
            win_chance,
            payout_multiplier: 2.0,
        }
    }

    fn config_with(tiers: Vec<HeistTier>) -> HeistConfig {
        HeistConfig {
            tiers,
            ..HeistConfig::default()
        }
    }

    #[test]
    fn test_tier_depends_on_final_count_only() {
        let tiers = HeistConfig::default().tiers;
        assert_eq!(tier_for(&tiers, 1), Some(0));
        assert_eq!(tier_for(&tiers, 4), Some(0));
        assert_eq!(tier_for(&tiers, 5), Some(1));
        assert_eq!(tier_for(&tiers, 10), Some(2));
        assert_eq!(tiers[2].min_users, 10);
        assert_eq!(tier_for(&tiers, 14), Some(2));
        assert_eq!(tier_for(&tiers, 25), Some(4));
    }

    #[test]
    fn test_payout_is_floored() {
        assert_eq!(heist_payout(10, 1.5), 15);
        assert_eq!(heist_payout(11, 1.5), 16);
        assert_eq!(heist_payout(7, 1.7), 11);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(HeistOutcome::classify(1, 1), HeistOutcome::SingleWon);
        assert_eq!(HeistOutcome::classify(1, 0), HeistOutcome::SingleLost);
        assert_eq!(HeistOutcome::classify(4, 0), HeistOutcome::NoneWon);
        assert_eq!(HeistOutcome::classify(4, 2), HeistOutcome::SomeWon);
        assert_eq!(HeistOutcome::classify(4, 4), HeistOutcome::AllWon);
    }

    #[tokio::test]
    async fn test_crossing_threshold_announces_bigger_target() {
        let names = ["a", "b", "c", "d", "e"];
        let balances: Vec<(&str, i64)> = names.iter().map(|n| (*n, 100)).collect();
        let fixture = Fixture::with_balances(&balances);
        let ctx = fixture.context();
        let mut heist = BankHeist::new(user("a"), 10, &HeistConfig::default()).unwrap();
        heist.start(&ctx).await.unwrap();

        for name in &names[1..] {
            heist
                .handle(EventAction::Join { user: user(name), wager: 10 }, &ctx)
                .await
                .unwrap();
        }

        assert!(fixture.notifier.contains("bigger target: the City Bank"));
        assert_eq!(heist.crew_size(), 5);
        assert_eq!(fixture.balance("e").await, 90);
    }

    #[tokio::test]
    async fn test_join_rules() {
        let fixture = Fixture::with_balances(&[("a", 100), ("b", 100)]);
        let ctx = fixture.context();
        let mut heist = BankHeist::new(user("a"), 10, &HeistConfig::default()).unwrap();
        heist.start(&ctx).await.unwrap();

        let again = heist
            .handle(EventAction::Join { user: user("A"), wager: 10 }, &ctx)
            .await;
        assert_eq!(again.err(), Some(EventError::AlreadyJoined(user("a"))));
        let free = heist
            .handle(EventAction::Join { user: user("b"), wager: 0 }, &ctx)
            .await;
        assert_eq!(free.err(), Some(EventError::InvalidWager(0)));

        heist.participation_period_ended(&ctx).await.unwrap();
        let late = heist
            .handle(EventAction::Join { user: user("b"), wager: 10 }, &ctx)
            .await;
        assert_eq!(late.err(), Some(EventError::NotJoinable(EventKind::BankHeist)));
        assert_eq!(fixture.balance("a").await, 90);
        assert_eq!(fixture.balance("b").await, 100);
    }

    #[tokio::test]
    async fn test_sure_win_pays_multiplier() {
        let fixture = Fixture::with_balances(&[("a", 100), ("b", 100)]);
        let ctx = fixture.context();
        let config = config_with(vec![tier(0, 1.0)]);
        let mut heist = BankHeist::new(user("a"), 10, &config)
            .unwrap()
            .with_rng(GameRng::seeded(3));
        heist.start(&ctx).await.unwrap();
        heist
            .handle(EventAction::Join { user: user("b"), wager: 30 }, &ctx)
            .await
            .unwrap();

        let boarding = heist.participation_period_ended(&ctx).await.unwrap();
        assert_eq!(
            boarding.as_slice(),
            &[Directive::Schedule {
                timer: EventTimer::Reveal,
                after: config.suspense(),
            }]
        );
        let done = heist.on_timer(EventTimer::Reveal, &ctx).await.unwrap();

        assert_eq!(done.as_slice(), &[Directive::Cooldown]);
        assert_eq!(fixture.balance("a").await, 110);
        assert_eq!(fixture.balance("b").await, 130);
        assert!(fixture.notifier.contains("@a (20)"));
    }

    #[tokio::test]
    async fn test_sure_loss_forfeits_wagers() {
        let fixture = Fixture::with_balances(&[("a", 100)]);
        let ctx = fixture.context();
        let config = config_with(vec![tier(0, 0.0)]);
        let mut heist = BankHeist::new(user("a"), 40, &config)
            .unwrap()
            .with_rng(GameRng::seeded(3));
        heist.start(&ctx).await.unwrap();
        heist.participation_period_ended(&ctx).await.unwrap();
        heist.on_timer(EventTimer::Reveal, &ctx).await.unwrap();

        assert_eq!(fixture.balance("a").await, 60);
        assert_eq!(heist.state(), EventState::Ended);
        assert!(fixture.notifier.contains("@a"));
    }

    #[tokio::test]
    async fn test_abort_refunds_crew() {
        let fixture = Fixture::with_balances(&[("a", 100), ("b", 100)]);
        let ctx = fixture.context();
        let mut heist = BankHeist::new(user("a"), 10, &HeistConfig::default()).unwrap();
        heist.start(&ctx).await.unwrap();
        heist
            .handle(EventAction::Join { user: user("b"), wager: 25 }, &ctx)
            .await
            .unwrap();

        heist.abort(&ctx).await;

        assert_eq!(fixture.balance("a").await, 100);
        assert_eq!(fixture.balance("b").await, 100);
        assert_eq!(fixture.ledger.net_change().await, 0);
    }
}
