//! Auctions.
//!
//! Bids are not escrowed. A bidder only has to hold the amount when bidding,
//! and the winner is charged when the auction closes. A second bid from the
//! same user replaces their first one.

use super::participation::{Entrant, Participant, Participation};
use super::{
    Admission, Directive, Directives, EventAction, EventContext, EventError, EventTimer,
    OngoingEvent, ParticipationEvent, SharedState, cooldown, schedule,
};
use crate::config::AuctionConfig;
use crate::ledger::LedgerError;
use arcd_sdk::objects::{EventKind, EventState, UserName};
use async_trait::async_trait;
use itertools::Itertools;
use smallvec::smallvec;
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_secs(1);

pub struct Auction {
    base: Participation<Entrant>,
    host: UserName,
    item: String,
    minimum_bid: i64,
    /// `None` for auctions that run until the host closes them.
    remaining: Option<Duration>,
    snipe_threshold: Duration,
    snipe_extension: Duration,
    status_interval: Duration,
}

impl Auction {
    pub fn new(
        host: UserName,
        item: impl Into<String>,
        minimum_bid: i64,
        duration: Option<Duration>,
        config: &AuctionConfig,
    ) -> Result<Self, EventError> {
        let item = item.into().trim().to_string();
        if item.is_empty() {
            return Err(EventError::EmptyItem);
        }
        if minimum_bid < 0 {
            return Err(EventError::InvalidMinimumBid(minimum_bid));
        }
        Ok(Self {
            base: Participation::new(None, config.cooldown()),
            host,
            item,
            minimum_bid,
            remaining: duration.filter(|d| !d.is_zero()),
            snipe_threshold: config.snipe_threshold(),
            snipe_extension: config.snipe_extension(),
            status_interval: config.status_interval(),
        })
    }

    pub fn host(&self) -> &UserName {
        &self.host
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    pub fn highest_bid(&self) -> Option<&Entrant> {
        self.base.participants().iter().max_by_key(|bid| bid.wager)
    }

    async fn bid(
        &mut self,
        user: UserName,
        amount: i64,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        if !self.base.is_open() {
            return Err(EventError::NotJoinable(EventKind::Auction));
        }
        if user == self.host {
            return Err(EventError::OwnAuction(user));
        }
        if amount < self.minimum_bid || amount <= 0 {
            return Err(EventError::BidBelowMinimum {
                minimum: self.minimum_bid.max(1),
            });
        }
        if let Some(highest) = self.highest_bid()
            && amount <= highest.wager
        {
            return Err(EventError::BidNotHigher {
                highest: highest.wager,
            });
        }
        let balance = ctx.ledger.balance(&user).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientPoints {
                user,
                balance,
                needed: amount,
            }
            .into());
        }

        match self.base.find_mut(&user) {
            Some(previous) => previous.wager = amount,
            None => {
                self.base
                    .add_participant(Entrant::new(user.clone(), amount), false, ctx.ledger.as_ref(), "auction bid")
                    .await?;
            }
        }
        debug!(%user, amount, item = %self.item, "Bid accepted");
        ctx.announce(format!("@{user} leads the auction for {} with {amount} points!", self.item));

        if let Some(remaining) = self.remaining
            && remaining < self.snipe_threshold
        {
            let extended = remaining + self.snipe_extension;
            self.remaining = Some(extended);
            info!(item = %self.item, remaining = extended.as_secs(), "Auction extended");
            ctx.announce(format!(
                "Snipe protection! The auction is extended by {} seconds.",
                self.snipe_extension.as_secs()
            ));
        }
        Ok(Directives::new())
    }

    async fn close(&mut self, user: UserName, ctx: &EventContext) -> Result<Directives, EventError> {
        if user != self.host {
            return Err(EventError::NotHost {
                user,
                host: self.host.clone(),
            });
        }
        if !self.base.is_open() {
            return Err(EventError::EventGone(EventKind::Auction));
        }
        Ok(self.close_out(ctx).await)
    }

    /// Charge the best bidder who can still pay.
    async fn close_out(&mut self, ctx: &EventContext) -> Directives {
        if !self.base.advance(EventState::Ended) {
            return Directives::new();
        }
        let bids = self
            .base
            .participants()
            .iter()
            .sorted_by_key(|bid| std::cmp::Reverse(bid.wager))
            .cloned()
            .collect::<Vec<_>>();

        for bid in &bids {
            match ctx
                .ledger
                .change_points(bid.user(), -bid.wager, "auction win")
                .await
            {
                Ok(_) => {
                    info!(item = %self.item, winner = %bid.user, price = bid.wager, "Auction sold");
                    ctx.announce(format!(
                        "Sold! @{} wins {} for {} points.",
                        bid.user, self.item, bid.wager
                    ));
                    return cooldown();
                }
                Err(e) => {
                    warn!(user = %bid.user, bid = bid.wager, error = %e, "Bidder cannot pay, trying the next one");
                }
            }
        }

        info!(item = %self.item, bids = bids.len(), "Auction closed without a sale");
        ctx.announce(format!("The auction for {} ended without a sale.", self.item));
        cooldown()
    }

    async fn tick(&mut self, ctx: &EventContext) -> Directives {
        if !self.base.is_open() {
            return Directives::new();
        }
        let Some(remaining) = self.remaining else {
            return Directives::new();
        };
        let remaining = remaining.saturating_sub(TICK);
        self.remaining = Some(remaining);
        if remaining.is_zero() {
            return self.close_out(ctx).await;
        }
        schedule(EventTimer::AuctionTick, TICK)
    }

    fn status(&self, ctx: &EventContext) -> Directives {
        if !self.base.is_open() {
            return Directives::new();
        }
        let message = match self.highest_bid() {
            Some(bid) => format!(
                "Auction for {}: @{} leads with {} points.",
                self.item, bid.user, bid.wager
            ),
            None => format!(
                "Auction for {}: no bids yet, the minimum is {} points.",
                self.item, self.minimum_bid
            ),
        };
        ctx.announce(message);
        schedule(EventTimer::AuctionStatus, self.status_interval)
    }
}

#[async_trait]
impl ParticipationEvent for Auction {
    fn kind(&self) -> EventKind {
        EventKind::Auction
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
            Admission::Rejected("The auction house is still wrapping up, try again shortly.".to_string())
        } else {
            Admission::Rejected("An auction is already running.".to_string())
        }
    }

    async fn start(&mut self, ctx: &EventContext) -> Result<Directives, EventError> {
        let ending = match self.remaining {
            Some(remaining) => format!("It ends in {} seconds.", remaining.as_secs()),
            None => format!("@{} will close it.", self.host),
        };
        ctx.announce(format!(
            "@{} is auctioning {}! The minimum bid is {} points, type !bid <points>. {ending}",
            self.host, self.item, self.minimum_bid
        ));

        let mut directives: Directives = smallvec![Directive::Schedule {
            timer: EventTimer::AuctionStatus,
            after: self.status_interval,
        }];
        if self.remaining.is_some() {
            directives.push(Directive::Schedule {
                timer: EventTimer::AuctionTick,
                after: TICK,
            });
        }
        Ok(directives)
    }

    async fn handle(
        &mut self,
        action: EventAction,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match action {
            EventAction::Bid { user, amount } | EventAction::Join { user, wager: amount } => {
                self.bid(user, amount, ctx).await
            }
            EventAction::Close { user } => self.close(user, ctx).await,
            other => Err(other.unsupported(EventKind::Auction)),
        }
    }

    async fn participation_period_ended(
        &mut self,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        Ok(self.close_out(ctx).await)
    }

    async fn on_timer(
        &mut self,
        timer: EventTimer,
        ctx: &EventContext,
    ) -> Result<Directives, EventError> {
        match timer {
            EventTimer::AuctionTick => Ok(self.tick(ctx).await),
            EventTimer::AuctionStatus => Ok(self.status(ctx)),
            _ => Ok(Directives::new()),
        }
    }

    async fn on_cooldown_complete(&mut self, ctx: &EventContext) {
        if !self.base.cooldown().is_zero() {
            ctx.announce("The auction house is open for new auctions.");
        }
    }

    async fn abort(&mut self, ctx: &EventContext) {
        if self.base.advance(EventState::Ended) {
            ctx.announce(format!("The auction for {} has been cancelled.", self.item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PointLedger;
    use crate::testing::{Fixture, user};

    fn timed(seconds: u64) -> Auction {
        Auction::new(
            user("host"),
            "Signed mousepad",
            10,
            Some(Duration::from_secs(seconds)),
            &AuctionConfig::default(),
        )
        .unwrap()
    }

    async fn bid(auction: &mut Auction, ctx: &EventContext, name: &str, amount: i64) -> Result<Directives, EventError> {
        auction
            .handle(EventAction::Bid { user: user(name), amount }, ctx)
            .await
    }

    #[tokio::test]
    async fn test_snipe_protection_extends_remaining_time() {
        let fixture = Fixture::with_balances(&[("alice", 500)]);
        let ctx = fixture.context();
        let mut auction = timed(60);
        auction.start(&ctx).await.unwrap();

        for _ in 0..52 {
            auction.on_timer(EventTimer::AuctionTick, &ctx).await.unwrap();
        }
        assert_eq!(auction.remaining(), Some(Duration::from_secs(8)));

        bid(&mut auction, &ctx, "alice", 50).await.unwrap();

        assert_eq!(auction.remaining(), Some(Duration::from_secs(28)));
        assert!(fixture.notifier.contains("Snipe protection"));
    }

    #[tokio::test]
    async fn test_no_extension_with_time_to_spare() {
        let fixture = Fixture::with_balances(&[("alice", 500)]);
        let ctx = fixture.context();
        let mut auction = timed(60);
        auction.start(&ctx).await.unwrap();

        bid(&mut auction, &ctx, "alice", 50).await.unwrap();

        assert_eq!(auction.remaining(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_bid_validation() {
        let fixture = Fixture::with_balances(&[("alice", 500), ("bob", 30), ("host", 500)]);
        let ctx = fixture.context();
        let mut auction = timed(60);
        auction.start(&ctx).await.unwrap();

        assert_eq!(
            bid(&mut auction, &ctx, "alice", 5).await.err(),
            Some(EventError::BidBelowMinimum { minimum: 10 })
        );
        bid(&mut auction, &ctx, "alice", 20).await.unwrap();
        assert_eq!(
            bid(&mut auction, &ctx, "bob", 20).await.err(),
            Some(EventError::BidNotHigher { highest: 20 })
        );
        assert!(matches!(
            bid(&mut auction, &ctx, "bob", 40).await,
            Err(EventError::Ledger(LedgerError::InsufficientPoints { .. }))
        ));
        assert_eq!(
            bid(&mut auction, &ctx, "host", 100).await.err(),
            Some(EventError::OwnAuction(user("host")))
        );
        assert!(fixture.ledger.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_rebid_replaces_entry_and_charges_once() {
        let fixture = Fixture::with_balances(&[("alice", 500), ("bob", 500)]);
        let ctx = fixture.context();
        let mut auction = timed(60);
        auction.start(&ctx).await.unwrap();

        bid(&mut auction, &ctx, "alice", 20).await.unwrap();
        bid(&mut auction, &ctx, "bob", 30).await.unwrap();
        bid(&mut auction, &ctx, "alice", 45).await.unwrap();

        assert_eq!(auction.participants().len(), 2);
        assert!(fixture.ledger.journal().await.is_empty());

        let directives = auction
            .handle(EventAction::Close { user: user("host") }, &ctx)
            .await
            .unwrap();

        assert_eq!(directives.as_slice(), &[Directive::Cooldown]);
        assert_eq!(fixture.balance("alice").await, 455);
        assert_eq!(fixture.balance("bob").await, 500);
        assert_eq!(fixture.ledger.journal().await.len(), 1);
    }

    #[tokio::test]
    async fn test_winner_who_spent_points_is_skipped() {
        let fixture = Fixture::with_balances(&[("alice", 100), ("bob", 100)]);
        let ctx = fixture.context();
        let mut auction = timed(60);
        auction.start(&ctx).await.unwrap();
        bid(&mut auction, &ctx, "bob", 50).await.unwrap();
        bid(&mut auction, &ctx, "alice", 80).await.unwrap();
        fixture
            .ledger
            .change_points(&user("alice"), -60, "elsewhere")
            .await
            .unwrap();

        auction
            .handle(EventAction::Close { user: user("host") }, &ctx)
            .await
            .unwrap();

        assert_eq!(fixture.balance("alice").await, 40);
        assert_eq!(fixture.balance("bob").await, 50);
        assert!(fixture.notifier.contains("@bob wins"));
    }

    #[tokio::test]
    async fn test_only_host_closes() {
        let fixture = Fixture::with_balances(&[]);
        let ctx = fixture.context();
        let mut auction =
            Auction::new(user("host"), "Poster", 0, None, &AuctionConfig::default()).unwrap();
        let directives = auction.start(&ctx).await.unwrap();
        assert_eq!(directives.len(), 1);

        let result = auction
            .handle(EventAction::Close { user: user("alice") }, &ctx)
            .await;
        assert!(matches!(result, Err(EventError::NotHost { .. })));

        auction
            .handle(EventAction::Close { user: user("host") }, &ctx)
            .await
            .unwrap();
        assert!(fixture.notifier.contains("without a sale"));
        assert!(fixture.ledger.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_closes_auction() {
        let fixture = Fixture::with_balances(&[("alice", 100)]);
        let ctx = fixture.context();
        let mut auction = timed(2);
        auction.start(&ctx).await.unwrap();
        bid(&mut auction, &ctx, "alice", 15).await.unwrap();
        // 2s remaining is below the snipe threshold
        assert_eq!(auction.remaining(), Some(Duration::from_secs(22)));

        let mut last = Directives::new();
        for _ in 0..22 {
            last = auction.on_timer(EventTimer::AuctionTick, &ctx).await.unwrap();
        }

        assert_eq!(last.as_slice(), &[Directive::Cooldown]);
        assert_eq!(auction.state(), EventState::Ended);
        assert_eq!(fixture.balance("alice").await, 85);
        assert!(auction
            .on_timer(EventTimer::AuctionStatus, &ctx)
            .await
            .unwrap()
            .is_empty());
    }
}
