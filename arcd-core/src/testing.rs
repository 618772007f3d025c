//! Shared fixtures for unit tests.

use crate::announcements::Notifier;
use crate::events::EventContext;
use crate::ledger::{MemoryInventory, MemoryLedger, PointLedger};
use arcd_sdk::objects::UserName;
use std::sync::{Arc, Mutex};

pub fn user(name: &str) -> UserName {
    UserName::new(name).unwrap()
}

/// Notifier that keeps every message it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, _channel: &str, message: String) {
        self.messages.lock().unwrap().push(message);
    }
}

pub struct Fixture {
    pub ledger: Arc<MemoryLedger>,
    pub inventory: Arc<MemoryInventory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    pub fn with_balances(balances: &[(&str, i64)]) -> Self {
        Self::new(balances, &[])
    }

    pub fn new(balances: &[(&str, i64)], cards: &[(&str, &[&str])]) -> Self {
        let ledger = MemoryLedger::with_balances(balances.iter().map(|(u, p)| (user(u), *p)));
        let inventory = MemoryInventory::with_cards(cards.iter().map(|(u, owned)| {
            (user(u), owned.iter().map(|c| c.to_string()).collect())
        }));
        Self {
            ledger: Arc::new(ledger),
            inventory: Arc::new(inventory),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn context(&self) -> EventContext {
        EventContext::new(
            self.ledger.clone(),
            self.inventory.clone(),
            self.notifier.clone(),
            "#arcade",
        )
    }

    pub async fn balance(&self, name: &str) -> i64 {
        self.ledger.balance(&user(name)).await.unwrap()
    }
}
