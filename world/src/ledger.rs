//! Player currency bookkeeping.

use tracing::debug;
use waypoint_defence_core::Event;

/// Single source of truth for the player's currency.
///
/// The balance is unsigned and every debit is conditional, so the ledger can
/// never be overdrawn. Each change is broadcast as [`Event::BalanceChanged`].
#[derive(Clone, Debug)]
pub struct EconomyLedger {
    balance: u32,
    low_funds_threshold: u32,
}

impl EconomyLedger {
    /// Creates a ledger holding `starting_money`.
    #[must_use]
    pub const fn new(starting_money: u32, low_funds_threshold: u32) -> Self {
        Self {
            balance: starting_money,
            low_funds_threshold,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Reports whether the balance sits below the low-funds threshold.
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.balance < self.low_funds_threshold
    }

    /// Adds `amount` to the balance.
    pub fn credit(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.balance = self.balance.saturating_add(amount);
        debug!(target: "td.economy", amount, balance = self.balance, "credited");
        self.broadcast(out_events);
    }

    /// Removes `amount` from the balance when enough funds are available.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    pub fn debit(&mut self, amount: u32, out_events: &mut Vec<Event>) -> bool {
        let Some(remaining) = self.balance.checked_sub(amount) else {
            debug!(target: "td.economy", amount, balance = self.balance, "insufficient funds");
            return false;
        };

        self.balance = remaining;
        debug!(target: "td.economy", amount, balance = self.balance, "debited");
        self.broadcast(out_events);
        true
    }

    /// Restores the balance to `starting_money`.
    pub fn reset(&mut self, starting_money: u32, out_events: &mut Vec<Event>) {
        self.balance = starting_money;
        self.broadcast(out_events);
    }

    fn broadcast(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::BalanceChanged {
            balance: self.balance,
            low_funds: self.is_low(),
        });
    }
}
