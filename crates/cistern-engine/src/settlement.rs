//! Inbound deposit settlement
//!
//! The host forwards every currency transfer notification touching the
//! treasury account to [`CisternEngine::deposit`]. Most notifications are
//! not deposits at all (our own market purchases settling, our own
//! outbound payments) and are ignored; real deposits buy resource bytes
//! for the account named in the memo or are rejected outright. A rejected
//! deposit means the host must fail the whole transfer, so funds are
//! never silently absorbed.

use tracing::info;

use cistern_core::{AccountId, CisternError, CurrencyAmount, Result};
use cistern_market::deposit_bytes;

use crate::effects::EffectRequest;
use crate::engine::CisternEngine;
use crate::receipts::DepositOutcome;

impl CisternEngine {
    /// Settle a currency transfer notification
    ///
    /// `from` and `to` are the transfer parties as seen by the currency
    /// ledger, `quantity` the amount, `symbol` its denomination and `memo`
    /// the free-form note naming the account to credit. The purchased
    /// byte count is quoted at the current reserves; the `BuyResource`
    /// effect that actually spends the deposit is emitted last.
    pub fn deposit(
        &self,
        from: &AccountId,
        to: &AccountId,
        quantity: CurrencyAmount,
        symbol: &str,
        memo: &str,
    ) -> Result<DepositOutcome> {
        // Pass-through notifications: the market settling one of our own
        // purchases, transfers not addressed to the treasury, and the
        // treasury's own outbound payments.
        if from == &self.config.market_account
            || to != &self.config.treasury
            || from == &self.config.treasury
        {
            return Ok(DepositOutcome::Ignored);
        }

        let state = self.state.read();
        let mut balances = self.balances.write();

        if symbol != self.config.currency_symbol {
            return Err(CisternError::InvalidInput(format!(
                "deposit must be denominated in {}, got {symbol}",
                self.config.currency_symbol
            )));
        }
        Self::check_enabled(&state)?;
        if quantity <= 0 {
            return Err(CisternError::InvalidInput(
                "deposit quantity must be positive".into(),
            ));
        }
        let receiver_name = memo.trim();
        if receiver_name.is_empty() {
            return Err(CisternError::InvalidInput(
                "deposit memo must name the receiving account".into(),
            ));
        }
        let receiver: AccountId = receiver_name.parse().map_err(|_| {
            CisternError::InvalidInput(format!(
                "deposit memo {memo:?} is not a valid account name"
            ))
        })?;
        if !self.config.allow_gifting && &receiver != from {
            return Err(CisternError::InvalidInput(format!(
                "gifting is disabled: memo names {receiver} but the deposit came from {from}"
            )));
        }
        if receiver == self.config.treasury {
            return Err(CisternError::InvalidInput(
                "the treasury cannot be the deposit receiver".into(),
            ));
        }

        let bytes = deposit_bytes(quantity, &self.reserves.reserves());
        if bytes <= 0 {
            return Err(CisternError::UnderfundedDeposit { quantity });
        }
        if !balances.is_open(&receiver) {
            return Err(CisternError::AccountNotOpened(receiver));
        }

        // Commit.
        balances.add_resource(&receiver, bytes)?;
        let mut effects = self.effects.lock();
        effects.push(EffectRequest::BuyResource { cost: quantity });

        info!(
            "Deposit of {quantity} {} from {from} bought {bytes} bytes for {receiver}",
            self.config.currency_symbol
        );
        Ok(DepositOutcome::Credited { receiver, bytes })
    }
}
