//! Nullable token: an in-memory fungible token with a single custody account.

use edu_token::{TokenError, TokenLedger};
use edu_types::{Address, TokenAmount};
use std::collections::HashMap;

/// Which way a recorded transfer moved tokens relative to custody.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferDirection {
    In,
    Out,
}

/// A completed transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub direction: TransferDirection,
    pub counterparty: Address,
    pub amount: TokenAmount,
}

/// A deterministic token for testing.
///
/// Balances only change through [`NullToken::mint`] and the two transfer
/// operations. Failures can be injected per direction; an injected failure
/// is consumed by the next transfer in that direction and leaves balances
/// untouched.
#[derive(Debug, Default)]
pub struct NullToken {
    balances: HashMap<Address, TokenAmount>,
    allowances: HashMap<Address, TokenAmount>,
    custody: TokenAmount,
    fail_next_in: bool,
    fail_next_out: bool,
    log: Vec<TransferRecord>,
}

impl NullToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `holder` with freshly minted tokens.
    pub fn mint(&mut self, holder: &Address, amount: TokenAmount) {
        let balance = self.balances.entry(holder.clone()).or_default();
        *balance = *balance + amount;
    }

    /// Set the amount `owner` authorises the fund to pull (replaces any previous value).
    pub fn approve(&mut self, owner: &Address, amount: TokenAmount) {
        self.allowances.insert(owner.clone(), amount);
    }

    /// Tokens held in the fund's custody account.
    pub fn custody_balance(&self) -> TokenAmount {
        self.custody
    }

    /// Reject the next `transfer_in` call.
    pub fn fail_next_transfer_in(&mut self) {
        self.fail_next_in = true;
    }

    /// Reject the next `transfer_out` call.
    pub fn fail_next_transfer_out(&mut self) {
        self.fail_next_out = true;
    }

    /// All completed transfers, oldest first.
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.log
    }

    /// Total paid out of custody to `payee`.
    pub fn paid_to(&self, payee: &Address) -> TokenAmount {
        self.log
            .iter()
            .filter(|r| r.direction == TransferDirection::Out && &r.counterparty == payee)
            .map(|r| r.amount)
            .sum()
    }

    /// Sum of every balance plus custody. Constant unless tokens are minted.
    pub fn total_supply(&self) -> TokenAmount {
        self.balances.values().copied().sum::<TokenAmount>() + self.custody
    }
}

impl TokenLedger for NullToken {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address) -> TokenAmount {
        self.allowances.get(owner).copied().unwrap_or_default()
    }

    fn transfer_in(&mut self, payer: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        if std::mem::take(&mut self.fail_next_in) {
            return Err(TokenError::Rejected("injected transfer_in failure".into()));
        }
        let allowance = self.allowance(payer);
        let remaining_allowance =
            allowance
                .checked_sub(amount)
                .ok_or_else(|| TokenError::InsufficientAllowance {
                    owner: payer.clone(),
                    needed: amount,
                    available: allowance,
                })?;
        let balance = self.balance_of(payer);
        let remaining_balance =
            balance
                .checked_sub(amount)
                .ok_or_else(|| TokenError::InsufficientBalance {
                    holder: payer.clone(),
                    needed: amount,
                    available: balance,
                })?;

        self.allowances.insert(payer.clone(), remaining_allowance);
        self.balances.insert(payer.clone(), remaining_balance);
        self.custody = self.custody + amount;
        self.log.push(TransferRecord {
            direction: TransferDirection::In,
            counterparty: payer.clone(),
            amount,
        });
        Ok(())
    }

    fn transfer_out(&mut self, payee: &Address, amount: TokenAmount) -> Result<(), TokenError> {
        if std::mem::take(&mut self.fail_next_out) {
            return Err(TokenError::Rejected("injected transfer_out failure".into()));
        }
        let remaining = self
            .custody
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientCustody {
                needed: amount,
                available: self.custody,
            })?;

        self.custody = remaining;
        self.mint(payee, amount);
        self.log.push(TransferRecord {
            direction: TransferDirection::Out,
            counterparty: payee.clone(),
            amount,
        });
        Ok(())
    }
}
