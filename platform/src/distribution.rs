//! Distribution engine: reward payouts to experts and refunds to voters.
//!
//! Every payout follows the same order: plan (pure checks), commit the
//! accounting, call the token collaborator, and undo the commit if the
//! transfer fails. The commit happens before the transfer, so nothing the
//! transfer does can observe the pre-payout state.

use std::collections::BTreeMap;

use edu_types::{Address, CourseStatus, ExpertId, RoundId, TokenAmount};
use serde::{Deserialize, Serialize};

use crate::experts::{Expert, ExpertLedger};
use crate::round::Round;
use crate::PlatformError;

/// A reward payout to one expert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardPayout {
    pub expert: ExpertId,
    pub round: RoundId,
    pub payee: Address,
    /// The expert's collected donations.
    pub donations: TokenAmount,
    /// The expert's share of the round budget.
    pub share: TokenAmount,
    pub total: TokenAmount,
}

/// Where a refund is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefundSource {
    /// The expert's course was canceled in the current round.
    Canceled,
    /// Carried over from a round that has since been rolled over.
    Carried,
}

/// A refund of one voter's donations to one canceled expert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefundPayout {
    pub expert: ExpertId,
    pub voter: Address,
    pub amount: TokenAmount,
    pub source: RefundSource,
}

/// Compute the payout for `expert` against the active `round`.
pub fn plan_reward(expert: &Expert, round: &Round) -> Result<RewardPayout, PlatformError> {
    if !expert.status.is_actionable() {
        return Err(PlatformError::NotActionable {
            id: expert.id,
            status: expert.status,
        });
    }
    if round.slots_remaining() == 0 {
        return Err(PlatformError::RewardSlotsExhausted {
            round: round.id,
            slots: round.reward_slots,
        });
    }
    let share = round.reward_share();
    let total = expert
        .balance
        .checked_add(share)
        .ok_or(PlatformError::AmountOverflow)?;
    Ok(RewardPayout {
        expert: expert.id,
        round: round.id,
        payee: expert.address.clone(),
        donations: expert.balance,
        share,
        total,
    })
}

/// Mark the expert paid and consume one reward slot.
pub(crate) fn commit_reward(expert: &mut Expert, round: &mut Round, payout: &RewardPayout) {
    expert.status = CourseStatus::Done;
    round.slots_paid += 1;
    round.distributed = round.distributed + payout.share;
}

/// Undo [`commit_reward`] after a failed transfer.
pub(crate) fn revert_reward(expert: &mut Expert, round: &mut Round, payout: &RewardPayout) {
    expert.status = CourseStatus::Pending;
    round.slots_paid -= 1;
    round.distributed = round.distributed - payout.share;
}

/// Check a refund claim against the current round's records.
pub fn plan_refund(expert: &Expert, voter: &Address) -> Result<RefundPayout, PlatformError> {
    if expert.status != CourseStatus::Canceled {
        return Err(PlatformError::NotCanceled(expert.id));
    }
    let amount = expert.donation_of(voter);
    if amount.is_zero() {
        return Err(PlatformError::NothingToWithdraw {
            id: expert.id,
            voter: voter.clone(),
        });
    }
    Ok(RefundPayout {
        expert: expert.id,
        voter: voter.clone(),
        amount,
        source: RefundSource::Canceled,
    })
}

/// Zero the entitlement a refund is drawn from.
pub(crate) fn commit_refund(experts: &mut ExpertLedger, refunds: &mut RefundBook, payout: &RefundPayout) {
    match payout.source {
        RefundSource::Canceled => {
            if let Some(expert) = experts.get_mut(payout.expert) {
                expert.take_donation(&payout.voter);
            }
        }
        RefundSource::Carried => {
            refunds.take(payout.expert, &payout.voter);
        }
    }
}

/// Undo [`commit_refund`] after a failed transfer.
pub(crate) fn revert_refund(experts: &mut ExpertLedger, refunds: &mut RefundBook, payout: &RefundPayout) {
    match payout.source {
        RefundSource::Canceled => {
            if let Some(expert) = experts.get_mut(payout.expert) {
                expert.restore_donation(&payout.voter, payout.amount);
            }
        }
        RefundSource::Carried => refunds.restore(payout),
    }
}

/// A refund entitlement kept across a round rollover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarriedRefund {
    pub expert: ExpertId,
    pub voter: Address,
    pub amount: TokenAmount,
}

/// Unclaimed refunds of canceled courses whose round has been rolled over.
#[derive(Clone, Debug, Default)]
pub struct RefundBook {
    carried: BTreeMap<(ExpertId, Address), TokenAmount>,
}

impl RefundBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CarriedRefund>) -> Self {
        let mut book = Self::new();
        for entry in entries {
            book.carry(entry.expert, entry.voter, entry.amount);
        }
        book
    }

    /// Add to the voter's carried entitlement for `expert`.
    pub(crate) fn carry(&mut self, expert: ExpertId, voter: Address, amount: TokenAmount) {
        if amount.is_zero() {
            return;
        }
        let entry = self.carried.entry((expert, voter)).or_default();
        // Every carried amount is also held in custody, so the sum fits.
        *entry = entry.checked_add(amount).unwrap_or(TokenAmount::new(u128::MAX));
    }

    pub fn get(&self, expert: ExpertId, voter: &Address) -> TokenAmount {
        self.carried
            .get(&(expert, voter.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// The carried entitlement of `voter` for `expert` as a payout, if any.
    pub fn plan(&self, expert: ExpertId, voter: &Address) -> Option<RefundPayout> {
        let amount = self.get(expert, voter);
        (!amount.is_zero()).then(|| RefundPayout {
            expert,
            voter: voter.clone(),
            amount,
            source: RefundSource::Carried,
        })
    }

    /// Remove the carried entitlement and return what it held.
    pub(crate) fn take(&mut self, expert: ExpertId, voter: &Address) -> TokenAmount {
        self.carried
            .remove(&(expert, voter.clone()))
            .unwrap_or_default()
    }

    /// Put back an entitlement removed by [`RefundBook::take`].
    pub(crate) fn restore(&mut self, payout: &RefundPayout) {
        self.carry(payout.expert, payout.voter.clone(), payout.amount);
    }

    pub fn total(&self) -> TokenAmount {
        self.carried.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.carried.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carried.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = CarriedRefund> + '_ {
        self.carried
            .iter()
            .map(|((expert, voter), amount)| CarriedRefund {
                expert: *expert,
                voter: voter.clone(),
                amount: *amount,
            })
    }
}
