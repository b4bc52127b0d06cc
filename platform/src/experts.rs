//! Expert ledger: approved experts with per-round donation accounting.
//!
//! Expert ids are assigned sequentially at approval and never reused; the
//! list is append-only, so `ExpertId::index()` is the position in it.

use std::collections::BTreeMap;

use edu_types::{Address, CourseStatus, ExpertId, TokenAmount};
use serde::{Deserialize, Serialize};

use crate::PlatformError;

/// An approved expert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expert {
    pub id: ExpertId,
    pub address: Address,
    /// Donations accumulated for the current round. Doubles as voting weight.
    pub balance: TokenAmount,
    pub status: CourseStatus,
    /// Cumulative donation per voter in the current round.
    pub voters_donated: BTreeMap<Address, TokenAmount>,
}

/// Outcome of recording one donation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DonationReceipt {
    /// The voter had no recorded donation to this expert before.
    pub first_from_voter: bool,
    pub voter_total: TokenAmount,
    pub expert_balance: TokenAmount,
}

impl Expert {
    fn new(id: ExpertId, address: Address) -> Self {
        Self {
            id,
            address,
            balance: TokenAmount::ZERO,
            status: CourseStatus::Pending,
            voters_donated: BTreeMap::new(),
        }
    }

    /// What `voter` has donated to this expert in the current round.
    pub fn donation_of(&self, voter: &Address) -> TokenAmount {
        self.voters_donated.get(voter).copied().unwrap_or_default()
    }

    /// Voters with a non-zero recorded donation.
    pub fn voter_count(&self) -> usize {
        self.voters_donated.values().filter(|a| !a.is_zero()).count()
    }

    /// Fails unless both totals can absorb `amount`. Leaves the expert untouched.
    pub fn check_donation(&self, voter: &Address, amount: TokenAmount) -> Result<(), PlatformError> {
        self.balance
            .checked_add(amount)
            .and(self.donation_of(voter).checked_add(amount))
            .map(|_| ())
            .ok_or(PlatformError::AmountOverflow)
    }

    /// Add `amount` from `voter` to the balance and the voter's record.
    pub(crate) fn record_donation(
        &mut self,
        voter: &Address,
        amount: TokenAmount,
    ) -> Result<DonationReceipt, PlatformError> {
        let previous = self.donation_of(voter);
        let voter_total = previous
            .checked_add(amount)
            .ok_or(PlatformError::AmountOverflow)?;
        let expert_balance = self
            .balance
            .checked_add(amount)
            .ok_or(PlatformError::AmountOverflow)?;

        self.balance = expert_balance;
        self.voters_donated.insert(voter.clone(), voter_total);
        Ok(DonationReceipt {
            first_from_voter: previous.is_zero(),
            voter_total,
            expert_balance,
        })
    }

    /// Zero the voter's record and return what it held.
    pub(crate) fn take_donation(&mut self, voter: &Address) -> TokenAmount {
        match self.voters_donated.get_mut(voter) {
            Some(amount) => std::mem::take(amount),
            None => TokenAmount::ZERO,
        }
    }

    /// Put back a record taken by [`Expert::take_donation`].
    pub(crate) fn restore_donation(&mut self, voter: &Address, amount: TokenAmount) {
        self.voters_donated.insert(voter.clone(), amount);
    }

    /// Clear per-round accounting. Returns the unclaimed donations of a
    /// canceled course so they can be carried forward.
    fn reset_for_round(&mut self) -> Vec<(Address, TokenAmount)> {
        let voters = std::mem::take(&mut self.voters_donated);
        let unclaimed = if self.status == CourseStatus::Canceled {
            voters.into_iter().filter(|(_, a)| !a.is_zero()).collect()
        } else {
            Vec::new()
        };
        self.balance = TokenAmount::ZERO;
        self.status = CourseStatus::Pending;
        unclaimed
    }
}

/// The append-only list of approved experts with an address index.
#[derive(Clone, Debug, Default)]
pub struct ExpertLedger {
    experts: Vec<Expert>,
    by_address: BTreeMap<Address, ExpertId>,
}

impl ExpertLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted experts, checking ids are sequential and
    /// addresses unique.
    pub fn from_experts(experts: Vec<Expert>) -> Result<Self, PlatformError> {
        let mut by_address = BTreeMap::new();
        for (position, expert) in experts.iter().enumerate() {
            if expert.id.index() != position {
                return Err(PlatformError::Snapshot(format!(
                    "expert id {} stored at position {position}",
                    expert.id
                )));
            }
            if by_address.insert(expert.address.clone(), expert.id).is_some() {
                return Err(PlatformError::Snapshot(format!(
                    "expert address {} appears twice",
                    expert.address
                )));
            }
        }
        Ok(Self {
            experts,
            by_address,
        })
    }

    /// Admit `address` as an expert with the next sequential id.
    pub fn enroll(&mut self, address: &Address) -> Result<ExpertId, PlatformError> {
        if self.by_address.contains_key(address) {
            return Err(PlatformError::AlreadyApproved(address.clone()));
        }
        let id = ExpertId::new(self.experts.len() as u64);
        self.experts.push(Expert::new(id, address.clone()));
        self.by_address.insert(address.clone(), id);
        Ok(id)
    }

    pub fn get(&self, id: ExpertId) -> Option<&Expert> {
        self.experts.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ExpertId) -> Option<&mut Expert> {
        self.experts.get_mut(id.index())
    }

    /// Look up an expert or fail with `ExpertNotFound`.
    pub fn require(&self, id: ExpertId) -> Result<&Expert, PlatformError> {
        self.get(id).ok_or(PlatformError::ExpertNotFound(id))
    }

    pub(crate) fn require_mut(&mut self, id: ExpertId) -> Result<&mut Expert, PlatformError> {
        self.get_mut(id).ok_or(PlatformError::ExpertNotFound(id))
    }

    pub fn find_by_address(&self, address: &Address) -> Option<&Expert> {
        self.by_address.get(address).and_then(|id| self.get(*id))
    }

    pub fn contains_address(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.experts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experts.is_empty()
    }

    /// Experts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Expert> {
        self.experts.iter()
    }

    /// No expert is still waiting to be paid or canceled.
    pub fn all_settled(&self) -> bool {
        self.experts.iter().all(|e| e.status.is_settled())
    }

    /// Sum of every expert's current-round balance.
    pub fn total_balance(&self) -> TokenAmount {
        self.experts.iter().map(|e| e.balance).sum()
    }

    /// Reset every expert settled in the previous round. Experts still
    /// pending keep their donations, which count toward the next round.
    /// Returns unclaimed refunds of canceled courses as
    /// `(expert, voter, amount)`.
    pub(crate) fn rollover(&mut self) -> Vec<(ExpertId, Address, TokenAmount)> {
        let mut unclaimed = Vec::new();
        for expert in self.experts.iter_mut().filter(|e| e.status.is_settled()) {
            let id = expert.id;
            unclaimed.extend(
                expert
                    .reset_for_round()
                    .into_iter()
                    .map(|(voter, amount)| (id, voter, amount)),
            );
        }
        unclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(n: u8) -> Address {
        Address::new(format!("user_{n}"))
    }

    fn amount(raw: u128) -> TokenAmount {
        TokenAmount::new(raw)
    }

    #[test]
    fn test_enroll_assigns_sequential_ids() {
        let mut ledger = ExpertLedger::new();
        assert_eq!(ledger.enroll(&test_address(1)).unwrap(), ExpertId::new(0));
        assert_eq!(ledger.enroll(&test_address(2)).unwrap(), ExpertId::new(1));

        let expert = ledger.get(ExpertId::new(1)).unwrap();
        assert_eq!(expert.address, test_address(2));
        assert_eq!(expert.balance, TokenAmount::ZERO);
        assert_eq!(expert.status, CourseStatus::Pending);
        assert_eq!(
            ledger.find_by_address(&test_address(1)).unwrap().id,
            ExpertId::new(0)
        );
    }

    #[test]
    fn test_enroll_same_address_twice_fails() {
        let mut ledger = ExpertLedger::new();
        ledger.enroll(&test_address(1)).unwrap();
        assert!(matches!(
            ledger.enroll(&test_address(1)),
            Err(PlatformError::AlreadyApproved(_))
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_record_donation_flags_first_donation_only() {
        let mut ledger = ExpertLedger::new();
        let id = ledger.enroll(&test_address(1)).unwrap();
        let expert = ledger.get_mut(id).unwrap();

        let first = expert.record_donation(&test_address(5), amount(10)).unwrap();
        assert!(first.first_from_voter);
        let second = expert.record_donation(&test_address(5), amount(15)).unwrap();
        assert!(!second.first_from_voter);
        assert_eq!(second.voter_total, amount(25));
        assert_eq!(second.expert_balance, amount(25));
        assert_eq!(expert.voter_count(), 1);
    }

    #[test]
    fn test_record_donation_overflow_leaves_state_untouched() {
        let mut ledger = ExpertLedger::new();
        let id = ledger.enroll(&test_address(1)).unwrap();
        let expert = ledger.get_mut(id).unwrap();
        expert.record_donation(&test_address(5), amount(u128::MAX)).unwrap();

        assert!(matches!(
            expert.check_donation(&test_address(6), amount(1)),
            Err(PlatformError::AmountOverflow)
        ));
        assert!(expert.record_donation(&test_address(6), amount(1)).is_err());
        assert_eq!(expert.donation_of(&test_address(6)), TokenAmount::ZERO);
        assert_eq!(expert.balance, amount(u128::MAX));
    }

    #[test]
    fn test_take_and_restore_donation() {
        let mut ledger = ExpertLedger::new();
        let id = ledger.enroll(&test_address(1)).unwrap();
        let expert = ledger.get_mut(id).unwrap();
        expert.record_donation(&test_address(5), amount(40)).unwrap();

        assert_eq!(expert.take_donation(&test_address(5)), amount(40));
        assert_eq!(expert.donation_of(&test_address(5)), TokenAmount::ZERO);
        assert_eq!(expert.take_donation(&test_address(5)), TokenAmount::ZERO);

        expert.restore_donation(&test_address(5), amount(40));
        assert_eq!(expert.donation_of(&test_address(5)), amount(40));
    }

    #[test]
    fn test_rollover_resets_settled_and_keeps_pending() {
        let mut ledger = ExpertLedger::new();
        let done = ledger.enroll(&test_address(1)).unwrap();
        let canceled = ledger.enroll(&test_address(2)).unwrap();
        let pending = ledger.enroll(&test_address(3)).unwrap();
        for id in [done, canceled, pending] {
            ledger
                .get_mut(id)
                .unwrap()
                .record_donation(&test_address(9), amount(7))
                .unwrap();
        }
        ledger.get_mut(done).unwrap().status = CourseStatus::Done;
        ledger.get_mut(canceled).unwrap().status = CourseStatus::Canceled;

        let unclaimed = ledger.rollover();

        assert_eq!(unclaimed, vec![(canceled, test_address(9), amount(7))]);
        for id in [done, canceled] {
            let expert = ledger.get(id).unwrap();
            assert_eq!(expert.status, CourseStatus::Pending);
            assert_eq!(expert.balance, TokenAmount::ZERO);
            assert!(expert.voters_donated.is_empty());
        }
        assert_eq!(ledger.get(pending).unwrap().balance, amount(7));
    }

    #[test]
    fn test_all_settled() {
        let mut ledger = ExpertLedger::new();
        assert!(ledger.all_settled());
        let id = ledger.enroll(&test_address(1)).unwrap();
        assert!(!ledger.all_settled());
        ledger.get_mut(id).unwrap().status = CourseStatus::Done;
        assert!(ledger.all_settled());
    }

    #[test]
    fn test_from_experts_rejects_gaps() {
        let mut ledger = ExpertLedger::new();
        ledger.enroll(&test_address(1)).unwrap();
        ledger.enroll(&test_address(2)).unwrap();
        let mut experts: Vec<Expert> = ledger.iter().cloned().collect();
        experts.remove(0);

        assert!(matches!(
            ExpertLedger::from_experts(experts),
            Err(PlatformError::Snapshot(_))
        ));
    }
}
