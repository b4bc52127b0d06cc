//! Round controller: the single active funding round and past rounds.

use std::collections::BTreeMap;

use edu_types::{RoundId, TokenAmount};
use serde::{Deserialize, Serialize};

use crate::PlatformError;

/// A bounded funding cycle with an escrowed budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// Escrowed from the administrator when the round started.
    pub budget: TokenAmount,
    /// Distinct (voter, expert) first donations counted while active.
    pub total_votes: u64,
    /// Number of equal reward shares the budget is split into.
    pub reward_slots: u32,
    pub slots_paid: u32,
    /// Budget paid out as reward shares so far.
    pub distributed: TokenAmount,
    pub active: bool,
}

impl Round {
    /// The budget share each paid expert receives on top of its donations.
    pub fn reward_share(&self) -> TokenAmount {
        self.budget
            .checked_div(self.reward_slots)
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn slots_remaining(&self) -> u32 {
        self.reward_slots.saturating_sub(self.slots_paid)
    }

    /// Budget not yet paid out (unused slots plus the division remainder).
    pub fn undistributed(&self) -> TokenAmount {
        self.budget.saturating_sub(self.distributed)
    }
}

/// Owns every round ever started; at most one is active.
#[derive(Clone, Debug, Default)]
pub struct RoundController {
    rounds: BTreeMap<RoundId, Round>,
    current: Option<RoundId>,
}

impl RoundController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted rounds. `current` must name a stored round,
    /// and only the current round may be active.
    pub fn from_rounds(
        rounds: impl IntoIterator<Item = Round>,
        current: Option<RoundId>,
    ) -> Result<Self, PlatformError> {
        let mut map = BTreeMap::new();
        for round in rounds {
            let id = round.id;
            if round.active && Some(id) != current {
                return Err(PlatformError::Snapshot(format!(
                    "round {id} is active but not current"
                )));
            }
            if map.insert(id, round).is_some() {
                return Err(PlatformError::Snapshot(format!("round {id} appears twice")));
            }
        }
        if let Some(id) = current {
            if !map.contains_key(&id) {
                return Err(PlatformError::Snapshot(format!(
                    "current round {id} is missing"
                )));
            }
        }
        Ok(Self {
            rounds: map,
            current,
        })
    }

    /// The active round, if any.
    pub fn active(&self) -> Option<&Round> {
        self.current().filter(|r| r.active)
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut Round> {
        let id = self.current?;
        self.rounds.get_mut(&id).filter(|r| r.active)
    }

    /// The most recently started round, active or not.
    pub fn current(&self) -> Option<&Round> {
        self.current.and_then(|id| self.rounds.get(&id))
    }

    pub fn current_id(&self) -> Option<RoundId> {
        self.current
    }

    pub fn get(&self, id: RoundId) -> Option<&Round> {
        self.rounds.get(&id)
    }

    /// Rounds in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    /// Check a round with `id` may be opened now.
    pub fn ensure_can_start(&self, id: RoundId) -> Result<(), PlatformError> {
        if let Some(active) = self.active() {
            return Err(PlatformError::RoundAlreadyActive(active.id));
        }
        if self.rounds.contains_key(&id) {
            return Err(PlatformError::RoundIdReused(id));
        }
        Ok(())
    }

    /// Open a new active round. Callers check [`Self::ensure_can_start`] first.
    pub(crate) fn open(&mut self, id: RoundId, budget: TokenAmount, reward_slots: u32) -> &Round {
        self.current = Some(id);
        self.rounds.entry(id).or_insert(Round {
            id,
            budget,
            total_votes: 0,
            reward_slots,
            slots_paid: 0,
            distributed: TokenAmount::ZERO,
            active: true,
        })
    }

    /// Count one vote against the active round. Returns the new total, or
    /// `None` when no round is active and the vote is not counted.
    pub(crate) fn record_vote(&mut self) -> Option<u64> {
        let round = self.active_mut()?;
        round.total_votes = round.total_votes.saturating_add(1);
        Some(round.total_votes)
    }

    /// Mark the active round finished. Returns its id.
    pub(crate) fn close_active(&mut self) -> Option<RoundId> {
        let round = self.active_mut()?;
        round.active = false;
        Some(round.id)
    }
}
