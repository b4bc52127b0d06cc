//! Fund parameters fixed by configuration.

use crate::amount::TokenAmount;
use serde::{Deserialize, Serialize};

/// Parameters governing reward distribution and donation acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundParams {
    /// Number of reward shares the round budget is divided into.
    /// Each expert paid out in a round receives `budget / reward_slots`
    /// on top of its collected donations. Must be at least 1.
    #[serde(default = "default_reward_slots")]
    pub reward_slots: u32,

    /// Smallest accepted donation (raw units). Must be at least 1 so a
    /// donation always leaves a non-zero record behind. Kept as `u64`
    /// so the value survives TOML, which has no 128-bit integers.
    #[serde(default = "default_min_donation")]
    pub min_donation: u64,
}

fn default_reward_slots() -> u32 {
    2
}

fn default_min_donation() -> u64 {
    1
}

impl FundParams {
    /// Two reward slots and a one-unit minimum donation.
    pub fn reference_defaults() -> Self {
        Self {
            reward_slots: default_reward_slots(),
            min_donation: default_min_donation(),
        }
    }

    pub fn min_donation_amount(&self) -> TokenAmount {
        TokenAmount::new(u128::from(self.min_donation))
    }

    pub fn with_reward_slots(mut self, reward_slots: u32) -> Self {
        self.reward_slots = reward_slots;
        self
    }

    pub fn with_min_donation(mut self, min_donation: u64) -> Self {
        self.min_donation = min_donation;
        self
    }
}

impl Default for FundParams {
    fn default() -> Self {
        Self::reference_defaults()
    }
}
