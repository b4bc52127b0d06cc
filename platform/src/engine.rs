//! The platform authority: the single serialized mutator over all fund state.
//!
//! Every operation takes `&mut self`, validates fully before touching any
//! state, and either completes or leaves the platform exactly as it was.
//! Inbound transfers run before the accounting is recorded; outbound
//! transfers run after it and the accounting is rolled back if they fail.

use edu_token::{TokenError, TokenLedger};
use edu_types::{
    Address, CourseStatus, ExpertId, FundParams, RegistrationStatus, RoundId, TokenAmount,
};
use tracing::{debug, info, warn};

use crate::distribution::{self, RefundBook, RefundPayout, RewardPayout};
use crate::experts::{DonationReceipt, Expert, ExpertLedger};
use crate::registry::{RegistrationRegistry, RegistrationRequest};
use crate::round::{Round, RoundController};
use crate::snapshot::{PlatformSnapshot, SnapshotContent};
use crate::{PlatformConfig, PlatformError};

pub struct EducationPlatform<T: TokenLedger> {
    admin: Address,
    params: FundParams,
    registry: RegistrationRegistry,
    experts: ExpertLedger,
    rounds: RoundController,
    refunds: RefundBook,
    /// Tokens the platform holds on behalf of budgets and donations.
    custody: TokenAmount,
    token: T,
}

impl<T: TokenLedger> EducationPlatform<T> {
    pub fn new(config: &PlatformConfig, token: T) -> Result<Self, PlatformError> {
        config.validate()?;
        info!(
            admin = %config.admin,
            reward_slots = config.params.reward_slots,
            min_donation = config.params.min_donation,
            "platform created"
        );
        Ok(Self {
            admin: config.admin.clone(),
            params: config.params.clone(),
            registry: RegistrationRegistry::new(),
            experts: ExpertLedger::new(),
            rounds: RoundController::new(),
            refunds: RefundBook::new(),
            custody: TokenAmount::ZERO,
            token,
        })
    }

    /// Rebuild a platform from a verified snapshot. Parameters come from
    /// `config`; the administrator comes from the snapshot.
    pub fn restore(
        config: &PlatformConfig,
        snapshot: &PlatformSnapshot,
        token: T,
    ) -> Result<Self, PlatformError> {
        config.validate()?;
        snapshot.verify()?;
        let content = &snapshot.content;

        let registry = RegistrationRegistry::from_requests(content.requests.iter().cloned())?;
        let experts = ExpertLedger::from_experts(content.experts.clone())?;
        for expert in experts.iter() {
            if registry.get(&expert.address).map(|r| r.status) != Some(RegistrationStatus::Approved) {
                return Err(PlatformError::Snapshot(format!(
                    "expert {} has no approved registration",
                    expert.id
                )));
            }
        }
        let rounds = RoundController::from_rounds(content.rounds.iter().cloned(), content.current_round)?;
        let refunds = RefundBook::from_entries(content.carried_refunds.iter().cloned());

        info!(
            hash = %snapshot.hash_hex(),
            experts = experts.len(),
            rounds = content.rounds.len(),
            custody = %content.custody,
            "platform restored from snapshot"
        );
        Ok(Self {
            admin: content.admin.clone(),
            params: config.params.clone(),
            registry,
            experts,
            rounds,
            refunds,
            custody: content.custody,
            token,
        })
    }

    pub fn snapshot(&self) -> Result<PlatformSnapshot, PlatformError> {
        PlatformSnapshot::create(SnapshotContent {
            admin: self.admin.clone(),
            requests: self.registry.iter().cloned().collect(),
            experts: self.experts.iter().cloned().collect(),
            rounds: self.rounds.iter().cloned().collect(),
            current_round: self.rounds.current_id(),
            carried_refunds: self.refunds.entries().collect(),
            custody: self.custody,
        })
    }

    // --- Registration ---

    /// File a registration request for `caller`.
    pub fn register(&mut self, caller: &Address, display_name: &str) -> Result<(), PlatformError> {
        ensure_valid(caller)?;
        let is_expert = self.experts.contains_address(caller);
        self.registry.submit(caller, display_name, is_expert)?;
        info!(requester = %caller, name = display_name, "registration requested");
        Ok(())
    }

    /// Approve a pending request and enroll the requester as an expert.
    pub fn approve(&mut self, caller: &Address, requester: &Address) -> Result<ExpertId, PlatformError> {
        self.ensure_admin(caller)?;
        if self.experts.contains_address(requester) {
            return Err(PlatformError::AlreadyApproved(requester.clone()));
        }
        self.registry.ensure_pending(requester)?;
        self.registry.approve(requester)?;
        let id = self.experts.enroll(requester)?;
        info!(expert = %id, address = %requester, "expert approved");
        Ok(id)
    }

    // --- Rounds ---

    /// Escrow `budget` from the administrator and open round `id`.
    ///
    /// Experts settled in the previous round are reset; unclaimed refunds of
    /// their canceled courses stay claimable.
    pub fn start_round(
        &mut self,
        caller: &Address,
        id: RoundId,
        budget: TokenAmount,
    ) -> Result<&Round, PlatformError> {
        self.ensure_admin(caller)?;
        self.rounds.ensure_can_start(id)?;
        self.pull(caller, budget)?;

        let carried = self.experts.rollover();
        if !carried.is_empty() {
            debug!(entries = carried.len(), "carrying unclaimed refunds forward");
        }
        for (expert, voter, amount) in carried {
            self.refunds.carry(expert, voter, amount);
        }

        let round = self.rounds.open(id, budget, self.params.reward_slots);
        info!(
            round = %round.id,
            budget = %round.budget,
            reward_share = %round.reward_share(),
            "round started"
        );
        Ok(round)
    }

    // --- Donations ---

    /// Donate `amount` from `caller` to an expert. The first donation from a
    /// voter to an expert counts as a vote in the active round.
    pub fn donate(
        &mut self,
        caller: &Address,
        expert_id: ExpertId,
        amount: TokenAmount,
    ) -> Result<DonationReceipt, PlatformError> {
        ensure_valid(caller)?;
        let minimum = self.params.min_donation_amount();
        if amount < minimum {
            debug!(voter = %caller, %amount, %minimum, "rejected: donation below minimum");
            return Err(PlatformError::BelowMinimumDonation { amount, minimum });
        }
        let expert = self.experts.require(expert_id)?;
        if !expert.status.is_actionable() {
            debug!(expert = %expert_id, status = ?expert.status, "rejected: course closed");
            return Err(PlatformError::CourseClosed {
                id: expert_id,
                status: expert.status,
            });
        }
        expert.check_donation(caller, amount)?;

        self.pull(caller, amount)?;

        let receipt = self
            .experts
            .require_mut(expert_id)?
            .record_donation(caller, amount)?;
        let total_votes = if receipt.first_from_voter {
            self.rounds.record_vote()
        } else {
            None
        };
        info!(
            expert = %expert_id,
            voter = %caller,
            %amount,
            first = receipt.first_from_voter,
            ?total_votes,
            "donation recorded"
        );
        Ok(receipt)
    }

    // --- Distribution ---

    /// Pay an expert its donations plus one share of the round budget.
    pub fn transfer_to_expert(
        &mut self,
        caller: &Address,
        expert_id: ExpertId,
    ) -> Result<RewardPayout, PlatformError> {
        self.ensure_admin(caller)?;
        let expert = self.experts.require(expert_id)?;
        ensure_actionable(expert)?;
        let round = self.rounds.active().ok_or(PlatformError::NoActiveRound)?;
        let payout = distribution::plan_reward(expert, round)?;
        let previous_custody = self.custody;
        let custody = previous_custody
            .checked_sub(payout.total)
            .ok_or(PlatformError::CustodyShortfall {
                needed: payout.total,
                available: previous_custody,
            })?;

        {
            let expert = self.experts.require_mut(expert_id)?;
            let round = self.rounds.active_mut().ok_or(PlatformError::NoActiveRound)?;
            distribution::commit_reward(expert, round, &payout);
        }
        self.custody = custody;

        if let Err(e) = self.token.transfer_out(&payout.payee, payout.total) {
            if let (Some(expert), Some(round)) =
                (self.experts.get_mut(expert_id), self.rounds.active_mut())
            {
                distribution::revert_reward(expert, round, &payout);
            }
            self.custody = previous_custody;
            return Err(transfer_failed(&payout.payee, payout.total, e));
        }

        info!(
            expert = %expert_id,
            round = %payout.round,
            donations = %payout.donations,
            share = %payout.share,
            total = %payout.total,
            "expert paid"
        );
        self.close_round_if_settled();
        Ok(payout)
    }

    /// Cancel an expert's course. Its donors may then reclaim their donations.
    pub fn cancel_course(&mut self, caller: &Address, expert_id: ExpertId) -> Result<(), PlatformError> {
        self.ensure_admin(caller)?;
        let expert = self.experts.require_mut(expert_id)?;
        ensure_actionable(expert)?;
        expert.status = CourseStatus::Canceled;
        info!(
            expert = %expert_id,
            refundable = %expert.balance,
            voters = expert.voter_count(),
            "course canceled"
        );
        self.close_round_if_settled();
        Ok(())
    }

    /// Return everything `caller` donated to a canceled expert.
    pub fn claim_refund(
        &mut self,
        caller: &Address,
        expert_id: ExpertId,
    ) -> Result<RefundPayout, PlatformError> {
        let expert = self.experts.require(expert_id)?;
        let payout = match self.refunds.plan(expert_id, caller) {
            Some(carried) => carried,
            None => distribution::plan_refund(expert, caller)?,
        };
        let previous_custody = self.custody;
        let custody = previous_custody
            .checked_sub(payout.amount)
            .ok_or(PlatformError::CustodyShortfall {
                needed: payout.amount,
                available: previous_custody,
            })?;

        distribution::commit_refund(&mut self.experts, &mut self.refunds, &payout);
        self.custody = custody;

        if let Err(e) = self.token.transfer_out(caller, payout.amount) {
            distribution::revert_refund(&mut self.experts, &mut self.refunds, &payout);
            self.custody = previous_custody;
            return Err(transfer_failed(caller, payout.amount, e));
        }

        info!(
            expert = %expert_id,
            voter = %caller,
            amount = %payout.amount,
            source = ?payout.source,
            "refund paid"
        );
        Ok(payout)
    }

    // --- Administration ---

    /// Hand the administrator role to `new_admin`.
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<(), PlatformError> {
        self.ensure_admin(caller)?;
        ensure_valid(&new_admin)?;
        info!(from = %self.admin, to = %new_admin, "administrator changed");
        self.admin = new_admin;
        Ok(())
    }

    // --- Queries ---

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn params(&self) -> &FundParams {
        &self.params
    }

    pub fn registration(&self, requester: &Address) -> Option<&RegistrationRequest> {
        self.registry.get(requester)
    }

    /// Requests still awaiting approval.
    pub fn pending_registrations(&self) -> impl Iterator<Item = &RegistrationRequest> {
        self.registry.pending()
    }

    /// Whether `address` is an approved expert.
    pub fn is_registered(&self, address: &Address) -> bool {
        self.experts.contains_address(address)
    }

    pub fn expert(&self, id: ExpertId) -> Option<&Expert> {
        self.experts.get(id)
    }

    pub fn expert_by_address(&self, address: &Address) -> Option<&Expert> {
        self.experts.find_by_address(address)
    }

    pub fn expert_count(&self) -> usize {
        self.experts.len()
    }

    /// Experts in id order.
    pub fn experts(&self) -> impl Iterator<Item = &Expert> {
        self.experts.iter()
    }

    /// An expert's voting weight: its current-round balance.
    pub fn voting_weight(&self, id: ExpertId) -> Option<TokenAmount> {
        self.experts.get(id).map(|e| e.balance)
    }

    pub fn course_status(&self, id: ExpertId) -> Option<CourseStatus> {
        self.experts.get(id).map(|e| e.status)
    }

    /// What `voter` has recorded against expert `id` in the current round.
    pub fn donation_of(&self, id: ExpertId, voter: &Address) -> TokenAmount {
        self.experts
            .get(id)
            .map(|e| e.donation_of(voter))
            .unwrap_or_default()
    }

    /// Refund carried over from an earlier round, claimable via `claim_refund`.
    pub fn carried_refund(&self, id: ExpertId, voter: &Address) -> TokenAmount {
        self.refunds.get(id, voter)
    }

    pub fn active_round(&self) -> Option<&Round> {
        self.rounds.active()
    }

    /// The most recently started round, active or not.
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.current()
    }

    pub fn round_by_id(&self, id: RoundId) -> Option<&Round> {
        self.rounds.get(id)
    }

    pub fn custody(&self) -> TokenAmount {
        self.custody
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn into_token(self) -> T {
        self.token
    }

    // --- Internals ---

    fn ensure_admin(&self, caller: &Address) -> Result<(), PlatformError> {
        if caller != &self.admin {
            debug!(%caller, "rejected: caller is not the administrator");
            return Err(PlatformError::NotAdmin {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Move `amount` from `payer` into custody. Balance is checked before
    /// allowance; nothing changes if any check or the transfer fails.
    fn pull(&mut self, payer: &Address, amount: TokenAmount) -> Result<(), PlatformError> {
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(PlatformError::AmountOverflow)?;
        let available = self.token.balance_of(payer);
        if available < amount {
            return Err(PlatformError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        let authorised = self.token.allowance(payer);
        if authorised < amount {
            return Err(PlatformError::InsufficientAllowance {
                needed: amount,
                available: authorised,
            });
        }
        self.token
            .transfer_in(payer, amount)
            .map_err(|e| transfer_failed(payer, amount, e))?;
        self.custody = custody;
        Ok(())
    }

    fn close_round_if_settled(&mut self) {
        if !self.experts.all_settled() {
            return;
        }
        if let Some(id) = self.rounds.close_active() {
            info!(round = %id, "all experts settled, round closed");
        }
    }
}

fn ensure_valid(address: &Address) -> Result<(), PlatformError> {
    if address.is_valid() {
        Ok(())
    } else {
        Err(PlatformError::InvalidAddress(address.to_string()))
    }
}

fn ensure_actionable(expert: &Expert) -> Result<(), PlatformError> {
    if expert.status.is_actionable() {
        Ok(())
    } else {
        Err(PlatformError::NotActionable {
            id: expert.id,
            status: expert.status,
        })
    }
}

fn transfer_failed(counterparty: &Address, amount: TokenAmount, e: TokenError) -> PlatformError {
    warn!(%counterparty, %amount, error = %e, "token transfer failed, state unchanged");
    PlatformError::TransferFailed(e)
}
