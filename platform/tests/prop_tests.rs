use proptest::prelude::*;

use edu_nullables::NullToken;
use edu_platform::{EducationPlatform, PlatformConfig};
use edu_types::{Address, ExpertId, RoundId, TokenAmount};

const EXPERTS: u64 = 3;
const VOTERS: u8 = 4;

fn admin() -> Address {
    Address::new("admin")
}

fn voter(n: u8) -> Address {
    Address::new(format!("voter_{n}"))
}

fn platform(budget: u128) -> EducationPlatform<NullToken> {
    let mut token = NullToken::new();
    token.mint(&admin(), TokenAmount::new(budget));
    token.approve(&admin(), TokenAmount::new(budget));
    for n in 0..VOTERS {
        token.mint(&voter(n), TokenAmount::new(1_000_000));
        token.approve(&voter(n), TokenAmount::new(1_000_000));
    }
    let mut platform = EducationPlatform::new(&PlatformConfig::new(admin()), token).unwrap();
    for n in 0..EXPERTS {
        let expert = Address::new(format!("expert_{n}"));
        platform.register(&expert, "expert").unwrap();
        platform.approve(&admin(), &expert).unwrap();
    }
    platform
}

/// One step a random caller sequence may take.
#[derive(Clone, Debug)]
enum Step {
    Donate { voter: u8, expert: u64, amount: u128 },
    Pay { expert: u64 },
    Cancel { expert: u64 },
    Refund { voter: u8, expert: u64 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0..VOTERS, 0..EXPERTS, 0u128..500)
            .prop_map(|(voter, expert, amount)| Step::Donate { voter, expert, amount }),
        1 => (0..EXPERTS).prop_map(|expert| Step::Pay { expert }),
        1 => (0..EXPERTS).prop_map(|expert| Step::Cancel { expert }),
        2 => (0..VOTERS, 0..EXPERTS).prop_map(|(voter, expert)| Step::Refund { voter, expert }),
    ]
}

proptest! {
    /// An expert's balance equals the sum of the donations accepted for it,
    /// and the vote count equals the number of distinct (voter, expert) pairs.
    #[test]
    fn balance_and_votes_follow_accepted_donations(
        donations in prop::collection::vec((0..VOTERS, 0..EXPERTS, 0u128..1_000), 0..40),
    ) {
        let mut platform = platform(100);
        platform.start_round(&admin(), RoundId::new(1), TokenAmount::new(100)).unwrap();

        let mut expected = [0u128; EXPERTS as usize];
        let mut pairs = std::collections::BTreeSet::new();
        for (v, e, amount) in donations {
            if platform.donate(&voter(v), ExpertId::new(e), TokenAmount::new(amount)).is_ok() {
                expected[e as usize] += amount;
                pairs.insert((v, e));
            }
        }

        for (e, total) in expected.iter().enumerate() {
            prop_assert_eq!(
                platform.voting_weight(ExpertId::new(e as u64)),
                Some(TokenAmount::new(*total))
            );
        }
        prop_assert_eq!(platform.active_round().unwrap().total_votes, pairs.len() as u64);
    }

    /// Tokens are never created or destroyed, and the internal custody tally
    /// always matches what the token holds for the platform.
    #[test]
    fn custody_tracks_token_under_random_operations(
        budget in 0u128..10_000,
        steps in prop::collection::vec(step(), 0..60),
    ) {
        let mut platform = platform(budget);
        let supply = platform.token().total_supply();
        platform.start_round(&admin(), RoundId::new(1), TokenAmount::new(budget)).unwrap();

        for step in steps {
            let _ = match step {
                Step::Donate { voter: v, expert, amount } => platform
                    .donate(&voter(v), ExpertId::new(expert), TokenAmount::new(amount))
                    .map(|_| ()),
                Step::Pay { expert } => platform
                    .transfer_to_expert(&admin(), ExpertId::new(expert))
                    .map(|_| ()),
                Step::Cancel { expert } => platform.cancel_course(&admin(), ExpertId::new(expert)),
                Step::Refund { voter: v, expert } => platform
                    .claim_refund(&voter(v), ExpertId::new(expert))
                    .map(|_| ()),
            };
            prop_assert_eq!(platform.custody(), platform.token().custody_balance());
            prop_assert_eq!(platform.token().total_supply(), supply);
        }

        let refundable: TokenAmount = platform
            .experts()
            .filter(|e| e.status == edu_types::CourseStatus::Canceled)
            .flat_map(|e| e.voters_donated.values().copied())
            .sum();
        let pending: TokenAmount = platform
            .experts()
            .filter(|e| e.status.is_actionable())
            .map(|e| e.balance)
            .sum();
        let round = platform.round_by_id(RoundId::new(1)).unwrap();
        prop_assert_eq!(platform.custody(), refundable + pending + round.undistributed());
    }
}
