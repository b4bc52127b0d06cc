//! Platform snapshots: the full fund state at a point in time.
//!
//! The hash is Blake2b-256 over the bincode encoding of the version and the
//! content, so a snapshot restored from bytes can be checked before use.

use serde::{Deserialize, Serialize};

use edu_types::{Address, RoundId, TokenAmount};

use crate::distribution::CarriedRefund;
use crate::experts::Expert;
use crate::registry::RegistrationRequest;
use crate::round::Round;
use crate::PlatformError;

/// Everything needed to rebuild an [`EducationPlatform`](crate::EducationPlatform).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotContent {
    pub admin: Address,
    pub requests: Vec<RegistrationRequest>,
    /// Experts in id order.
    pub experts: Vec<Expert>,
    pub rounds: Vec<Round>,
    pub current_round: Option<RoundId>,
    pub carried_refunds: Vec<CarriedRefund>,
    pub custody: TokenAmount,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    /// Blake2b-256 of the encoded version and content.
    pub hash: [u8; 32],
    pub version: u32,
    pub content: SnapshotContent,
}

impl PlatformSnapshot {
    pub const VERSION: u32 = 1;

    pub fn create(content: SnapshotContent) -> Result<Self, PlatformError> {
        let hash = compute_hash(Self::VERSION, &content)?;
        Ok(Self {
            hash,
            version: Self::VERSION,
            content,
        })
    }

    /// Fails if the version is unknown or the hash does not match the content.
    pub fn verify(&self) -> Result<(), PlatformError> {
        if self.version != Self::VERSION {
            return Err(PlatformError::Snapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if self.hash != compute_hash(self.version, &self.content)? {
            return Err(PlatformError::Snapshot("hash mismatch".into()));
        }
        Ok(())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PlatformError> {
        bincode::serialize(self).map_err(|e| PlatformError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlatformError> {
        bincode::deserialize(bytes).map_err(|e| PlatformError::Snapshot(e.to_string()))
    }

    pub fn expert_count(&self) -> usize {
        self.content.experts.len()
    }

    pub fn round_count(&self) -> usize {
        self.content.rounds.len()
    }
}

fn compute_hash(version: u32, content: &SnapshotContent) -> Result<[u8; 32], PlatformError> {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};

    let encoded =
        bincode::serialize(&(version, content)).map_err(|e| PlatformError::Snapshot(e.to_string()))?;
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(&encoded);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experts::ExpertLedger;
    use edu_types::RegistrationStatus;

    fn sample_content() -> SnapshotContent {
        let mut experts = ExpertLedger::new();
        let id = experts.enroll(&Address::new("ada")).unwrap();
        experts
            .get_mut(id)
            .unwrap()
            .record_donation(&Address::new("bob"), TokenAmount::new(25))
            .unwrap();
        SnapshotContent {
            admin: Address::new("admin"),
            requests: vec![RegistrationRequest {
                requester: Address::new("ada"),
                display_name: "Ada".into(),
                status: RegistrationStatus::Approved,
            }],
            experts: experts.iter().cloned().collect(),
            rounds: vec![Round {
                id: RoundId::new(1),
                budget: TokenAmount::new(100),
                total_votes: 1,
                reward_slots: 2,
                slots_paid: 0,
                distributed: TokenAmount::ZERO,
                active: true,
            }],
            current_round: Some(RoundId::new(1)),
            carried_refunds: vec![],
            custody: TokenAmount::new(125),
        }
    }

    #[test]
    fn test_create_and_verify() {
        let snap = PlatformSnapshot::create(sample_content()).unwrap();
        snap.verify().unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.expert_count(), 1);
        assert_eq!(snap.round_count(), 1);
        assert_eq!(snap.hash_hex().len(), 64);
    }

    #[test]
    fn test_tampered_snapshot_fails_verify() {
        let mut snap = PlatformSnapshot::create(sample_content()).unwrap();
        snap.content.custody = TokenAmount::new(1_000_000);
        assert!(matches!(snap.verify(), Err(PlatformError::Snapshot(_))));
    }

    #[test]
    fn test_unknown_version_fails_verify() {
        let mut snap = PlatformSnapshot::create(sample_content()).unwrap();
        snap.version = 7;
        assert!(snap.verify().is_err());
    }

    #[test]
    fn test_bytes_roundtrip_keeps_hash() {
        let snap = PlatformSnapshot::create(sample_content()).unwrap();
        let restored = PlatformSnapshot::from_bytes(&snap.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.hash, snap.hash);
        assert_eq!(restored.content, snap.content);
        restored.verify().unwrap();
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            PlatformSnapshot::from_bytes(&[0xFF, 0x01]),
            Err(PlatformError::Snapshot(_))
        ));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = PlatformSnapshot::create(sample_content()).unwrap();
        let b = PlatformSnapshot::create(sample_content()).unwrap();
        assert_eq!(a.hash, b.hash);
    }
}
