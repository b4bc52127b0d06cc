//! Registration registry: expert registration requests keyed by requester.
//!
//! Requests are never deleted; an approved request stays behind as the
//! audit record of how an expert was admitted.

use std::collections::BTreeMap;

use edu_types::{Address, RegistrationStatus};
use serde::{Deserialize, Serialize};

use crate::PlatformError;

/// A request by an address to be admitted as an expert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub requester: Address,
    pub display_name: String,
    pub status: RegistrationStatus,
}

/// At most one request per address; `Pending → Approved` exactly once.
#[derive(Clone, Debug, Default)]
pub struct RegistrationRegistry {
    requests: BTreeMap<Address, RegistrationRequest>,
}

impl RegistrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted requests, rejecting duplicate requesters.
    pub fn from_requests(
        requests: impl IntoIterator<Item = RegistrationRequest>,
    ) -> Result<Self, PlatformError> {
        let mut registry = Self::new();
        for request in requests {
            let requester = request.requester.clone();
            if registry.requests.insert(requester.clone(), request).is_some() {
                return Err(PlatformError::Snapshot(format!(
                    "duplicate registration request from {requester}"
                )));
            }
        }
        Ok(registry)
    }

    pub fn get(&self, requester: &Address) -> Option<&RegistrationRequest> {
        self.requests.get(requester)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Requests in address order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistrationRequest> {
        self.requests.values()
    }

    /// Requests still awaiting the administrator.
    pub fn pending(&self) -> impl Iterator<Item = &RegistrationRequest> {
        self.requests
            .values()
            .filter(|r| r.status == RegistrationStatus::Pending)
    }

    /// File a new pending request for `requester`.
    ///
    /// `is_expert` tells whether the requester already has an expert record.
    pub fn submit(
        &mut self,
        requester: &Address,
        display_name: &str,
        is_expert: bool,
    ) -> Result<(), PlatformError> {
        if is_expert {
            return Err(PlatformError::AlreadyApproved(requester.clone()));
        }
        match self.requests.get(requester).map(|r| r.status) {
            Some(RegistrationStatus::Pending) => {
                Err(PlatformError::AlreadyPending(requester.clone()))
            }
            Some(RegistrationStatus::Approved) => {
                Err(PlatformError::AlreadyApproved(requester.clone()))
            }
            None => {
                self.requests.insert(
                    requester.clone(),
                    RegistrationRequest {
                        requester: requester.clone(),
                        display_name: display_name.to_string(),
                        status: RegistrationStatus::Pending,
                    },
                );
                Ok(())
            }
        }
    }

    /// Check that `requester` has a request still waiting for approval.
    pub fn ensure_pending(&self, requester: &Address) -> Result<&RegistrationRequest, PlatformError> {
        let request = self
            .requests
            .get(requester)
            .ok_or_else(|| PlatformError::RequestNotFound(requester.clone()))?;
        match request.status {
            RegistrationStatus::Pending => Ok(request),
            RegistrationStatus::Approved => Err(PlatformError::AlreadyApproved(requester.clone())),
        }
    }

    /// Flip a pending request to approved.
    pub fn approve(&mut self, requester: &Address) -> Result<(), PlatformError> {
        self.ensure_pending(requester)?;
        if let Some(request) = self.requests.get_mut(requester) {
            request.status = RegistrationStatus::Approved;
        }
        Ok(())
    }
}
