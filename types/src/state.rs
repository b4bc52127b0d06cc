//! Lifecycle enums for registration requests and expert courses.

use serde::{Deserialize, Serialize};

/// The state of an expert registration request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Submitted, awaiting the administrator.
    Pending,
    /// Approved; an expert record exists for the requester. Terminal.
    Approved,
}

/// The course-completion state of an expert within the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseStatus {
    /// Accepting donations; not yet settled this round.
    Pending,
    /// Donations and reward share paid out to the expert.
    Done,
    /// Course canceled; voters may reclaim their donations.
    Canceled,
}

impl CourseStatus {
    /// Whether the administrator can still settle this expert (pay or cancel).
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the expert was settled one way or the other this round.
    pub fn is_settled(&self) -> bool {
        !self.is_actionable()
    }
}
