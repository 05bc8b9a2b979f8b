//! Ownership and state validation shared by the batch operations

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::store::StoreState;
use crate::task::Task;
use crate::{Error, Result};

/// The state a task must be in for a batch operation to touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Active,
    Deleted,
}

impl Eligibility {
    pub fn admits(self, task: &Task) -> bool {
        match self {
            Self::Active => task.is_active(),
            Self::Deleted => task.is_soft_deleted(),
        }
    }
}

/// Requested ids split by verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Owned by the caller and in the required state
    pub eligible: Vec<Uuid>,
    /// Missing, or owned by someone else
    pub not_owned: Vec<Uuid>,
    /// Owned by the caller but in the wrong state
    pub wrong_state: Vec<Uuid>,
}

impl Partition {
    pub fn is_clean(&self) -> bool {
        self.not_owned.is_empty() && self.wrong_state.is_empty()
    }

    /// Every id that failed, sorted.
    pub fn rejected(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .not_owned
            .iter()
            .chain(self.wrong_state.iter())
            .copied()
            .collect();
        ids.sort();
        ids
    }
}

/// Collapse the request into a set, rejecting an empty one.
pub fn requested_ids(task_ids: &[Uuid]) -> Result<BTreeSet<Uuid>> {
    let ids: BTreeSet<Uuid> = task_ids.iter().copied().collect();
    if ids.is_empty() {
        return Err(Error::InvalidInput(
            "At least one task id is required".to_string(),
        ));
    }
    Ok(ids)
}

pub fn partition(
    state: &StoreState,
    ids: &BTreeSet<Uuid>,
    user_id: Uuid,
    eligibility: Eligibility,
) -> Partition {
    let mut result = Partition::default();
    for &id in ids {
        match state.task(id) {
            Some(task) if task.user_id == user_id => {
                if eligibility.admits(task) {
                    result.eligible.push(id);
                } else {
                    result.wrong_state.push(id);
                }
            }
            _ => result.not_owned.push(id),
        }
    }
    result
}
