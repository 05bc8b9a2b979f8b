//! Trash bin module
//!
//! Soft delete, restore and purge of tasks, plus the snapshots that make a
//! deleted task recoverable.

mod model;
mod purge;
mod restore;
mod service;
mod snapshot;
mod soft_delete;
mod validate;

pub use model::*;
pub use purge::{Cutoff, PurgeCriteria};
pub use service::TrashService;
pub use snapshot::TaskSnapshot;
pub use validate::{partition, requested_ids, Eligibility, Partition};
