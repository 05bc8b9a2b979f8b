//! Append-only record of bulk operations.

pub mod store;
pub mod types;

pub use store::{AuditError, AuditStore};
pub use types::{AuditAction, AuditEvent, AuditListQuery, AuditListResponse};
