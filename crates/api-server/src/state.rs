//! Application state

use std::sync::Arc;

use anyhow::Context;
use tb_core::store::TaskStore;
use tb_core::trash::{TrashPolicy, TrashService};

use crate::audit::AuditStore;
use crate::auth::JwtKeys;
use crate::config::{RateLimitConfig, ServerConfig};
use crate::rate_limit::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: Arc<TaskStore>,
    trash: TrashService,
    audit_store: AuditStore,
    jwt_keys: JwtKeys,
    bulk_limiter: RateLimiter,
}

impl AppState {
    /// Open the stores under the configured data directory
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .with_context(|| format!("creating data directory {:?}", config.data_dir))?;

        let task_store = TaskStore::file(config.store_path())
            .await
            .context("opening task store")?;
        let audit_store = AuditStore::new(config.audit_dir())
            .await
            .context("opening audit log")?;

        Ok(Self::from_parts(
            Arc::new(task_store),
            audit_store,
            JwtKeys::from_secret(&config.jwt_secret),
            config.trash_policy,
            config.bulk_rate_limit,
        ))
    }

    pub fn from_parts(
        task_store: Arc<TaskStore>,
        audit_store: AuditStore,
        jwt_keys: JwtKeys,
        trash_policy: TrashPolicy,
        bulk_rate_limit: RateLimitConfig,
    ) -> Self {
        let trash = TrashService::new(Arc::clone(&task_store), trash_policy);
        Self {
            inner: Arc::new(AppStateInner {
                task_store,
                trash,
                audit_store,
                jwt_keys,
                bulk_limiter: RateLimiter::new(bulk_rate_limit),
            }),
        }
    }

    pub fn task_store(&self) -> &TaskStore {
        &self.inner.task_store
    }

    pub fn trash(&self) -> &TrashService {
        &self.inner.trash
    }

    pub fn audit_store(&self) -> &AuditStore {
        &self.inner.audit_store
    }

    pub fn jwt_keys(&self) -> &JwtKeys {
        &self.inner.jwt_keys
    }

    pub fn bulk_limiter(&self) -> &RateLimiter {
        &self.inner.bulk_limiter
    }
}
