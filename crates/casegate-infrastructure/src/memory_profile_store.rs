//! In-memory principal profile store.

use async_trait::async_trait;
use casegate_core::auth::SubjectId;
use casegate_core::principal::{PrincipalProfile, ProfileStore};
use casegate_core::{CasegateError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Profile rows held in memory, with knobs for simulating row-level
/// security refusals and slow reads.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<SubjectId, PrincipalProfile>>,
    denied: RwLock<HashSet<SubjectId>>,
    delays: RwLock<HashMap<SubjectId, Duration>>,
    fetches: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: PrincipalProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }

    pub async fn remove(&self, subject_id: &SubjectId) {
        self.profiles.write().await.remove(subject_id);
    }

    /// Refuses reads for `subject_id` as row-level security would.
    pub async fn deny(&self, subject_id: impl Into<SubjectId>) {
        self.denied.write().await.insert(subject_id.into());
    }

    /// Delays reads for `subject_id`.
    pub async fn set_delay(&self, subject_id: impl Into<SubjectId>, delay: Duration) {
        self.delays.write().await.insert(subject_id.into(), delay);
    }

    /// Number of `get_profile` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, subject_id: &SubjectId) -> Result<PrincipalProfile> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.read().await.get(subject_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.denied.read().await.contains(subject_id) {
            return Err(CasegateError::permission_denied(format!(
                "profile of {} is not readable",
                subject_id
            )));
        }

        self.profiles
            .read()
            .await
            .get(subject_id)
            .cloned()
            .ok_or_else(|| CasegateError::not_found("PrincipalProfile", subject_id.as_str()))
    }
}
