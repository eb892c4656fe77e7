use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::ProjectStore;
use crate::types::{Project, ProjectUpdate};
use crate::Result;

/// Process-local store keyed by project id.
#[derive(Default)]
pub struct MemoryProjectStore {
    rows: RwLock<HashMap<String, Project>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn insert(&self, project: &Project) -> Result<Project> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        rows.insert(project.id.clone(), project.clone());
        Ok(project.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Project>> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Project>> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Project> = rows.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }

    async fn update(&self, id: &str, update: &ProjectUpdate) -> Result<Option<Project>> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get_mut(id).map(|project| {
            update.apply_to(project);
            project.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.remove(id).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
