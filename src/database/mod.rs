//! # Project Store
//!
//! Persistence for [`Project`] rows behind the [`ProjectStore`] trait.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SupabaseStore`] | Hosted PostgREST `projects` table |
//! | [`MemoryProjectStore`] | Tests and local runs without a database |

pub mod memory;
pub mod supabase;

use async_trait::async_trait;

use crate::types::{Project, ProjectUpdate};
use crate::Result;

pub use memory::MemoryProjectStore;
pub use supabase::SupabaseStore;

pub const PROJECTS_TABLE: &str = "projects";

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a new row and return it as stored.
    async fn insert(&self, project: &Project) -> Result<Project>;
    async fn get(&self, id: &str) -> Result<Option<Project>>;
    /// Most recent first.
    async fn list(&self, limit: usize) -> Result<Vec<Project>>;
    /// `None` when no row has this id.
    async fn update(&self, id: &str, update: &ProjectUpdate) -> Result<Option<Project>>;
    /// `true` when a row was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
    fn name(&self) -> &'static str;
}
