//! # Types Module
//!
//! Core data types shared by the orchestrator, the store and the HTTP layer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Conversation turn with a role |
//! | [`Prompt`] | Provider-neutral completion request |
//! | [`ProjectIdea`] | Generated title, idea and hypothesis |
//! | [`Project`] | Persisted project row |
//! | [`ProjectUpdate`] | Partial update payload |

pub mod message;
pub mod project;

pub use message::{Message, MessageRole, Prompt};
pub use project::{Project, ProjectIdea, ProjectUpdate, UNTITLED_PROJECT};
