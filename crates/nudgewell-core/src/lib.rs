//! # Nudgewell Core Library
//!
//! This library provides the personalized recommendation engine for
//! Nudgewell, a task-and-wellness companion for people with cognitive
//! challenges and their caregivers. Task storage, profile storage and the
//! UI live elsewhere; they hand this crate read-only snapshots.
//!
//! ## Architecture
//!
//! - **Context**: derives time of day and recent behavioral signals
//! - **Rules**: five independent generators producing unscored candidates
//! - **Scoring**: a bounded relevance score per candidate
//! - **Store**: persistence, deduplication, expiry and the dismissed skip-list
//! - **Engine**: refresh policy and the command surface used by the UI
//!
//! ## Key Components
//!
//! - [`RecommendationEngine`]: service object wrapping the whole pipeline
//! - [`KeyValueStore`]: async persistence seam ([`FileStore`], [`MemoryStore`])
//! - [`Config`]: TOML configuration

pub mod error;
pub mod profile;
pub mod recommendation;
pub mod storage;
pub mod task;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use profile::{
    PatientType, Sentiment, UserHabit, UserInteraction, UserPreference, UserProfile, UserRole,
};
pub use recommendation::{
    Recommendation, RecommendationContext, RecommendationEngine, RecommendationPriority,
    RecommendationType, RefreshOutcome, TimeOfDay,
};
pub use storage::{Config, FileStore, KeyValueStore, MemoryStore};
pub use task::{Task, TaskPriority, TaskStatus};
