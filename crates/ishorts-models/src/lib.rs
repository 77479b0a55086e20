//! Shared data models for the InstaShorts production pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Series and the videos produced for them
//! - The per-video status state machine and pipeline stages
//! - Generated scenes and their batch invariants

pub mod error;
pub mod ids;
pub mod scene;
pub mod series;
pub mod stage;
pub mod video;

pub use error::{ModelError, ModelResult};
pub use ids::{SeriesId, VideoId};
pub use scene::{validate_scene_set, NewScene, VideoScene};
pub use series::{Series, MAX_POSTS_PER_DAY, MIN_POSTS_PER_DAY};
pub use stage::Stage;
pub use video::{Video, VideoStatus, HAPPY_PATH};
