//! Text generation for the production pipeline.
//!
//! This crate provides:
//! - The `ContentGenerator` contract used by the stage handlers
//! - Prompt builders for titles, scene breakdowns, scene prompts and scripts
//! - An OpenAI-compatible chat client with strict JSON-schema output

pub mod client;
pub mod error;
pub mod generator;
pub mod prompts;
pub mod schema;
pub mod types;

pub use client::{OpenAiClient, OpenAiConfig};
pub use error::{LlmError, LlmResult};
pub use generator::ContentGenerator;
pub use schema::strict_schema;
pub use types::{PromptGeneration, SceneBreakdown, SceneOutline, ScriptResponse, TitleResponse};
