//! Agent directory.
//!
//! Relational store of marketplace agent listings with AI content moderation
//! on registration, AI-assisted listing authoring, and creator-only deletion.

mod error;
mod models;
mod repository;
mod service;

pub use error::{AgentError, AgentResult};
pub use models::{
    AGENT_CATEGORIES, Agent, AgentCategory, GenerateField, GenerateInfoRequest, GeneratedInfo,
    RegisterAgentRequest, ValidationVerdict, slugify,
};
pub use repository::AgentRepository;
pub use service::AgentService;
