//! Agent service - registration, moderation, listing authoring.

use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

use crate::llm::{ChatMessage, CompletionBackend, CompletionRequest};

use super::error::{AgentError, AgentResult};
use super::models::{
    Agent, AgentCategory, GenerateField, GenerateInfoRequest, GeneratedInfo,
    RegisterAgentRequest, ValidationVerdict, slugify,
};
use super::repository::AgentRepository;

/// First JSON object embedded in a moderation reply.
static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Leading bullet markers on generated text.
static LEADING_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\u{2022}\-\*]\s*").unwrap());

/// Service for managing agent listings.
#[derive(Clone)]
pub struct AgentService {
    repo: AgentRepository,
    llm: Arc<dyn CompletionBackend>,
}

impl AgentService {
    /// Create a new agent service.
    pub fn new(repo: AgentRepository, llm: Arc<dyn CompletionBackend>) -> Self {
        Self { repo, llm }
    }

    /// List all agents.
    pub async fn list(&self) -> AgentResult<Vec<Agent>> {
        Ok(self.repo.list().await?)
    }

    /// List agents in a category.
    pub async fn list_by_category(&self, category: &str) -> AgentResult<Vec<Agent>> {
        Ok(self.repo.list_by_category(category).await?)
    }

    /// List agents registered by a creator wallet.
    pub async fn list_by_creator(&self, creator_wallet: &str) -> AgentResult<Vec<Agent>> {
        Ok(self.repo.list_by_creator(creator_wallet).await?)
    }

    /// Get an agent by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AgentResult<Agent> {
        self.repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AgentError::NotFound(slug.to_string()))
    }

    /// Run content moderation on a submission.
    pub async fn validate(
        &self,
        name: &str,
        description: &str,
        category: &str,
    ) -> AgentResult<ValidationVerdict> {
        let prompt = build_validation_prompt(name, description, category);
        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "You are a content moderator. Always respond with valid JSON only.",
            ),
            ChatMessage::user(prompt),
        ])
        .max_tokens(200)
        .temperature(0.3);

        let reply = self.llm.complete(request).await?;
        Ok(parse_verdict(&reply))
    }

    /// Register a new agent: field checks, slug availability, moderation,
    /// insert.
    pub async fn register(&self, request: RegisterAgentRequest) -> AgentResult<Agent> {
        let name = request.name.trim();
        let description = request.description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(AgentError::Invalid(
                "name and description are required".to_string(),
            ));
        }
        if request.creator_wallet.trim().is_empty() || request.payment_wallet.trim().is_empty() {
            return Err(AgentError::Invalid(
                "creator and payment wallets are required".to_string(),
            ));
        }
        let category: AgentCategory = request
            .category
            .parse()
            .map_err(AgentError::Invalid)?;

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(AgentError::Invalid(format!(
                "name {name:?} produces an empty slug"
            )));
        }
        if self.repo.slug_exists(&slug).await? {
            return Err(AgentError::SlugTaken(slug));
        }

        let verdict = self.validate(name, description, &category.to_string()).await?;
        if !verdict.approved {
            warn!("submission {:?} denied by moderation: {}", name, verdict.reason);
            return Err(AgentError::ValidationRejected {
                reason: verdict.reason,
            });
        }

        let now = Utc::now().to_rfc3339();
        let agent = Agent {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug,
            description: description.to_string(),
            category: category.to_string(),
            price_per_query: request.price_per_query,
            payment_wallet: request.payment_wallet.trim().to_string(),
            creator_wallet: request.creator_wallet.trim().to_string(),
            status: "active".to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.repo.create(&agent).await?;

        info!("registered agent {} ({})", agent.name, agent.slug);
        Ok(agent)
    }

    /// Generate a listing name or description from partial context.
    pub async fn generate_info(&self, request: GenerateInfoRequest) -> AgentResult<GeneratedInfo> {
        let prompt = build_generation_prompt(&request);
        let completion = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .max_tokens(200)
            .temperature(0.7);

        let reply = self.llm.complete(completion).await?;
        Ok(GeneratedInfo {
            generated_text: clean_generated(&reply),
            field: request.generate_field,
        })
    }

    /// Delete an agent; only the creator wallet may do so.
    pub async fn delete(&self, agent_id: &str, creator_wallet: &str) -> AgentResult<()> {
        let agent = self
            .repo
            .get(agent_id)
            .await?
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;

        if !agent
            .creator_wallet
            .eq_ignore_ascii_case(creator_wallet.trim())
        {
            return Err(AgentError::Unauthorized);
        }

        self.repo.delete(agent_id).await?;
        info!("deleted agent {} ({})", agent.name, agent_id);
        Ok(())
    }
}

/// Build the moderation prompt for a submission.
fn build_validation_prompt(name: &str, description: &str, category: &str) -> String {
    format!(
        "You are a content moderator for an AI agent marketplace. Review the \
submission below and decide whether to approve it.\n\n\
Agent Name: {name}\n\
Category: {category}\n\
Description: {description}\n\n\
DENY submissions that are offensive or harmful, promote illegal activity or \
scams, are misleading, are spam or low-quality, or have no clear purpose.\n\
APPROVE submissions with a clear legitimate purpose, a description matching \
the category, and appropriate content.\n\n\
Respond in this EXACT JSON format:\n\
{{\"approved\": true/false, \"reason\": \"brief explanation\"}}\n\n\
Only return the JSON, nothing else."
    )
}

/// Parse a moderation reply into a verdict.
///
/// The model sometimes wraps the JSON in prose; take the first JSON object.
/// An unparseable reply denies the submission rather than approving it.
fn parse_verdict(reply: &str) -> ValidationVerdict {
    let block = match JSON_BLOCK.find(reply) {
        Some(found) => found.as_str(),
        None => {
            return ValidationVerdict {
                approved: false,
                reason: "Invalid moderation response format".to_string(),
            };
        }
    };

    match serde_json::from_str::<ValidationVerdict>(block) {
        Ok(mut verdict) => {
            if verdict.reason.is_empty() {
                verdict.reason = "No reason provided".to_string();
            }
            verdict
        }
        Err(_) => ValidationVerdict {
            approved: false,
            reason: "Invalid moderation response format".to_string(),
        },
    }
}

/// Build the generation prompt for a listing field.
fn build_generation_prompt(request: &GenerateInfoRequest) -> String {
    let mut context = Vec::new();
    match request.generate_field {
        GenerateField::Name => {
            if let Some(name) = request.current_name.as_deref().filter(|n| !n.is_empty()) {
                context.push(format!("Current name idea: {name}"));
            }
        }
        GenerateField::Description => {
            if let Some(description) = request
                .current_description
                .as_deref()
                .filter(|d| !d.is_empty())
            {
                context.push(format!("Current description: {description}"));
            } else if let Some(name) = request.current_name.as_deref().filter(|n| !n.is_empty()) {
                context.push(format!("Agent name: {name}"));
            }
        }
    }
    if !request.categories.is_empty() {
        context.push(format!("Categories: {}", request.categories.join(", ")));
    }

    let context_block = if context.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", context.join("\n"))
    };

    match request.generate_field {
        GenerateField::Name => format!(
            "You are helping name an agent for an AI marketplace.\n\n{context_block}\
Generate a catchy, professional agent name (max 5 words), relevant to the \
categories if given.\n\n\
Respond with ONLY the agent name, no JSON, no quotes, no explanation."
        ),
        GenerateField::Description => format!(
            "You are helping describe an agent for an AI marketplace.\n\n{context_block}\
Write a concise description of what this agent does: maximum 2 lines, around \
20-30 words, focused on the agent's value.\n\n\
Respond with ONLY the description text, no JSON, no quotes, no labels."
        ),
    }
}

/// Strip wrapping quotes and bullet markers from generated text.
fn clean_generated(reply: &str) -> String {
    let trimmed = reply.trim();
    let trimmed = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    LEADING_BULLET.replace(trimmed, "").trim().to_string()
}
