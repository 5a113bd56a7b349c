//! Chat orchestration.
//!
//! Validates incoming queries, builds role-scoped prompts for registered
//! agents, and calls the completion backend. Entitlement gating and the
//! post-success debit happen at the API layer so a failed completion is never
//! charged.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::agent::{Agent, AgentRepository};
use crate::llm::{ChatMessage, CompletionBackend, CompletionRequest, LlmError};

/// Maximum query length in characters.
const MAX_QUERY_CHARS: usize = 1000;

/// Minimum query length in characters.
const MIN_QUERY_CHARS: usize = 3;

/// Reply used when the backend answers with no content.
const EMPTY_REPLY_FALLBACK: &str = "I apologize, but I could not generate a response.";

/// Low-effort spam shapes: long single-character runs and keyboard filler.
static SPAM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^(.)\1{10,}$").unwrap(),
        Regex::new(r"(?i)^test+$").unwrap(),
        Regex::new(r"(?i)^asdf+$").unwrap(),
    ]
});

/// Words suggesting the user is asking what agents exist.
const DISCOVERY_KEYWORDS: [&str; 9] = [
    "agent", "show", "list", "find", "get", "what", "tell me", "display", "available",
];

/// Result type for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that can occur serving a chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The query failed validation; the message is user-facing.
    #[error("{0}")]
    InvalidQuery(String),

    /// The addressed agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Completion backend failure.
    #[error("completion backend error: {0}")]
    Backend(#[from] LlmError),

    /// Directory lookup failure.
    #[error(transparent)]
    Directory(#[from] anyhow::Error),
}

/// A chat request against an optional agent persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// The user's message.
    pub message: String,
    /// Slug of the agent to impersonate; platform assistant when absent.
    #[serde(default)]
    pub agent_slug: Option<String>,
    /// Prior turns of the conversation.
    #[serde(default)]
    pub context: Vec<ChatMessage>,
}

/// Reply of the marketplace assistant, with directory results when the query
/// looked like agent discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<Agent>>,
}

/// Service orchestrating chat completions.
#[derive(Clone)]
pub struct ChatService {
    agents: AgentRepository,
    llm: Arc<dyn CompletionBackend>,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(agents: AgentRepository, llm: Arc<dyn CompletionBackend>) -> Self {
        Self { agents, llm }
    }

    /// Serve one chat turn and return the agent's reply.
    pub async fn send(&self, turn: ChatTurn) -> ChatResult<String> {
        validate_query(&turn.message)?;

        let agent = match turn.agent_slug.as_deref() {
            Some(slug) => Some(
                self.agents
                    .get_by_slug(slug)
                    .await?
                    .ok_or_else(|| ChatError::AgentNotFound(slug.to_string()))?,
            ),
            None => None,
        };

        let system = match &agent {
            Some(agent) => agent_system_prompt(agent),
            None => platform_system_prompt(),
        };

        let mut messages = Vec::with_capacity(turn.context.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend(turn.context);
        messages.push(ChatMessage::user(turn.message));

        debug!(
            "chat turn for agent {:?}, {} context messages",
            agent.as_ref().map(|a| a.slug.as_str()),
            messages.len() - 2
        );

        match self.llm.complete(CompletionRequest::new(messages)).await {
            Ok(reply) => Ok(reply),
            Err(LlmError::Empty) => Ok(EMPTY_REPLY_FALLBACK.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    /// Serve a marketplace-assistant turn; attaches the current directory
    /// listing when the query looks like agent discovery.
    pub async fn assistant_query(&self, message: &str) -> ChatResult<AssistantReply> {
        validate_query(message)?;

        let agents = if is_discovery_query(message) {
            let listing = self.agents.list().await?;
            if listing.is_empty() { None } else { Some(listing) }
        } else {
            None
        };

        let system = assistant_system_prompt(agents.as_deref());
        let messages = vec![ChatMessage::system(system), ChatMessage::user(message)];

        let response = match self.llm.complete(CompletionRequest::new(messages)).await {
            Ok(reply) => reply,
            Err(LlmError::Empty) => EMPTY_REPLY_FALLBACK.to_string(),
            Err(e) => return Err(e.into()),
        };

        Ok(AssistantReply { response, agents })
    }
}

/// Reject queries that are too short, too long, or obvious filler.
pub fn validate_query(message: &str) -> ChatResult<()> {
    let trimmed = message.trim();

    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(ChatError::InvalidQuery(
            "Query too short. Please ask a meaningful question.".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(ChatError::InvalidQuery(format!(
            "Query too long. Please keep it under {MAX_QUERY_CHARS} characters."
        )));
    }
    for pattern in SPAM_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            return Err(ChatError::InvalidQuery(
                "Invalid query detected. Please ask a real question.".to_string(),
            ));
        }
    }

    Ok(())
}

/// Whether a message looks like it is asking what agents exist.
fn is_discovery_query(message: &str) -> bool {
    let lowered = message.to_lowercase();
    DISCOVERY_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// System prompt that keeps a registered agent strictly on topic.
fn agent_system_prompt(agent: &Agent) -> String {
    format!(
        "You are {name}. {description}\n\n\
RULES:\n\
1. Only answer queries related to your purpose and description.\n\
2. Politely decline greetings, math problems, general chat, and anything \
outside your specialty, and redirect the user to your core purpose.\n\
3. Stay strictly within your role.\n\n\
Respond as this agent, staying true to your specialized purpose.",
        name = agent.name,
        description = agent.description,
    )
}

/// Default prompt when no agent persona is addressed.
fn platform_system_prompt() -> String {
    "You are a helpful AI assistant on an agent marketplace, answering \
questions about AI agents and blockchain topics."
        .to_string()
}

/// Prompt for the marketplace assistant, with the directory folded in when
/// available.
fn assistant_system_prompt(agents: Option<&[Agent]>) -> String {
    let mut prompt = String::from(
        "You are the marketplace assistant. You help users discover AI agents, \
register their own, and understand pay-per-query payments with native tokens. \
Users browse agents by category (AI, Utility, Demo, Chat, Analysis, Trading, \
NFT, DeFi), pay per query at the price set by each agent's creator, and earn \
by registering useful agents. Be friendly and concise.",
    );

    if let Some(agents) = agents {
        prompt.push_str("\n\nCurrently registered agents:\n");
        for agent in agents {
            prompt.push_str(&format!(
                "- {} ({}): {} - {} per query\n",
                agent.name, agent.category, agent.description, agent.price_per_query
            ));
        }
        prompt.push_str(
            "\nWhen the user asks about agents, describe the relevant ones and \
mention that matching agents are shown below your reply.",
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::llm::LlmResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedBackend {
        replies: Mutex<Vec<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        fn with(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
            self.requests.lock().unwrap().push(request);
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop()
                .expect("scripted backend exhausted"))
        }
    }

    async fn repo_with_agent() -> AgentRepository {
        let db = Database::in_memory().await.unwrap();
        let repo = AgentRepository::new(db.pool().clone());
        let now = Utc::now().to_rfc3339();
        repo.create(&Agent {
            id: Uuid::new_v4().to_string(),
            name: "Flow Analyzer".to_string(),
            slug: "flow-analyzer".to_string(),
            description: "Summarizes on-chain token flow".to_string(),
            category: "Analysis".to_string(),
            price_per_query: 0.01,
            payment_wallet: "0x2222222222222222222222222222222222222222".to_string(),
            creator_wallet: "0x1111111111111111111111111111111111111111".to_string(),
            status: "active".to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
        .await
        .unwrap();
        repo
    }

    #[test]
    fn test_validate_query_bounds() {
        assert!(validate_query("hi").is_err());
        assert!(validate_query("what is this agent for?").is_ok());
        assert!(validate_query(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn test_validate_query_spam() {
        assert!(validate_query("aaaaaaaaaaaaaaaa").is_err());
        assert!(validate_query("TESTTEST").is_err());
        assert!(validate_query("asdfasdf").is_err());
        assert!(validate_query("testing my new agent").is_ok());
    }

    #[test]
    fn test_discovery_detection() {
        assert!(is_discovery_query("What agents are available?"));
        assert!(is_discovery_query("show me trading bots"));
        assert!(!is_discovery_query("explain gas fees"));
    }

    #[tokio::test]
    async fn test_send_uses_agent_persona() {
        let backend = ScriptedBackend::with(&["Inflows exceed outflows."]);
        let service = ChatService::new(repo_with_agent().await, backend.clone());

        let reply = service
            .send(ChatTurn {
                message: "summarize flows for 0xabc".to_string(),
                agent_slug: Some("flow-analyzer".to_string()),
                context: vec![],
            })
            .await
            .unwrap();

        assert_eq!(reply, "Inflows exceed outflows.");
        let request = backend.last_request();
        assert!(request.messages[0].content.contains("You are Flow Analyzer"));
    }

    #[tokio::test]
    async fn test_send_unknown_agent() {
        let backend = ScriptedBackend::with(&[]);
        let service = ChatService::new(repo_with_agent().await, backend);

        let err = service
            .send(ChatTurn {
                message: "hello there agent".to_string(),
                agent_slug: Some("missing".to_string()),
                context: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn test_send_threads_context() {
        let backend = ScriptedBackend::with(&["Continuing."]);
        let service = ChatService::new(repo_with_agent().await, backend.clone());

        service
            .send(ChatTurn {
                message: "and what about outflows?".to_string(),
                agent_slug: None,
                context: vec![
                    ChatMessage::user("summarize inflows"),
                    ChatMessage::assistant("Inflows are rising."),
                ],
            })
            .await
            .unwrap();

        let request = backend.last_request();
        // system + 2 context turns + user
        assert_eq!(request.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_assistant_attaches_directory_on_discovery() {
        let backend = ScriptedBackend::with(&["Here is what we have."]);
        let service = ChatService::new(repo_with_agent().await, backend.clone());

        let reply = service
            .assistant_query("what agents are available?")
            .await
            .unwrap();

        let agents = reply.agents.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].slug, "flow-analyzer");
        assert!(backend.last_request().messages[0]
            .content
            .contains("Flow Analyzer"));
    }

    #[tokio::test]
    async fn test_assistant_skips_directory_otherwise() {
        let backend = ScriptedBackend::with(&["Gas is the execution fee."]);
        let service = ChatService::new(repo_with_agent().await, backend);

        let reply = service.assistant_query("explain gas fees").await.unwrap();
        assert!(reply.agents.is_none());
    }
}
