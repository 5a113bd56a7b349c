//! Agent directory data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Marketplace category of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentCategory {
    #[serde(rename = "AI")]
    Ai,
    Utility,
    Demo,
    Chat,
    Analysis,
    Trading,
    #[serde(rename = "NFT")]
    Nft,
    DeFi,
}

/// All categories, in display order.
pub const AGENT_CATEGORIES: [AgentCategory; 8] = [
    AgentCategory::Ai,
    AgentCategory::Utility,
    AgentCategory::Demo,
    AgentCategory::Chat,
    AgentCategory::Analysis,
    AgentCategory::Trading,
    AgentCategory::Nft,
    AgentCategory::DeFi,
];

impl std::fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentCategory::Ai => write!(f, "AI"),
            AgentCategory::Utility => write!(f, "Utility"),
            AgentCategory::Demo => write!(f, "Demo"),
            AgentCategory::Chat => write!(f, "Chat"),
            AgentCategory::Analysis => write!(f, "Analysis"),
            AgentCategory::Trading => write!(f, "Trading"),
            AgentCategory::Nft => write!(f, "NFT"),
            AgentCategory::DeFi => write!(f, "DeFi"),
        }
    }
}

impl std::str::FromStr for AgentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AI" => Ok(AgentCategory::Ai),
            "Utility" => Ok(AgentCategory::Utility),
            "Demo" => Ok(AgentCategory::Demo),
            "Chat" => Ok(AgentCategory::Chat),
            "Analysis" => Ok(AgentCategory::Analysis),
            "Trading" => Ok(AgentCategory::Trading),
            "NFT" => Ok(AgentCategory::Nft),
            "DeFi" => Ok(AgentCategory::DeFi),
            _ => Err(format!("unknown agent category: {}", s)),
        }
    }
}

/// A registered agent listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    /// Unique agent ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug, unique across the directory.
    pub slug: String,
    /// What the agent does.
    pub description: String,
    /// Marketplace category.
    pub category: String,
    /// Price per query in native units.
    pub price_per_query: f64,
    /// Wallet receiving query payments.
    pub payment_wallet: String,
    /// Wallet that registered the agent.
    pub creator_wallet: String,
    /// Listing status ("active").
    pub status: String,
    /// When the listing was created.
    pub created_at: String,
    /// When the listing was last updated.
    pub updated_at: String,
}

/// Request to register a new agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub price_per_query: f64,
    pub payment_wallet: String,
    pub creator_wallet: String,
}

/// Moderation verdict on an agent submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub approved: bool,
    /// Tolerate verdicts that omit the reason.
    #[serde(default)]
    pub reason: String,
}

/// Which listing field to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateField {
    Name,
    Description,
}

impl std::fmt::Display for GenerateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateField::Name => write!(f, "name"),
            GenerateField::Description => write!(f, "description"),
        }
    }
}

/// Request to generate a listing field from partial context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateInfoRequest {
    #[serde(default)]
    pub current_name: Option<String>,
    #[serde(default)]
    pub current_description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub generate_field: GenerateField,
}

/// A generated listing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedInfo {
    pub generated_text: String,
    pub field: GenerateField,
}

/// Derive a URL slug from an agent name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
