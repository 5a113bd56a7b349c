//! Agent database repository.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::Agent;

/// Repository for agent listings.
#[derive(Debug, Clone)]
pub struct AgentRepository {
    pool: SqlitePool,
}

impl AgentRepository {
    /// Create a new repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new agent listing.
    pub async fn create(&self, agent: &Agent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agents (
                id, name, slug, description, category, price_per_query,
                payment_wallet, creator_wallet, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.slug)
        .bind(&agent.description)
        .bind(&agent.category)
        .bind(agent.price_per_query)
        .bind(&agent.payment_wallet)
        .bind(&agent.creator_wallet)
        .bind(&agent.status)
        .bind(&agent.created_at)
        .bind(&agent.updated_at)
        .execute(&self.pool)
        .await
        .context("creating agent")?;

        Ok(())
    }

    /// Get an agent by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Agent>> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, slug, description, category, price_per_query,
                   payment_wallet, creator_wallet, status, created_at, updated_at
            FROM agents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching agent")?;

        Ok(agent)
    }

    /// Get an agent by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Agent>> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, slug, description, category, price_per_query,
                   payment_wallet, creator_wallet, status, created_at, updated_at
            FROM agents
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("fetching agent by slug")?;

        Ok(agent)
    }

    /// Check whether a slug is already taken.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("checking slug availability")?;

        Ok(count > 0)
    }

    /// List all agents, newest first.
    pub async fn list(&self) -> Result<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, slug, description, category, price_per_query,
                   payment_wallet, creator_wallet, status, created_at, updated_at
            FROM agents
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("listing agents")?;

        Ok(agents)
    }

    /// List agents in a category, newest first.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, slug, description, category, price_per_query,
                   payment_wallet, creator_wallet, status, created_at, updated_at
            FROM agents
            WHERE category = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .context("listing agents by category")?;

        Ok(agents)
    }

    /// List agents registered by a creator wallet.
    pub async fn list_by_creator(&self, creator_wallet: &str) -> Result<Vec<Agent>> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, name, slug, description, category, price_per_query,
                   payment_wallet, creator_wallet, status, created_at, updated_at
            FROM agents
            WHERE LOWER(creator_wallet) = LOWER(?)
            ORDER BY created_at DESC
            "#,
        )
        .bind(creator_wallet)
        .fetch_all(&self.pool)
        .await
        .context("listing agents by creator")?;

        Ok(agents)
    }

    /// Delete an agent by ID.
    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting agent")?;

        Ok(())
    }
}
