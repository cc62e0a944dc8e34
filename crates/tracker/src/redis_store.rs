//! # Redis exclusion store
//!
//! One Redis set per user under `viewed:<user_id>`. `SADD` gives
//! idempotent writes for free; `SMEMBERS` returns the whole set in one
//! round trip, which stays small (one entry per artwork the user has seen).

use crate::error::Result;
use crate::store::ExclusionStore;
use async_trait::async_trait;
use catalog::ArtworkId;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use std::collections::HashSet;
use tracing::info;

pub const DEFAULT_KEY_PREFIX: &str = "viewed:";

#[derive(Clone)]
pub struct RedisExclusionStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisExclusionStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;
        info!("Connected exclusion store to {}", redis_url);

        Ok(Self {
            connection,
            prefix: DEFAULT_KEY_PREFIX.to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.prefix, user_id)
    }
}

#[async_trait]
impl ExclusionStore for RedisExclusionStore {
    async fn add(&self, user_id: &str, artwork_id: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        connection
            .sadd::<_, _, ()>(self.key(user_id), artwork_id)
            .await?;
        Ok(())
    }

    async fn members(&self, user_id: &str) -> Result<HashSet<ArtworkId>> {
        let mut connection = self.connection.clone();
        let members: HashSet<ArtworkId> = connection.smembers(self.key(user_id)).await?;
        Ok(members)
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(self.key(user_id)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
