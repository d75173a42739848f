use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn add_auto_bid_agent(
        &self,
        agent: entities::AutoBidAgent,
    ) -> Result<entities::AutoBidAgent, RestError> {
        self.db.add_auto_bid_agent(&agent).await?;
        self.in_memory_store
            .auto_bid_agents
            .write()
            .await
            .entry(agent.auction_id)
            .or_default()
            .push(agent.clone());
        Ok(agent)
    }
}
