use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Deactivation applies to future resolver passes only; bids the agent
    /// already placed stay accepted.
    #[tracing::instrument(skip_all, fields(agent_id = %agent.id))]
    pub async fn deactivate_auto_bid_agent(
        &self,
        agent: &entities::AutoBidAgent,
    ) -> Result<(), RestError> {
        self.db.set_auto_bid_agent_active(agent.id, false).await?;
        if let Some(agents) = self
            .in_memory_store
            .auto_bid_agents
            .write()
            .await
            .get_mut(&agent.auction_id)
        {
            for existing in agents.iter_mut() {
                if existing.id == agent.id {
                    existing.active = false;
                }
            }
        }
        Ok(())
    }
}
