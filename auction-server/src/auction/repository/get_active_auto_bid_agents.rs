use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    /// Active agents for an auction, oldest registration first. The ordering
    /// carries the first-registration tie-break all the way to the resolver.
    pub async fn get_active_auto_bid_agents(
        &self,
        auction_id: entities::AuctionId,
    ) -> Vec<entities::AutoBidAgent> {
        let mut agents: Vec<entities::AutoBidAgent> = self
            .in_memory_store
            .auto_bid_agents
            .read()
            .await
            .get(&auction_id)
            .map(|agents| agents.iter().filter(|agent| agent.active).cloned().collect())
            .unwrap_or_default();
        agents.sort_by_key(|agent| agent.registered_at);
        agents
    }
}
