use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Rebuilds the in-memory state for every non-terminal auction after a
    /// restart. Returns the reloaded auctions so the clock can re-arm their
    /// deadlines.
    pub async fn load_open_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        let auctions = self.db.get_open_auctions().await?;
        for auction in &auctions {
            let bids = self.db.get_bids(auction.id).await?;
            let agents = self.db.get_active_auto_bid_agents(auction.id).await?;
            self.in_memory_store
                .auctions
                .insert(auction.id, auction.clone());
            self.in_memory_store
                .bids
                .write()
                .await
                .insert(auction.id, bids);
            self.in_memory_store
                .auto_bid_agents
                .write()
                .await
                .insert(auction.id, agents);
        }
        Ok(auctions)
    }
}
