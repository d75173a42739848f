use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn add_auction(
        &self,
        auction: entities::Auction,
    ) -> Result<entities::Auction, RestError> {
        self.db.add_auction(&auction).await?;
        self.in_memory_store
            .auctions
            .insert(auction.id, auction.clone());
        self.in_memory_store
            .bids
            .write()
            .await
            .entry(auction.id)
            .or_default();
        self.in_memory_store
            .auto_bid_agents
            .write()
            .await
            .entry(auction.id)
            .or_default();
        Ok(auction)
    }
}
