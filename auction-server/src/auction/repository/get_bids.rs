use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// The full ledger of a known auction. Historical bids are safe to read
    /// without the auction lock once written. Auctions that predate the
    /// current process are served from the database.
    pub async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        if let Some(ledger) = self.in_memory_store.bids.read().await.get(&auction_id) {
            return Ok(ledger.clone());
        }
        self.db.get_bids(auction_id).await
    }
}
