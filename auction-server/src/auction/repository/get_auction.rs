use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        if let Some(auction) = self.get_in_memory_auction(auction_id) {
            return Ok(Some(auction));
        }
        self.db.get_auction(auction_id).await
    }
}
