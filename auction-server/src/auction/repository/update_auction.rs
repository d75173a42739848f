use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn update_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        self.db.update_auction(auction).await?;
        self.update_in_memory_auction(auction.clone());
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(auction_id = %auction.id))]
    pub(super) fn update_in_memory_auction(&self, auction: entities::Auction) {
        match self.in_memory_store.auctions.get_mut(&auction.id) {
            Some(mut a) => {
                *a = auction;
            }
            None => {
                tracing::error!(auction = ?auction, "Auction not found in in-memory store");
            }
        };
    }
}
