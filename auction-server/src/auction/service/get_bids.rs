use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

pub struct GetBidsInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// The auction's ledger in acceptance order.
    pub async fn get_bids(&self, input: GetBidsInput) -> Result<Vec<entities::Bid>, RestError> {
        self.repo
            .get_auction(input.auction_id)
            .await?
            .ok_or(RestError::AuctionNotFound)?;
        self.repo.get_bids(input.auction_id).await
    }
}
