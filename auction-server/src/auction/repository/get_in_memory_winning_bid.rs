use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    /// The single bid currently flagged winning, if any. Finding more than one
    /// means the per-auction serialization was broken; that is a defect worth
    /// crashing the operation over, not a state to repair silently.
    pub async fn get_in_memory_winning_bid(
        &self,
        auction_id: entities::AuctionId,
    ) -> Option<entities::Bid> {
        let bids = self.in_memory_store.bids.read().await;
        let ledger = bids.get(&auction_id)?;
        let mut winning = ledger.iter().filter(|bid| bid.is_winning);
        let bid = winning.next().cloned();
        if winning.next().is_some() {
            panic!("two bids flagged winning on auction {}", auction_id);
        }
        bid
    }
}
