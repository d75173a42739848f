use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Appends an accepted bid to the ledger and updates the auction record in
    /// one step. The caller must hold the auction lock. The winning flag and
    /// the price move together: once a bid exists there is never a moment with
    /// two winners or none.
    #[tracing::instrument(skip_all, fields(auction_id = %auction.id, bid_id = %bid.id))]
    pub async fn accept_bid(
        &self,
        auction: &entities::Auction,
        mut bid: entities::Bid,
    ) -> Result<(entities::Bid, entities::Auction), RestError> {
        bid.is_winning = true;
        let previous_winner = self.get_in_memory_winning_bid(auction.id).await;

        let mut updated = auction.clone();
        updated.current_price = bid.amount;
        updated.bid_count += 1;
        updated.winning_bid_id = Some(bid.id);

        // The previous winner's flag clears before the new bid lands so the
        // store never holds two winning rows, even transiently.
        if let Some(previous) = &previous_winner {
            self.db.set_bid_winning(previous.id, false).await?;
        }
        self.db.add_bid(&bid).await?;
        self.db.update_auction(&updated).await?;

        {
            let mut bids = self.in_memory_store.bids.write().await;
            let ledger = bids.entry(auction.id).or_default();
            if ledger.iter().filter(|b| b.is_winning).count() > 1 {
                panic!("two bids flagged winning on auction {}", auction.id);
            }
            for existing in ledger.iter_mut() {
                existing.is_winning = false;
            }
            ledger.push(bid.clone());
        }
        self.update_in_memory_auction(updated.clone());

        Ok((bid, updated))
    }
}
