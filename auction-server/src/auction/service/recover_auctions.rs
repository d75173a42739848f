use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    /// Reloads every non-terminal auction from the database after a restart
    /// and re-arms its next deadline on the clock.
    pub async fn recover_open_auctions(&self) -> Result<(), RestError> {
        let auctions = self.repo.load_open_auctions().await?;
        let count = auctions.len();
        for auction in auctions {
            let deadline = match auction.status {
                entities::AuctionStatus::Scheduled => auction.start_time,
                _ => auction.effective_end_time,
            };
            self.deadlines.schedule(deadline, auction.id).await;
        }
        if count > 0 {
            tracing::info!(count, "Recovered open auctions from database");
        }
        Ok(())
    }
}
