use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    tokio::sync::MutexGuard,
};

pub struct CancelAutoBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder_id:  UserId,
}

impl Service {
    /// Deactivates the bidder's agent for all future resolver passes. Bids the
    /// agent already placed are never retroactively invalidated.
    #[tracing::instrument(
        skip_all,
        fields(auction_id = %input.auction_id, bidder_id = %input.bidder_id),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn cancel_auto_bid(&self, input: CancelAutoBidInput) -> Result<(), RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self
            .cancel_auto_bid_for_lock(&input, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }

    async fn cancel_auto_bid_for_lock(
        &self,
        input: &CancelAutoBidInput,
        _auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<(), RestError> {
        self.repo
            .get_in_memory_auction(input.auction_id)
            .ok_or(RestError::AuctionNotFound)?;
        let agent = self
            .repo
            .get_active_auto_bid_agents(input.auction_id)
            .await
            .into_iter()
            .find(|agent| agent.bidder_id == input.bidder_id)
            .ok_or(RestError::AutoBidNotFound)?;
        self.repo.deactivate_auto_bid_agent(&agent).await?;
        tracing::info!(
            auction_id = %input.auction_id,
            agent_id = %agent.id,
            "Auto-bid agent cancelled",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::{
                register_auto_bid::RegisterAutoBidInput,
                tests::{
                    new_test_service,
                    scheduled_auction,
                    seed_auction,
                },
            },
            CancelAutoBidInput,
        },
        crate::api::RestError,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn test_cancel_deactivates_agent() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::hours(1), time::Duration::hours(2));
        seed_auction(&service, &auction).await;
        let bidder = Uuid::new_v4();

        service
            .register_auto_bid(RegisterAutoBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                ceiling:    400_000_000,
                step:       None,
            })
            .await
            .unwrap();
        service
            .cancel_auto_bid(CancelAutoBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
            })
            .await
            .unwrap();

        assert!(service
            .repo
            .get_active_auto_bid_agents(auction.id)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_agent_is_reported() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::hours(1), time::Duration::hours(2));
        seed_auction(&service, &auction).await;

        let result = service
            .cancel_auto_bid(CancelAutoBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
            })
            .await;
        assert_eq!(result.err(), Some(RestError::AutoBidNotFound));
    }
}
