use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
    },
    tokio::sync::MutexGuard,
};

pub struct CancelAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// Cancels a scheduled or live auction. Terminal: no bids or transitions
    /// can follow, and the record is never deleted.
    #[tracing::instrument(
        skip_all,
        fields(auction_id = %input.auction_id),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn cancel_auction(
        &self,
        input: CancelAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self
            .cancel_auction_for_lock(&input, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }

    async fn cancel_auction_for_lock(
        &self,
        input: &CancelAuctionInput,
        _auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<entities::Auction, RestError> {
        let auction = self
            .repo
            .get_in_memory_auction(input.auction_id)
            .ok_or(RestError::AuctionNotFound)?;
        if auction.status.is_terminal() {
            return Err(RestError::AuctionNotActive);
        }
        let mut updated = auction;
        updated.status = entities::AuctionStatus::Cancelled;
        self.repo.update_auction(&updated).await?;
        self.broadcast(UpdateEvent::AuctionCancelled {
            auction_id: updated.id,
        });
        tracing::info!(auction_id = %updated.id, "Auction cancelled");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::{
                live_auction,
                new_test_service,
                seed_auction,
            },
            CancelAuctionInput,
        },
        crate::{
            api::RestError,
            auction::entities,
        },
    };

    #[tokio::test]
    async fn test_cancel_live_auction_is_terminal() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let cancelled = service
            .cancel_auction(CancelAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, entities::AuctionStatus::Cancelled);

        let again = service
            .cancel_auction(CancelAuctionInput {
                auction_id: auction.id,
            })
            .await;
        assert_eq!(again.err(), Some(RestError::AuctionNotActive));
    }
}
