use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
        collaborator::NotificationKind,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

pub(crate) struct AcceptBidInput {
    /// Snapshot of the auction the caller validated against.
    pub auction:   entities::Auction,
    pub bidder_id: UserId,
    pub amount:    entities::Amount,
    pub kind:      entities::BidKind,
    pub ceiling:   Option<entities::Amount>,
}

impl Service {
    /// Applies an already-validated bid: ledger append, winning-flag hand-off,
    /// price update, outbid notification, event emission and the anti-sniping
    /// check. Shared by manual bids and every proxy bid the resolver places.
    ///
    /// The caller must hold the auction lock.
    pub(crate) async fn accept_bid(
        &self,
        input: AcceptBidInput,
    ) -> Result<(entities::Bid, entities::Auction), RestError> {
        let accepted_at = OffsetDateTime::now_utc();
        let previous_winner = self.repo.get_in_memory_winning_bid(input.auction.id).await;
        let bid = entities::Bid::new(
            input.auction.id,
            input.bidder_id,
            input.amount,
            input.kind,
            input.ceiling,
            accepted_at,
        );
        let (bid, mut auction) = self.repo.accept_bid(&input.auction, bid).await?;
        tracing::info!(
            auction_id = %auction.id,
            bid_id = %bid.id,
            amount = bid.amount,
            kind = %bid.kind,
            "Bid accepted",
        );

        self.broadcast(UpdateEvent::BidAccepted {
            bid:           bid.clone().into(),
            current_price: auction.current_price,
            min_next_bid:  auction.min_acceptable_bid(self.config.bid_increment_floor),
        });

        if let Some(previous) = previous_winner {
            if previous.bidder_id != bid.bidder_id {
                self.notify_outbid(&previous, &auction);
            }
        }

        if let Some(extended) = self.extend_auction_after_bid(&auction, accepted_at).await? {
            auction = extended;
        }

        Ok((bid, auction))
    }

    /// Tells the previous leader they lost the lead. Fire-and-forget: a
    /// failing notification collaborator never blocks bid acceptance.
    fn notify_outbid(&self, previous: &entities::Bid, auction: &entities::Auction) {
        let notifier = self.collaborators.notifier.clone();
        let timeout = self.config.collaborator_timeout;
        let user_id = previous.bidder_id;
        let payload = serde_json::json!({
            "auction_id": auction.id,
            "current_price": auction.current_price,
        });
        self.task_tracker.spawn(async move {
            let notify = notifier.notify(user_id, NotificationKind::Outbid, payload);
            match tokio::time::timeout(timeout, notify).await {
                Err(_) => {
                    tracing::warn!(user_id = %user_id, "Outbid notification timed out");
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = ?err, user_id = %user_id, "Failed to dispatch outbid notification");
                }
                Ok(Ok(())) => {}
            }
        });
    }
}
