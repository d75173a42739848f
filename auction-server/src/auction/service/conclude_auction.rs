use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
        collaborator::NotificationKind,
    },
    time::OffsetDateTime,
    tokio::sync::MutexGuard,
};

pub struct ConcludeAuctionInput {
    pub auction_id: entities::AuctionId,
}

impl Service {
    /// Finalizes an auction whose deadline has passed: records the outcome,
    /// requests settlement for a sale and emits the terminal event.
    /// Idempotent: a second invocation sees the terminal status and performs
    /// no further side effects.
    #[tracing::instrument(
        skip_all,
        fields(auction_id = %input.auction_id, result),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn conclude_auction(&self, input: ConcludeAuctionInput) -> Result<(), RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self
            .conclude_auction_for_lock(&input, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }

    pub(crate) async fn conclude_auction_for_lock(
        &self,
        input: &ConcludeAuctionInput,
        _auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<(), RestError> {
        let Some(auction) = self.repo.get_in_memory_auction(input.auction_id) else {
            // Unknown here: either the id is bogus or the auction reached a
            // terminal state before a restart. Both are no-ops.
            return Ok(());
        };
        if auction.status.is_terminal() {
            return Ok(());
        }
        if auction.status != entities::AuctionStatus::Live {
            tracing::warn!(
                auction_id = %auction.id,
                status = %auction.status,
                "Conclusion requested for an auction that never went live",
            );
            return Ok(());
        }
        let now = OffsetDateTime::now_utc();
        if now < auction.effective_end_time {
            // An extension raced the clock tick; the new deadline is already
            // on the schedule.
            return Ok(());
        }

        let result = auction.compute_result();
        tracing::Span::current().record("result", result.to_string());
        let mut updated = auction.clone();
        updated.status = entities::AuctionStatus::Ended;
        updated.result = Some(result);
        self.repo.update_auction(&updated).await?;

        let winning_bid = self.repo.get_in_memory_winning_bid(updated.id).await;
        let mut winning_bid_id = None;
        if result == entities::AuctionResult::Sold {
            let Some(winning_bid) = &winning_bid else {
                panic!("auction {} sold without a winning bid", updated.id);
            };
            winning_bid_id = Some(winning_bid.id);
            self.request_settlement(updated.id, winning_bid.id, updated.current_price)
                .await;
            self.notify_winner(winning_bid, &updated);
        }

        self.broadcast(UpdateEvent::AuctionEnded {
            auction_id:     updated.id,
            result:         result.into(),
            winning_bid_id,
            final_price:    updated.current_price,
        });
        tracing::info!(
            auction_id = %updated.id,
            result = %result,
            final_price = updated.current_price,
            "Auction concluded",
        );
        Ok(())
    }

    /// Hands the sale off to the settlement collaborator. The collaborator is
    /// idempotent on its side, so a retry after an error or a crash between
    /// the state write and this call is safe; failures are surfaced in the
    /// log rather than un-ending the auction.
    async fn request_settlement(
        &self,
        auction_id: entities::AuctionId,
        winning_bid_id: entities::BidId,
        final_price: entities::Amount,
    ) {
        let request = self.collaborators.settlement.request_settlement(
            auction_id,
            winning_bid_id,
            final_price,
        );
        match tokio::time::timeout(self.config.collaborator_timeout, request).await {
            Err(_) => {
                tracing::error!(auction_id = %auction_id, "Settlement request timed out");
            }
            Ok(Err(err)) => {
                tracing::error!(error = ?err, auction_id = %auction_id, "Settlement request failed");
            }
            Ok(Ok(())) => {}
        }
    }

    fn notify_winner(&self, winning_bid: &entities::Bid, auction: &entities::Auction) {
        let notifier = self.collaborators.notifier.clone();
        let timeout = self.config.collaborator_timeout;
        let user_id = winning_bid.bidder_id;
        let payload = serde_json::json!({
            "auction_id": auction.id,
            "final_price": auction.current_price,
        });
        self.task_tracker.spawn(async move {
            let notify = notifier.notify(user_id, NotificationKind::AuctionWon, payload);
            match tokio::time::timeout(timeout, notify).await {
                Err(_) => {
                    tracing::warn!(user_id = %user_id, "Winner notification timed out");
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = ?err, user_id = %user_id, "Failed to dispatch winner notification");
                }
                Ok(Ok(())) => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::{
                submit_bid::SubmitBidInput,
                tests::{
                    eligible_bidders,
                    live_auction,
                    permissive_db,
                    quiet_notifier,
                    seed_auction,
                },
            },
            ConcludeAuctionInput,
        },
        crate::{
            auction::{
                entities,
                service::Service,
            },
            collaborator::MockSettlementGateway,
        },
        uuid::Uuid,
    };

    fn service_with_settlement(settlement: MockSettlementGateway) -> Service {
        Service::new_with_mocks(
            permissive_db(),
            eligible_bidders(),
            quiet_notifier(),
            settlement,
        )
    }

    #[tokio::test]
    async fn test_no_bids_yields_no_settlement() {
        let mut settlement = MockSettlementGateway::new();
        settlement.expect_request_settlement().times(0);
        let service = service_with_settlement(settlement);

        let auction = live_auction(time::Duration::seconds(-1));
        seed_auction(&service, &auction).await;

        service
            .conclude_auction(ConcludeAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Ended);
        assert_eq!(stored.result, Some(entities::AuctionResult::NoBids));
    }

    #[tokio::test]
    async fn test_reserve_not_met_yields_no_settlement_but_keeps_winner_flag() {
        let mut settlement = MockSettlementGateway::new();
        settlement.expect_request_settlement().times(0);
        let service = service_with_settlement(settlement);

        let mut auction = live_auction(time::Duration::hours(1));
        auction.reserve_price = 400_000_000;
        seed_auction(&service, &auction).await;

        service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                amount:     368_000_000,
            })
            .await
            .unwrap();

        // Force the deadline into the past, then conclude.
        let mut past_due = service.repo.get_in_memory_auction(auction.id).unwrap();
        past_due.effective_end_time = time::OffsetDateTime::now_utc() - time::Duration::seconds(1);
        service
            .repo
            .in_memory_store
            .auctions
            .insert(auction.id, past_due);

        service
            .conclude_auction(ConcludeAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.result, Some(entities::AuctionResult::ReserveNotMet));
        // The winning flag stays set for audit even though nothing settles.
        let winning = service.repo.get_in_memory_winning_bid(auction.id).await;
        assert!(winning.is_some());
    }

    #[tokio::test]
    async fn test_sold_requests_exactly_one_settlement_even_when_concluded_twice() {
        let mut settlement = MockSettlementGateway::new();
        settlement
            .expect_request_settlement()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let service = service_with_settlement(settlement);

        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let output = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                amount:     368_000_000,
            })
            .await
            .unwrap();

        let mut past_due = service.repo.get_in_memory_auction(auction.id).unwrap();
        past_due.effective_end_time = time::OffsetDateTime::now_utc() - time::Duration::seconds(1);
        service
            .repo
            .in_memory_store
            .auctions
            .insert(auction.id, past_due);

        service
            .conclude_auction(ConcludeAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();
        let first = service.repo.get_in_memory_auction(auction.id).unwrap();

        // Idempotent re-entry: identical observable state, no second settlement.
        service
            .conclude_auction(ConcludeAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();
        let second = service.repo.get_in_memory_auction(auction.id).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.status, entities::AuctionStatus::Ended);
        assert_eq!(first.result, Some(entities::AuctionResult::Sold));
        assert_eq!(first.winning_bid_id, Some(output.bid.id));
    }

    #[tokio::test]
    async fn test_conclusion_before_deadline_is_a_no_op() {
        let mut settlement = MockSettlementGateway::new();
        settlement.expect_request_settlement().times(0);
        let service = service_with_settlement(settlement);

        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        service
            .conclude_auction(ConcludeAuctionInput {
                auction_id: auction.id,
            })
            .await
            .unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Live);
        assert_eq!(stored.result, None);
    }
}
