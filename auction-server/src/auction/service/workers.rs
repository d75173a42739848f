use {
    super::{
        conclude_auction::ConcludeAuctionInput,
        Service,
    },
    crate::{
        api::RestError,
        auction::entities,
        server::SHOULD_EXIT,
    },
    anyhow::Result,
    std::{
        sync::atomic::Ordering,
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::MutexGuard,
};

/// Upper bound on how long the clock parks without re-checking the schedule.
/// This bounds transition latency: a due transition is observed within
/// `CLOCK_MAX_PARK` of its deadline even if a wakeup notification is missed.
pub const CLOCK_MAX_PARK: Duration = Duration::from_secs(1);

impl Service {
    /// Drives every auction through `scheduled -> live -> ended`. The clock
    /// parks until the earliest scheduled deadline (or `CLOCK_MAX_PARK`,
    /// whichever is sooner) and is re-armed whenever an earlier deadline is
    /// scheduled, so it only wakes for auctions actually due rather than
    /// polling the whole registry.
    pub async fn run_auction_clock_loop(&self) -> Result<()> {
        tracing::info!("Starting auction clock...");
        while !SHOULD_EXIT.load(Ordering::Acquire) {
            let now = OffsetDateTime::now_utc();
            let park = match self.deadlines.next_deadline().await {
                Some(deadline) if deadline <= now => {
                    self.process_due_auctions(now).await;
                    continue;
                }
                Some(deadline) => Duration::try_from(deadline - now)
                    .map(|until_due| until_due.min(CLOCK_MAX_PARK))
                    .unwrap_or(CLOCK_MAX_PARK),
                None => CLOCK_MAX_PARK,
            };
            tokio::select! {
                _ = tokio::time::sleep(park) => {}
                _ = self.deadlines.rearm.notified() => {}
            }
        }
        tracing::info!("Shutting down auction clock...");
        Ok(())
    }

    async fn process_due_auctions(&self, now: OffsetDateTime) {
        for auction_id in self.deadlines.pop_due(now).await {
            self.task_tracker.spawn({
                let service = self.clone();
                async move {
                    if let Err(err) = service.handle_due_auction(auction_id).await {
                        tracing::error!(
                            error = ?err,
                            auction_id = %auction_id,
                            "Failed to apply due auction transition",
                        );
                    }
                }
            });
        }
    }

    /// Applies whichever transition is due for the auction. Stale or
    /// re-delivered deadlines make this a no-op; both transitions are
    /// idempotent.
    #[tracing::instrument(skip_all, fields(auction_id = %auction_id))]
    pub async fn handle_due_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<(), RestError> {
        let auction_lock = self.repo.get_or_create_auction_lock(auction_id).await;
        let result = self
            .handle_due_auction_for_lock(auction_id, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&auction_id).await;
        result
    }

    async fn handle_due_auction_for_lock(
        &self,
        auction_id: entities::AuctionId,
        auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<(), RestError> {
        let Some(auction) = self.repo.get_in_memory_auction(auction_id) else {
            return Ok(());
        };
        let now = OffsetDateTime::now_utc();
        match auction.status {
            entities::AuctionStatus::Scheduled if now >= auction.start_time => {
                let mut updated = auction;
                updated.status = entities::AuctionStatus::Live;
                self.repo.update_auction(&updated).await?;
                tracing::info!(
                    auction_id = %auction_id,
                    effective_end_time = %updated.effective_end_time,
                    "Auction is live",
                );
                self.deadlines
                    .schedule(updated.effective_end_time, auction_id)
                    .await;
                // Agents registered before the opening contest immediately.
                self.resolve_auto_bids(auction_id).await
            }
            entities::AuctionStatus::Scheduled => {
                // Woken before the start; a stale entry was on the heap.
                self.deadlines.schedule(auction.start_time, auction_id).await;
                Ok(())
            }
            entities::AuctionStatus::Live if now >= auction.effective_end_time => {
                self.conclude_auction_for_lock(
                    &ConcludeAuctionInput { auction_id },
                    auction_mutex_guard,
                )
                .await
            }
            entities::AuctionStatus::Live => {
                // The deadline moved (extension) after this entry was queued.
                self.deadlines
                    .schedule(auction.effective_end_time, auction_id)
                    .await;
                Ok(())
            }
            entities::AuctionStatus::Ended | entities::AuctionStatus::Cancelled => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::{
                live_auction,
                new_test_service,
                scheduled_auction,
                seed_auction,
            },
            CLOCK_MAX_PARK,
        },
        crate::auction::entities,
        time::OffsetDateTime,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn test_scheduled_auction_goes_live_when_due() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::seconds(-1), time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        service.handle_due_auction(auction.id).await.unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Live);
    }

    #[tokio::test]
    async fn test_scheduled_auction_stays_scheduled_before_start() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::hours(1), time::Duration::hours(2));
        seed_auction(&service, &auction).await;

        service.handle_due_auction(auction.id).await.unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_live_transition_is_idempotent() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::seconds(-1), time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        service.handle_due_auction(auction.id).await.unwrap();
        let first = service.repo.get_in_memory_auction(auction.id).unwrap();
        service.handle_due_auction(auction.id).await.unwrap();
        let second = service.repo.get_in_memory_auction(auction.id).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.status, entities::AuctionStatus::Live);
    }

    #[tokio::test]
    async fn test_due_live_auction_is_concluded_and_stays_concluded() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::seconds(-1));
        seed_auction(&service, &auction).await;

        service.handle_due_auction(auction.id).await.unwrap();
        let first = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(first.status, entities::AuctionStatus::Ended);
        assert_eq!(first.result, Some(entities::AuctionResult::NoBids));

        // Applying the ended transition again is a no-op, not an error.
        service.handle_due_auction(auction.id).await.unwrap();
        let second = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_auction_deadline_is_ignored() {
        let service = new_test_service();
        service.handle_due_auction(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_opening_transition_triggers_registered_agents() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::seconds(-1), time::Duration::hours(1));
        seed_auction(&service, &auction).await;
        let agent = entities::AutoBidAgent::new(
            auction.id,
            Uuid::new_v4(),
            400_000_000,
            None,
            OffsetDateTime::now_utc(),
        );
        service
            .repo
            .in_memory_store
            .auto_bid_agents
            .write()
            .await
            .entry(auction.id)
            .or_default()
            .push(agent.clone());

        service.handle_due_auction(auction.id).await.unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Live);
        assert_eq!(stored.current_price, 367_500_000);
        let winning = service
            .repo
            .get_in_memory_winning_bid(auction.id)
            .await
            .unwrap();
        assert_eq!(winning.bidder_id, agent.bidder_id);
    }

    #[tokio::test]
    async fn test_deadline_schedule_orders_and_pops_due_entries() {
        let service = new_test_service();
        let now = OffsetDateTime::now_utc();
        let early = Uuid::new_v4();
        let late = Uuid::new_v4();
        service
            .deadlines
            .schedule(now + time::Duration::hours(1), late)
            .await;
        service
            .deadlines
            .schedule(now - time::Duration::seconds(1), early)
            .await;

        assert_eq!(
            service.deadlines.next_deadline().await,
            Some(now - time::Duration::seconds(1))
        );
        assert_eq!(service.deadlines.pop_due(now).await, vec![early]);
        assert_eq!(
            service.deadlines.next_deadline().await,
            Some(now + time::Duration::hours(1))
        );
    }

    #[test]
    fn test_transition_latency_bound_is_one_second() {
        // The documented bound on how late a due transition can be observed.
        assert_eq!(CLOCK_MAX_PARK, std::time::Duration::from_secs(1));
    }
}
