use {
    super::{
        accept_bid::AcceptBidInput,
        Service,
    },
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
    tokio::sync::MutexGuard,
};

pub struct RegisterAutoBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder_id:  UserId,
    pub ceiling:    entities::Amount,
    pub step:       Option<entities::Amount>,
}

impl Service {
    /// Registers (or replaces) the bidder's auto-bid agent. On a live auction
    /// the fresh agent opens immediately at the minimum acceptable amount and
    /// the cascade lets standing agents respond; on a scheduled auction the
    /// agent waits for the opening transition.
    #[tracing::instrument(
        skip_all,
        fields(
            auction_id = %input.auction_id,
            bidder_id = %input.bidder_id,
            ceiling = input.ceiling,
        ),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn register_auto_bid(
        &self,
        input: RegisterAutoBidInput,
    ) -> Result<entities::AutoBidAgent, RestError> {
        if input.ceiling <= 0 {
            return Err(RestError::BadParameters(
                "auto-bid ceiling must be positive".to_string(),
            ));
        }
        if input.step.is_some_and(|step| step <= 0) {
            return Err(RestError::BadParameters(
                "auto-bid step must be positive".to_string(),
            ));
        }
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self
            .register_auto_bid_for_lock(&input, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }

    async fn register_auto_bid_for_lock(
        &self,
        input: &RegisterAutoBidInput,
        _auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<entities::AutoBidAgent, RestError> {
        let auction = self
            .repo
            .get_in_memory_auction(input.auction_id)
            .ok_or(RestError::AuctionNotFound)?;
        let now = OffsetDateTime::now_utc();
        if auction.status.is_terminal()
            || (auction.status == entities::AuctionStatus::Live
                && now > auction.effective_end_time)
        {
            return Err(RestError::AuctionNotActive);
        }
        if input.ceiling <= auction.current_price {
            return Err(RestError::AutoBidCeilingTooLow {
                current_price: auction.current_price,
            });
        }
        self.check_bidder_eligibility(input.bidder_id).await?;

        if let Some(previous) = self
            .repo
            .get_active_auto_bid_agents(auction.id)
            .await
            .into_iter()
            .find(|agent| agent.bidder_id == input.bidder_id)
        {
            self.repo.deactivate_auto_bid_agent(&previous).await?;
        }
        let agent = self
            .repo
            .add_auto_bid_agent(entities::AutoBidAgent::new(
                auction.id,
                input.bidder_id,
                input.ceiling,
                input.step,
                now,
            ))
            .await?;
        tracing::info!(
            auction_id = %auction.id,
            agent_id = %agent.id,
            "Auto-bid agent registered",
        );

        if auction.is_accepting_bids(now) {
            let leader = self.repo.get_in_memory_winning_bid(auction.id).await;
            let already_leading = leader
                .as_ref()
                .is_some_and(|bid| bid.bidder_id == input.bidder_id);
            let opening = auction.min_acceptable_bid(self.config.bid_increment_floor);
            if !already_leading && opening <= input.ceiling {
                self.accept_bid(AcceptBidInput {
                    auction,
                    bidder_id: input.bidder_id,
                    amount: opening,
                    kind: entities::BidKind::ProxyInitial,
                    ceiling: Some(input.ceiling),
                })
                .await?;
                self.resolve_auto_bids(input.auction_id).await?;
            }
        }

        Ok(agent)
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
            RegisterAutoBidInput,
        },
        crate::{
            api::RestError,
            auction::entities,
        },
        uuid::Uuid,
    };

    #[tokio::test]
    async fn test_register_places_opening_proxy_bid_on_live_auction() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
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

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        // Opens at the minimum acceptable amount over the starting price.
        assert_eq!(stored.current_price, 367_500_000);
        let ledger = service.repo.get_bids(auction.id).await.unwrap();
        let opening = ledger.iter().find(|bid| bid.is_winning).unwrap();
        assert_eq!(opening.kind, entities::BidKind::ProxyInitial);
        assert_eq!(opening.bidder_id, bidder);
        assert_eq!(opening.ceiling, Some(400_000_000));
    }

    #[tokio::test]
    async fn test_register_rejects_ceiling_at_or_below_current_price() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let result = service
            .register_auto_bid(RegisterAutoBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                ceiling:    350_000_000,
                step:       None,
            })
            .await;
        assert_eq!(
            result.err(),
            Some(RestError::AutoBidCeilingTooLow {
                current_price: 350_000_000
            })
        );
    }

    #[tokio::test]
    async fn test_register_on_scheduled_auction_waits_for_opening() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::hours(1), time::Duration::hours(2));
        seed_auction(&service, &auction).await;

        service
            .register_auto_bid(RegisterAutoBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                ceiling:    400_000_000,
                step:       None,
            })
            .await
            .unwrap();

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.bid_count, 0);
        assert_eq!(stored.current_price, auction.starting_price);
        assert_eq!(
            service.repo.get_active_auto_bid_agents(auction.id).await.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_register_replaces_previous_agent() {
        let service = new_test_service();
        let auction = scheduled_auction(time::Duration::hours(1), time::Duration::hours(2));
        seed_auction(&service, &auction).await;
        let bidder = Uuid::new_v4();

        let first = service
            .register_auto_bid(RegisterAutoBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                ceiling:    400_000_000,
                step:       None,
            })
            .await
            .unwrap();
        let second = service
            .register_auto_bid(RegisterAutoBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                ceiling:    450_000_000,
                step:       None,
            })
            .await
            .unwrap();

        let active = service.repo.get_active_auto_bid_agents(auction.id).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert_ne!(active[0].id, first.id);
        assert_eq!(active[0].ceiling, 450_000_000);
    }
}
