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

pub struct SubmitBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder_id:  UserId,
    pub amount:     entities::Amount,
}

pub struct SubmitBidOutput {
    pub bid:           entities::Bid,
    /// Price in force after the submission, including every auto-bid response
    /// it triggered.
    pub current_price: entities::Amount,
    pub min_next_bid:  entities::Amount,
}

impl Service {
    /// Validates and applies one manual bid. All mutations for an auction run
    /// under its lock, one submission at a time; the call returns only after
    /// the auto-bid cascade has settled, so the caller sees the final price.
    #[tracing::instrument(
        skip_all,
        fields(
            auction_id = %input.auction_id,
            bidder_id = %input.bidder_id,
            amount = input.amount,
            bid_id,
        ),
        err(level = tracing::Level::TRACE)
    )]
    pub async fn submit_bid(&self, input: SubmitBidInput) -> Result<SubmitBidOutput, RestError> {
        if input.amount <= 0 {
            return Err(RestError::BadParameters(
                "bid amount must be positive".to_string(),
            ));
        }
        let auction_lock = self.repo.get_or_create_auction_lock(input.auction_id).await;
        let result = self
            .submit_bid_for_lock(&input, auction_lock.lock().await)
            .await;
        self.repo.remove_auction_lock(&input.auction_id).await;
        result
    }

    async fn submit_bid_for_lock(
        &self,
        input: &SubmitBidInput,
        _auction_mutex_guard: MutexGuard<'_, ()>,
    ) -> Result<SubmitBidOutput, RestError> {
        let auction = self
            .repo
            .get_in_memory_auction(input.auction_id)
            .ok_or(RestError::AuctionNotFound)?;
        let now = OffsetDateTime::now_utc();
        let leader = self.repo.get_in_memory_winning_bid(input.auction_id).await;
        self.verify_bid(&auction, input.bidder_id, input.amount, now, leader.as_ref())?;
        self.check_bidder_eligibility(input.bidder_id).await?;

        let (bid, _) = self
            .accept_bid(AcceptBidInput {
                auction,
                bidder_id: input.bidder_id,
                amount: input.amount,
                kind: entities::BidKind::Manual,
                ceiling: None,
            })
            .await?;
        tracing::Span::current().record("bid_id", bid.id.to_string());

        self.resolve_auto_bids(input.auction_id).await?;

        let auction = self
            .repo
            .get_in_memory_auction(input.auction_id)
            .ok_or(RestError::TemporarilyUnavailable)?;
        Ok(SubmitBidOutput {
            bid,
            current_price: auction.current_price,
            min_next_bid: auction.min_acceptable_bid(self.config.bid_increment_floor),
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            super::tests::{
                live_auction,
                new_test_service,
                permissive_db,
                quiet_notifier,
                seed_auction,
            },
            SubmitBidInput,
        },
        crate::{
            api::RestError,
            auction::entities,
            collaborator::{
                Eligibility,
                EligibilityCheck,
                MockEligibilityCheck,
                MockSettlementGateway,
            },
            kernel::entities::UserId,
        },
        axum::async_trait,
        std::sync::Arc,
        uuid::Uuid,
    };

    #[tokio::test]
    async fn test_submit_bid_updates_price_and_winner() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;
        let bidder = Uuid::new_v4();

        let output = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                amount:     368_000_000,
            })
            .await
            .unwrap();

        assert_eq!(output.current_price, 368_000_000);
        assert!(output.bid.is_winning);
        assert_eq!(output.bid.kind, entities::BidKind::Manual);

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.current_price, 368_000_000);
        assert_eq!(stored.bid_count, 1);
        assert_eq!(stored.winning_bid_id, Some(output.bid.id));
    }

    #[tokio::test]
    async fn test_submit_bid_rejects_below_minimum() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let result = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                amount:     360_000_000,
            })
            .await;
        assert_eq!(
            result.err(),
            Some(RestError::BidTooLow {
                minimum: 367_500_000
            })
        );

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.current_price, 350_000_000);
        assert_eq!(stored.bid_count, 0);
    }

    #[tokio::test]
    async fn test_submit_bid_rejects_repeat_leader() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;
        let bidder = Uuid::new_v4();

        service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                amount:     368_000_000,
            })
            .await
            .unwrap();

        let result = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  bidder,
                amount:     400_000_000,
            })
            .await;
        assert_eq!(result.err(), Some(RestError::AlreadyHighestBidder));
    }

    #[tokio::test]
    async fn test_submit_bid_unknown_auction() {
        let service = new_test_service();
        let result = service
            .submit_bid(SubmitBidInput {
                auction_id: Uuid::new_v4(),
                bidder_id:  Uuid::new_v4(),
                amount:     368_000_000,
            })
            .await;
        assert_eq!(result.err(), Some(RestError::AuctionNotFound));
    }

    #[tokio::test]
    async fn test_submit_bid_rejects_ineligible_bidder() {
        let mut eligibility = MockEligibilityCheck::new();
        eligibility.expect_is_eligible_to_bid().returning(|_| {
            Ok(Eligibility {
                eligible: false,
                reason:   Some("identity not verified".to_string()),
            })
        });
        let service = crate::auction::service::Service::new_with_mocks(
            permissive_db(),
            eligibility,
            quiet_notifier(),
            MockSettlementGateway::new(),
        );
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let result = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                amount:     368_000_000,
            })
            .await;
        assert_eq!(
            result.err(),
            Some(RestError::BidderIneligible {
                reason: Some("identity not verified".to_string())
            })
        );

        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.bid_count, 0);
    }

    struct StalledEligibilityCheck;

    #[async_trait]
    impl EligibilityCheck for StalledEligibilityCheck {
        async fn is_eligible_to_bid(&self, _user_id: UserId) -> anyhow::Result<Eligibility> {
            // Longer than the test service's 100ms collaborator timeout.
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(Eligibility {
                eligible: true,
                reason:   None,
            })
        }
    }

    #[tokio::test]
    async fn test_submit_bid_fails_definitely_on_stalled_collaborator() {
        let service = crate::auction::service::Service::new_with_collaborators(
            permissive_db(),
            crate::auction::service::Collaborators {
                eligibility: Arc::new(StalledEligibilityCheck),
                notifier:    Arc::new(quiet_notifier()),
                settlement:  Arc::new(MockSettlementGateway::new()),
            },
        );
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let result = service
            .submit_bid(SubmitBidInput {
                auction_id: auction.id,
                bidder_id:  Uuid::new_v4(),
                amount:     368_000_000,
            })
            .await;
        assert_eq!(result.err(), Some(RestError::CollaboratorUnavailable));
    }

    #[tokio::test]
    async fn test_concurrent_bids_keep_single_winner_and_max_price() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        seed_auction(&service, &auction).await;

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let service = service.clone();
            let auction_id = auction.id;
            handles.push(tokio::spawn(async move {
                service
                    .submit_bid(SubmitBidInput {
                        auction_id,
                        bidder_id: Uuid::new_v4(),
                        amount: 400_000_000 + i as i64 * 50_000_000,
                    })
                    .await
            }));
        }

        let mut accepted = Vec::new();
        for handle in handles {
            if let Ok(output) = handle.await.unwrap() {
                accepted.push(output);
            }
        }
        assert!(!accepted.is_empty());

        let max_accepted = service
            .repo
            .get_bids(auction.id)
            .await
            .unwrap()
            .iter()
            .map(|bid| bid.amount)
            .max()
            .unwrap();
        let stored = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(stored.current_price, max_accepted);

        let ledger = service.repo.get_bids(auction.id).await.unwrap();
        assert_eq!(ledger.iter().filter(|bid| bid.is_winning).count(), 1);
        let winner = ledger.iter().find(|bid| bid.is_winning).unwrap();
        assert_eq!(winner.amount, max_accepted);
        assert_eq!(stored.winning_bid_id, Some(winner.id));
        assert_eq!(stored.bid_count, ledger.len() as u64);

        // Acceptance times are totally ordered and the price trail is
        // non-decreasing.
        for pair in ledger.windows(2) {
            assert!(pair[0].accepted_at <= pair[1].accepted_at);
            assert!(pair[0].amount < pair[1].amount);
        }
    }
}
