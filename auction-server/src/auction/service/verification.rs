use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
};

impl Service {
    /// Gates a candidate bid against the auction's current state. Pure with
    /// respect to the store: the caller supplies the snapshot and the current
    /// leader while holding the auction lock.
    pub(crate) fn verify_bid(
        &self,
        auction: &entities::Auction,
        bidder_id: UserId,
        amount: entities::Amount,
        now: OffsetDateTime,
        current_leader: Option<&entities::Bid>,
    ) -> Result<(), RestError> {
        if !auction.is_accepting_bids(now) {
            return Err(RestError::AuctionNotActive);
        }
        let minimum = auction.min_acceptable_bid(self.config.bid_increment_floor);
        if amount < minimum {
            return Err(RestError::BidTooLow { minimum });
        }
        if let Some(leader) = current_leader {
            if leader.bidder_id == bidder_id {
                return Err(RestError::AlreadyHighestBidder);
            }
        }
        Ok(())
    }

    /// Asks the identity collaborator whether the bidder may bid right now.
    /// A slow or failing collaborator fails the attempt with a definite
    /// outcome instead of hanging the caller.
    pub(crate) async fn check_bidder_eligibility(&self, user_id: UserId) -> Result<(), RestError> {
        let check = self.collaborators.eligibility.is_eligible_to_bid(user_id);
        match tokio::time::timeout(self.config.collaborator_timeout, check).await {
            Err(_) => {
                tracing::warn!(user_id = %user_id, "Eligibility check timed out");
                Err(RestError::CollaboratorUnavailable)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = ?err, user_id = %user_id, "Eligibility check failed");
                Err(RestError::CollaboratorUnavailable)
            }
            Ok(Ok(eligibility)) => {
                if eligibility.eligible {
                    Ok(())
                } else {
                    Err(RestError::BidderIneligible {
                        reason: eligibility.reason,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::tests::{
            live_auction,
            new_test_service,
            TEST_INCREMENT_FLOOR,
        },
        crate::{
            api::RestError,
            auction::entities,
        },
        time::OffsetDateTime,
        uuid::Uuid,
    };

    #[test]
    fn test_min_increment_follows_percentage_step() {
        let auction = live_auction(time::Duration::hours(1));
        assert_eq!(auction.current_price, 350_000_000);
        assert_eq!(auction.min_increment(TEST_INCREMENT_FLOOR), 17_500_000);
        assert_eq!(auction.min_acceptable_bid(TEST_INCREMENT_FLOOR), 367_500_000);
    }

    #[test]
    fn test_min_increment_respects_configured_floor() {
        let mut auction = live_auction(time::Duration::hours(1));
        auction.current_price = 100;
        auction.bid_increment_percentage = 5;
        // A 5% step over 100 rounds up to 5, far below the floor.
        assert_eq!(auction.min_increment(TEST_INCREMENT_FLOOR), TEST_INCREMENT_FLOOR);
    }

    #[test]
    fn test_percentage_step_rounds_up() {
        let mut auction = live_auction(time::Duration::hours(1));
        auction.current_price = 333;
        auction.bid_increment_percentage = 3;
        // ceil(333 * 3%) = ceil(9.99) = 10
        assert_eq!(auction.min_increment(1), 10);
    }

    #[tokio::test]
    async fn test_verify_bid_rejects_below_minimum() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        let now = OffsetDateTime::now_utc();

        let result = service.verify_bid(&auction, Uuid::new_v4(), 360_000_000, now, None);
        assert_eq!(
            result,
            Err(RestError::BidTooLow {
                minimum: 367_500_000
            })
        );

        let result = service.verify_bid(&auction, Uuid::new_v4(), 368_000_000, now, None);
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_verify_bid_rejects_inactive_auction() {
        let service = new_test_service();
        let now = OffsetDateTime::now_utc();

        let scheduled = super::super::tests::scheduled_auction(
            time::Duration::hours(1),
            time::Duration::hours(2),
        );
        assert_eq!(
            service.verify_bid(&scheduled, Uuid::new_v4(), 400_000_000, now, None),
            Err(RestError::AuctionNotActive)
        );

        // Status still reads live but the deadline has already passed.
        let expired = live_auction(time::Duration::minutes(-1));
        assert_eq!(
            service.verify_bid(&expired, Uuid::new_v4(), 400_000_000, now, None),
            Err(RestError::AuctionNotActive)
        );

        let mut cancelled = live_auction(time::Duration::hours(1));
        cancelled.status = entities::AuctionStatus::Cancelled;
        assert_eq!(
            service.verify_bid(&cancelled, Uuid::new_v4(), 400_000_000, now, None),
            Err(RestError::AuctionNotActive)
        );
    }

    #[tokio::test]
    async fn test_verify_bid_rejects_current_leader() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::hours(1));
        let now = OffsetDateTime::now_utc();
        let bidder = Uuid::new_v4();

        let mut leader = entities::Bid::new(
            auction.id,
            bidder,
            368_000_000,
            entities::BidKind::Manual,
            None,
            now,
        );
        leader.is_winning = true;

        assert_eq!(
            service.verify_bid(&auction, bidder, 400_000_000, now, Some(&leader)),
            Err(RestError::AlreadyHighestBidder)
        );
        assert_eq!(
            service.verify_bid(&auction, Uuid::new_v4(), 400_000_000, now, Some(&leader)),
            Ok(())
        );
    }
}
