use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Service {
    /// Applies the anti-sniping rule after an accepted bid: a bid landing
    /// inside the configured window pushes the deadline to `accepted_at +
    /// extend_by`. The deadline never moves backward. The caller must hold
    /// the auction lock.
    pub(crate) async fn extend_auction_after_bid(
        &self,
        auction: &entities::Auction,
        accepted_at: OffsetDateTime,
    ) -> Result<Option<entities::Auction>, RestError> {
        let Some(new_end_time) = auction.anti_snipe_extension(accepted_at) else {
            return Ok(None);
        };
        if new_end_time <= auction.effective_end_time {
            return Ok(None);
        }
        let mut updated = auction.clone();
        updated.effective_end_time = new_end_time;
        updated.extension_count += 1;
        self.repo.update_auction(&updated).await?;
        self.deadlines.schedule(new_end_time, updated.id).await;
        self.broadcast(UpdateEvent::AuctionExtended {
            auction_id: updated.id,
            new_end_time,
        });
        tracing::info!(
            auction_id = %updated.id,
            new_end_time = %new_end_time,
            extension_count = updated.extension_count,
            "Auction deadline extended",
        );
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::super::tests::{
            live_auction,
            new_test_service,
            seed_auction,
        },
        crate::auction::entities,
        time::OffsetDateTime,
    };

    #[tokio::test]
    async fn test_extends_from_acceptance_time_not_previous_deadline() {
        let service = new_test_service();
        let mut auction = live_auction(time::Duration::minutes(2));
        auction.auto_extend.enabled = true;
        seed_auction(&service, &auction).await;

        let accepted_at = OffsetDateTime::now_utc();
        let extended = service
            .extend_auction_after_bid(&auction, accepted_at)
            .await
            .unwrap()
            .expect("bid two minutes before the deadline must extend");

        // Five minutes from acceptance, not five minutes past the old deadline.
        assert_eq!(
            extended.effective_end_time,
            accepted_at + auction.auto_extend.extend_by
        );
        assert_eq!(extended.extension_count, 1);
        assert!(extended.effective_end_time > auction.effective_end_time);
    }

    #[tokio::test]
    async fn test_no_extension_outside_window() {
        let service = new_test_service();
        let mut auction = live_auction(time::Duration::minutes(30));
        auction.auto_extend.enabled = true;
        seed_auction(&service, &auction).await;

        let extended = service
            .extend_auction_after_bid(&auction, OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(extended.is_none());
    }

    #[tokio::test]
    async fn test_no_extension_when_disabled() {
        let service = new_test_service();
        let auction = live_auction(time::Duration::minutes(2));
        seed_auction(&service, &auction).await;

        let extended = service
            .extend_auction_after_bid(&auction, OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(extended.is_none());
    }

    #[tokio::test]
    async fn test_extension_cap_is_honored() {
        let service = new_test_service();
        let mut auction = live_auction(time::Duration::minutes(2));
        auction.auto_extend.enabled = true;
        auction.auto_extend.max_extensions = Some(3);
        auction.extension_count = 3;
        seed_auction(&service, &auction).await;

        let extended = service
            .extend_auction_after_bid(&auction, OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(extended.is_none());
    }

    #[tokio::test]
    async fn test_extension_never_shortens_deadline() {
        let service = new_test_service();
        let mut auction = live_auction(time::Duration::minutes(2));
        auction.auto_extend.enabled = true;
        // The push-back is shorter than the time remaining, so applying it
        // would move the deadline backward.
        auction.auto_extend.extend_by = std::time::Duration::from_secs(30);
        auction.auto_extend.window = std::time::Duration::from_secs(300);
        seed_auction(&service, &auction).await;

        let extended = service
            .extend_auction_after_bid(&auction, OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(extended.is_none());

        let unchanged = service.repo.get_in_memory_auction(auction.id).unwrap();
        assert_eq!(unchanged.effective_end_time, auction.effective_end_time);
    }

    #[tokio::test]
    async fn test_repeated_late_bids_keep_extending_without_cap() {
        let service = new_test_service();
        let mut auction = live_auction(time::Duration::minutes(2));
        auction.auto_extend.enabled = true;
        assert_eq!(auction.auto_extend.max_extensions, None);
        seed_auction(&service, &auction).await;

        let mut current: entities::Auction = auction.clone();
        for round in 1..=5u32 {
            // Let the wall clock advance so each bid lands strictly inside the
            // freshly extended window.
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            let accepted_at = OffsetDateTime::now_utc();
            current = service
                .extend_auction_after_bid(&current, accepted_at)
                .await
                .unwrap()
                .expect("every in-window bid extends while no cap is set");
            assert_eq!(current.extension_count, round);
        }
    }
}
