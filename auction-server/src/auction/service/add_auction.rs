use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::PropertyId,
    },
    time::OffsetDateTime,
};

pub struct AddAuctionInput {
    pub property_id:              PropertyId,
    pub start_time:               OffsetDateTime,
    pub scheduled_end_time:       OffsetDateTime,
    pub starting_price:           entities::Amount,
    pub reserve_price:            entities::Amount,
    pub bid_increment_percentage: u32,
    pub auto_extend:              entities::AutoExtend,
}

impl Service {
    /// Creates an auction in `scheduled` and arms its opening deadline.
    #[tracing::instrument(skip_all, fields(auction_id, property_id = %input.property_id))]
    pub async fn add_auction(
        &self,
        input: AddAuctionInput,
    ) -> Result<entities::Auction, RestError> {
        if input.starting_price <= 0 {
            return Err(RestError::BadParameters(
                "starting price must be positive".to_string(),
            ));
        }
        if input.reserve_price < 0 {
            return Err(RestError::BadParameters(
                "reserve price must not be negative".to_string(),
            ));
        }
        if input.scheduled_end_time <= input.start_time {
            return Err(RestError::BadParameters(
                "scheduled end time must be after the start time".to_string(),
            ));
        }
        if input.auto_extend.enabled
            && (input.auto_extend.window.is_zero() || input.auto_extend.extend_by.is_zero())
        {
            return Err(RestError::BadParameters(
                "auto-extension requires a non-zero window and push-back".to_string(),
            ));
        }

        let auction = self
            .repo
            .add_auction(entities::Auction::new(
                input.property_id,
                input.start_time,
                input.scheduled_end_time,
                input.starting_price,
                input.reserve_price,
                input.bid_increment_percentage,
                input.auto_extend,
            ))
            .await?;
        tracing::Span::current().record("auction_id", auction.id.to_string());
        self.deadlines.schedule(auction.start_time, auction.id).await;
        tracing::info!(
            auction_id = %auction.id,
            start_time = %auction.start_time,
            scheduled_end_time = %auction.scheduled_end_time,
            "Auction scheduled",
        );
        Ok(auction)
    }
}
