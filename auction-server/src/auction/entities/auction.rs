use {
    super::bid::{
        Amount,
        BidId,
    },
    crate::kernel::entities::PropertyId,
    estate_auction_api_types::auction as api_auction,
    std::{
        sync::Arc,
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type AuctionLock = Arc<Mutex<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Ended | AuctionStatus::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuctionResult {
    NoBids,
    ReserveNotMet,
    Sold,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutoExtend {
    pub enabled:        bool,
    pub window:         Duration,
    pub extend_by:      Duration,
    pub max_extensions: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Auction {
    pub id:                       AuctionId,
    pub property_id:              PropertyId,
    pub status:                   AuctionStatus,
    pub start_time:               OffsetDateTime,
    pub scheduled_end_time:       OffsetDateTime,
    /// The deadline currently in force. Only ever moves forward.
    pub effective_end_time:       OffsetDateTime,
    pub starting_price:           Amount,
    /// Zero means no reserve.
    pub reserve_price:            Amount,
    pub current_price:            Amount,
    pub bid_increment_percentage: u32,
    pub auto_extend:              AutoExtend,
    pub extension_count:          u32,
    pub result:                   Option<AuctionResult>,
    pub bid_count:                u64,
    pub winning_bid_id:           Option<BidId>,
    pub created_at:               OffsetDateTime,
}

impl Auction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        property_id: PropertyId,
        start_time: OffsetDateTime,
        scheduled_end_time: OffsetDateTime,
        starting_price: Amount,
        reserve_price: Amount,
        bid_increment_percentage: u32,
        auto_extend: AutoExtend,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            property_id,
            status: AuctionStatus::Scheduled,
            start_time,
            scheduled_end_time,
            effective_end_time: scheduled_end_time,
            starting_price,
            reserve_price,
            current_price: starting_price,
            bid_increment_percentage,
            auto_extend,
            extension_count: 0,
            result: None,
            bid_count: 0,
            winning_bid_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// The smallest step the next bid must add over the current price:
    /// the configured floor or the percentage step, whichever is larger.
    /// The percentage step rounds up so the step never degenerates to zero.
    pub fn min_increment(&self, floor: Amount) -> Amount {
        let pct_step =
            (self.current_price as i128 * self.bid_increment_percentage as i128 + 99) / 100;
        floor.max(Amount::try_from(pct_step).unwrap_or(Amount::MAX))
    }

    pub fn min_acceptable_bid(&self, floor: Amount) -> Amount {
        self.current_price.saturating_add(self.min_increment(floor))
    }

    /// Whether a bid arriving at `now` can still be accepted. Guards the race
    /// between a clock tick and an in-flight submission: the status may still
    /// read live while the deadline has already passed.
    pub fn is_accepting_bids(&self, now: OffsetDateTime) -> bool {
        self.status == AuctionStatus::Live && now <= self.effective_end_time
    }

    /// The new deadline an accepted bid at `now` forces, if any. Measured from
    /// the acceptance time, not the previous deadline. Without a configured
    /// `max_extensions` cap, sustained late bidding can extend the auction
    /// indefinitely; that is an accepted property of the rule.
    pub fn anti_snipe_extension(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        if !self.auto_extend.enabled {
            return None;
        }
        if let Some(max) = self.auto_extend.max_extensions {
            if self.extension_count >= max {
                return None;
            }
        }
        let window = time::Duration::try_from(self.auto_extend.window).ok()?;
        if self.effective_end_time - now >= window {
            return None;
        }
        Some(now + self.auto_extend.extend_by)
    }

    /// The outcome of an auction whose deadline has passed.
    pub fn compute_result(&self) -> AuctionResult {
        if self.bid_count == 0 {
            AuctionResult::NoBids
        } else if self.reserve_price > 0 && self.current_price < self.reserve_price {
            AuctionResult::ReserveNotMet
        } else {
            AuctionResult::Sold
        }
    }
}

impl From<AuctionStatus> for api_auction::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Scheduled => api_auction::AuctionStatus::Scheduled,
            AuctionStatus::Live => api_auction::AuctionStatus::Live,
            AuctionStatus::Ended => api_auction::AuctionStatus::Ended,
            AuctionStatus::Cancelled => api_auction::AuctionStatus::Cancelled,
        }
    }
}

impl From<AuctionResult> for api_auction::AuctionResult {
    fn from(result: AuctionResult) -> Self {
        match result {
            AuctionResult::NoBids => api_auction::AuctionResult::NoBids,
            AuctionResult::ReserveNotMet => api_auction::AuctionResult::ReserveNotMet,
            AuctionResult::Sold => api_auction::AuctionResult::Sold,
        }
    }
}

impl From<AutoExtend> for api_auction::AutoExtendConfig {
    fn from(auto_extend: AutoExtend) -> Self {
        Self {
            enabled:        auto_extend.enabled,
            window:         auto_extend.window,
            extend_by:      auto_extend.extend_by,
            max_extensions: auto_extend.max_extensions,
        }
    }
}

impl From<api_auction::AutoExtendConfig> for AutoExtend {
    fn from(config: api_auction::AutoExtendConfig) -> Self {
        Self {
            enabled:        config.enabled,
            window:         config.window,
            extend_by:      config.extend_by,
            max_extensions: config.max_extensions,
        }
    }
}

impl From<Auction> for api_auction::Auction {
    fn from(auction: Auction) -> Self {
        Self {
            id:                       auction.id,
            property_id:              auction.property_id,
            status:                   auction.status.into(),
            start_time:               auction.start_time,
            scheduled_end_time:       auction.scheduled_end_time,
            effective_end_time:       auction.effective_end_time,
            starting_price:           auction.starting_price,
            reserve_price:            auction.reserve_price,
            current_price:            auction.current_price,
            bid_increment_percentage: auction.bid_increment_percentage,
            auto_extend:              auction.auto_extend.into(),
            result:                   auction.result.map(Into::into),
            bid_count:                auction.bid_count,
            winning_bid_id:           auction.winning_bid_id,
        }
    }
}
