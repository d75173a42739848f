use {
    crate::{
        bid::BidId,
        Amount,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::time::Duration,
    time::OffsetDateTime,
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type PropertyId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// The auction is created but bidding has not opened yet.
    Scheduled,
    /// The auction is open and accepting bids.
    Live,
    /// The auction deadline has passed and a result has been computed.
    Ended,
    /// The auction was cancelled before it ended. Terminal.
    Cancelled,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum AuctionResult {
    /// The auction ended without a single accepted bid.
    NoBids,
    /// Bids were accepted but the highest one stayed below the reserve price.
    ReserveNotMet,
    /// The highest bid met the reserve and a settlement was requested.
    Sold,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct AutoExtendConfig {
    /// Whether late bids push the deadline back at all.
    pub enabled:        bool,
    /// A bid accepted within this window before the deadline triggers an extension.
    #[serde(with = "humantime_serde")]
    #[schema(example = "5m", value_type = String)]
    pub window:         Duration,
    /// How far past the acceptance time the deadline is pushed.
    #[serde(with = "humantime_serde")]
    #[schema(example = "5m", value_type = String)]
    pub extend_by:      Duration,
    /// Maximum number of extensions; unlimited when absent.
    #[schema(example = 20, value_type = Option<u32>)]
    pub max_extensions: Option<u32>,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, PartialEq, Debug)]
pub struct Auction {
    /// The unique id of the auction.
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:                       AuctionId,
    /// The property this auction sells. Immutable after creation.
    #[schema(example = "a8a0bc3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub property_id:              PropertyId,
    pub status:                   AuctionStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-01T09:00:00+00:00", value_type = String)]
    pub start_time:               OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-08T09:00:00+00:00", value_type = String)]
    pub scheduled_end_time:       OffsetDateTime,
    /// The deadline currently in force; moves forward under anti-sniping, never backward.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-08T09:05:00+00:00", value_type = String)]
    pub effective_end_time:       OffsetDateTime,
    #[schema(example = 350_000_000)]
    pub starting_price:           Amount,
    /// Minimum acceptable final price. Zero means no reserve.
    #[schema(example = 400_000_000)]
    pub reserve_price:            Amount,
    /// The amount of the most recent accepted bid, or the starting price before any bid.
    #[schema(example = 368_000_000)]
    pub current_price:            Amount,
    /// Minimum percentage step the next bid must add over the current price.
    #[schema(example = 5)]
    pub bid_increment_percentage: u32,
    pub auto_extend:              AutoExtendConfig,
    /// Set exactly once, when the auction ends.
    pub result:                   Option<AuctionResult>,
    #[schema(example = 12)]
    pub bid_count:                u64,
    #[schema(value_type = Option<String>)]
    pub winning_bid_id:           Option<BidId>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CreateAuction {
    #[schema(example = "a8a0bc3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub property_id:              PropertyId,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-01T09:00:00+00:00", value_type = String)]
    pub start_time:               OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-08T09:00:00+00:00", value_type = String)]
    pub scheduled_end_time:       OffsetDateTime,
    #[schema(example = 350_000_000)]
    pub starting_price:           Amount,
    /// Zero disables the reserve rule.
    #[serde(default)]
    #[schema(example = 400_000_000)]
    pub reserve_price:            Amount,
    #[schema(example = 5)]
    pub bid_increment_percentage: u32,
    pub auto_extend:              AutoExtendConfig,
}

#[derive(Serialize, Deserialize, IntoParams, Clone, Debug)]
pub struct AuctionPathParams {
    /// Auction id to operate on.
    #[param(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub auction_id: AuctionId,
}
