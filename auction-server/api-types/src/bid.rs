use {
    crate::{
        auction::AuctionId,
        Amount,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type BidId = Uuid;
pub type BidderId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum BidKind {
    /// A bid placed directly by a bidder.
    Manual,
    /// The opening bid placed by a freshly registered auto-bid agent.
    ProxyInitial,
    /// A counter-bid placed by an auto-bid agent during a cascade.
    ProxyResponse,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct Bid {
    /// The unique id of the bid.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:          BidId,
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub auction_id:  AuctionId,
    #[schema(example = "39f9a2be-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub bidder_id:   BidderId,
    #[schema(example = 368_000_000)]
    pub amount:      Amount,
    pub kind:        BidKind,
    /// Whether this bid is the current highest valid offer on its auction.
    pub is_winning:  bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-05T10:21:00+00:00", value_type = String)]
    pub accepted_at: OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct SubmitBid {
    #[schema(example = "39f9a2be-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub bidder_id: BidderId,
    #[schema(example = 368_000_000)]
    pub amount:    Amount,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct BidResult {
    /// Whether the bid was accepted into the ledger.
    #[schema(example = true)]
    pub accepted:      bool,
    /// The id of the accepted bid. Absent on rejection.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = Option<String>)]
    pub id:            Option<BidId>,
    /// The price in force after this submission, including any auto-bid responses.
    #[schema(example = 386_400_000)]
    pub current_price: Amount,
    /// The smallest amount the next bid must reach.
    #[schema(example = 405_720_000)]
    pub min_next_bid:  Amount,
    /// Rejection kind when `accepted` is false.
    #[schema(example = "bid_too_low", value_type = Option<String>)]
    pub reason:        Option<String>,
}
