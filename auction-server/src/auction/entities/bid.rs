use {
    super::AuctionId,
    crate::kernel::entities::UserId,
    estate_auction_api_types::bid as api_bid,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;

/// Monetary amount in the smallest unit of the listing currency.
pub type Amount = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BidKind {
    Manual,
    ProxyInitial,
    ProxyResponse,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:          BidId,
    pub auction_id:  AuctionId,
    pub bidder_id:   UserId,
    pub amount:      Amount,
    pub kind:        BidKind,
    /// The authorized maximum of the placing agent. Present for proxy bids only.
    pub ceiling:     Option<Amount>,
    pub is_winning:  bool,
    pub accepted_at: OffsetDateTime,
}

impl Bid {
    pub fn new(
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Amount,
        kind: BidKind,
        ceiling: Option<Amount>,
        accepted_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder_id,
            amount,
            kind,
            ceiling,
            is_winning: false,
            accepted_at,
        }
    }
}

impl From<BidKind> for api_bid::BidKind {
    fn from(kind: BidKind) -> Self {
        match kind {
            BidKind::Manual => api_bid::BidKind::Manual,
            BidKind::ProxyInitial => api_bid::BidKind::ProxyInitial,
            BidKind::ProxyResponse => api_bid::BidKind::ProxyResponse,
        }
    }
}

impl From<Bid> for api_bid::Bid {
    fn from(bid: Bid) -> Self {
        Self {
            id:          bid.id,
            auction_id:  bid.auction_id,
            bidder_id:   bid.bidder_id,
            amount:      bid.amount,
            kind:        bid.kind.into(),
            is_winning:  bid.is_winning,
            accepted_at: bid.accepted_at,
        }
    }
}
