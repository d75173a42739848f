use {
    super::{
        bid::Amount,
        AuctionId,
    },
    crate::kernel::entities::UserId,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type AutoBidAgentId = Uuid;

/// A standing authorization to bid on a user's behalf up to a ceiling.
/// At most one agent per bidder per auction is active at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct AutoBidAgent {
    pub id:            AutoBidAgentId,
    pub auction_id:    AuctionId,
    pub bidder_id:     UserId,
    pub ceiling:       Amount,
    /// Increment over the current price used for responses. Falls back to the
    /// auction's increment rule when absent.
    pub step:          Option<Amount>,
    /// Cleared when the bidder cancels the agent or the agent can no longer
    /// respond within its ceiling.
    pub active:        bool,
    pub registered_at: OffsetDateTime,
}

impl AutoBidAgent {
    pub fn new(
        auction_id: AuctionId,
        bidder_id: UserId,
        ceiling: Amount,
        step: Option<Amount>,
        registered_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder_id,
            ceiling,
            step,
            active: true,
            registered_at,
        }
    }
}
