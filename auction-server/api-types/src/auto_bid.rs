use {
    crate::{
        bid::BidderId,
        Amount,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type AutoBidAgentId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct RegisterAutoBid {
    #[schema(example = "39f9a2be-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub bidder_id: BidderId,
    /// The maximum amount the agent is authorized to reach on the bidder's behalf.
    #[schema(example = 400_000_000)]
    pub ceiling:   Amount,
    /// Increment the agent adds over the current price when responding.
    /// Defaults to the auction's increment rule.
    #[schema(example = 10_000_000, value_type = Option<i64>)]
    pub step:      Option<Amount>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct CancelAutoBid {
    #[schema(example = "39f9a2be-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub bidder_id: BidderId,
}

#[derive(Serialize, Deserialize, ToResponse, ToSchema, Clone, Debug)]
pub struct AutoBidResult {
    /// Whether the agent was registered.
    #[schema(example = true)]
    pub accepted: bool,
    /// The id of the registered agent. Absent on rejection.
    #[schema(example = "070e4c6e-58cc-4372-a567-0e02b2c3d479", value_type = Option<String>)]
    pub id:       Option<AutoBidAgentId>,
    /// Rejection kind when `accepted` is false.
    #[schema(example = "auto_bid_ceiling_too_low", value_type = Option<String>)]
    pub reason:   Option<String>,
}
