use {
    crate::{
        auction::{
            AuctionId,
            AuctionResult,
        },
        bid::{
            Bid,
            BidId,
        },
        Amount,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::ToSchema,
};

#[derive(Deserialize, Clone, ToSchema, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe {
        #[schema(value_type = Vec<String>)]
        auction_ids: Vec<AuctionId>,
    },
    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        #[schema(value_type = Vec<String>)]
        auction_ids: Vec<AuctionId>,
    },
}

#[derive(Deserialize, Clone, ToSchema, Serialize)]
pub struct ClientRequest {
    pub id:  String,
    #[serde(flatten)]
    pub msg: ClientMessage,
}

/// This enum is used to send an update to the client for any subscriptions made.
/// Updates for one auction are emitted in the exact order the engine accepted them.
#[derive(Serialize, Clone, ToSchema, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerUpdateResponse {
    #[serde(rename = "bid_accepted")]
    BidAccepted {
        bid:           Bid,
        current_price: Amount,
        min_next_bid:  Amount,
        /// True for bids placed by an auto-bid agent.
        is_auto:       bool,
    },
    #[serde(rename = "auction_extended")]
    AuctionExtended {
        #[schema(value_type = String)]
        auction_id:   AuctionId,
        #[serde(with = "time::serde::rfc3339")]
        #[schema(value_type = String)]
        new_end_time: OffsetDateTime,
    },
    #[serde(rename = "auction_ended")]
    AuctionEnded {
        #[schema(value_type = String)]
        auction_id:     AuctionId,
        result:         AuctionResult,
        #[schema(value_type = Option<String>)]
        winning_bid_id: Option<BidId>,
        final_price:    Amount,
    },
    #[serde(rename = "auction_cancelled")]
    AuctionCancelled {
        #[schema(value_type = String)]
        auction_id: AuctionId,
    },
}

#[derive(Serialize, Clone, ToSchema, Deserialize, Debug)]
#[serde(tag = "status", content = "result")]
pub enum ServerResultMessage {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "error")]
    Err(String),
}

/// This is used to send the result for a specific client request with the same id.
/// Id is only None when the client message is invalid.
#[derive(Serialize, ToSchema, Deserialize, Clone, Debug)]
pub struct ServerResultResponse {
    pub id:     Option<String>,
    #[serde(flatten)]
    pub result: ServerResultMessage,
}
