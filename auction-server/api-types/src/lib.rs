use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

pub mod auction;
pub mod auto_bid;
pub mod bid;
pub mod ws;

/// Monetary amount in the smallest unit of the listing currency.
pub type Amount = i64;

#[derive(ToResponse, ToSchema, Serialize, Deserialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}
