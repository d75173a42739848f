use {
    super::RestError,
    crate::{
        auction::service::{
            cancel_auto_bid::CancelAutoBidInput,
            register_auto_bid::RegisterAutoBidInput,
        },
        state::Store,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
    },
    estate_auction_api_types::{
        auction::AuctionPathParams,
        auto_bid::{
            AutoBidResult,
            CancelAutoBid,
            RegisterAutoBid,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Register an auto-bid agent for a bidder on an auction.
///
/// The agent bids on the bidder's behalf up to the given ceiling. On a live
/// auction it opens immediately at the minimum acceptable amount. Registering
/// again replaces the bidder's previous agent.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/auto_bids", params(AuctionPathParams),
    request_body = RegisterAutoBid, responses(
    (status = 200, description = "Outcome of the registration", body = AutoBidResult),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_auto_bid(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
    Json(register_auto_bid): Json<RegisterAutoBid>,
) -> Result<Json<AutoBidResult>, RestError> {
    match store
        .auction_service
        .register_auto_bid(RegisterAutoBidInput {
            auction_id: params.auction_id,
            bidder_id:  register_auto_bid.bidder_id,
            ceiling:    register_auto_bid.ceiling,
            step:       register_auto_bid.step,
        })
        .await
    {
        Ok(agent) => Ok(Json(AutoBidResult {
            accepted: true,
            id:       Some(agent.id),
            reason:   None,
        })),
        Err(err) => match err.rejection_kind() {
            Some(kind) => Ok(Json(AutoBidResult {
                accepted: false,
                id:       None,
                reason:   Some(kind.to_string()),
            })),
            None => Err(err),
        },
    }
}

/// Cancel the bidder's active auto-bid agent on an auction.
///
/// Takes effect for all future resolver passes; bids the agent already placed
/// stand.
#[utoipa::path(delete, path = "/v1/auctions/{auction_id}/auto_bids", params(AuctionPathParams),
    request_body = CancelAutoBid, responses(
    (status = 200, description = "Auto-bid agent was cancelled"),
    (status = 404, description = "Auction or agent was not found", body = ErrorBodyResponse),
),)]
pub async fn delete_auto_bid(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
    Json(cancel_auto_bid): Json<CancelAutoBid>,
) -> Result<(), RestError> {
    store
        .auction_service
        .cancel_auto_bid(CancelAutoBidInput {
            auction_id: params.auction_id,
            bidder_id:  cancel_auto_bid.bidder_id,
        })
        .await
}
