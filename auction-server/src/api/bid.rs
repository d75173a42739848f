use {
    super::RestError,
    crate::{
        auction::{
            entities::AuctionId,
            service::{
                get_auction::GetAuctionInput,
                get_bids::GetBidsInput,
                submit_bid::SubmitBidInput,
            },
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
        bid::{
            Bid,
            BidResult,
            SubmitBid,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Place a bid on an auction.
///
/// The engine validates the bid against the auction's current state and, once
/// accepted, resolves any auto-bid responses before answering, so the reported
/// price is the final one. Rejections that follow from the auction rules are
/// reported in the result body with `accepted = false`.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/bids", params(AuctionPathParams),
    request_body = SubmitBid, responses(
    (status = 200, description = "Outcome of the submission", body = BidResult),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_bid(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
    Json(submit_bid): Json<SubmitBid>,
) -> Result<Json<BidResult>, RestError> {
    process_bid(store, params.auction_id, submit_bid).await
}

pub async fn process_bid(
    store: Arc<Store>,
    auction_id: AuctionId,
    submit_bid: SubmitBid,
) -> Result<Json<BidResult>, RestError> {
    match store
        .auction_service
        .submit_bid(SubmitBidInput {
            auction_id,
            bidder_id: submit_bid.bidder_id,
            amount: submit_bid.amount,
        })
        .await
    {
        Ok(output) => Ok(Json(BidResult {
            accepted:      true,
            id:            Some(output.bid.id),
            current_price: output.current_price,
            min_next_bid:  output.min_next_bid,
            reason:        None,
        })),
        Err(err) => match err.rejection_kind() {
            // A definite rejection still tells the caller what it would take
            // to proceed.
            Some(kind) => {
                let auction = store
                    .auction_service
                    .get_auction(GetAuctionInput { auction_id })
                    .await?;
                Ok(Json(BidResult {
                    accepted:      false,
                    id:            None,
                    current_price: auction.current_price,
                    min_next_bid:  store.auction_service.min_next_bid(&auction),
                    reason:        Some(kind.to_string()),
                }))
            }
            None => Err(err),
        },
    }
}

/// The auction's bid ledger in acceptance order.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}/bids", params(AuctionPathParams), responses(
    (status = 200, description = "Bids accepted so far", body = Vec<Bid>),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn get_bids(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
) -> Result<Json<Vec<Bid>>, RestError> {
    let bids = store
        .auction_service
        .get_bids(GetBidsInput {
            auction_id: params.auction_id,
        })
        .await?;
    Ok(Json(bids.into_iter().map(Into::into).collect()))
}
