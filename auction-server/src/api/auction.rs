use {
    super::RestError,
    crate::{
        auction::service::{
            add_auction::AddAuctionInput,
            cancel_auction::CancelAuctionInput,
            get_auction::GetAuctionInput,
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
        auction::{
            Auction,
            AuctionPathParams,
            CreateAuction,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Create a timed auction for a property listing.
///
/// The auction starts in the scheduled state; the engine's clock opens and
/// closes it at the configured times.
#[utoipa::path(post, path = "/v1/auctions", request_body = CreateAuction, responses(
    (status = 200, description = "Auction was created successfully", body = Auction),
    (status = 400, response = ErrorBodyResponse),
),)]
pub async fn post_auction(
    State(store): State<Arc<Store>>,
    Json(create_auction): Json<CreateAuction>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .add_auction(AddAuctionInput {
            property_id:              create_auction.property_id,
            start_time:               create_auction.start_time,
            scheduled_end_time:       create_auction.scheduled_end_time,
            starting_price:           create_auction.starting_price,
            reserve_price:            create_auction.reserve_price,
            bid_increment_percentage: create_auction.bid_increment_percentage,
            auto_extend:              create_auction.auto_extend.into(),
        })
        .await?;
    Ok(Json(auction.into()))
}

/// List the auctions the engine currently tracks.
#[utoipa::path(get, path = "/v1/auctions", responses(
    (status = 200, description = "Tracked auctions", body = Vec<Auction>),
),)]
pub async fn get_auctions(State(store): State<Arc<Store>>) -> Result<Json<Vec<Auction>>, RestError> {
    let auctions = store.auction_service.get_auctions();
    Ok(Json(auctions.into_iter().map(Into::into).collect()))
}

/// Query a single auction.
#[utoipa::path(get, path = "/v1/auctions/{auction_id}", params(AuctionPathParams), responses(
    (status = 200, description = "The auction", body = Auction),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn get_auction(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .get_auction(GetAuctionInput {
            auction_id: params.auction_id,
        })
        .await?;
    Ok(Json(auction.into()))
}

/// Cancel a scheduled or live auction.
///
/// Cancellation is terminal; ended auctions cannot be cancelled.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/cancel", params(AuctionPathParams), responses(
    (status = 200, description = "Auction was cancelled", body = Auction),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
),)]
pub async fn post_cancel_auction(
    State(store): State<Arc<Store>>,
    Path(params): Path<AuctionPathParams>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .cancel_auction(CancelAuctionInput {
            auction_id: params.auction_id,
        })
        .await?;
    Ok(Json(auction.into()))
}
