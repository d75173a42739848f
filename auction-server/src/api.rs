use {
    crate::{
        auction::entities::Amount,
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
    },
    anyhow::Result,
    axum::{
        http::StatusCode,
        response::{
            IntoResponse,
            Response,
        },
        routing::{
            delete,
            get,
            post,
        },
        Json,
        Router,
    },
    axum_prometheus::PrometheusMetricLayer,
    clap::crate_version,
    estate_auction_api_types::{
        auction::{
            Auction,
            AuctionResult,
            AuctionStatus,
            AutoExtendConfig,
            CreateAuction,
        },
        auto_bid::{
            AutoBidResult,
            CancelAutoBid,
            RegisterAutoBid,
        },
        bid::{
            Bid,
            BidKind,
            BidResult,
            SubmitBid,
        },
        ws::{
            ClientMessage,
            ClientRequest,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        ErrorBodyResponse,
    },
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

pub(crate) mod auction;
pub(crate) mod auto_bid;
pub(crate) mod bid;
pub(crate) mod ws;

async fn root() -> String {
    format!("Estate Auction Server API {}", crate_version!())
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

#[derive(Clone, Debug, PartialEq)]
pub enum RestError {
    /// The auction is not accepting bids: not live yet, already past its
    /// deadline, cancelled, or ended.
    AuctionNotActive,
    /// The amount does not reach the required minimum for the next bid.
    BidTooLow { minimum: Amount },
    /// The bidder already holds the current winning bid.
    AlreadyHighestBidder,
    /// The identity collaborator refused the bidder.
    BidderIneligible { reason: Option<String> },
    /// The requested auto-bid ceiling does not exceed the current price.
    AutoBidCeilingTooLow { current_price: Amount },
    /// A collaborator call failed or timed out; the attempt was not applied.
    CollaboratorUnavailable,
    /// The auction was not found.
    AuctionNotFound,
    /// The bidder has no active auto-bid agent on the auction.
    AutoBidNotFound,
    /// The request contained invalid parameters.
    BadParameters(String),
    /// Internal error occurred during processing the request.
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::AuctionNotActive => (
                StatusCode::BAD_REQUEST,
                "Auction is not accepting bids".to_string(),
            ),
            RestError::BidTooLow { minimum } => (
                StatusCode::BAD_REQUEST,
                format!("Bid is below the required minimum of {}", minimum),
            ),
            RestError::AlreadyHighestBidder => (
                StatusCode::BAD_REQUEST,
                "Bidder already holds the winning bid".to_string(),
            ),
            RestError::BidderIneligible { reason } => (
                StatusCode::FORBIDDEN,
                match reason {
                    Some(reason) => format!("Bidder is not eligible to bid: {}", reason),
                    None => "Bidder is not eligible to bid".to_string(),
                },
            ),
            RestError::AutoBidCeilingTooLow { current_price } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Auto-bid ceiling must exceed the current price of {}",
                    current_price
                ),
            ),
            RestError::CollaboratorUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "A required collaborator did not respond in time".to_string(),
            ),
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::AutoBidNotFound => (
                StatusCode::NOT_FOUND,
                "No active auto-bid agent was found for the bidder".to_string(),
            ),
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }

    /// The machine-readable kind for bid/auto-bid rejections that are a
    /// definite outcome of the arbitration rules rather than a surface error.
    pub fn rejection_kind(&self) -> Option<&'static str> {
        match self {
            RestError::AuctionNotActive => Some("auction_not_active"),
            RestError::BidTooLow { .. } => Some("bid_too_low"),
            RestError::AlreadyHighestBidder => Some("already_highest_bidder"),
            RestError::BidderIneligible { .. } => Some("bidder_ineligible"),
            RestError::AutoBidCeilingTooLow { .. } => Some("auto_bid_ceiling_too_low"),
            RestError::CollaboratorUnavailable => Some("collaborator_unavailable"),
            _ => None,
        }
    }
}

impl std::fmt::Display for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_status_and_message().1)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

pub async fn start_api(run_options: RunOptions, store: Arc<Store>) -> Result<()> {
    // Make sure functions included in the paths section have distinct names, otherwise some api generators will fail
    #[derive(OpenApi)]
    #[openapi(
    paths(
    auction::post_auction,
    auction::get_auctions,
    auction::get_auction,
    auction::post_cancel_auction,
    bid::post_bid,
    bid::get_bids,
    auto_bid::post_auto_bid,
    auto_bid::delete_auto_bid,
    ),
    components(
    schemas(
    Auction,
    AuctionStatus,
    AuctionResult,
    AutoExtendConfig,
    CreateAuction,
    Bid,
    BidKind,
    BidResult,
    SubmitBid,
    RegisterAutoBid,
    CancelAutoBid,
    AutoBidResult,
    ClientMessage,
    ClientRequest,
    ServerResultMessage,
    ServerResultResponse,
    ServerUpdateResponse,
    ErrorBodyResponse,
    ),
    responses(
    ErrorBodyResponse,
    Auction,
    BidResult,
    AutoBidResult,
    ),
    ),
    tags(
    (name = "Estate Auction Server", description = "The auction server runs timed auctions for real-estate \
    listings. It arbitrates competing bids, resolves auto-bid cascades, extends deadlines against sniping \
    and finalizes each auction into a single winner or none.")
    )
    )]
    struct ApiDoc;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let auction_routes = Router::new()
        .route("/", post(auction::post_auction))
        .route("/", get(auction::get_auctions))
        .route("/:auction_id", get(auction::get_auction))
        .route("/:auction_id/cancel", post(auction::post_cancel_auction))
        .route("/:auction_id/bids", post(bid::post_bid))
        .route("/:auction_id/bids", get(bid::get_bids))
        .route("/:auction_id/auto_bids", post(auto_bid::post_auto_bid))
        .route("/:auction_id/auto_bids", delete(auto_bid::delete_auto_bid));

    let v1_routes = Router::new().nest(
        "/v1",
        Router::new()
            .nest("/auctions", auction_routes)
            .route("/ws", get(ws::ws_route_handler)),
    );

    let app: Router<()> = Router::new()
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .merge(v1_routes)
        .route("/", get(root))
        .route("/live", get(live))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer)
        .with_state(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    tracing::info!(
        listen_addr = %run_options.server.listen_addr,
        "Starting API server...",
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down API server...");
        })
        .await?;
    Ok(())
}
