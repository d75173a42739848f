use {
    crate::{
        auction::service::get_auction::GetAuctionInput,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::{
        extract::{
            ws::{
                Message,
                WebSocket,
            },
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
    },
    estate_auction_api_types::{
        auction::{
            AuctionId,
            AuctionResult,
        },
        bid::{
            Bid,
            BidId,
            BidKind,
        },
        ws::{
            ClientMessage,
            ClientRequest,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
        Amount,
    },
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::{
        broadcast,
        RwLock,
    },
    tracing::instrument,
};

pub struct WsState {
    pub requester_ip_header_name: String,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
    pub broadcast_receiver:       broadcast::Receiver<UpdateEvent>,
}

const MAXIMUM_SUBSCRIBERS_PER_IP: usize = 10;

impl WsState {
    pub fn new(
        requester_ip_header_name: String,
        broadcast_receiver: broadcast::Receiver<UpdateEvent>,
    ) -> Self {
        Self {
            requester_ip_header_name,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
            broadcast_receiver,
        }
    }

    /// If the specified IP address has too many open websocket connections, this function will
    /// return none. Otherwise, it will return the new subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= MAXIMUM_SUBSCRIBERS_PER_IP {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }
}

/// Engine-side update fanned out to subscribed websocket clients. Events for
/// one auction are broadcast in the order the engine accepted them.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateEvent {
    BidAccepted {
        bid:           Bid,
        current_price: Amount,
        min_next_bid:  Amount,
    },
    AuctionExtended {
        auction_id:   AuctionId,
        new_end_time: OffsetDateTime,
    },
    AuctionEnded {
        auction_id:     AuctionId,
        result:         AuctionResult,
        winning_bid_id: Option<BidId>,
        final_price:    Amount,
    },
    AuctionCancelled {
        auction_id: AuctionId,
    },
}

impl UpdateEvent {
    fn auction_id(&self) -> AuctionId {
        match self {
            UpdateEvent::BidAccepted { bid, .. } => bid.auction_id,
            UpdateEvent::AuctionExtended { auction_id, .. } => *auction_id,
            UpdateEvent::AuctionEnded { auction_id, .. } => *auction_id,
            UpdateEvent::AuctionCancelled { auction_id } => *auction_id,
        }
    }
}

impl From<UpdateEvent> for ServerUpdateResponse {
    fn from(event: UpdateEvent) -> Self {
        match event {
            UpdateEvent::BidAccepted {
                bid,
                current_price,
                min_next_bid,
            } => {
                let is_auto = matches!(bid.kind, BidKind::ProxyInitial | BidKind::ProxyResponse);
                ServerUpdateResponse::BidAccepted {
                    bid,
                    current_price,
                    min_next_bid,
                    is_auto,
                }
            }
            UpdateEvent::AuctionExtended {
                auction_id,
                new_end_time,
            } => ServerUpdateResponse::AuctionExtended {
                auction_id,
                new_end_time,
            },
            UpdateEvent::AuctionEnded {
                auction_id,
                result,
                winning_bid_id,
                final_price,
            } => ServerUpdateResponse::AuctionEnded {
                auction_id,
                result,
                winning_bid_id,
                final_price,
            },
            UpdateEvent::AuctionCancelled { auction_id } => {
                ServerUpdateResponse::AuctionCancelled { auction_id }
            }
        }
    }
}

pub type SubscriberId = usize;

pub async fn ws_route_handler(
    ws: WebSocketUpgrade,
    State(store): State<Arc<Store>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ws_state = &store.ws;
    let requester_ip = headers
        .get(ws_state.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Only take the first ip if there are multiple
        .and_then(|value| value.parse().ok());

    if requester_ip.is_none() {
        tracing::warn!("Failed to get requester IP address");
    }

    match ws_state.get_new_subscriber_id(requester_ip).await {
        Some(subscriber_id) => ws.on_upgrade(move |socket| {
            websocket_handler(socket, store, subscriber_id, requester_ip)
        }),
        None => super::RestError::BadParameters(
            "Maximum number of open websocket connections reached for this IP".to_string(),
        )
        .into_response(),
    }
}

async fn websocket_handler(
    stream: WebSocket,
    state: Arc<Store>,
    subscriber_id: SubscriberId,
    requester_ip: Option<IpAddr>,
) {
    let ws_state = &state.ws;
    let new_receiver = ws_state.broadcast_receiver.resubscribe();
    let (sender, receiver) = stream.split();
    let mut subscriber = Subscriber::new(subscriber_id, state.clone(), new_receiver, receiver, sender);
    subscriber.run().await;
    ws_state.remove_subscriber(subscriber_id, requester_ip).await;
}

/// Subscriber is an actor that handles a single websocket connection.
/// It listens to the engine's broadcast channel and forwards the updates for
/// the auctions the client subscribed to.
pub struct Subscriber {
    id:                  SubscriberId,
    closed:              bool,
    store:               Arc<Store>,
    notify_receiver:     broadcast::Receiver<UpdateEvent>,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    auction_ids:         HashSet<AuctionId>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);

fn ok_response(id: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Success,
    }
}

impl Subscriber {
    pub fn new(
        id: SubscriberId,
        store: Arc<Store>,
        notify_receiver: broadcast::Receiver<UpdateEvent>,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
    ) -> Self {
        Self {
            id,
            closed: false,
            store,
            notify_receiver,
            receiver,
            sender,
            auction_ids: HashSet::new(),
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            responded_to_ping: true, // We start with true so we don't close the connection immediately
        }
    }

    pub async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(subscriber = self.id, error = ?e, "Error Handling Subscriber Message.");
                break;
            }
        }
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update_event = self.notify_receiver.recv() => {
                match maybe_update_event {
                    Ok(event) => self.handle_update(event).await,
                    Err(e) => Err(anyhow!("Error receiving update event: {:?}", e)),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            _ = self.ping_interval.tick() => {
                if !self.responded_to_ping {
                    return Err(anyhow!("Subscriber did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    #[instrument(skip_all, fields(subscriber = self.id))]
    async fn handle_update(&mut self, event: UpdateEvent) -> Result<()> {
        if !self.auction_ids.contains(&event.auction_id()) {
            // Irrelevant update
            return Ok(());
        }
        let message = serde_json::to_string(&ServerUpdateResponse::from(event))?;
        self.sender.send(message.into()).await?;
        Ok(())
    }

    async fn handle_subscribe(&mut self, message_id: String, auction_ids: Vec<AuctionId>) {
        let mut not_found_auction_ids = Vec::new();
        for auction_id in &auction_ids {
            if self
                .store
                .auction_service
                .get_auction(GetAuctionInput {
                    auction_id: *auction_id,
                })
                .await
                .is_err()
            {
                not_found_auction_ids.push(*auction_id);
            }
        }
        // If there is a single auction id that is not found, we don't subscribe to any of the
        // asked correct auction ids and return an error to be more explicit and clear.
        let response = if !not_found_auction_ids.is_empty() {
            ServerResultResponse {
                id:     Some(message_id),
                result: ServerResultMessage::Err(format!(
                    "Auction(s) with id(s) {:?} not found",
                    not_found_auction_ids
                )),
            }
        } else {
            self.auction_ids.extend(auction_ids);
            ok_response(message_id)
        };
        self.send_response(response).await;
    }

    async fn handle_unsubscribe(&mut self, message_id: String, auction_ids: Vec<AuctionId>) {
        self.auction_ids
            .retain(|auction_id| !auction_ids.contains(auction_id));
        self.send_response(ok_response(message_id)).await;
    }

    async fn send_response(&mut self, response: ServerResultResponse) {
        match serde_json::to_string(&response) {
            Ok(message) => {
                if let Err(e) = self.sender.send(message.into()).await {
                    tracing::warn!(subscriber = self.id, error = ?e, "Error sending response to subscriber");
                }
            }
            Err(e) => {
                tracing::warn!(error = ?e, "Error serializing response");
            }
        }
    }

    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        let maybe_client_message = match message {
            Message::Close(_) => {
                // Send the close message to gracefully shut down the connection.
                // Otherwise the client might get an abnormal Websocket closure error.
                self.sender.close().await?;
                self.closed = true;
                return Ok(());
            }
            Message::Text(text) => serde_json::from_str::<ClientRequest>(&text),
            Message::Binary(data) => serde_json::from_slice::<ClientRequest>(&data),
            Message::Ping(_) => {
                // Axum will send Pong automatically
                return Ok(());
            }
            Message::Pong(_) => {
                self.responded_to_ping = true;
                return Ok(());
            }
        };

        match maybe_client_message {
            Err(e) => {
                self.send_response(ServerResultResponse {
                    id:     None,
                    result: ServerResultMessage::Err(e.to_string()),
                })
                .await;
            }
            Ok(ClientRequest { msg, id }) => match msg {
                ClientMessage::Subscribe { auction_ids } => {
                    self.handle_subscribe(id, auction_ids).await
                }
                ClientMessage::Unsubscribe { auction_ids } => {
                    self.handle_unsubscribe(id, auction_ids).await
                }
            },
        };

        Ok(())
    }
}
