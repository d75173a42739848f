use {
    super::entities,
    dashmap::DashMap,
    std::{
        collections::HashMap,
        sync::Arc,
    },
    tokio::sync::{
        Mutex,
        RwLock,
    },
};

mod accept_bid;
mod add_auction;
mod add_auto_bid_agent;
mod deactivate_auto_bid_agent;
mod get_active_auto_bid_agents;
mod get_auction;
mod get_bids;
mod get_in_memory_auction;
mod get_in_memory_auctions;
mod get_in_memory_winning_bid;
mod get_or_create_auction_lock;
mod load_open_auctions;
mod models;
mod remove_auction_lock;
mod update_auction;

pub use models::*;

/// Authoritative state for open auctions. The auction records are the only
/// contended resource; the per-auction lock map serializes every writer. The
/// bid ledgers are append-only apart from the winning flag, which only the
/// acceptance path touches while holding the auction lock.
#[derive(Default)]
pub struct InMemoryStore {
    pub auctions:        DashMap<entities::AuctionId, entities::Auction>,
    pub bids:            RwLock<HashMap<entities::AuctionId, Vec<entities::Bid>>>,
    pub auto_bid_agents: RwLock<HashMap<entities::AuctionId, Vec<entities::AutoBidAgent>>>,
    pub auction_lock:    Mutex<HashMap<entities::AuctionId, entities::AuctionLock>>,
}

pub struct Repository {
    pub in_memory_store: InMemoryStore,
    pub db:              Arc<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db:              Arc::new(db),
        }
    }
}
