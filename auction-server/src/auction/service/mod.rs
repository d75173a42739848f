use {
    super::{
        entities,
        repository::{
            Database,
            Repository,
        },
    },
    crate::{
        api::ws::UpdateEvent,
        collaborator::{
            EligibilityCheck,
            Notifier,
            SettlementGateway,
        },
    },
    std::{
        cmp::Reverse,
        collections::BinaryHeap,
        sync::Arc,
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::{
        broadcast,
        Mutex,
        Notify,
    },
    tokio_util::task::TaskTracker,
};

pub mod accept_bid;
pub mod add_auction;
pub mod cancel_auction;
pub mod cancel_auto_bid;
pub mod conclude_auction;
pub mod extend_auction;
pub mod get_auction;
pub mod get_auctions;
pub mod get_bids;
pub mod recover_auctions;
pub mod register_auto_bid;
pub mod resolve_auto_bids;
pub mod submit_bid;
pub mod verification;
pub mod workers;

pub struct Config {
    /// Absolute floor for the bid increment, in minor currency units. Keeps
    /// bids strictly increasing even when the percentage step rounds small.
    pub bid_increment_floor:  entities::Amount,
    /// Upper bound on any eligibility, notification or settlement call. A
    /// collaborator that does not answer within this interval fails the
    /// attempt instead of holding the auction lock.
    pub collaborator_timeout: Duration,
}

pub struct Collaborators {
    pub eligibility: Arc<dyn EligibilityCheck>,
    pub notifier:    Arc<dyn Notifier>,
    pub settlement:  Arc<dyn SettlementGateway>,
}

/// Min-heap of upcoming auction deadlines. The clock only wakes for auctions
/// actually due instead of polling every auction every tick; entries are
/// re-validated against the auction record when popped, so stale deadlines
/// (e.g. superseded by an extension) are harmless.
#[derive(Default)]
pub(crate) struct DeadlineSchedule {
    heap:      Mutex<BinaryHeap<Reverse<(OffsetDateTime, entities::AuctionId)>>>,
    pub rearm: Notify,
}

impl DeadlineSchedule {
    pub async fn schedule(&self, deadline: OffsetDateTime, auction_id: entities::AuctionId) {
        let mut heap = self.heap.lock().await;
        let is_new_earliest = heap
            .peek()
            .map_or(true, |Reverse((earliest, _))| deadline < *earliest);
        heap.push(Reverse((deadline, auction_id)));
        if is_new_earliest {
            self.rearm.notify_one();
        }
    }

    pub async fn next_deadline(&self) -> Option<OffsetDateTime> {
        self.heap
            .lock()
            .await
            .peek()
            .map(|Reverse((deadline, _))| *deadline)
    }

    pub async fn pop_due(&self, now: OffsetDateTime) -> Vec<entities::AuctionId> {
        let mut heap = self.heap.lock().await;
        let mut due = Vec::new();
        while let Some(Reverse((deadline, auction_id))) = heap.peek().copied() {
            if deadline > now {
                break;
            }
            heap.pop();
            due.push(auction_id);
        }
        due
    }
}

pub struct ServiceInner {
    config:        Config,
    repo:          Arc<Repository>,
    collaborators: Collaborators,
    task_tracker:  TaskTracker,
    event_sender:  broadcast::Sender<UpdateEvent>,
    deadlines:     DeadlineSchedule,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        db: impl Database,
        config: Config,
        collaborators: Collaborators,
        task_tracker: TaskTracker,
        event_sender: broadcast::Sender<UpdateEvent>,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            repo: Arc::new(Repository::new(db)),
            collaborators,
            task_tracker,
            event_sender,
            deadlines: DeadlineSchedule::default(),
        }))
    }

    /// The smallest amount the next bid on this auction must reach.
    pub fn min_next_bid(&self, auction: &entities::Auction) -> entities::Amount {
        auction.min_acceptable_bid(self.config.bid_increment_floor)
    }

    /// Emits an engine event to the websocket fan-out. Events are sent while
    /// the auction lock is held, so subscribers observe exactly the internal
    /// acceptance order.
    pub(crate) fn broadcast(&self, event: UpdateEvent) {
        if let Err(e) = self.event_sender.send(event) {
            tracing::debug!(error = %e, "No active subscribers for engine event");
        }
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::{
            Collaborators,
            Config,
            DeadlineSchedule,
            Service,
            ServiceInner,
        },
        crate::{
            auction::{
                entities,
                repository::{
                    MockDatabase,
                    Repository,
                },
            },
            collaborator::{
                Eligibility,
                MockEligibilityCheck,
                MockNotifier,
                MockSettlementGateway,
            },
        },
        std::{
            sync::Arc,
            time::Duration,
        },
        time::OffsetDateTime,
        tokio::sync::broadcast,
        tokio_util::task::TaskTracker,
        uuid::Uuid,
    };

    pub const TEST_INCREMENT_FLOOR: entities::Amount = 1_000_000;

    impl Service {
        pub fn new_with_mocks(
            db: MockDatabase,
            eligibility: MockEligibilityCheck,
            notifier: MockNotifier,
            settlement: MockSettlementGateway,
        ) -> Self {
            Self::new_with_collaborators(
                db,
                Collaborators {
                    eligibility: Arc::new(eligibility),
                    notifier:    Arc::new(notifier),
                    settlement:  Arc::new(settlement),
                },
            )
        }

        pub fn new_with_collaborators(db: MockDatabase, collaborators: Collaborators) -> Self {
            Self(Arc::new(ServiceInner {
                config: Config {
                    bid_increment_floor:  TEST_INCREMENT_FLOOR,
                    collaborator_timeout: Duration::from_millis(100),
                },
                repo: Arc::new(Repository::new(db)),
                collaborators,
                task_tracker: TaskTracker::new(),
                event_sender: broadcast::channel(100).0,
                deadlines: DeadlineSchedule::default(),
            }))
        }
    }

    /// Database mock that accepts every write. Reads stay unexpected and
    /// panic, which keeps tests honest about what they exercise.
    pub fn permissive_db() -> MockDatabase {
        let mut db = MockDatabase::new();
        db.expect_add_auction().returning(|_| Ok(()));
        db.expect_update_auction().returning(|_| Ok(()));
        db.expect_add_bid().returning(|_| Ok(()));
        db.expect_set_bid_winning().returning(|_, _| Ok(()));
        db.expect_add_auto_bid_agent().returning(|_| Ok(()));
        db.expect_set_auto_bid_agent_active().returning(|_, _| Ok(()));
        db
    }

    pub fn eligible_bidders() -> MockEligibilityCheck {
        let mut eligibility = MockEligibilityCheck::new();
        eligibility.expect_is_eligible_to_bid().returning(|_| {
            Ok(Eligibility {
                eligible: true,
                reason:   None,
            })
        });
        eligibility
    }

    pub fn quiet_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_, _, _| Ok(()));
        notifier
    }

    pub fn new_test_service() -> Service {
        Service::new_with_mocks(
            permissive_db(),
            eligible_bidders(),
            quiet_notifier(),
            MockSettlementGateway::new(),
        )
    }

    pub fn scheduled_auction(
        start_in: time::Duration,
        duration: time::Duration,
    ) -> entities::Auction {
        let now = OffsetDateTime::now_utc();
        entities::Auction::new(
            Uuid::new_v4(),
            now + start_in,
            now + start_in + duration,
            350_000_000,
            0,
            5,
            entities::AutoExtend {
                enabled:        false,
                window:         Duration::from_secs(300),
                extend_by:      Duration::from_secs(300),
                max_extensions: None,
            },
        )
    }

    pub fn live_auction(remaining: time::Duration) -> entities::Auction {
        let mut auction = scheduled_auction(time::Duration::hours(-1), time::Duration::hours(1) + remaining);
        auction.status = entities::AuctionStatus::Live;
        auction
    }

    /// Seeds an auction into the service's in-memory store, bypassing the
    /// database write so read-only mocks stay usable.
    pub async fn seed_auction(service: &Service, auction: &entities::Auction) {
        let store = &service.repo.in_memory_store;
        store.auctions.insert(auction.id, auction.clone());
        store.bids.write().await.entry(auction.id).or_default();
        store
            .auto_bid_agents
            .write()
            .await
            .entry(auction.id)
            .or_default();
    }
}
