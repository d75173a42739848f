#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::db::DB,
    },
    axum::async_trait,
    sqlx::FromRow,
    std::time::Duration,
    time::OffsetDateTime,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Ended,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_result", rename_all = "snake_case")]
pub enum AuctionResult {
    NoBids,
    ReserveNotMet,
    Sold,
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "bid_kind", rename_all = "snake_case")]
pub enum BidKind {
    Manual,
    ProxyInitial,
    ProxyResponse,
}

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Scheduled => AuctionStatus::Scheduled,
            entities::AuctionStatus::Live => AuctionStatus::Live,
            entities::AuctionStatus::Ended => AuctionStatus::Ended,
            entities::AuctionStatus::Cancelled => AuctionStatus::Cancelled,
        }
    }
}

impl From<AuctionStatus> for entities::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Scheduled => entities::AuctionStatus::Scheduled,
            AuctionStatus::Live => entities::AuctionStatus::Live,
            AuctionStatus::Ended => entities::AuctionStatus::Ended,
            AuctionStatus::Cancelled => entities::AuctionStatus::Cancelled,
        }
    }
}

impl From<entities::AuctionResult> for AuctionResult {
    fn from(result: entities::AuctionResult) -> Self {
        match result {
            entities::AuctionResult::NoBids => AuctionResult::NoBids,
            entities::AuctionResult::ReserveNotMet => AuctionResult::ReserveNotMet,
            entities::AuctionResult::Sold => AuctionResult::Sold,
        }
    }
}

impl From<AuctionResult> for entities::AuctionResult {
    fn from(result: AuctionResult) -> Self {
        match result {
            AuctionResult::NoBids => entities::AuctionResult::NoBids,
            AuctionResult::ReserveNotMet => entities::AuctionResult::ReserveNotMet,
            AuctionResult::Sold => entities::AuctionResult::Sold,
        }
    }
}

impl From<entities::BidKind> for BidKind {
    fn from(kind: entities::BidKind) -> Self {
        match kind {
            entities::BidKind::Manual => BidKind::Manual,
            entities::BidKind::ProxyInitial => BidKind::ProxyInitial,
            entities::BidKind::ProxyResponse => BidKind::ProxyResponse,
        }
    }
}

impl From<BidKind> for entities::BidKind {
    fn from(kind: BidKind) -> Self {
        match kind {
            BidKind::Manual => entities::BidKind::Manual,
            BidKind::ProxyInitial => entities::BidKind::ProxyInitial,
            BidKind::ProxyResponse => entities::BidKind::ProxyResponse,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Auction {
    pub id:                       entities::AuctionId,
    pub property_id:              Uuid,
    pub status:                   AuctionStatus,
    pub start_time:               OffsetDateTime,
    pub scheduled_end_time:       OffsetDateTime,
    pub effective_end_time:       OffsetDateTime,
    pub starting_price:           i64,
    pub reserve_price:            i64,
    pub current_price:            i64,
    pub bid_increment_percentage: i32,
    pub auto_extend_enabled:      bool,
    pub auto_extend_window_secs:  i64,
    pub auto_extend_by_secs:      i64,
    pub max_extensions:           Option<i32>,
    pub extension_count:          i32,
    pub result:                   Option<AuctionResult>,
    pub bid_count:                i64,
    pub winning_bid_id:           Option<Uuid>,
    pub creation_time:            OffsetDateTime,
}

impl Auction {
    pub fn new(auction: &entities::Auction) -> Self {
        Self {
            id:                       auction.id,
            property_id:              auction.property_id,
            status:                   auction.status.into(),
            start_time:               auction.start_time,
            scheduled_end_time:       auction.scheduled_end_time,
            effective_end_time:       auction.effective_end_time,
            starting_price:           auction.starting_price,
            reserve_price:            auction.reserve_price,
            current_price:            auction.current_price,
            bid_increment_percentage: auction.bid_increment_percentage as i32,
            auto_extend_enabled:      auction.auto_extend.enabled,
            auto_extend_window_secs:  auction.auto_extend.window.as_secs() as i64,
            auto_extend_by_secs:      auction.auto_extend.extend_by.as_secs() as i64,
            max_extensions:           auction.auto_extend.max_extensions.map(|max| max as i32),
            extension_count:          auction.extension_count as i32,
            result:                   auction.result.map(Into::into),
            bid_count:                auction.bid_count as i64,
            winning_bid_id:           auction.winning_bid_id,
            creation_time:            auction.created_at,
        }
    }

    pub fn get_auction_entity(self) -> anyhow::Result<entities::Auction> {
        Ok(entities::Auction {
            id:                       self.id,
            property_id:              self.property_id,
            status:                   self.status.into(),
            start_time:               self.start_time,
            scheduled_end_time:       self.scheduled_end_time,
            effective_end_time:       self.effective_end_time,
            starting_price:           self.starting_price,
            reserve_price:            self.reserve_price,
            current_price:            self.current_price,
            bid_increment_percentage: u32::try_from(self.bid_increment_percentage)?,
            auto_extend:              entities::AutoExtend {
                enabled:        self.auto_extend_enabled,
                window:         Duration::from_secs(u64::try_from(self.auto_extend_window_secs)?),
                extend_by:      Duration::from_secs(u64::try_from(self.auto_extend_by_secs)?),
                max_extensions: self
                    .max_extensions
                    .map(u32::try_from)
                    .transpose()?,
            },
            extension_count:          u32::try_from(self.extension_count)?,
            result:                   self.result.map(Into::into),
            bid_count:                u64::try_from(self.bid_count)?,
            winning_bid_id:           self.winning_bid_id,
            created_at:               self.creation_time,
        })
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Bid {
    pub id:          entities::BidId,
    pub auction_id:  entities::AuctionId,
    pub bidder_id:   Uuid,
    pub amount:      i64,
    pub kind:        BidKind,
    pub ceiling:     Option<i64>,
    pub is_winning:  bool,
    pub accepted_at: OffsetDateTime,
}

impl Bid {
    pub fn new(bid: &entities::Bid) -> Self {
        Self {
            id:          bid.id,
            auction_id:  bid.auction_id,
            bidder_id:   bid.bidder_id,
            amount:      bid.amount,
            kind:        bid.kind.into(),
            ceiling:     bid.ceiling,
            is_winning:  bid.is_winning,
            accepted_at: bid.accepted_at,
        }
    }

    pub fn get_bid_entity(self) -> entities::Bid {
        entities::Bid {
            id:          self.id,
            auction_id:  self.auction_id,
            bidder_id:   self.bidder_id,
            amount:      self.amount,
            kind:        self.kind.into(),
            ceiling:     self.ceiling,
            is_winning:  self.is_winning,
            accepted_at: self.accepted_at,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct AutoBidAgent {
    pub id:            entities::AutoBidAgentId,
    pub auction_id:    entities::AuctionId,
    pub bidder_id:     Uuid,
    pub ceiling:       i64,
    pub step:          Option<i64>,
    pub active:        bool,
    pub registered_at: OffsetDateTime,
}

impl AutoBidAgent {
    pub fn new(agent: &entities::AutoBidAgent) -> Self {
        Self {
            id:            agent.id,
            auction_id:    agent.auction_id,
            bidder_id:     agent.bidder_id,
            ceiling:       agent.ceiling,
            step:          agent.step,
            active:        agent.active,
            registered_at: agent.registered_at,
        }
    }

    pub fn get_agent_entity(self) -> entities::AutoBidAgent {
        entities::AutoBidAgent {
            id:            self.id,
            auction_id:    self.auction_id,
            bidder_id:     self.bidder_id,
            ceiling:       self.ceiling,
            step:          self.step,
            active:        self.active,
            registered_at: self.registered_at,
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError>;
    async fn update_auction(&self, auction: &entities::Auction) -> Result<(), RestError>;
    async fn add_bid(&self, bid: &entities::Bid) -> Result<(), RestError>;
    async fn set_bid_winning(
        &self,
        bid_id: entities::BidId,
        is_winning: bool,
    ) -> Result<(), RestError>;
    async fn add_auto_bid_agent(&self, agent: &entities::AutoBidAgent) -> Result<(), RestError>;
    async fn set_auto_bid_agent_active(
        &self,
        agent_id: entities::AutoBidAgentId,
        active: bool,
    ) -> Result<(), RestError>;
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError>;
    async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::Bid>, RestError>;
    async fn get_active_auto_bid_agents(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::AutoBidAgent>, RestError>;
    async fn get_open_auctions(&self) -> Result<Vec<entities::Auction>, RestError>;
}

fn unavailable(error: sqlx::Error, operation: &str) -> RestError {
    tracing::error!(error = %error, operation, "DB: query failed");
    RestError::TemporarilyUnavailable
}

#[async_trait]
impl Database for DB {
    #[tracing::instrument(skip_all, name = "db_add_auction", fields(auction_id = %auction.id))]
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        let row = Auction::new(auction);
        sqlx::query(
            "INSERT INTO auction (id, property_id, status, start_time, scheduled_end_time, \
             effective_end_time, starting_price, reserve_price, current_price, \
             bid_increment_percentage, auto_extend_enabled, auto_extend_window_secs, \
             auto_extend_by_secs, max_extensions, extension_count, result, bid_count, \
             winning_bid_id, creation_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(row.id)
        .bind(row.property_id)
        .bind(row.status)
        .bind(row.start_time)
        .bind(row.scheduled_end_time)
        .bind(row.effective_end_time)
        .bind(row.starting_price)
        .bind(row.reserve_price)
        .bind(row.current_price)
        .bind(row.bid_increment_percentage)
        .bind(row.auto_extend_enabled)
        .bind(row.auto_extend_window_secs)
        .bind(row.auto_extend_by_secs)
        .bind(row.max_extensions)
        .bind(row.extension_count)
        .bind(row.result)
        .bind(row.bid_count)
        .bind(row.winning_bid_id)
        .bind(row.creation_time)
        .execute(self)
        .await
        .map_err(|e| unavailable(e, "add_auction"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_update_auction", fields(auction_id = %auction.id))]
    async fn update_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        let row = Auction::new(auction);
        sqlx::query(
            "UPDATE auction SET status = $2, effective_end_time = $3, current_price = $4, \
             extension_count = $5, result = $6, bid_count = $7, winning_bid_id = $8 \
             WHERE id = $1",
        )
        .bind(row.id)
        .bind(row.status)
        .bind(row.effective_end_time)
        .bind(row.current_price)
        .bind(row.extension_count)
        .bind(row.result)
        .bind(row.bid_count)
        .bind(row.winning_bid_id)
        .execute(self)
        .await
        .map_err(|e| unavailable(e, "update_auction"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_add_bid", fields(bid_id = %bid.id))]
    async fn add_bid(&self, bid: &entities::Bid) -> Result<(), RestError> {
        let row = Bid::new(bid);
        sqlx::query(
            "INSERT INTO bid (id, auction_id, bidder_id, amount, kind, ceiling, is_winning, accepted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(row.id)
        .bind(row.auction_id)
        .bind(row.bidder_id)
        .bind(row.amount)
        .bind(row.kind)
        .bind(row.ceiling)
        .bind(row.is_winning)
        .bind(row.accepted_at)
        .execute(self)
        .await
        .map_err(|e| unavailable(e, "add_bid"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_set_bid_winning", fields(bid_id = %bid_id))]
    async fn set_bid_winning(
        &self,
        bid_id: entities::BidId,
        is_winning: bool,
    ) -> Result<(), RestError> {
        sqlx::query("UPDATE bid SET is_winning = $2 WHERE id = $1")
            .bind(bid_id)
            .bind(is_winning)
            .execute(self)
            .await
            .map_err(|e| unavailable(e, "set_bid_winning"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_add_auto_bid_agent", fields(agent_id = %agent.id))]
    async fn add_auto_bid_agent(&self, agent: &entities::AutoBidAgent) -> Result<(), RestError> {
        let row = AutoBidAgent::new(agent);
        sqlx::query(
            "INSERT INTO auto_bid_agent (id, auction_id, bidder_id, ceiling, step, active, registered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(row.id)
        .bind(row.auction_id)
        .bind(row.bidder_id)
        .bind(row.ceiling)
        .bind(row.step)
        .bind(row.active)
        .bind(row.registered_at)
        .execute(self)
        .await
        .map_err(|e| unavailable(e, "add_auto_bid_agent"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_set_auto_bid_agent_active", fields(agent_id = %agent_id))]
    async fn set_auto_bid_agent_active(
        &self,
        agent_id: entities::AutoBidAgentId,
        active: bool,
    ) -> Result<(), RestError> {
        sqlx::query("UPDATE auto_bid_agent SET active = $2 WHERE id = $1")
            .bind(agent_id)
            .bind(active)
            .execute(self)
            .await
            .map_err(|e| unavailable(e, "set_auto_bid_agent_active"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "db_get_auction", fields(auction_id = %auction_id))]
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        let row: Option<Auction> = sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_optional(self)
            .await
            .map_err(|e| unavailable(e, "get_auction"))?;
        row.map(|row| {
            row.get_auction_entity().map_err(|e| {
                tracing::error!(error = %e, auction_id = %auction_id, "DB: invalid auction row");
                RestError::TemporarilyUnavailable
            })
        })
        .transpose()
    }

    #[tracing::instrument(skip_all, name = "db_get_bids", fields(auction_id = %auction_id))]
    async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::Bid>, RestError> {
        let rows: Vec<Bid> =
            sqlx::query_as("SELECT * FROM bid WHERE auction_id = $1 ORDER BY accepted_at ASC")
                .bind(auction_id)
                .fetch_all(self)
                .await
                .map_err(|e| unavailable(e, "get_bids"))?;
        Ok(rows.into_iter().map(Bid::get_bid_entity).collect())
    }

    #[tracing::instrument(skip_all, name = "db_get_active_auto_bid_agents", fields(auction_id = %auction_id))]
    async fn get_active_auto_bid_agents(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Vec<entities::AutoBidAgent>, RestError> {
        let rows: Vec<AutoBidAgent> = sqlx::query_as(
            "SELECT * FROM auto_bid_agent WHERE auction_id = $1 AND active ORDER BY registered_at ASC",
        )
        .bind(auction_id)
        .fetch_all(self)
        .await
        .map_err(|e| unavailable(e, "get_active_auto_bid_agents"))?;
        Ok(rows.into_iter().map(AutoBidAgent::get_agent_entity).collect())
    }

    #[tracing::instrument(skip_all, name = "db_get_open_auctions")]
    async fn get_open_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        let rows: Vec<Auction> =
            sqlx::query_as("SELECT * FROM auction WHERE status IN ('scheduled', 'live')")
                .fetch_all(self)
                .await
                .map_err(|e| unavailable(e, "get_open_auctions"))?;
        rows.into_iter()
            .map(|row| {
                row.get_auction_entity().map_err(|e| {
                    tracing::error!(error = %e, "DB: invalid auction row");
                    RestError::TemporarilyUnavailable
                })
            })
            .collect()
    }
}
