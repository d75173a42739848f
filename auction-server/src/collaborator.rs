use {
    crate::{
        auction::entities::{
            Amount,
            AuctionId,
            BidId,
        },
        kernel::entities::UserId,
    },
    axum::async_trait,
    serde::{
        Deserialize,
        Serialize,
    },
};

#[cfg(test)]
use mockall::automock;

/// Answer of the identity collaborator for a bidder.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason:   Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Sent to the previous leader when another bid takes over.
    Outbid,
    /// Sent to the holder of the winning bid when the auction sells.
    AuctionWon,
}

/// Identity/eligibility checks are delegated to an external service. The
/// engine treats the answer as authoritative and never caches it across bids.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EligibilityCheck: Send + Sync + 'static {
    async fn is_eligible_to_bid(&self, user_id: UserId) -> anyhow::Result<Eligibility>;
}

/// Fire-and-forget notification dispatch. Failures are logged by the caller
/// and never block bid acceptance.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> anyhow::Result<()>;
}

/// Settlement hand-off for sold auctions. The collaborator deduplicates on
/// `(auction_id, winning_bid_id)`, so a repeated request after a finalizer
/// re-entry is safe.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettlementGateway: Send + Sync + 'static {
    async fn request_settlement(
        &self,
        auction_id: AuctionId,
        winning_bid_id: BidId,
        final_price: Amount,
    ) -> anyhow::Result<()>;
}

pub struct HttpEligibilityCheck {
    pub client:   reqwest::Client,
    pub base_url: String,
}

#[async_trait]
impl EligibilityCheck for HttpEligibilityCheck {
    async fn is_eligible_to_bid(&self, user_id: UserId) -> anyhow::Result<Eligibility> {
        let url = format!("{}/v1/users/{}/bidding-eligibility", self.base_url, user_id);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[derive(Serialize)]
struct NotificationBody {
    user_id: UserId,
    kind:    NotificationKind,
    payload: serde_json::Value,
}

pub struct HttpNotifier {
    pub client:   reqwest::Client,
    pub base_url: String,
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        let url = format!("{}/v1/notifications", self.base_url);
        self.client
            .post(url)
            .json(&NotificationBody {
                user_id,
                kind,
                payload,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SettlementBody {
    auction_id:     AuctionId,
    winning_bid_id: BidId,
    final_price:    Amount,
}

pub struct HttpSettlementGateway {
    pub client:   reqwest::Client,
    pub base_url: String,
}

#[async_trait]
impl SettlementGateway for HttpSettlementGateway {
    async fn request_settlement(
        &self,
        auction_id: AuctionId,
        winning_bid_id: BidId,
        final_price: Amount,
    ) -> anyhow::Result<()> {
        let url = format!("{}/v1/settlements", self.base_url);
        self.client
            .post(url)
            .json(&SettlementBody {
                auction_id,
                winning_bid_id,
                final_price,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
