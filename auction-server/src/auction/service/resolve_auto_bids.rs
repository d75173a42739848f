use {
    super::{
        accept_bid::AcceptBidInput,
        Service,
    },
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
};

/// Picks the agent that contests the current price: highest ceiling first,
/// earliest registration on equal ceilings. The leader's own agent never
/// contests its own bid.
fn select_strongest(
    agents: &[entities::AutoBidAgent],
    leader: Option<UserId>,
) -> Option<usize> {
    agents
        .iter()
        .enumerate()
        .filter(|(_, agent)| Some(agent.bidder_id) != leader)
        .max_by(|(_, a), (_, b)| {
            a.ceiling
                .cmp(&b.ceiling)
                .then(b.registered_at.cmp(&a.registered_at))
        })
        .map(|(position, _)| position)
}

impl Service {
    /// Runs the proxy cascade after an externally triggered acceptance. The
    /// cascade is a single bounded loop, not open recursion: every agent
    /// collected at the start is engaged at most once, either countering
    /// within its ceiling or dropping out. The pass count is therefore
    /// structurally capped by the number of agents; blowing past that cap
    /// means the serialization broke and the operation must die loudly.
    ///
    /// Agents cancelled mid-cascade stop responding from the next pass, but
    /// bids they already placed stand.
    ///
    /// The caller must hold the auction lock.
    #[tracing::instrument(skip_all, fields(auction_id = %auction_id))]
    pub(crate) async fn resolve_auto_bids(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<(), RestError> {
        let mut remaining = self.repo.get_active_auto_bid_agents(auction_id).await;
        let cascade_bound = remaining.len();
        let mut passes = 0usize;
        loop {
            let auction = self
                .repo
                .get_in_memory_auction(auction_id)
                .ok_or(RestError::AuctionNotFound)?;
            let leader = self.repo.get_in_memory_winning_bid(auction_id).await;

            let still_active = self.repo.get_active_auto_bid_agents(auction_id).await;
            remaining.retain(|agent| still_active.iter().any(|active| active.id == agent.id));

            let Some(position) =
                select_strongest(&remaining, leader.map(|bid| bid.bidder_id))
            else {
                break;
            };
            let agent = remaining.remove(position);

            passes += 1;
            if passes > cascade_bound {
                panic!(
                    "auto-bid cascade exceeded {} passes on auction {}",
                    cascade_bound, auction_id,
                );
            }

            let increment = auction
                .min_increment(self.config.bid_increment_floor)
                .max(agent.step.unwrap_or(0));
            let candidate = auction.current_price.saturating_add(increment);
            if candidate > agent.ceiling {
                // The agent cannot respond within its authorization anymore.
                self.repo.deactivate_auto_bid_agent(&agent).await?;
                tracing::info!(
                    auction_id = %auction_id,
                    agent_id = %agent.id,
                    ceiling = agent.ceiling,
                    "Auto-bid agent exhausted its ceiling",
                );
                continue;
            }

            self.accept_bid(AcceptBidInput {
                auction,
                bidder_id: agent.bidder_id,
                amount: candidate,
                kind: entities::BidKind::ProxyResponse,
                ceiling: Some(agent.ceiling),
            })
            .await?;
        }
        Ok(())
    }
}
