use {
    super::Repository,
    crate::auction::entities,
};

impl Repository {
    pub fn get_in_memory_auctions(&self) -> Vec<entities::Auction> {
        let mut auctions: Vec<entities::Auction> = self
            .in_memory_store
            .auctions
            .iter()
            .map(|auction| auction.clone())
            .collect();
        auctions.sort_by_key(|auction| auction.start_time);
        auctions
    }
}
