use {
    super::Service,
    crate::auction::entities,
};

impl Service {
    /// Every auction the engine currently tracks, oldest start first.
    pub fn get_auctions(&self) -> Vec<entities::Auction> {
        self.repo.get_in_memory_auctions()
    }
}
