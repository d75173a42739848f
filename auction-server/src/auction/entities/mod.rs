mod auction;
mod auto_bid;
mod bid;

pub use {
    auction::*,
    auto_bid::*,
    bid::*,
};
