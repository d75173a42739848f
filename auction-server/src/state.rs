use crate::{
    api::ws,
    auction::service::Service,
};

pub struct Store {
    pub auction_service: Service,
    pub ws:              ws::WsState,
}
