use std::sync::Arc;

use service::exchange::ExchangeService;
use service::ResourceStore;

/// Everything the router needs, assembled once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub stores: Vec<Arc<ResourceStore>>,
    pub exchange: Arc<ExchangeService>,
}

impl ServerState {
    pub fn new(stores: Vec<ResourceStore>, exchange: ExchangeService) -> Self {
        Self { stores: stores.into_iter().map(Arc::new).collect(), exchange: Arc::new(exchange) }
    }

    pub fn store(&self, name: &str) -> Option<&Arc<ResourceStore>> {
        self.stores.iter().find(|s| s.name() == name)
    }
}
