//! Request routing.
//!
//! Resource endpoints are described by [`RESOURCE_ROUTES`], a plain table of
//! `(verb, path, operation)` entries. At startup the table is mounted once under
//! `/{resource}` for every configured store.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    routing::{get, post, MethodFilter, MethodRouter},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

use common::types::Health;
use service::ResourceStore;

use crate::state::ServerState;

pub mod exchange;
pub mod resources;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

/// Store operation a route dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteSpec {
    pub verb: Verb,
    /// Path relative to the resource prefix.
    pub path: &'static str,
    pub op: Operation,
}

pub const RESOURCE_ROUTES: &[RouteSpec] = &[
    RouteSpec { verb: Verb::Get, path: "/", op: Operation::List },
    RouteSpec { verb: Verb::Get, path: "/:id", op: Operation::Get },
    RouteSpec { verb: Verb::Post, path: "/", op: Operation::Create },
    RouteSpec { verb: Verb::Put, path: "/:id", op: Operation::Update },
    RouteSpec { verb: Verb::Delete, path: "/:id", op: Operation::Delete },
];

type StoreState = Arc<ResourceStore>;

fn bind(op: Operation, filter: MethodFilter, mr: MethodRouter<StoreState>) -> MethodRouter<StoreState> {
    match op {
        Operation::List => mr.on(filter, resources::list),
        Operation::Get => mr.on(filter, resources::get),
        Operation::Create => mr.on(filter, resources::create),
        Operation::Update => mr.on(filter, resources::update),
        Operation::Delete => mr.on(filter, resources::delete),
    }
}

/// Router serving one store according to `table`.
pub fn resource_router(store: StoreState, table: &[RouteSpec]) -> Router {
    let mut by_path: BTreeMap<&'static str, MethodRouter<StoreState>> = BTreeMap::new();
    for entry in table {
        let mr = by_path.remove(entry.path).unwrap_or_else(MethodRouter::new);
        by_path.insert(entry.path, bind(entry.op, entry.verb.filter(), mr));
    }
    let mut router = Router::new();
    for (path, mr) in by_path {
        router = router.route(path, mr);
    }
    router.with_state(store)
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, exchange and every resource.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/exchange/convert", post(exchange::convert).with_state(state.exchange.clone()));

    for store in &state.stores {
        debug!(resource = store.name(), routes = RESOURCE_ROUTES.len(), "mounting resource");
        app = app.nest(&format!("/{}", store.name()), resource_router(Arc::clone(store), RESOURCE_ROUTES));
    }

    app.layer(cors).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
