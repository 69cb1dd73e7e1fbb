use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{balance_sheet, expenses, users};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Every route of the HTTP API.
///
/// Static segments win over parameters, so `/expenses/overall` and
/// `/users/download-balance-sheet` never reach the `{id}` handlers.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/users", post(users::user_new).get(users::list))
        .route(
            "/users/download-balance-sheet",
            get(balance_sheet::download),
        )
        .route("/users/{id}", get(users::get))
        .route("/expenses", post(expenses::expense_new))
        .route("/expenses/overall", get(expenses::overall))
        .route("/expenses/user/{user_id}", get(expenses::for_user))
        .route(
            "/expenses/{id}",
            get(expenses::get).delete(expenses::delete),
        )
        .with_state(state)
}

/// Router over a freshly built engine.
pub fn app(engine: Engine) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
    })
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}
