mod handlers;
mod routes;
mod stats;

pub use handlers::{AppState, EventPayload};
pub use routes::create_api_router;
