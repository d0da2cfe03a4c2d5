pub mod error;
pub mod handlers;
pub mod router;
pub mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
