pub mod handlers;
pub mod middleware;
pub mod preview;
pub mod routes;
pub mod service;

pub use routes::create_redirect_router;
pub use service::{RedirectOutcome, RedirectService};
