//! Adapters implementing the application ports.

mod reqwest_client;
mod route_tracker;

pub use reqwest_client::{API_PREFIX, ReqwestHttpClient};
pub use route_tracker::RouteTracker;
