//! Web surface: server-rendered chat page and JSON API.

pub mod page;
pub mod routes;

pub use page::{ChatPage, DebugView, Templates};
pub use routes::{AppState, app_routes};
