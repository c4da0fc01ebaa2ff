//! Web front end: login-gated task pages served with axum.

mod server;
pub mod session;
pub mod templates;
pub mod views;

pub use server::{
    AppState, INVALID_CREDENTIALS, ServerHandle, TASK_ADDED, TASK_COMPLETED, TASK_DELETED,
    build_router, start_server,
};
