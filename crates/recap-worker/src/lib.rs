pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::build_router;
