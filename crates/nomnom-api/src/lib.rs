pub mod auth;
pub mod comments;
pub mod convert;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod photos;
pub mod posts;
pub mod profile;
pub mod recipes;
pub mod routes;
pub mod state;
pub mod storage;
pub mod swipes;

pub use routes::router;
pub use state::{AppState, AppStateInner};
