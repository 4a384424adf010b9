pub mod admin;
pub mod auth;
pub mod contact;
pub mod error;
pub mod export;
pub mod favourites;
pub mod generate;
pub mod interactions;
pub mod mealplan;
pub mod middleware;
pub mod profile;
pub mod recipes;
pub mod routes;
pub mod store;

pub use auth::{AppState, AppStateInner};
pub use routes::router;
