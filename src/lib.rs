pub mod app;
pub mod chart;
pub mod colors;
pub mod config;
pub mod errors;
pub mod grass;
pub mod grid;
pub mod growth;
pub mod handlers;
pub mod models;
pub mod months;
pub mod provider;
pub mod snapshot;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
