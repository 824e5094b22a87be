pub mod api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod intercept;
pub mod state_factory;
