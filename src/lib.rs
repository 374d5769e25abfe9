//! BoxCast broadcast API client
//! Broadcast listing and lookup, stream views, and playback metrics reporting

pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod metrics;
pub mod models;
pub mod player;
pub mod query;
pub mod routes;


pub use catalog::{BroadcastCatalog, Channel, ChannelEpisode, EpisodeCache};
pub use client::{BoxCastClient, Parameters, PublicScope, Scope};
pub use config::ClientConfig;
pub use error::BoxCastError;
pub use models::{Broadcast, BroadcastView, ViewStatus};
pub use player::{MediaPlayer, MetricsPlayer, PlayerObserver};
pub use routes::Timeframe;
