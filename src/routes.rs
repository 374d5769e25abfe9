//! Broadcast and broadcast view routes

use serde_json::Value;

use crate::client::{BoxCastClient, Parameters};
use crate::error::BoxCastError;
use crate::http::encode_path_segment;
use crate::models::{Broadcast, BroadcastView};
use crate::query::{LogicOperator, QueryBuilder};

/// Server-side broadcast lifecycle filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Upcoming,
    Live,
    Preroll,
    Past,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Upcoming => "future",
            Timeframe::Live => "current",
            Timeframe::Preroll => "preroll",
            Timeframe::Past => "past",
        }
    }
}

impl BoxCastClient {
    // Accessing broadcasts

    /// Upcoming broadcasts for a channel.
    pub fn get_upcoming_broadcasts(&self, channel_id: &str) -> Result<Vec<Broadcast>, BoxCastError> {
        self.find_broadcasts(channel_id, &[Timeframe::Upcoming])
    }

    /// Live broadcasts for a channel, including those in preroll.
    pub fn get_live_broadcasts(&self, channel_id: &str) -> Result<Vec<Broadcast>, BoxCastError> {
        self.find_broadcasts(channel_id, &[Timeframe::Live, Timeframe::Preroll])
    }

    /// Archived broadcasts for a channel.
    pub fn get_archived_broadcasts(&self, channel_id: &str) -> Result<Vec<Broadcast>, BoxCastError> {
        self.find_broadcasts(channel_id, &[Timeframe::Past])
    }

    /// A detailed broadcast. Only detailed broadcasts carry an account id.
    pub fn get_broadcast(&self, broadcast_id: &str, channel_id: &str) -> Result<Broadcast, BoxCastError> {
        let path = format!("/broadcasts/{}", encode_path_segment(broadcast_id));
        let json = self.get_json(&path, None)?;
        Broadcast::from_json(channel_id, &json)
    }

    pub fn find_broadcasts(
        &self,
        channel_id: &str,
        timeframes: &[Timeframe],
    ) -> Result<Vec<Broadcast>, BoxCastError> {
        let mut query = QueryBuilder::new();
        for timeframe in timeframes {
            query.append(LogicOperator::Or, "timeframe", timeframe.as_str());
        }
        let mut params = Parameters::new();
        params.insert("q".to_string(), Value::String(query.build()));

        let path = format!("/channels/{}/broadcasts", encode_path_segment(channel_id));
        let json = self.get_json(&path, Some(&params))?;
        Broadcast::list_from_json(channel_id, &json)
    }

    // Accessing broadcast views

    pub fn get_broadcast_view(&self, broadcast_id: &str) -> Result<BroadcastView, BoxCastError> {
        let path = format!("/broadcasts/{}/view", encode_path_segment(broadcast_id));
        let json = self.get_json(&path, None)?;
        BroadcastView::from_json(&json)
    }

    // Async variants, completing on the client's callback queue

    pub fn fetch_live_broadcasts<F>(&self, channel_id: &str, completion: F)
    where
        F: FnOnce(Result<Vec<Broadcast>, BoxCastError>) + Send + 'static,
    {
        let channel_id = channel_id.to_string();
        self.spawn_request(move |client| client.get_live_broadcasts(&channel_id), completion);
    }

    pub fn fetch_upcoming_broadcasts<F>(&self, channel_id: &str, completion: F)
    where
        F: FnOnce(Result<Vec<Broadcast>, BoxCastError>) + Send + 'static,
    {
        let channel_id = channel_id.to_string();
        self.spawn_request(move |client| client.get_upcoming_broadcasts(&channel_id), completion);
    }

    pub fn fetch_archived_broadcasts<F>(&self, channel_id: &str, completion: F)
    where
        F: FnOnce(Result<Vec<Broadcast>, BoxCastError>) + Send + 'static,
    {
        let channel_id = channel_id.to_string();
        self.spawn_request(move |client| client.get_archived_broadcasts(&channel_id), completion);
    }

    pub fn fetch_broadcast<F>(&self, broadcast_id: &str, channel_id: &str, completion: F)
    where
        F: FnOnce(Result<Broadcast, BoxCastError>) + Send + 'static,
    {
        let broadcast_id = broadcast_id.to_string();
        let channel_id = channel_id.to_string();
        self.spawn_request(
            move |client| client.get_broadcast(&broadcast_id, &channel_id),
            completion,
        );
    }

    pub fn fetch_broadcast_view<F>(&self, broadcast_id: &str, completion: F)
    where
        F: FnOnce(Result<BroadcastView, BoxCastError>) + Send + 'static,
    {
        let broadcast_id = broadcast_id.to_string();
        self.spawn_request(move |client| client.get_broadcast_view(&broadcast_id), completion);
    }
}
