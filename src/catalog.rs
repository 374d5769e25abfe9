//! Channel catalog built on top of the broadcast routes

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::cache::{CacheError, KeyValueCache};
use crate::client::{BoxCastClient, Parameters};
use crate::config::ClientConfig;
use crate::error::BoxCastError;
use crate::http::encode_path_segment;
use crate::metrics::MetricsConsumer;
use crate::models::Broadcast;
use crate::player::{MediaPlayer, MetricsPlayer};

/// A BoxCast channel shown in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub disabled_by_default: bool,
}

impl Channel {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            disabled_by_default: false,
        }
    }
}

/// A broadcast as listed in a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEpisode {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<Url>,
}

impl From<Broadcast> for ChannelEpisode {
    fn from(broadcast: Broadcast) -> Self {
        Self {
            id: broadcast.id,
            channel_id: broadcast.channel_id,
            title: broadcast.name,
            description: broadcast.description,
            date: broadcast.start_date,
            image_url: broadcast.thumbnail_url,
        }
    }
}

/// Newest first.
pub fn episodes_from_broadcasts(broadcasts: Vec<Broadcast>) -> Vec<ChannelEpisode> {
    let mut episodes: Vec<ChannelEpisode> = broadcasts.into_iter().map(ChannelEpisode::from).collect();
    episodes.sort_by(|a, b| b.date.cmp(&a.date));
    episodes
}

fn fetch_channel_episodes(
    client: &BoxCastClient,
    channel_id: &str,
    limit: u32,
) -> Result<Vec<ChannelEpisode>, BoxCastError> {
    let mut params = Parameters::new();
    params.insert("l".to_string(), Value::from(limit));
    let path = format!("/channels/{}/broadcasts", encode_path_segment(channel_id));
    let json = client.get_json(&path, Some(&params))?;
    Ok(episodes_from_broadcasts(Broadcast::list_from_json(channel_id, &json)?))
}

pub struct BroadcastCatalog {
    client: BoxCastClient,
    config: ClientConfig,
    viewer_id: String,
}

impl BroadcastCatalog {
    pub fn new(client: BoxCastClient, config: ClientConfig, viewer_id: String) -> Self {
        Self { client, config, viewer_id }
    }

    pub fn client(&self) -> &BoxCastClient {
        &self.client
    }

    /// One page of a channel's broadcasts, newest first.
    pub fn episodes(&self, channel: &Channel) -> Result<Vec<ChannelEpisode>, BoxCastError> {
        fetch_channel_episodes(&self.client, &channel.id, self.config.page_limit)
    }

    pub fn fetch_episodes<F>(&self, channel: &Channel, completion: F)
    where
        F: FnOnce(Result<Vec<ChannelEpisode>, BoxCastError>) + Send + 'static,
    {
        let channel_id = channel.id.clone();
        let limit = self.config.page_limit;
        self.client.spawn_request(
            move |client| fetch_channel_episodes(client, &channel_id, limit),
            completion,
        );
    }

    /// Fetch the detailed broadcast and a fresh view for `episode`, then open
    /// an instrumented player on its stream.
    pub fn open_player<P, F>(
        &self,
        episode: &ChannelEpisode,
        make_player: F,
    ) -> Result<MetricsPlayer<P>, BoxCastError>
    where
        P: MediaPlayer,
        F: FnOnce(&Url) -> P,
    {
        let broadcast = self.client.get_broadcast(&episode.id, &episode.channel_id)?;
        let view = self.client.get_broadcast_view(&broadcast.id)?;

        let consumer = MetricsConsumer::new(
            broadcast,
            &view,
            self.client.transport(),
            &self.config,
            self.viewer_id.clone(),
            self.client.callbacks().clone(),
        );

        MetricsPlayer::open(
            &view,
            Arc::new(consumer),
            self.config.metrics_interval(),
            make_player,
        )
    }
}

/// Last known episode lists, keyed by channel.
pub struct EpisodeCache<C: KeyValueCache> {
    cache: C,
}

impl<C: KeyValueCache> EpisodeCache<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn get_episodes(&self, channel: &Channel) -> Result<Vec<ChannelEpisode>, CacheError> {
        Ok(self.cache.get(&Self::cache_key(channel))?.unwrap_or_default())
    }

    pub fn set_episodes(&self, episodes: &[ChannelEpisode], channel: &Channel) -> Result<(), CacheError> {
        self.cache.set(&Self::cache_key(channel), &episodes)
    }

    fn cache_key(channel: &Channel) -> String {
        format!("channel-{}", channel.id)
    }
}
