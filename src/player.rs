//! Metrics-instrumented playback
//!
//! `MetricsPlayer` wraps any `MediaPlayer` and turns its state transitions
//! into playback metrics. All session state lives on one actor thread; the
//! player reports transitions through a `PlayerObserver`, and the repeating
//! timer feeds the same queue.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use url::Url;

use crate::error::BoxCastError;
use crate::metrics::{Metric, MetricAction, MetricSink, RepeatingTimer};
use crate::models::BroadcastView;

/// The media player being instrumented.
pub trait MediaPlayer: Send + Sync + 'static {
    /// Current media position
    fn current_time(&self) -> Duration;
    /// Playback rate; zero when paused or stalled
    fn rate(&self) -> f32;
    fn is_playback_buffer_empty(&self) -> bool;
    /// Height of the presented video in pixels, zero when unknown
    fn presentation_height(&self) -> u32;

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_time: self.current_time(),
            rate: self.rate(),
            buffer_empty: self.is_playback_buffer_empty(),
            video_height: self.presentation_height(),
        }
    }
}

/// Player state captured at the moment a transition was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_time: Duration,
    pub rate: f32,
    pub buffer_empty: bool,
    pub video_height: u32,
}

impl PlaybackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.rate != 0.0
    }
}

/// Watch-time accounting for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchClock {
    total_time: Duration,
    last_sent_time: Duration,
    last_play_time: Option<Duration>,
}

impl WatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub fn last_sent_time(&self) -> Duration {
        self.last_sent_time
    }

    pub fn last_play_time(&self) -> Option<Duration> {
        self.last_play_time
    }

    /// Fold the running play interval into the total.
    fn finalize(&mut self, now: Duration) {
        if let Some(started) = self.last_play_time.take() {
            self.total_time += now.saturating_sub(started);
        }
    }

    fn emit(&mut self, metric: Metric) -> Metric {
        self.last_sent_time = match metric.action {
            MetricAction::Seek { to } => to,
            _ => metric.time,
        };
        metric
    }

    pub fn setup(&mut self, snapshot: PlaybackSnapshot) -> Metric {
        self.emit(Metric::new(
            MetricAction::Setup,
            snapshot.current_time,
            self.total_time,
            snapshot.video_height,
        ))
    }

    pub fn rate_changed(&mut self, snapshot: PlaybackSnapshot) -> Metric {
        let now = snapshot.current_time;
        let action = if snapshot.is_playing() {
            // A rate change while already playing closes the previous interval
            self.finalize(now);
            self.last_play_time = Some(now);
            MetricAction::Play
        } else {
            self.finalize(now);
            if snapshot.buffer_empty {
                MetricAction::Buffer
            } else {
                MetricAction::Pause
            }
        };
        self.emit(Metric::new(action, now, self.total_time, snapshot.video_height))
    }

    pub fn played_to_end(&mut self, snapshot: PlaybackSnapshot) -> Metric {
        self.finalize(snapshot.current_time);
        self.emit(Metric::new(
            MetricAction::Complete,
            snapshot.current_time,
            self.total_time,
            snapshot.video_height,
        ))
    }

    /// The jump is only observed after it happened, so the reported position
    /// is the last sent time rather than the current one.
    pub fn time_jumped(&mut self, snapshot: PlaybackSnapshot) -> Metric {
        let now = snapshot.current_time;
        self.finalize(now);
        if snapshot.is_playing() {
            self.last_play_time = Some(now);
        }
        self.emit(Metric::new(
            MetricAction::Seek { to: now },
            self.last_sent_time,
            self.total_time,
            snapshot.video_height,
        ))
    }

    /// Periodic metric. Reports the projected total without closing the interval.
    pub fn tick(&mut self, snapshot: PlaybackSnapshot) -> Metric {
        let now = snapshot.current_time;
        let projected = match self.last_play_time {
            Some(started) => self.total_time + now.saturating_sub(started),
            None => self.total_time,
        };
        self.emit(Metric::new(MetricAction::Time, now, projected, snapshot.video_height))
    }
}

enum PlayerEvent {
    Setup(PlaybackSnapshot),
    RateChanged(PlaybackSnapshot),
    PlayedToEnd(PlaybackSnapshot),
    TimeJumped(PlaybackSnapshot),
    IntervalElapsed,
    Shutdown,
}

/// Callback interface handed to the media player implementation.
///
/// Each call snapshots the player and queues the transition for the metrics
/// actor. Calls made after the session has shut down are ignored.
#[derive(Clone)]
pub struct PlayerObserver {
    events: Sender<PlayerEvent>,
    player: Arc<dyn MediaPlayer>,
}

impl PlayerObserver {
    fn send(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    pub fn rate_did_change(&self) {
        self.send(PlayerEvent::RateChanged(self.player.snapshot()));
    }

    pub fn did_play_to_end(&self) {
        self.send(PlayerEvent::PlayedToEnd(self.player.snapshot()));
    }

    pub fn time_did_jump(&self) {
        self.send(PlayerEvent::TimeJumped(self.player.snapshot()));
    }
}

/// A media player instrumented with playback metrics.
pub struct MetricsPlayer<P: MediaPlayer> {
    player: Arc<P>,
    playlist_url: Url,
    events: Sender<PlayerEvent>,
    worker: Option<JoinHandle<()>>,
}

impl<P: MediaPlayer> MetricsPlayer<P> {
    /// Create the player for `view`'s stream and start the metrics session.
    ///
    /// Fails with `InvalidUrl` when the view has no playable stream. The
    /// `setup` metric is emitted immediately.
    pub fn open<F>(
        view: &BroadcastView,
        sink: Arc<dyn MetricSink>,
        interval: Duration,
        make_player: F,
    ) -> Result<Self, BoxCastError>
    where
        F: FnOnce(&Url) -> P,
    {
        let playlist_url = view.playlist_url.clone().ok_or(BoxCastError::InvalidUrl)?;
        let player = Arc::new(make_player(&playlist_url));

        let (events, receiver) = channel();
        let _ = events.send(PlayerEvent::Setup(player.snapshot()));

        let actor = SessionActor {
            player: Arc::clone(&player),
            sink,
            interval,
            events: events.clone(),
            clock: WatchClock::new(),
            timer: None,
        };
        let worker = thread::Builder::new()
            .name("boxcast-metrics".to_string())
            .spawn(move || actor.run(receiver))
            .map_err(|e| {
                tracing::error!(error = %e, "failed to start metrics session");
                BoxCastError::Unknown
            })?;

        tracing::info!(url = %playlist_url, "playback session started");
        Ok(Self {
            player,
            playlist_url,
            events,
            worker: Some(worker),
        })
    }

    pub fn player(&self) -> &Arc<P> {
        &self.player
    }

    pub fn playlist_url(&self) -> &Url {
        &self.playlist_url
    }

    pub fn observer(&self) -> PlayerObserver {
        let player: Arc<dyn MediaPlayer> = self.player.clone();
        PlayerObserver {
            events: self.events.clone(),
            player,
        }
    }

    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop the timer and detach observers. Waits for queued events to drain.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.events.send(PlayerEvent::Shutdown);
            let _ = worker.join();
            tracing::info!(url = %self.playlist_url, "playback session ended");
        }
    }
}

impl<P: MediaPlayer> Drop for MetricsPlayer<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct SessionActor<P: MediaPlayer> {
    player: Arc<P>,
    sink: Arc<dyn MetricSink>,
    interval: Duration,
    events: Sender<PlayerEvent>,
    clock: WatchClock,
    timer: Option<RepeatingTimer>,
}

impl<P: MediaPlayer> SessionActor<P> {
    fn run(mut self, receiver: Receiver<PlayerEvent>) {
        for event in receiver.iter() {
            let metric = match event {
                PlayerEvent::Setup(snapshot) => self.clock.setup(snapshot),
                PlayerEvent::RateChanged(snapshot) => {
                    if snapshot.is_playing() {
                        self.ensure_timer();
                    }
                    self.clock.rate_changed(snapshot)
                }
                PlayerEvent::PlayedToEnd(snapshot) => self.clock.played_to_end(snapshot),
                PlayerEvent::TimeJumped(snapshot) => self.clock.time_jumped(snapshot),
                PlayerEvent::IntervalElapsed => self.clock.tick(self.player.snapshot()),
                PlayerEvent::Shutdown => break,
            };
            tracing::debug!(%metric, "metric");
            self.sink.consume(metric);
        }

        if let Some(mut timer) = self.timer.take() {
            timer.invalidate();
        }
    }

    fn ensure_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let events = self.events.clone();
        match RepeatingTimer::start("boxcast-metrics-timer", self.interval, move || {
            let _ = events.send(PlayerEvent::IntervalElapsed);
        }) {
            Ok(timer) => self.timer = Some(timer),
            Err(e) => tracing::warn!(error = %e, "failed to start metrics timer"),
        }
    }
}
