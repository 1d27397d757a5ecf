// ABOUTME: Owns the item list and one playback session per slot in the active/preload window.
// ABOUTME: Routes platform callbacks to sessions and fans out mute and network changes.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use reelfeed_feed::VideoItem;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::PlayerConfig;
use crate::machine::{Demand, PlaybackEvent, State};
use crate::network::{DeviceClass, NetworkSpeed};
use crate::platform::{Generations, Platform, SlotEvent, SlotId};
use crate::session::PlaybackSession;
use crate::telemetry::{MetricsSink, TracingMetrics};

pub struct PlaybackController<P: Platform> {
    platform: Arc<P>,
    config: PlayerConfig,
    metrics: Arc<dyn MetricsSink>,
    items: Vec<VideoItem>,
    sessions: BTreeMap<SlotId, PlaybackSession<P>>,
    active: Option<SlotId>,
    generations: Generations,
    tx: UnboundedSender<SlotEvent>,
    rx: UnboundedReceiver<SlotEvent>,
}

impl<P: Platform> PlaybackController<P> {
    pub fn new(platform: Arc<P>, config: PlayerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            platform,
            config,
            metrics: Arc::new(TracingMetrics),
            items: Vec::new(),
            sessions: BTreeMap::new(),
            active: None,
            generations: Generations::default(),
            tx,
            rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn items(&self) -> &[VideoItem] {
        &self.items
    }

    pub fn active(&self) -> Option<SlotId> {
        self.active
    }

    pub fn session(&self, slot: SlotId) -> Option<&PlaybackSession<P>> {
        self.sessions.get(&slot)
    }

    pub fn state(&self, slot: SlotId) -> Option<State> {
        self.sessions.get(&slot).map(PlaybackSession::state)
    }

    /// Slots that currently hold a session, in order.
    pub fn live_slots(&self) -> Vec<SlotId> {
        self.sessions.keys().copied().collect()
    }

    /// Replaces the item list. Sessions whose slot now holds a different item are torn down.
    pub fn set_items(&mut self, items: Vec<VideoItem>) {
        self.items = items;

        let superseded: Vec<SlotId> = self
            .sessions
            .iter()
            .filter(|(slot, session)| {
                self.items.get(**slot).map(VideoItem::id) != Some(session.item_id())
            })
            .map(|(slot, _)| *slot)
            .collect();
        for slot in superseded {
            self.destroy(slot);
        }

        if self.active.is_some_and(|a| a >= self.items.len()) {
            self.active = None;
        }
        self.reconcile();
    }

    /// Appends the next page of items; the window may grow into them.
    pub fn append_items(&mut self, items: impl IntoIterator<Item = VideoItem>) {
        self.items.extend(items);
        self.reconcile();
    }

    /// Makes `slot` the visible item. Returns false when the slot is out of range.
    pub fn activate(&mut self, slot: SlotId) -> bool {
        if slot >= self.items.len() {
            return false;
        }
        self.active = Some(slot);
        self.reconcile();
        true
    }

    /// Nothing is visible; every session is torn down.
    pub fn deactivate(&mut self) {
        self.active = None;
        self.reconcile();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.config.muted = muted;
        for session in self.sessions.values_mut() {
            session.set_muted(muted);
        }
    }

    /// New profile applies to engines created from now on.
    pub fn set_network_speed(&mut self, speed: NetworkSpeed) {
        self.config.speed = speed;
        self.push_profile();
    }

    pub fn set_device(&mut self, device: DeviceClass) {
        self.config.device = device;
        self.push_profile();
    }

    pub fn user_play(&mut self, slot: SlotId) -> Option<State> {
        self.dispatch(slot, PlaybackEvent::UserPlay)
    }

    pub fn user_pause(&mut self, slot: SlotId) -> Option<State> {
        self.dispatch(slot, PlaybackEvent::UserPause)
    }

    pub fn manual_retry(&mut self, slot: SlotId) -> Option<State> {
        self.dispatch(slot, PlaybackEvent::ManualRetry)
    }

    /// Routes one platform callback. Returns false when it was stale or unroutable.
    pub fn handle(&mut self, event: SlotEvent) -> bool {
        match self.sessions.get_mut(&event.slot) {
            Some(session) => session.dispatch_from(event.generation, event.event),
            None => false,
        }
    }

    /// Waits for the next callback and routes it.
    pub async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Routes every callback already queued; returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.handle(event) {
                applied += 1;
            }
        }
        applied
    }

    fn dispatch(&mut self, slot: SlotId, event: PlaybackEvent) -> Option<State> {
        self.sessions.get_mut(&slot).map(|s| s.dispatch(event))
    }

    fn push_profile(&mut self) {
        let profile = self.config.profile();
        for session in self.sessions.values_mut() {
            session.set_profile(profile);
        }
    }

    fn window(&self) -> Option<RangeInclusive<SlotId>> {
        let active = self.active?;
        let last = self.items.len().checked_sub(1)?;
        let end = active.saturating_add(self.config.preload_ahead).min(last);
        Some(active..=end)
    }

    fn reconcile(&mut self) {
        let window = self.window();
        let outside: Vec<SlotId> = self
            .sessions
            .keys()
            .copied()
            .filter(|slot| !window.as_ref().is_some_and(|w| w.contains(slot)))
            .collect();
        for slot in outside {
            self.destroy(slot);
        }

        let (Some(window), Some(active)) = (window, self.active) else {
            return;
        };
        for slot in window {
            let demand = if slot == active {
                Demand::Active
            } else {
                Demand::Preload
            };
            let session = self.sessions.entry(slot).or_insert_with(|| {
                PlaybackSession::new(
                    slot,
                    &self.items[slot],
                    Arc::clone(&self.platform),
                    &self.config,
                    self.generations.clone(),
                    self.tx.clone(),
                    Arc::clone(&self.metrics),
                )
            });
            session.set_demand(demand);
        }
    }

    fn destroy(&mut self, slot: SlotId) {
        if let Some(mut session) = self.sessions.remove(&slot) {
            session.teardown();
            tracing::debug!(slot, item_id = %session.item_id(), "playback session destroyed");
        }
    }
}

impl<P: Platform> std::fmt::Debug for PlaybackController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("items", &self.items.len())
            .field("active", &self.active)
            .field("sessions", &self.sessions)
            .finish()
    }
}
