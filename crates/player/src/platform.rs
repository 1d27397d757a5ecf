// ABOUTME: Seams to the host media stack: media element, streaming engine, and platform factory.
// ABOUTME: Platform callbacks flow back as generation-tagged SlotEvents over an unbounded channel.

use tokio::sync::mpsc::UnboundedSender;

use crate::machine::PlaybackEvent;
use crate::network::NetworkProfile;

/// Index of an item within the controller's item list.
pub type SlotId = usize;

/// Attachment counter; a session draws a new one on every setup and release.
pub type Generation = u64;

/// A platform callback addressed to one session attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEvent {
    pub slot: SlotId,
    pub generation: Generation,
    pub event: PlaybackEvent,
}

/// Handle given to media elements and engines for reporting events.
///
/// Events carry the generation that was current when the sink was made,
/// so callbacks from a released attachment are recognised and discarded.
#[derive(Debug, Clone)]
pub struct EventSink {
    slot: SlotId,
    generation: Generation,
    tx: UnboundedSender<SlotEvent>,
}

impl EventSink {
    pub fn new(slot: SlotId, generation: Generation, tx: UnboundedSender<SlotEvent>) -> Self {
        Self { slot, generation, tx }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns false once the receiving controller is gone.
    pub fn emit(&self, event: PlaybackEvent) -> bool {
        self.tx
            .send(SlotEvent {
                slot: self.slot,
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// A single media output surface.
///
/// `play` is fire-and-forget; the outcome arrives as `PlayStarted` or
/// `PlayRejected` through the current sink.
pub trait MediaElement: Send {
    /// Replaces the sink that receives this element's events.
    fn listen(&mut self, sink: EventSink);
    fn set_source(&mut self, url: &str, content_type: &str);
    fn load(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn play(&mut self);
    fn pause(&mut self);
    fn clear_source(&mut self);
}

/// An adaptive-stream engine bound to one media element at a time.
pub trait StreamingEngine: Send {
    fn attach_media(&mut self, media: &mut dyn MediaElement);
    fn load_source(&mut self, url: &str);
    fn recover_media_error(&mut self);
    fn detach_media(&mut self);
    fn destroy(&mut self);
}

/// Factory for media elements and engines.
pub trait Platform: Send + Sync {
    type Media: MediaElement;
    type Engine: StreamingEngine;

    /// Whether media elements play adaptive streams without an engine.
    fn supports_native_adaptive(&self) -> bool;

    fn create_media(&self) -> Self::Media;

    /// Creates an engine configured with `profile`, reporting through `sink`.
    fn create_engine(&self, profile: &NetworkProfile, sink: EventSink) -> Self::Engine;
}

/// Shared source of generations; sessions drawing from one source never reuse a value.
#[derive(Debug, Clone, Default)]
pub struct Generations(std::sync::Arc<std::sync::atomic::AtomicU64>);

impl Generations {
    pub fn next(&self) -> Generation {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1
    }
}
