//! External media playback handles.
//!
//! Audio tiles and video-filled images reference a playback handle that
//! lives outside the scene (an `HTMLMediaElement` in the browser). The
//! handle is held in a `MediaSlot` which stops and releases it when the
//! slot is dropped, so removing an element from the registry is enough to
//! clean it up.

use crate::error::MediaError;
use crate::events::EditorEvent;
use crate::session::EditorSession;
use std::collections::HashMap;
use tc_core::{MediaKind, MediaRef, NodeId};

/// A live playback handle.
pub trait MediaHandle {
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Stop playback and detach the source. Called exactly once.
    fn release(&mut self);
}

/// Opens playback handles for media references.
pub trait MediaBackend {
    fn open(&mut self, media: &MediaRef) -> Result<Box<dyn MediaHandle>, MediaError>;
}

/// Backend for headless sessions: handles only track their paused state.
#[derive(Debug, Default)]
pub struct NullMediaBackend;

#[derive(Debug)]
struct NullHandle {
    paused: bool,
}

impl MediaHandle for NullHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn release(&mut self) {
        self.paused = true;
    }
}

impl MediaBackend for NullMediaBackend {
    fn open(&mut self, _media: &MediaRef) -> Result<Box<dyn MediaHandle>, MediaError> {
        Ok(Box::new(NullHandle { paused: true }))
    }
}

/// Owns one handle and releases it on drop.
pub struct MediaSlot {
    media: MediaRef,
    handle: Option<Box<dyn MediaHandle>>,
}

impl MediaSlot {
    pub fn new(media: MediaRef, handle: Box<dyn MediaHandle>) -> Self {
        Self {
            media,
            handle: Some(handle),
        }
    }

    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    pub fn play(&mut self) -> Result<(), MediaError> {
        match self.handle.as_mut() {
            Some(h) => h.play(),
            None => Err(MediaError::Unavailable(self.media.src.clone())),
        }
    }

    pub fn pause(&mut self) {
        if let Some(h) = self.handle.as_mut() {
            h.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_paused())
    }
}

impl Drop for MediaSlot {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            log::debug!("media: releasing {:?} `{}`", self.media.kind, self.media.src);
            handle.pause();
            handle.release();
        }
    }
}

impl std::fmt::Debug for MediaSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSlot")
            .field("media", &self.media)
            .field("paused", &self.is_paused())
            .finish()
    }
}

/// Media slots keyed by the element that owns them.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    slots: HashMap<NodeId, MediaSlot>,
}

impl MediaRegistry {
    /// Store a slot; any slot the element already had is released.
    pub fn insert(&mut self, id: NodeId, slot: MediaSlot) {
        self.slots.insert(id, slot);
    }

    /// Release the element's handle. Returns false if it had none.
    pub fn release(&mut self, id: NodeId) -> bool {
        self.slots.remove(&id).is_some()
    }

    pub fn release_all(&mut self) {
        self.slots.clear();
    }

    /// Keep only the slots for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId, &MediaSlot) -> bool) {
        self.slots.retain(|id, slot| keep(*id, slot));
    }

    pub fn get(&self, id: NodeId) -> Option<&MediaSlot> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MediaSlot> {
        self.slots.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Keeps redraws coming every animation frame while a video fill is on
/// the canvas, since its pixels change outside edit events.
#[derive(Debug, Default)]
pub struct FrameDriver {
    running: bool,
    ticks: u64,
}

impl FrameDriver {
    /// Start or stop. Returns true if the state changed.
    pub fn set_running(&mut self, running: bool) -> bool {
        if self.running == running {
            return false;
        }
        self.running = running;
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one frame. Returns true if a redraw is due.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.ticks += 1;
        }
        self.running
    }
}

impl EditorSession {
    /// Open a handle for `id` through the session's backend.
    pub(crate) fn open_media(&mut self, id: NodeId, media: &MediaRef) -> bool {
        match self.backend.open(media) {
            Ok(handle) => {
                self.media.insert(id, MediaSlot::new(media.clone(), handle));
                true
            }
            Err(err) => {
                log::warn!("media: cannot open `{}` for {id:?}: {err}", media.src);
                false
            }
        }
    }

    /// Try to start playback. Rejection (autoplay policy) is logged only.
    pub(crate) fn autoplay(&mut self, id: NodeId) {
        let Some(slot) = self.media.get_mut(id) else {
            return;
        };
        if let Err(err) = slot.play() {
            match slot.media().kind {
                MediaKind::Audio => log::info!("media: audio autoplay suppressed: {err}"),
                MediaKind::Video => log::error!("media: video autoplay failed: {err}"),
            }
        }
    }

    /// Run the frame driver while any video fill is attached.
    pub(crate) fn sync_frame_driver(&mut self) {
        let needed = self.scene.editable_children().into_iter().any(|id| {
            self.scene
                .get_by_id(id)
                .and_then(|n| n.media())
                .is_some_and(|m| m.kind == MediaKind::Video)
        });
        if self.frames.set_running(needed) {
            log::debug!("frames: driver {}", if needed { "started" } else { "stopped" });
            self.emit(EditorEvent::AnimationFrames(needed));
        }
    }

    /// Host callback for each animation frame.
    pub fn tick_frame(&mut self) -> bool {
        if self.frames.tick() {
            log::trace!("frames: tick {}", self.frames.ticks());
            self.emit(EditorEvent::RedrawRequested);
            return true;
        }
        false
    }

    /// Play or pause the selected media element.
    pub fn toggle_media_playback(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let Some(slot) = self.media.get_mut(id) else {
            return false;
        };
        if slot.is_paused() {
            if let Err(err) = slot.play() {
                log::error!("media: play failed: {err}");
            }
        } else {
            slot.pause();
        }
        self.refresh_floating();
        true
    }

    pub fn is_media_playing(&self, id: NodeId) -> bool {
        self.media.get(id).is_some_and(|slot| !slot.is_paused())
    }
}
