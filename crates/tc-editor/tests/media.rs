//! Integration tests: video-backed images, the frame driver and media
//! playback.

use futures::executor::block_on;
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tc_core::{ImageFill, MediaRef, NodeKind};
use tc_editor::{
    EditorConfig, EditorEvent, EditorSession, LoadError, MediaBackend, MediaError, MediaHandle,
    VideoMetadata, VideoProbe, add_video,
};

/// Reports fixed metadata, or fails for one source.
struct FixedMetadata {
    broken: Option<&'static str>,
}

impl VideoProbe for FixedMetadata {
    async fn probe(&self, src: &str) -> Result<VideoMetadata, LoadError> {
        if self.broken == Some(src) {
            return Err(LoadError::Video {
                src: src.to_string(),
                reason: "MEDIA_ERR_SRC_NOT_SUPPORTED".into(),
            });
        }
        Ok(VideoMetadata {
            width: 1920.0,
            height: 1080.0,
        })
    }
}

const WORKING: FixedMetadata = FixedMetadata { broken: None };

/// Handles that always honor `play`, sharing an open-handle count.
#[derive(Default)]
struct PlayableBackend {
    open: Rc<Cell<u32>>,
}

struct PlayableHandle {
    paused: bool,
    open: Rc<Cell<u32>>,
}

impl MediaHandle for PlayableHandle {
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
        self.open.set(self.open.get() - 1);
    }
}

impl MediaBackend for PlayableBackend {
    fn open(&mut self, _media: &MediaRef) -> Result<Box<dyn MediaHandle>, MediaError> {
        self.open.set(self.open.get() + 1);
        Ok(Box::new(PlayableHandle {
            paused: true,
            open: self.open.clone(),
        }))
    }
}

fn shared(backend: PlayableBackend) -> Rc<RefCell<EditorSession>> {
    let _ = env_logger::builder().is_test(true).try_init();
    Rc::new(RefCell::new(
        EditorSession::new(EditorConfig::default()).with_media_backend(Box::new(backend)),
    ))
}

fn frame_events(session: &mut EditorSession) -> Vec<bool> {
    session
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::AnimationFrames(running) => Some(running),
            _ => None,
        })
        .collect()
}

#[test]
fn video_is_sized_from_metadata_and_drives_frames() {
    let backend = PlayableBackend::default();
    let open = backend.open.clone();
    let session = shared(backend);

    let id = block_on(add_video(&session, "blob:clip", &WORKING)).unwrap();

    let mut s = session.borrow_mut();
    assert_eq!(s.elements(), vec![id]);
    assert_eq!(s.selection(), Some(id));
    assert_eq!(s.history().len(), 2);
    let node = s.node(id).unwrap();
    assert!(matches!(
        &node.kind,
        NodeKind::Image(props) if props.fill == ImageFill::VideoFrame { src: "blob:clip".into() }
    ));
    // 16:9 fitted into 300x550 is width-bound.
    assert!((node.attrs.width - 300.0).abs() < 1e-3);
    assert!((node.attrs.height - 168.75).abs() < 1e-3);
    assert!((node.attrs.y - 190.625).abs() < 1e-3);

    assert_eq!(open.get(), 1);
    assert!(s.is_media_playing(id));
    assert!(s.frames().is_running());
    assert_eq!(frame_events(&mut s), vec![true]);
    assert!(s.tick_frame());
}

#[test]
fn frame_driver_follows_the_video_through_delete_and_undo() {
    let backend = PlayableBackend::default();
    let open = backend.open.clone();
    let session = shared(backend);
    let id = block_on(add_video(&session, "blob:clip", &WORKING)).unwrap();

    let mut s = session.borrow_mut();
    s.drain_events();
    assert!(s.delete_selection());
    assert!(!s.frames().is_running());
    assert!(!s.tick_frame());
    assert_eq!(open.get(), 0);
    assert_eq!(frame_events(&mut s), vec![false]);

    assert!(s.undo());
    assert!(s.node(id).is_some());
    assert!(s.frames().is_running());
    assert_eq!(open.get(), 1);
    assert!(!s.is_media_playing(id), "restored media comes back paused");

    assert!(s.undo());
    assert!(s.elements().is_empty());
    assert!(!s.frames().is_running());
    assert_eq!(open.get(), 0);
    assert_eq!(frame_events(&mut s), vec![true, false]);
}

#[test]
fn failed_metadata_leaves_the_canvas_alone() {
    let session = shared(PlayableBackend::default());
    let broken = FixedMetadata {
        broken: Some("blob:bad"),
    };

    let err = block_on(add_video(&session, "blob:bad", &broken)).unwrap_err();
    assert!(matches!(err, LoadError::Video { .. }));

    let mut s = session.borrow_mut();
    assert!(s.elements().is_empty());
    assert_eq!(s.history().len(), 1);
    assert!(!s.frames().is_running());
    assert!(s.media().is_empty());
    let notices: Vec<String> = s
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Notify(msg) => Some(msg),
            _ => None,
        })
        .collect();
    assert_eq!(notices, vec!["Failed to load video: blob:bad".to_string()]);
}

#[test]
fn toggle_flips_playback_of_the_selected_media() {
    let session = shared(PlayableBackend::default());
    let mut s = session.borrow_mut();
    let tile = s.add_audio("blob:song", "song.mp3");
    assert!(s.is_media_playing(tile), "autoplay starts the tile");

    assert!(s.toggle_media_playback());
    assert!(!s.is_media_playing(tile));
    assert!(s.toggle_media_playback());
    assert!(s.is_media_playing(tile));

    s.deselect();
    assert!(!s.toggle_media_playback(), "nothing selected");
    assert!(s.is_media_playing(tile));
}
