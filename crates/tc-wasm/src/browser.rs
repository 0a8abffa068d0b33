//! Browser-backed collaborators: image decoding, video metadata, media
//! playback and rasterization through the page's graphics library.

use js_sys::{Function, Promise};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tc_core::{MediaKind, MediaRef, SceneGraph, snapshot};
use tc_editor::{
    ExportError, ExportRequest, ImageLoader, LoadError, LoadedImage, MediaBackend, MediaError,
    MediaHandle, Rasterizer, VideoMetadata, VideoProbe,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{EventTarget, HtmlAudioElement, HtmlImageElement, HtmlMediaElement, HtmlVideoElement};

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Resolves on the first `ok` event, rejects on the first `err` event.
/// Listeners are attached immediately, before the caller sets `src`.
fn wait_for(target: &EventTarget, ok: &str, err: &str) -> JsFuture {
    let promise = Promise::new(&mut |resolve: Function, reject: Function| {
        let _ = target.add_event_listener_with_callback(ok, &resolve);
        let _ = target.add_event_listener_with_callback(err, &reject);
    });
    JsFuture::from(promise)
}

fn video_element() -> Result<HtmlVideoElement, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?
        .create_element("video")?
        .dyn_into::<HtmlVideoElement>()
        .map_err(|_| JsValue::from_str("not a video element"))
}

// ─── Images ──────────────────────────────────────────────────────────────

/// Decodes images with `HtmlImageElement` (`onload` / `onerror`).
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
    async fn load(&self, src: &str) -> Result<LoadedImage, LoadError> {
        let fail = |reason: String| LoadError::Image {
            src: src.to_string(),
            reason,
        };
        let img = HtmlImageElement::new().map_err(|e| fail(describe(&e)))?;
        img.set_cross_origin(Some("anonymous"));
        let ready = wait_for(&img, "load", "error");
        img.set_src(src);
        ready.await.map_err(|e| fail(describe(&e)))?;
        Ok(LoadedImage {
            src: src.to_string(),
            width: f64::from(img.natural_width()),
            height: f64::from(img.natural_height()),
        })
    }
}

// ─── Video metadata ──────────────────────────────────────────────────────

/// Reads intrinsic video size from `loadedmetadata`.
pub struct HtmlVideoProbe;

impl VideoProbe for HtmlVideoProbe {
    async fn probe(&self, src: &str) -> Result<VideoMetadata, LoadError> {
        let fail = |reason: String| LoadError::Video {
            src: src.to_string(),
            reason,
        };
        let video = video_element().map_err(|e| fail(describe(&e)))?;
        video.set_preload("metadata");
        let ready = wait_for(&video, "loadedmetadata", "error");
        video.set_src(src);
        ready.await.map_err(|e| fail(describe(&e)))?;
        let meta = VideoMetadata {
            width: f64::from(video.video_width()),
            height: f64::from(video.video_height()),
        };
        video.remove_attribute("src").ok();
        video.load();
        Ok(meta)
    }
}

// ─── Playback ────────────────────────────────────────────────────────────

/// Media elements currently owned by canvas elements, keyed by source.
/// The graphics layer reads video frames from these.
pub type MediaElements = Rc<RefCell<HashMap<String, HtmlMediaElement>>>;

pub struct BrowserMediaHandle {
    src: String,
    element: HtmlMediaElement,
    elements: MediaElements,
}

impl MediaHandle for BrowserMediaHandle {
    fn play(&mut self) -> Result<(), MediaError> {
        let promise = self
            .element
            .play()
            .map_err(|e| MediaError::PlaybackRejected(describe(&e)))?;
        // Autoplay rejection arrives asynchronously; it is only logged.
        let src = self.src.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                log::info!("media: playback of `{src}` rejected: {}", describe(&err));
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(err) = self.element.pause() {
            log::warn!("media: pause failed: {}", describe(&err));
        }
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn release(&mut self) {
        self.element.remove_attribute("src").ok();
        self.element.load();
        let mut elements = self.elements.borrow_mut();
        let owned = elements
            .get(&self.src)
            .is_some_and(|e| js_sys::Object::is(e.as_ref(), self.element.as_ref()));
        if owned {
            elements.remove(&self.src);
        }
    }
}

#[derive(Default)]
pub struct BrowserMediaBackend {
    pub elements: MediaElements,
}

impl BrowserMediaBackend {
    fn element_for(media: &MediaRef) -> Result<HtmlMediaElement, JsValue> {
        match media.kind {
            MediaKind::Audio => {
                let audio = HtmlAudioElement::new_with_src(&media.src)?;
                audio.set_loop(true);
                Ok(audio.unchecked_into())
            }
            MediaKind::Video => {
                let video = video_element()?;
                video.set_src(&media.src);
                // Muted so autoplay is allowed.
                video.set_muted(true);
                video.set_loop(true);
                Ok(video.unchecked_into())
            }
        }
    }
}

impl MediaBackend for BrowserMediaBackend {
    fn open(&mut self, media: &MediaRef) -> Result<Box<dyn MediaHandle>, MediaError> {
        let element =
            Self::element_for(media).map_err(|e| MediaError::Unavailable(describe(&e)))?;
        self.elements
            .borrow_mut()
            .insert(media.src.clone(), element.clone());
        Ok(Box::new(BrowserMediaHandle {
            src: media.src.clone(),
            element,
            elements: self.elements.clone(),
        }))
    }
}

// ─── Export ──────────────────────────────────────────────────────────────

/// Delegates rendering to a JS callback:
/// `(sceneJson: string, requestJson: string) => dataUrl`.
pub struct JsRasterizer {
    pub callback: Function,
}

impl Rasterizer for JsRasterizer {
    fn rasterize(&mut self, scene: &SceneGraph, request: &ExportRequest) -> Result<String, ExportError> {
        let scene_json = snapshot::to_json(&snapshot::serialize(scene)?)?;
        let request_json =
            serde_json::to_string(request).map_err(|e| ExportError::Rasterizer(e.to_string()))?;
        let result = self
            .callback
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(&scene_json),
                &JsValue::from_str(&request_json),
            )
            .map_err(|e| ExportError::Rasterizer(describe(&e)))?;
        result
            .as_string()
            .ok_or_else(|| ExportError::Rasterizer("callback did not return a data URL".into()))
    }
}
