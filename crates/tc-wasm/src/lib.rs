//! WASM bridge for TC: exposes the editing core to the studio page.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the DOM and
//! the graphics library; after every call it drains `drain_events()` and
//! applies them (redraw, alerts, panels, the text overlay).

mod browser;

use browser::{BrowserMediaBackend, HtmlImageLoader, HtmlVideoProbe, JsRasterizer, MediaElements};
use js_sys::{Function, Promise};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use tc_core::parse::parse_color;
use tc_core::template::BUILTIN_KEYS;
use tc_core::{AnimationPreset, Color, NodeId, TemplateDescriptor, TextAlign};
use tc_editor::sidebar::{ChangePhase, PropertyChange};
use tc_editor::{
    CanvasEvent, EditorConfig, EditorSession, ExitTrigger, ExternalEvent, KeyInput, LoadedImage,
    TextPreset, TransformUpdate, add_video, load_image_template, load_template, load_template_by_key,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlMediaElement;

/// The main WASM-facing studio controller.
///
/// Shares the session with in-flight loads, which borrow it only between
/// suspension points.
#[wasm_bindgen]
pub struct StudioCanvas {
    session: Rc<RefCell<EditorSession>>,
    media: MediaElements,
}

#[wasm_bindgen]
impl StudioCanvas {
    /// Create a session. `config_json` may override any `EditorConfig` field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        console_setup();

        let config = match config_json.as_deref().map(EditorConfig::from_json) {
            Some(Ok(config)) => config,
            Some(Err(err)) => {
                log::warn!("config: {err}; using defaults");
                EditorConfig::default()
            }
            None => EditorConfig::default(),
        };
        let backend = BrowserMediaBackend::default();
        let media = backend.elements.clone();
        let session = EditorSession::new(config)
            .with_media_backend(Box::new(backend))
            .with_welcome();

        Self {
            session: Rc::new(RefCell::new(session)),
            media,
        }
    }

    /// Pending events as a JSON array.
    pub fn drain_events(&self) -> String {
        let events = self.session.borrow_mut().drain_events();
        serde_json::to_string(&events).unwrap_or_else(|err| {
            log::error!("events: {err}");
            "[]".to_string()
        })
    }

    /// Where the stage container sits on the page.
    pub fn set_container_origin(&self, x: f64, y: f64) {
        self.session.borrow_mut().set_container_origin(x, y);
    }

    pub fn selection(&self) -> Option<String> {
        self.session.borrow().selection().map(|id| id.to_string())
    }

    // ─── Element factory ─────────────────────────────────────────────────

    /// Add a text box: `"heading"`, `"subheading"` or `"body"`.
    pub fn add_text(&self, preset: &str) -> String {
        let id = self
            .session
            .borrow_mut()
            .add_text_preset(TextPreset::from_name(preset));
        id.to_string()
    }

    pub fn add_emoji(&self, emoji: &str) -> String {
        self.session.borrow_mut().add_emoji(emoji).to_string()
    }

    pub fn add_rectangle(&self, x: f64, y: f64, width: f64, height: f64, fill: &str) -> String {
        let fill = parse_color(fill).unwrap_or(Color::WHITE);
        let bounds = kurbo_rect(x, y, width, height);
        self.session.borrow_mut().add_rectangle(bounds, fill).to_string()
    }

    /// Add an image the page has already decoded (e.g. from a file input).
    pub fn add_image(&self, src: String, width: f64, height: f64) -> String {
        let image = LoadedImage { src, width, height };
        self.session.borrow_mut().add_image(&image).to_string()
    }

    pub fn add_audio(&self, src: &str, file_name: &str) -> String {
        self.session.borrow_mut().add_audio(src, file_name).to_string()
    }

    /// Resolves with the new element id once the video's metadata loads.
    pub fn add_video(&self, url: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            add_video(&session, &url, &HtmlVideoProbe)
                .await
                .map(|id| JsValue::from_str(id.as_str()))
                .map_err(|err| JsValue::from_str(&err.to_string()))
        })
    }

    // ─── Templates ───────────────────────────────────────────────────────

    /// Load a built-in template (`carousel1` ..).
    pub fn load_template(&self, key: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            load_template_by_key(&session, &key, &HtmlImageLoader)
                .await
                .map(|_| JsValue::TRUE)
                .map_err(|err| JsValue::from_str(&err.to_string()))
        })
    }

    /// Load a template from its JSON descriptor.
    pub fn load_template_json(&self, json: &str) -> Promise {
        let descriptor = match TemplateDescriptor::from_json(json) {
            Ok(d) => d,
            Err(err) => return Promise::reject(&JsValue::from_str(&err.to_string())),
        };
        let session = self.session.clone();
        future_to_promise(async move {
            load_template(&session, descriptor, &HtmlImageLoader)
                .await
                .map(|_| JsValue::TRUE)
                .map_err(|err| JsValue::from_str(&err.to_string()))
        })
    }

    /// Use a single image as a full-canvas template.
    pub fn load_template_url(&self, url: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            load_image_template(&session, &url, &HtmlImageLoader)
                .await
                .map(|id| JsValue::from_str(id.as_str()))
                .map_err(|err| JsValue::from_str(&err.to_string()))
        })
    }

    pub fn template_keys(&self) -> String {
        serde_json::to_string(&BUILTIN_KEYS).unwrap_or_else(|_| "[]".to_string())
    }

    /// Feed a collaborator event (`template:apply`, `video:apply`,
    /// `sidebar:loaded`, `templates:open`). Returns false for unknown
    /// events or a missing url.
    pub fn dispatch_event(&self, name: &str, detail_json: Option<String>) -> bool {
        let Some(event) = ExternalEvent::parse(name, detail_json.as_deref()) else {
            log::debug!("external: ignored `{name}`");
            return false;
        };
        match event {
            ExternalEvent::TemplateApply { url } => {
                let session = self.session.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = load_image_template(&session, &url, &HtmlImageLoader).await;
                });
                true
            }
            ExternalEvent::VideoApply { url } => {
                let session = self.session.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = add_video(&session, &url, &HtmlVideoProbe).await;
                });
                true
            }
            other => self.session.borrow_mut().handle_external(&other),
        }
    }

    // ─── Selection & toolbar ─────────────────────────────────────────────

    pub fn select(&self, id: &str) -> bool {
        self.session.borrow_mut().select(NodeId::intern(id))
    }

    pub fn deselect(&self) {
        self.session.borrow_mut().deselect();
    }

    pub fn delete_selection(&self) -> bool {
        self.session.borrow_mut().delete_selection()
    }

    pub fn duplicate_selection(&self) -> Option<String> {
        self.session
            .borrow_mut()
            .duplicate_selection()
            .map(|id| id.to_string())
    }

    pub fn bring_to_front(&self) -> bool {
        self.session.borrow_mut().bring_to_front()
    }

    pub fn send_to_back(&self) -> bool {
        self.session.borrow_mut().send_to_back()
    }

    pub fn toggle_bold(&self) -> bool {
        self.session.borrow_mut().toggle_bold()
    }

    pub fn toggle_italic(&self) -> bool {
        self.session.borrow_mut().toggle_italic()
    }

    pub fn increase_font_size(&self) -> bool {
        self.session.borrow_mut().increase_font_size()
    }

    pub fn decrease_font_size(&self) -> bool {
        self.session.borrow_mut().decrease_font_size()
    }

    pub fn toggle_media_playback(&self) -> bool {
        self.session.borrow_mut().toggle_media_playback()
    }

    /// The live media element behind an audio/video source, for the
    /// graphics layer to paint video frames from.
    pub fn media_element(&self, src: &str) -> Option<HtmlMediaElement> {
        self.media.borrow().get(src).cloned()
    }

    /// Apply a sidebar edit. `value_json` is the control's value as JSON.
    /// `commit` is false while a slider is being dragged.
    pub fn set_property(&self, name: &str, value_json: &str, commit: bool) -> bool {
        let Some(change) = parse_property(name, value_json) else {
            log::warn!("sidebar: bad value for `{name}`: {value_json}");
            return false;
        };
        let phase = if commit {
            ChangePhase::Commit
        } else {
            ChangePhase::Preview
        };
        self.session.borrow_mut().apply_property(change, phase)
    }

    pub fn finish_property_gesture(&self) -> bool {
        self.session.borrow_mut().finish_property_gesture()
    }

    pub fn set_canvas_color(&self, css: &str) -> bool {
        let Some(color) = parse_color(css) else {
            return false;
        };
        self.session.borrow_mut().set_canvas_color(color);
        true
    }

    // ─── Pointer events from the graphics layer ──────────────────────────

    /// Click on a node (`None` = stage background).
    pub fn click(&self, id: Option<String>) -> bool {
        let target = id.as_deref().map(NodeId::intern);
        self.session.borrow_mut().dispatch(CanvasEvent::Click { target })
    }

    pub fn click_at(&self, x: f64, y: f64) -> bool {
        self.session.borrow_mut().click_at(x, y)
    }

    pub fn double_click(&self, id: Option<String>) -> bool {
        let target = id.as_deref().map(NodeId::intern);
        self.session
            .borrow_mut()
            .dispatch(CanvasEvent::DoubleClick { target })
    }

    pub fn drag_move(&self, id: &str, x: f32, y: f32) -> bool {
        self.session.borrow_mut().dispatch(CanvasEvent::DragMove {
            target: NodeId::intern(id),
            x,
            y,
        })
    }

    pub fn drag_end(&self, id: &str, x: f32, y: f32) -> bool {
        self.session.borrow_mut().dispatch(CanvasEvent::DragEnd {
            target: NodeId::intern(id),
            x,
            y,
        })
    }

    pub fn transform_end(
        &self,
        id: &str,
        x: f32,
        y: f32,
        rotation: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> bool {
        self.session.borrow_mut().dispatch(CanvasEvent::TransformEnd {
            target: NodeId::intern(id),
            transform: TransformUpdate {
                x,
                y,
                rotation,
                scale_x,
                scale_y,
            },
        })
    }

    // ─── Text overlay ────────────────────────────────────────────────────

    // Tokens cross the boundary as JS numbers.

    /// Overlay lost focus.
    pub fn text_overlay_blur(&self, token: f64, value: &str) -> bool {
        self.session
            .borrow_mut()
            .finish_text_edit(token as u64, value, ExitTrigger::Blur)
    }

    /// Key pressed in the overlay. Returns true if the host should call
    /// `preventDefault()`.
    pub fn text_overlay_key(&self, token: f64, key: &str, shift: bool, value: &str) -> bool {
        self.session
            .borrow_mut()
            .overlay_key(token as u64, key, shift, value)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a page-level keydown. Returns `{"handled":..,"preventDefault":..}`.
    pub fn handle_key(
        &self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        typing: bool,
    ) -> String {
        let outcome = self.session.borrow_mut().handle_key(&KeyInput {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
            typing,
        });
        format!(
            r#"{{"handled":{},"preventDefault":{}}}"#,
            outcome.handled, outcome.prevent_default
        )
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&self) -> bool {
        self.session.borrow_mut().undo()
    }

    pub fn redo(&self) -> bool {
        self.session.borrow_mut().redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.borrow().history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.borrow().history().can_redo()
    }

    // ─── Stage, frames, export ───────────────────────────────────────────

    pub fn resize_canvas(&self, width: f64, height: f64) -> bool {
        self.session.borrow_mut().resize_canvas(width, height)
    }

    /// Apply a `"1080x1350"`-style preset and record it in history.
    pub fn apply_size_preset(&self, preset: &str) -> bool {
        self.session.borrow_mut().apply_size_preset(preset)
    }

    /// Call from `requestAnimationFrame` while `animationFrames` is on.
    pub fn tick_frame(&self) -> bool {
        self.session.borrow_mut().tick_frame()
    }

    /// Export through `rasterize(sceneJson, requestJson) => dataUrl`.
    /// Returns `{"fileName","mime","dataUrl"}`.
    pub fn export(&self, rasterize: Function) -> Result<String, JsValue> {
        let mut rasterizer = JsRasterizer { callback: rasterize };
        let blob = self
            .session
            .borrow()
            .export(&mut rasterizer)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(serde_json::json!({
            "fileName": blob.file_name,
            "mime": blob.mime,
            "dataUrl": blob.data_url,
        })
        .to_string())
    }

    pub fn scene_json(&self) -> Result<String, JsValue> {
        self.session
            .borrow()
            .scene_json()
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }
}

fn kurbo_rect(x: f64, y: f64, width: f64, height: f64) -> tc_core::kurbo::Rect {
    tc_core::kurbo::Rect::new(x, y, x + width.max(0.0), y + height.max(0.0))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShadowValue {
    color: Color,
    offset_x: f32,
    offset_y: f32,
}

/// Decode a sidebar control value into a `PropertyChange`.
fn parse_property(name: &str, value_json: &str) -> Option<PropertyChange> {
    fn value<'a, T: Deserialize<'a>>(json: &'a str) -> Option<T> {
        serde_json::from_str(json).ok()
    }
    let change = match name {
        "fill" => PropertyChange::Fill(value(value_json)?),
        "opacity" => PropertyChange::Opacity(value(value_json)?),
        "fontFamily" => PropertyChange::FontFamily(value(value_json)?),
        "align" => PropertyChange::Align(value::<TextAlign>(value_json)?),
        "lineHeight" => PropertyChange::LineHeight(value(value_json)?),
        "letterSpacing" => PropertyChange::LetterSpacing(value(value_json)?),
        "strokeColor" => PropertyChange::StrokeColor(value(value_json)?),
        "strokeWidth" => PropertyChange::StrokeWidth(value(value_json)?),
        "shadowEnabled" => PropertyChange::ShadowEnabled(value(value_json)?),
        "shadow" => {
            let shadow: ShadowValue = value(value_json)?;
            PropertyChange::Shadow {
                color: shadow.color,
                offset_x: shadow.offset_x,
                offset_y: shadow.offset_y,
            }
        }
        "animation" => {
            let name: String = value(value_json)?;
            PropertyChange::Animation(AnimationPreset::from_name(&name)?)
        }
        _ => return None,
    };
    Some(change)
}

/// Route panics and `log` records to the browser console.
fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("TC WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if let Err(err) = console_log::init_with_level(log::Level::Info) {
                web_sys::console::warn_1(&format!("TC WASM logger: {err}").into());
            }
        });
    }
}
