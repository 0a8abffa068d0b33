//! Element factory.
//!
//! Pure constructors build fully configured nodes; the session methods
//! place them on the canvas, install bindings, and record history.

use crate::error::LoadError;
use crate::events::EditorEvent;
use crate::session::EditorSession;
use kurbo::{Rect, Size};
use std::cell::RefCell;
use std::rc::Rc;
use tc_core::geometry::{centered_origin, fit_to, fit_within};
use tc_core::{
    Color, GroupProps, ImageFill, ImageProps, MediaKind, MediaRef, NodeId, NodeKind, RectProps,
    SceneNode, TextAlign, TextProps, TextWrap, VerticalAlign,
};

pub const EMOJI_FONT_STACK: &str = "Segoe UI Emoji, Apple Color Emoji, sans-serif";
const AUDIO_ICON_FILL: Color = Color::rgb(0x05, 0xEA, 0xFA);
const AUDIO_LABEL_FILL: Color = Color::rgb(0x14, 0x14, 0x14);

/// A decoded bitmap with its intrinsic size.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub src: String,
    pub width: f64,
    pub height: f64,
}

impl LoadedImage {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Intrinsic dimensions of a video, known once its metadata loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: f64,
    pub height: f64,
}

/// Reads video metadata without decoding frames.
#[allow(async_fn_in_trait)]
pub trait VideoProbe {
    async fn probe(&self, src: &str) -> Result<VideoMetadata, LoadError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub text: String,
    pub font_size: f32,
    pub fill: Color,
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            text: "Body text here.".into(),
            font_size: 16.0,
            fill: Color::WHITE,
            x: 50.0,
            y: 150.0,
            align: TextAlign::Left,
        }
    }
}

/// Text styles offered in the text panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPreset {
    Heading,
    Subheading,
    Body,
}

impl TextPreset {
    pub fn from_name(name: &str) -> Self {
        match name {
            "heading" => Self::Heading,
            "subheading" => Self::Subheading,
            _ => Self::Body,
        }
    }

    pub fn options(self) -> TextOptions {
        let (text, font_size) = match self {
            Self::Heading => ("HEADING TEXT", 36.0),
            Self::Subheading => ("Subheading text here", 24.0),
            Self::Body => ("Body text here.", 16.0),
        };
        TextOptions {
            text: text.into(),
            font_size,
            ..Default::default()
        }
    }
}

// ─── Constructors ────────────────────────────────────────────────────────

/// Word-wrapped text box spanning the canvas minus the margin.
pub fn build_text(opts: &TextOptions, canvas_width: f64, margin: f32) -> SceneNode {
    let mut node = SceneNode::editable(
        NodeId::with_prefix("text"),
        NodeKind::Text(TextProps {
            text: opts.text.clone(),
            font_size: opts.font_size,
            fill: Some(opts.fill),
            align: opts.align,
            wrap: TextWrap::Word,
            ..Default::default()
        }),
    );
    node.attrs.x = opts.x;
    node.attrs.y = opts.y;
    node.attrs.width = (canvas_width as f32 - margin).max(0.0);
    node
}

/// A single emoji glyph centered on the canvas.
pub fn build_emoji(emoji: &str, font_size: f32, canvas: Size) -> SceneNode {
    let mut node = SceneNode::editable(
        NodeId::with_prefix("text"),
        NodeKind::Text(TextProps {
            text: emoji.to_string(),
            font_size,
            font_family: EMOJI_FONT_STACK.into(),
            fill: Some(Color::WHITE),
            ..Default::default()
        }),
    );
    node.attrs.x = (canvas.width / 2.0) as f32 - font_size / 2.0;
    node.attrs.y = (canvas.height / 2.0) as f32 - font_size / 2.0;
    node
}

pub fn build_rect(bounds: Rect, fill: Color) -> SceneNode {
    let mut node = SceneNode::editable(
        NodeId::with_prefix("rect"),
        NodeKind::Rect(RectProps {
            fill: Some(fill),
            corner_radius: 0.0,
        }),
    );
    node.attrs.x = bounds.x0 as f32;
    node.attrs.y = bounds.y0 as f32;
    node.attrs.width = bounds.width() as f32;
    node.attrs.height = bounds.height() as f32;
    node
}

fn image_node(fill: ImageFill, size: Size, canvas: Size) -> SceneNode {
    let origin = centered_origin(size, canvas);
    let mut node = SceneNode::editable(
        NodeId::with_prefix("image"),
        NodeKind::Image(ImageProps {
            fill,
            background: None,
        }),
    );
    node.attrs.x = origin.x as f32;
    node.attrs.y = origin.y as f32;
    node.attrs.width = size.width as f32;
    node.attrs.height = size.height as f32;
    node
}

/// Uploaded bitmap, shrunk to `ratio` of the canvas and centered.
pub fn build_image(image: &LoadedImage, canvas: Size, ratio: f64) -> SceneNode {
    let size = fit_within(image.size(), canvas * ratio);
    image_node(
        ImageFill::Bitmap {
            src: image.src.clone(),
        },
        size,
        canvas,
    )
}

/// Template bitmap scaled to fill the canvas and centered.
pub fn build_template_image(image: &LoadedImage, canvas: Size) -> SceneNode {
    let size = fit_to(image.size(), canvas);
    image_node(
        ImageFill::Bitmap {
            src: image.src.clone(),
        },
        size,
        canvas,
    )
}

/// Image painted with the live frame of a video, on a black backdrop.
pub fn build_video(src: &str, meta: VideoMetadata, canvas: Size) -> SceneNode {
    let size = fit_to(Size::new(meta.width, meta.height), canvas);
    let mut node = image_node(ImageFill::VideoFrame { src: src.to_string() }, size, canvas);
    if let NodeKind::Image(props) = &mut node.kind {
        props.background = Some(Color::BLACK);
    }
    node
}

/// The audio tile: a rounded icon and a label inside one draggable group.
/// Returns the group and its two non-listening children.
pub fn build_audio(src: &str, file_name: &str, tile: f32, canvas: Size) -> (SceneNode, [SceneNode; 2]) {
    let mut group = SceneNode::editable(
        NodeId::with_prefix("group"),
        NodeKind::Group(GroupProps {
            media: Some(MediaRef {
                kind: MediaKind::Audio,
                src: src.to_string(),
            }),
        }),
    );
    group.attrs.x = (canvas.width / 2.0) as f32 - tile / 2.0;
    group.attrs.y = (canvas.height / 2.0) as f32 - tile / 2.0;
    group.attrs.width = tile;
    group.attrs.height = tile;

    let mut icon = SceneNode::new(
        NodeId::with_prefix("rect"),
        NodeKind::Rect(RectProps {
            fill: Some(AUDIO_ICON_FILL),
            corner_radius: 10.0,
        }),
    );
    icon.attrs.width = tile;
    icon.attrs.height = tile;
    icon.attrs.listening = false;

    let mut label = SceneNode::new(
        NodeId::with_prefix("text"),
        NodeKind::Text(TextProps {
            text: format!("🎵\n{file_name}"),
            font_size: 30.0,
            font_family: "Arial".into(),
            fill: Some(AUDIO_LABEL_FILL),
            align: TextAlign::Center,
            vertical_align: VerticalAlign::Middle,
            ..Default::default()
        }),
    );
    label.attrs.width = tile;
    label.attrs.height = tile;
    label.attrs.listening = false;

    (group, [icon, label])
}

// ─── Session operations ──────────────────────────────────────────────────

impl EditorSession {
    fn canvas(&self) -> Size {
        self.viewport.size()
    }

    /// Add a text box, select it and commit.
    pub fn add_text(&mut self, opts: TextOptions) -> NodeId {
        let node = build_text(&opts, self.viewport.width, self.config.text_margin);
        let id = node.id;
        self.attach(node);
        self.select(id);
        self.commit();
        id
    }

    pub fn add_text_preset(&mut self, preset: TextPreset) -> NodeId {
        self.add_text(preset.options())
    }

    pub fn add_emoji(&mut self, emoji: &str) -> NodeId {
        let node = build_emoji(emoji.trim(), self.config.emoji_font_size, self.canvas());
        let id = node.id;
        self.attach(node);
        self.commit();
        self.select(id);
        id
    }

    /// Add a filled rectangle at the back of the z-order.
    pub fn add_rectangle(&mut self, bounds: Rect, fill: Color) -> NodeId {
        let node = build_rect(bounds, fill);
        let id = node.id;
        self.attach(node);
        self.scene.move_to_bottom(id);
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        id
    }

    /// Add an uploaded image, shrunk to fit and centered.
    pub fn add_image(&mut self, image: &LoadedImage) -> NodeId {
        let node = build_image(image, self.canvas(), self.config.image_fit_ratio);
        let id = node.id;
        self.attach(node);
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        id
    }

    /// Add an audio tile and try to start playback.
    pub fn add_audio(&mut self, src: &str, file_name: &str) -> NodeId {
        let (group, children) = build_audio(src, file_name, self.config.audio_tile_size, self.canvas());
        let id = group.id;
        let media = group.media();
        let idx = self.attach(group);
        for child in children {
            self.scene.add_child(idx, child);
        }
        if let Some(media) = media {
            self.open_media(id, &media);
        }
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        self.select(id);
        self.autoplay(id);
        self.refresh_floating();
        id
    }

    /// Place a video once its metadata has been read.
    pub fn finish_video(&mut self, src: &str, meta: VideoMetadata) -> NodeId {
        let node = build_video(src, meta, self.canvas());
        let id = node.id;
        let media = node.media();
        self.attach(node);
        if let Some(media) = media {
            self.open_media(id, &media);
        }
        self.sync_frame_driver();
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        self.autoplay(id);
        self.select(id);
        id
    }

    /// Place a template image fitted to the canvas, replacing the welcome text.
    pub fn finish_image_template(&mut self, image: &LoadedImage) -> NodeId {
        let node = build_template_image(image, self.canvas());
        let id = node.id;
        self.attach(node);
        self.select(id);
        self.remove_welcome();
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        id
    }
}

/// Probe a video and add it to the canvas.
pub async fn add_video<P: VideoProbe>(
    session: &Rc<RefCell<EditorSession>>,
    src: &str,
    probe: &P,
) -> Result<NodeId, LoadError> {
    match probe.probe(src).await {
        Ok(meta) => Ok(session.borrow_mut().finish_video(src, meta)),
        Err(err) => {
            log::error!("video: {err}");
            session
                .borrow_mut()
                .emit(EditorEvent::Notify(format!("Failed to load video: {src}")));
            Err(err)
        }
    }
}

/// Load a single image from a URL as a full-canvas template.
pub async fn load_image_template<L: crate::pipeline::ImageLoader>(
    session: &Rc<RefCell<EditorSession>>,
    url: &str,
    loader: &L,
) -> Result<NodeId, LoadError> {
    match loader.load(url).await {
        Ok(image) => Ok(session.borrow_mut().finish_image_template(&image)),
        Err(err) => {
            log::error!("template image: {err}");
            session
                .borrow_mut()
                .emit(EditorEvent::Notify(format!("Failed to load template image: {url}")));
            Err(err)
        }
    }
}
