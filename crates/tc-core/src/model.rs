//! Canvas element model.
//!
//! Every node on the canvas is a `SceneNode`: an interned id, a closed
//! `NodeKind` carrying the variant-specific properties, the common `Attrs`
//! shared by all variants, and the runtime `Bindings` that decide how the
//! node reacts to pointer events. Bindings are never serialized; they are
//! derived from the variant whenever a node enters the scene.

use crate::id::NodeId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// Marker name carried by user content nodes. Control nodes (the transform
/// overlay) never carry it, so snapshots and restores can tell them apart.
pub const EDITABLE_TAG: &str = "editable-shape";

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color, serialized as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                let a = match bytes.get(3) {
                    Some(&c) => hex_val(c)?,
                    None => 0xF,
                };
                Some(Self::rgba(r * 17, g * 17, b * 17, a * 17))
            }
            6 | 8 => {
                let pair = |i: usize| -> Option<u8> {
                    Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?)
                };
                let a = if bytes.len() == 8 { pair(6)? } else { 255 };
                Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, a))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::parse::parse_color(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Shadow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub enabled: bool,
    pub color: Color,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::BLACK,
            offset_x: 5.0,
            offset_y: 5.0,
            blur: 0.0,
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Bold / italic flags. Emitted in CSS order: `"bold italic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub fn as_css(&self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "normal",
            (true, false) => "bold",
            (false, true) => "italic",
            (true, true) => "bold italic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextWrap {
    #[default]
    Word,
    Char,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_style: FontStyle,
    pub fill: Option<Color>,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub line_height: f32,
    pub letter_spacing: f32,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub wrap: TextWrap,
    pub padding: f32,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Arial".into(),
            font_size: 12.0,
            font_style: FontStyle::default(),
            fill: None,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            letter_spacing: 0.0,
            stroke: None,
            stroke_width: 0.0,
            wrap: TextWrap::Word,
            padding: 0.0,
        }
    }
}

// ─── Media ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Reference to an external media source. The playback handle itself is
/// owned by the editor session, keyed by element id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub src: String,
}

/// What paints an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageFill {
    /// A decoded bitmap (URL or data URL).
    Bitmap { src: String },
    /// The live frame of a video, updated every animation frame.
    VideoFrame { src: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProps {
    pub fill: ImageFill,
    /// Painted behind the bitmap (e.g. black while a video buffers).
    pub background: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RectProps {
    pub fill: Option<Color>,
    pub corner_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupProps {
    pub media: Option<MediaRef>,
}

// ─── Animation ───────────────────────────────────────────────────────────

/// Entrance animation preset. Only the choice is stored; playing it is up
/// to the graphics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPreset {
    #[default]
    None,
    FadeJiggle,
    SlideInLeft,
    ZoomIn,
}

impl AnimationPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "fade_jiggle" => Some(Self::FadeJiggle),
            "slide_in_left" => Some(Self::SlideInLeft),
            "zoom_in" => Some(Self::ZoomIn),
            _ => None,
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The closed set of node variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of the scene.
    Layer,
    /// Transform handle overlay; `nodes` are the elements it is bound to.
    Transformer { nodes: SmallVec<[NodeId; 1]> },
    Text(TextProps),
    Image(ImageProps),
    Rect(RectProps),
    Group(GroupProps),
}

/// Variant tag of a `NodeKind`, used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementClass {
    Layer,
    Transformer,
    Text,
    Image,
    Rect,
    Group,
}

impl ElementClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementClass::Layer => "Layer",
            ElementClass::Transformer => "Transformer",
            ElementClass::Text => "Text",
            ElementClass::Image => "Image",
            ElementClass::Rect => "Rect",
            ElementClass::Group => "Group",
        }
    }
}

impl NodeKind {
    pub fn class(&self) -> ElementClass {
        match self {
            NodeKind::Layer => ElementClass::Layer,
            NodeKind::Transformer { .. } => ElementClass::Transformer,
            NodeKind::Text(_) => ElementClass::Text,
            NodeKind::Image(_) => ElementClass::Image,
            NodeKind::Rect(_) => ElementClass::Rect,
            NodeKind::Group(_) => ElementClass::Group,
        }
    }
}

/// Attributes shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
    pub draggable: bool,
    pub listening: bool,
    pub visible: bool,
    pub shadow: Shadow,
    pub animation: AnimationPreset,
    pub is_background: bool,
    /// Editable-identity tag (`EDITABLE_TAG`) or another free-form name.
    pub name: Option<String>,
}

impl Default for Attrs {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            draggable: false,
            listening: true,
            visible: true,
            shadow: Shadow::default(),
            animation: AnimationPreset::None,
            is_background: false,
            name: None,
        }
    }
}

impl Attrs {
    /// Clamp opacity into `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }
}

/// Pointer reactions wired onto a node. Rebuilt from the variant every time
/// a node is created, cloned or restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bindings {
    /// Click selects the node.
    pub select: bool,
    /// Click does not bubble to the stage.
    pub cancel_bubble: bool,
    /// Double click opens the in-place text editor.
    pub edit_text: bool,
    /// Drag end commits a history entry.
    pub commit_on_drag_end: bool,
    /// Transform end commits a history entry.
    pub commit_on_transform_end: bool,
    /// Drag and transform keep the floating media panel in place.
    pub track_floating: bool,
}

impl Bindings {
    /// The per-variant binding table.
    pub fn for_class(class: ElementClass) -> Self {
        match class {
            ElementClass::Text => Self {
                select: true,
                cancel_bubble: false,
                edit_text: true,
                commit_on_drag_end: true,
                commit_on_transform_end: true,
                track_floating: false,
            },
            ElementClass::Image | ElementClass::Rect | ElementClass::Group => Self {
                select: true,
                cancel_bubble: true,
                edit_text: false,
                commit_on_drag_end: true,
                commit_on_transform_end: true,
                track_floating: true,
            },
            ElementClass::Layer | ElementClass::Transformer => Self::default(),
        }
    }

    pub fn is_bound(&self) -> bool {
        *self != Self::default()
    }
}

/// A single node in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub attrs: Attrs,
    #[serde(skip)]
    pub bindings: Bindings,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            attrs: Attrs::default(),
            bindings: Bindings::default(),
        }
    }

    /// A node carrying the editable-identity tag.
    pub fn editable(id: NodeId, kind: NodeKind) -> Self {
        let mut node = Self::new(id, kind);
        node.attrs.name = Some(EDITABLE_TAG.to_string());
        node.attrs.draggable = true;
        node
    }

    pub fn class(&self) -> ElementClass {
        self.kind.class()
    }

    pub fn is_editable(&self) -> bool {
        self.attrs.name.as_deref() == Some(EDITABLE_TAG)
    }

    /// Install the variant's pointer bindings.
    pub fn bind(&mut self) {
        self.bindings = Bindings::for_class(self.class());
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The external media this node plays, if it is a media variant.
    pub fn media(&self) -> Option<MediaRef> {
        match &self.kind {
            NodeKind::Group(g) => g.media.clone(),
            NodeKind::Image(ImageProps {
                fill: ImageFill::VideoFrame { src },
                ..
            }) => Some(MediaRef {
                kind: MediaKind::Video,
                src: src.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        self.media().is_some()
    }

    /// Unscaled size. Text without an explicit box is measured with a
    /// rough monospace estimate, which is all the overlay math needs.
    pub fn size(&self) -> (f32, f32) {
        let NodeKind::Text(t) = &self.kind else {
            return (self.attrs.width, self.attrs.height);
        };
        let lines = t.text.split('\n').count().max(1) as f32;
        let longest = t
            .text
            .split('\n')
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as f32;
        let width = if self.attrs.width > 0.0 {
            self.attrs.width
        } else {
            longest * (t.font_size * 0.6 + t.letter_spacing) + t.padding * 2.0
        };
        let height = if self.attrs.height > 0.0 {
            self.attrs.height
        } else {
            lines * t.font_size * t.line_height + t.padding * 2.0
        };
        (width, height)
    }
}
