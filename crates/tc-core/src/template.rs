//! Declarative template descriptors and the built-in catalog.
//!
//! A descriptor mirrors the layer JSON the UI ships with:
//!
//! ```json
//! { "className": "Layer",
//!   "children": [
//!     { "className": "Image", "attrs": { "src": "bg.jpg", "width": 300, "height": 550 },
//!       "isBackground": true, "id": "bg" },
//!     { "className": "Text", "text": "HEADLINE", "x": 40, "y": 70, "fontSize": 50 } ] }
//! ```
//!
//! Attributes may sit directly on the child or under `attrs`; the nested
//! block wins when both name the same field. Unknown class tags parse to
//! `TemplateClass::Unknown` and are skipped at instantiation.

use crate::geometry::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::id::NodeId;
use crate::model::{Color, NodeKind, SceneNode, TextAlign};
use crate::parse::parse_font_style;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateClass {
    Image,
    Text,
    Rect,
    #[serde(other)]
    Unknown,
}

/// Attributes a template child may declare. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// CSS-style string such as `"bold italic"` or `"700"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

macro_rules! overlay_fields {
    ($base:expr, $top:expr, $($field:ident),+) => {
        $( if $top.$field.is_some() { $base.$field = $top.$field.clone(); } )+
    };
}

impl TemplateAttrs {
    /// Fields set in `other` replace fields in `self`.
    pub fn overlay(mut self, other: &TemplateAttrs) -> Self {
        overlay_fields!(
            self, other, src, text, x, y, width, height, font_size, font_family, font_style, fill,
            align, corner_radius, opacity, draggable
        );
        self
    }

    /// Write the declared attributes onto a freshly built node.
    /// Fields that do not apply to the node's variant are ignored.
    pub fn apply_to(&self, node: &mut SceneNode) {
        let attrs = &mut node.attrs;
        if let Some(x) = self.x {
            attrs.x = x;
        }
        if let Some(y) = self.y {
            attrs.y = y;
        }
        if let Some(w) = self.width {
            attrs.width = w;
        }
        if let Some(h) = self.height {
            attrs.height = h;
        }
        if let Some(o) = self.opacity {
            attrs.set_opacity(o);
        }
        if let Some(d) = self.draggable {
            attrs.draggable = d;
        }

        match &mut node.kind {
            NodeKind::Text(t) => {
                if let Some(text) = &self.text {
                    t.text = text.clone();
                }
                if let Some(size) = self.font_size {
                    t.font_size = size;
                }
                if let Some(family) = &self.font_family {
                    t.font_family = family.clone();
                }
                if let Some(raw) = &self.font_style {
                    match parse_font_style(raw) {
                        Some(style) => t.font_style = style,
                        None => log::warn!("template: ignoring font style `{raw}`"),
                    }
                }
                if self.fill.is_some() {
                    t.fill = self.fill;
                }
                if let Some(align) = self.align {
                    t.align = align;
                }
            }
            NodeKind::Rect(r) => {
                if self.fill.is_some() {
                    r.fill = self.fill;
                }
                if let Some(radius) = self.corner_radius {
                    r.corner_radius = radius;
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDescriptor {
    pub class_name: TemplateClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub is_background: bool,
    #[serde(default)]
    pub attrs: TemplateAttrs,
    #[serde(flatten)]
    pub inline: TemplateAttrs,
}

impl ChildDescriptor {
    fn new(class_name: TemplateClass, id: &str, inline: TemplateAttrs) -> Self {
        Self {
            class_name,
            id: Some(NodeId::intern(id)),
            is_background: false,
            attrs: TemplateAttrs::default(),
            inline,
        }
    }

    /// Inline fields overlaid by the nested `attrs` block.
    pub fn resolved(&self) -> TemplateAttrs {
        self.inline.clone().overlay(&self.attrs)
    }

    /// Source URL of an image child.
    pub fn src(&self) -> Option<String> {
        self.resolved().src
    }

    pub fn is_image(&self) -> bool {
        self.class_name == TemplateClass::Image
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    #[serde(default = "default_container")]
    pub class_name: String,
    pub children: Vec<ChildDescriptor>,
}

fn default_container() -> String {
    "Layer".to_string()
}

impl TemplateDescriptor {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Image children and everything else, each in descriptor order.
    pub fn partition(&self) -> (Vec<&ChildDescriptor>, Vec<&ChildDescriptor>) {
        self.children.iter().partition(|c| c.is_image())
    }
}

// ─── Built-in catalog ────────────────────────────────────────────────────

pub const BUILTIN_KEYS: [&str; 4] = ["carousel1", "carousel2", "carousel3", "carousel4"];

fn text(id: &str, body: &str, x: f32, y: f32, size: f32, fill: Color, family: &str) -> ChildDescriptor {
    ChildDescriptor::new(
        TemplateClass::Text,
        id,
        TemplateAttrs {
            text: Some(body.to_string()),
            x: Some(x),
            y: Some(y),
            font_size: Some(size),
            fill: Some(fill),
            font_family: Some(family.to_string()),
            draggable: Some(true),
            ..Default::default()
        },
    )
}

fn wrapped(mut child: ChildDescriptor) -> ChildDescriptor {
    child.inline.width = Some(DEFAULT_WIDTH as f32 - 80.0);
    child
}

fn background(src: &str) -> ChildDescriptor {
    let mut child = ChildDescriptor::new(TemplateClass::Image, "bg", TemplateAttrs::default());
    child.is_background = true;
    child.attrs = TemplateAttrs {
        src: Some(src.to_string()),
        width: Some(DEFAULT_WIDTH as f32),
        height: Some(DEFAULT_HEIGHT as f32),
        ..Default::default()
    };
    child
}

/// Look up one of the templates that ship with the editor.
pub fn builtin(key: &str) -> Option<TemplateDescriptor> {
    let white = Color::WHITE;
    let amber = Color::rgb(0xFF, 0xB5, 0x31);
    let children = match key {
        "carousel1" => vec![
            background("assets/templates/carousel1.jpg"),
            text("headline_text", "HEADLINE", 40.0, 70.0, 50.0, white, "Bebas Neue"),
            wrapped(text(
                "body_text",
                "Supporting text goes here",
                40.0,
                130.0,
                18.0,
                white,
                "Raleway",
            )),
        ],
        "carousel2" => vec![
            ChildDescriptor::new(
                TemplateClass::Rect,
                "bg_rect",
                TemplateAttrs {
                    x: Some(0.0),
                    y: Some(0.0),
                    width: Some(DEFAULT_WIDTH as f32),
                    height: Some(DEFAULT_HEIGHT as f32),
                    fill: Some(Color::rgb(0xA0, 0x52, 0x2D)),
                    draggable: Some(false),
                    ..Default::default()
                },
            ),
            text("tip_title", "TIP", 40.0, 50.0, 36.0, amber, "Anton"),
            wrapped(text(
                "tip_body",
                "Use high-contrast colors for accessibility.",
                40.0,
                100.0,
                24.0,
                white,
                "Oswald",
            )),
        ],
        "carousel3" => vec![
            background("assets/templates/carousel3.jpg"),
            wrapped(text(
                "quote_title",
                "\u{201C}The best way to predict the future is to create it.\u{201D}",
                40.0,
                70.0,
                36.0,
                white,
                "Oswald",
            )),
            wrapped(text(
                "quote_body",
                "- Peter Drucker. Add your text here",
                40.0,
                140.0,
                18.0,
                white,
                "Raleway",
            )),
        ],
        "carousel4" => vec![
            background("assets/templates/carousel4.jpg"),
            text("cta_title", "CALL TO ACTION", 40.0, 70.0, 42.0, white, "Oswald"),
            ChildDescriptor::new(
                TemplateClass::Rect,
                "cta_rect",
                TemplateAttrs {
                    x: Some(40.0),
                    y: Some(150.0),
                    width: Some(180.0),
                    height: Some(50.0),
                    corner_radius: Some(8.0),
                    fill: Some(amber),
                    draggable: Some(true),
                    ..Default::default()
                },
            ),
            text("cta_text", "LEARN MORE", 60.0, 162.0, 20.0, Color::rgb(0x14, 0x14, 0x14), "Anton"),
        ],
        _ => return None,
    };
    Some(TemplateDescriptor {
        class_name: default_container(),
        children,
    })
}
