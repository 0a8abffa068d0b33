//! Coordinate mapping between element-local space, the stage and the page.
//!
//! Elements are positioned like retained-mode 2D nodes: translate to
//! `(x, y)`, rotate by `rotation` degrees, then scale. The stage applies
//! its own transform on top, and the stage container sits at
//! `container_origin` on the page.

use crate::model::SceneNode;
use crate::scene::SceneGraph;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use petgraph::graph::NodeIndex;

/// Canvas size used when nothing else is configured.
pub const DEFAULT_WIDTH: f64 = 300.0;
pub const DEFAULT_HEIGHT: f64 = 550.0;

/// The stage: logical size, stage transform and on-page placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub stage: Affine,
    /// Top-left of the stage container in page (screen) coordinates.
    pub container_origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            stage: Affine::IDENTITY,
            container_origin: Point::ORIGIN,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Map a stage-space point to the page.
    pub fn to_screen(&self, p: Point) -> Point {
        self.container_origin + p.to_vec2()
    }
}

/// A node's own transform relative to its parent.
pub fn local_transform(node: &SceneNode) -> Affine {
    let a = &node.attrs;
    Affine::translate(Vec2::new(f64::from(a.x), f64::from(a.y)))
        * Affine::rotate(f64::from(a.rotation).to_radians())
        * Affine::scale_non_uniform(f64::from(a.scale_x), f64::from(a.scale_y))
}

/// Full transform from a node's local space to stage (canvas) space,
/// including the stage transform.
pub fn absolute_transform(scene: &SceneGraph, idx: NodeIndex, viewport: &Viewport) -> Affine {
    let mut chain = Vec::new();
    let mut current = Some(idx);
    while let Some(i) = current {
        if i == scene.root {
            break;
        }
        chain.push(local_transform(&scene.graph[i]));
        current = scene.parent(i);
    }
    chain
        .into_iter()
        .rev()
        .fold(viewport.stage, |acc, local| acc * local)
}

/// Where a node's origin lands on the stage.
pub fn absolute_position(scene: &SceneGraph, idx: NodeIndex, viewport: &Viewport) -> Point {
    absolute_transform(scene, idx, viewport) * Point::ORIGIN
}

/// Axis-aligned bounding box of a node in stage coordinates.
pub fn client_rect(scene: &SceneGraph, idx: NodeIndex, viewport: &Viewport) -> Rect {
    let (w, h) = scene.graph[idx].size();
    let local = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
    let transform = absolute_transform(scene, idx, viewport);
    transform.transform_rect_bbox(local)
}

/// Aspect-preserving scale factor that makes `content` fit `bounds` exactly.
pub fn fit_scale(content: Size, bounds: Size) -> f64 {
    if content.width <= 0.0 || content.height <= 0.0 {
        return 1.0;
    }
    (bounds.width / content.width).min(bounds.height / content.height)
}

/// Shrink `content` to fit `bounds`, never enlarging it.
pub fn fit_within(content: Size, bounds: Size) -> Size {
    if content.width > bounds.width || content.height > bounds.height {
        content * fit_scale(content, bounds)
    } else {
        content
    }
}

/// Scale `content` up or down so it just fits `bounds`.
pub fn fit_to(content: Size, bounds: Size) -> Size {
    content * fit_scale(content, bounds)
}

/// Top-left corner that centers `size` inside `bounds`.
pub fn centered_origin(size: Size, bounds: Size) -> Point {
    Point::new(
        (bounds.width - size.width) / 2.0,
        (bounds.height - size.height) / 2.0,
    )
}
