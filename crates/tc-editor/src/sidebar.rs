//! Property sidebar and text toolbar bindings.
//!
//! `SidebarState` is what the property panel shows for the current
//! selection. `PropertyChange` carries edits back. Every setter is a no-op
//! when nothing is selected or the property does not apply to the
//! selected variant.

use crate::events::EditorEvent;
use crate::session::EditorSession;
use serde::Serialize;
use tc_core::{AnimationPreset, Color, ElementClass, NodeId, NodeKind, SceneNode, TextAlign};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    pub font_family: String,
    pub fill: Color,
    pub align: TextAlign,
    pub line_height: f32,
    pub letter_spacing: f32,
    pub stroke: Color,
    pub stroke_width: f32,
    pub bold: bool,
    pub italic: bool,
    pub font_size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFields {
    pub id: NodeId,
    pub class: ElementClass,
    /// Opacity as a whole percentage, 0..=100.
    pub opacity_percent: u32,
    pub shadow_enabled: bool,
    pub shadow_color: Color,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub animation: AnimationPreset,
    /// Present only for text elements; the text tab is hidden otherwise.
    pub text: Option<TextFields>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum SidebarState {
    Canvas { canvas_color: Color },
    Element(ElementFields),
}

impl SidebarState {
    pub fn for_node(node: &SceneNode) -> Self {
        let a = &node.attrs;
        let text = node.as_text().map(|t| TextFields {
            font_family: t.font_family.clone(),
            fill: t.fill.unwrap_or(Color::WHITE),
            align: t.align,
            line_height: if t.line_height > 0.0 { t.line_height } else { 1.2 },
            letter_spacing: t.letter_spacing,
            stroke: t.stroke.unwrap_or(Color::BLACK),
            stroke_width: t.stroke_width,
            bold: t.font_style.bold,
            italic: t.font_style.italic,
            font_size: t.font_size,
        });
        Self::Element(ElementFields {
            id: node.id,
            class: node.class(),
            opacity_percent: (a.opacity * 100.0).round() as u32,
            shadow_enabled: a.shadow.enabled,
            shadow_color: a.shadow.color,
            shadow_offset_x: a.shadow.offset_x,
            shadow_offset_y: a.shadow.offset_y,
            animation: a.animation,
            text,
        })
    }
}

/// A single edit from the property panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    /// Text color, rect fill, or the backdrop behind an image.
    Fill(Color),
    /// 0.0..=1.0
    Opacity(f32),
    FontFamily(String),
    Align(TextAlign),
    LineHeight(f32),
    LetterSpacing(f32),
    StrokeColor(Color),
    StrokeWidth(f32),
    ShadowEnabled(bool),
    Shadow {
        color: Color,
        offset_x: f32,
        offset_y: f32,
    },
    Animation(AnimationPreset),
}

/// Live slider drags preview; releasing the control commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePhase {
    Preview,
    Commit,
}

fn apply(node: &mut SceneNode, change: &PropertyChange) -> bool {
    match (change, &mut node.kind) {
        (PropertyChange::Fill(c), NodeKind::Text(t)) => t.fill = Some(*c),
        (PropertyChange::Fill(c), NodeKind::Rect(r)) => r.fill = Some(*c),
        (PropertyChange::Fill(c), NodeKind::Image(i)) => i.background = Some(*c),
        (PropertyChange::FontFamily(f), NodeKind::Text(t)) => t.font_family = f.clone(),
        (PropertyChange::Align(a), NodeKind::Text(t)) => t.align = *a,
        (PropertyChange::LineHeight(v), NodeKind::Text(t)) => t.line_height = *v,
        (PropertyChange::LetterSpacing(v), NodeKind::Text(t)) => t.letter_spacing = *v,
        (PropertyChange::StrokeColor(c), NodeKind::Text(t)) => t.stroke = Some(*c),
        (PropertyChange::StrokeWidth(v), NodeKind::Text(t)) => t.stroke_width = v.max(0.0),
        (PropertyChange::Opacity(o), _) => node.attrs.set_opacity(*o),
        (PropertyChange::ShadowEnabled(on), _) => node.attrs.shadow.enabled = *on,
        (
            PropertyChange::Shadow {
                color,
                offset_x,
                offset_y,
            },
            _,
        ) => {
            node.attrs.shadow.color = *color;
            node.attrs.shadow.offset_x = *offset_x;
            node.attrs.shadow.offset_y = *offset_y;
        }
        (PropertyChange::Animation(preset), _) => node.attrs.animation = *preset,
        _ => return false,
    }
    true
}

impl EditorSession {
    /// Apply a sidebar edit to the selection.
    pub fn apply_property(&mut self, change: PropertyChange, phase: ChangePhase) -> bool {
        let Some(id) = self.selection else {
            log::debug!("sidebar: {change:?} ignored, nothing selected");
            return false;
        };
        let Some(node) = self.scene.get_by_id_mut(id) else {
            return false;
        };
        if !apply(node, &change) {
            log::debug!("sidebar: {change:?} does not apply to {:?}", node.class());
            return false;
        }
        self.emit(EditorEvent::RedrawRequested);
        if phase == ChangePhase::Commit {
            self.commit();
        }
        true
    }

    /// Commit the end of a preview gesture (slider release).
    pub fn finish_property_gesture(&mut self) -> bool {
        if self.selection.is_none() {
            return false;
        }
        self.commit()
    }

    /// Stage background color, shown in the canvas tab.
    pub fn set_canvas_color(&mut self, color: Color) {
        self.canvas_color = color;
        if self.selection.is_none() {
            self.emit(EditorEvent::SidebarChanged(SidebarState::Canvas {
                canvas_color: color,
            }));
        }
    }

    fn edit_selected_text(&mut self, edit: impl FnOnce(&mut tc_core::TextProps, f32, f32)) -> bool {
        let (min, step) = (self.config.min_font_size, self.config.font_size_step);
        let Some(text) = self
            .selection
            .and_then(|id| self.scene.get_by_id_mut(id))
            .and_then(SceneNode::as_text_mut)
        else {
            return false;
        };
        edit(text, min, step);
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        true
    }

    pub fn toggle_bold(&mut self) -> bool {
        self.edit_selected_text(|t, _, _| t.font_style.bold = !t.font_style.bold)
    }

    pub fn toggle_italic(&mut self) -> bool {
        self.edit_selected_text(|t, _, _| t.font_style.italic = !t.font_style.italic)
    }

    pub fn increase_font_size(&mut self) -> bool {
        self.edit_selected_text(|t, _, step| t.font_size += step)
    }

    /// Shrinks by one step, never below the configured minimum.
    pub fn decrease_font_size(&mut self) -> bool {
        self.edit_selected_text(|t, min, step| t.font_size = (t.font_size - step).max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::factory::TextOptions;
    use pretty_assertions::assert_eq;

    fn with_text() -> (EditorSession, NodeId) {
        let mut s = EditorSession::new(EditorConfig::default());
        let id = s.add_text(TextOptions {
            font_size: 12.0,
            ..Default::default()
        });
        (s, id)
    }

    #[test]
    fn null_selection_guards_every_setter() {
        let mut s = EditorSession::new(EditorConfig::default());
        assert!(!s.apply_property(PropertyChange::Opacity(0.5), ChangePhase::Commit));
        assert!(!s.toggle_bold());
        assert!(!s.increase_font_size());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn text_only_properties_skip_other_variants() {
        let mut s = EditorSession::new(EditorConfig::default());
        let rect = s.add_rectangle(kurbo::Rect::new(0.0, 0.0, 20.0, 20.0), Color::BLACK);
        s.select(rect);
        assert!(!s.apply_property(PropertyChange::LineHeight(2.0), ChangePhase::Commit));
        assert!(s.apply_property(PropertyChange::Fill(Color::WHITE), ChangePhase::Commit));
    }

    #[test]
    fn preview_does_not_commit() {
        let (mut s, id) = with_text();
        let before = s.history().len();
        assert!(s.apply_property(PropertyChange::Opacity(0.25), ChangePhase::Preview));
        assert_eq!(s.history().len(), before);
        assert!(s.finish_property_gesture());
        assert_eq!(s.history().len(), before + 1);
        assert_eq!(s.node(id).unwrap().attrs.opacity, 0.25);
    }

    #[test]
    fn bold_italic_toggle_independently() {
        let (mut s, id) = with_text();
        s.toggle_italic();
        s.toggle_bold();
        let style = s.node(id).and_then(SceneNode::as_text).unwrap().font_style;
        assert_eq!(style.as_css(), "bold italic");
        s.toggle_bold();
        let style = s.node(id).and_then(SceneNode::as_text).unwrap().font_style;
        assert_eq!(style.as_css(), "italic");
    }

    #[test]
    fn font_size_never_drops_below_minimum() {
        let (mut s, id) = with_text();
        s.decrease_font_size();
        s.decrease_font_size();
        let size = |s: &EditorSession| s.node(id).and_then(SceneNode::as_text).unwrap().font_size;
        assert_eq!(size(&s), 10.0);
        s.increase_font_size();
        assert_eq!(size(&s), 12.0);
    }

    #[test]
    fn sidebar_reflects_text_defaults() {
        let (s, id) = with_text();
        let SidebarState::Element(fields) = SidebarState::for_node(s.node(id).unwrap()) else {
            panic!("expected element view");
        };
        assert_eq!(fields.opacity_percent, 100);
        let text = fields.text.unwrap();
        assert_eq!(text.stroke, Color::BLACK);
        assert_eq!(text.stroke_width, 0.0);
    }
}
