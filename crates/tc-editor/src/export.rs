//! Canvas export and stage sizing.

use crate::error::ExportError;
use crate::events::EditorEvent;
use crate::session::EditorSession;
use serde::Serialize;
use tc_core::parse::parse_size_preset;
use tc_core::{Color, SceneGraph, SnapshotError, snapshot};

pub const EXPORT_MIME: &str = "image/png";
pub const EXPORT_FILE_NAME: &str = "twinclouds-design.png";

/// What the rasterizer should produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub mime: String,
    pub quality: f64,
    pub file_name: String,
    pub width: f64,
    pub height: f64,
    pub background: Color,
}

/// An encoded image ready to download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBlob {
    pub file_name: String,
    pub mime: String,
    /// `data:` URL of the encoded image.
    pub data_url: String,
}

/// Turns a scene into pixels. Implemented by the graphics layer.
pub trait Rasterizer {
    fn rasterize(&mut self, scene: &SceneGraph, request: &ExportRequest) -> Result<String, ExportError>;
}

impl EditorSession {
    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            mime: EXPORT_MIME.to_string(),
            quality: 1.0,
            file_name: EXPORT_FILE_NAME.to_string(),
            width: self.viewport.width,
            height: self.viewport.height,
            background: self.canvas_color,
        }
    }

    /// Render the canvas without the transform overlay.
    pub fn export(&self, rasterizer: &mut dyn Rasterizer) -> Result<ExportBlob, ExportError> {
        let content = snapshot::restore(&snapshot::serialize(&self.scene)?)?;
        let request = self.export_request();
        let data_url = rasterizer.rasterize(&content, &request).inspect_err(|err| {
            log::error!("export: {err}");
        })?;
        log::debug!(
            "export: {}x{} -> {} bytes",
            request.width,
            request.height,
            data_url.len()
        );
        Ok(ExportBlob {
            file_name: request.file_name,
            mime: request.mime,
            data_url,
        })
    }

    /// JSON view of the current scene, for debugging and inspection.
    pub fn scene_json(&self) -> Result<String, SnapshotError> {
        snapshot::to_json(&snapshot::serialize(&self.scene)?)
    }

    /// Resize the stage. Elements keep their coordinates.
    pub fn resize_canvas(&mut self, width: f64, height: f64) -> bool {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            log::warn!("resize: rejected {width}x{height}");
            return false;
        }
        self.viewport.resize(width, height);
        self.refresh_floating();
        self.emit(EditorEvent::RedrawRequested);
        log::debug!("resize: {width}x{height}");
        true
    }

    /// Apply a `"WxH"` preset from the size selector.
    ///
    /// Snapshots hold elements only, so the stage size is not part of
    /// history and a preset records no entry.
    pub fn apply_size_preset(&mut self, preset: &str) -> bool {
        let Some((width, height)) = parse_size_preset(preset) else {
            log::warn!("resize: bad preset {preset:?}");
            return false;
        };
        self.resize_canvas(f64::from(width), f64::from(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::factory::TextOptions;
    use pretty_assertions::assert_eq;
    use tc_core::NodeId;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<NodeId>,
    }

    impl Rasterizer for Recorder {
        fn rasterize(&mut self, scene: &SceneGraph, request: &ExportRequest) -> Result<String, ExportError> {
            self.seen = scene.ids().collect();
            Ok(format!("data:{};base64,AAAA", request.mime))
        }
    }

    struct Broken;

    impl Rasterizer for Broken {
        fn rasterize(&mut self, _: &SceneGraph, _: &ExportRequest) -> Result<String, ExportError> {
            Err(ExportError::Rasterizer("no surface".into()))
        }
    }

    #[test]
    fn export_leaves_out_the_overlay() {
        let mut s = EditorSession::new(EditorConfig::default());
        let text = s.add_text(TextOptions::default());
        let mut recorder = Recorder::default();

        let blob = s.export(&mut recorder).unwrap();
        assert_eq!(blob.file_name, "twinclouds-design.png");
        assert_eq!(blob.data_url, "data:image/png;base64,AAAA");
        assert!(recorder.seen.contains(&text));
        assert!(!recorder.seen.contains(&NodeId::transformer()));
        assert!(s.scene().contains(NodeId::transformer()));
    }

    #[test]
    fn rasterizer_failure_is_reported() {
        let s = EditorSession::new(EditorConfig::default());
        assert!(matches!(s.export(&mut Broken), Err(ExportError::Rasterizer(_))));
    }

    #[test]
    fn preset_resizes_without_spending_an_undo_step() {
        let mut s = EditorSession::new(EditorConfig::default());
        let text = s.add_text(TextOptions::default());
        assert!(s.apply_size_preset("1080x1350"));
        assert_eq!(s.viewport().size(), kurbo::Size::new(1080.0, 1350.0));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.export_request().width, 1080.0);

        assert!(s.undo());
        assert!(s.node(text).is_none(), "undo goes straight to the last edit");
        assert_eq!(s.viewport().size(), kurbo::Size::new(1080.0, 1350.0));
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let mut s = EditorSession::new(EditorConfig::default());
        assert!(!s.resize_canvas(0.0, 100.0));
        assert!(!s.resize_canvas(f64::NAN, 100.0));
        assert!(!s.apply_size_preset("huge"));
        assert_eq!(s.viewport().size(), kurbo::Size::new(300.0, 550.0));
        assert_eq!(s.history().len(), 1);
    }
}
