//! Session outbox and the collaborator event surface.
//!
//! The editing core never touches the page. Everything the UI must do in
//! response to an edit (redraw, alert, show a panel) is queued as an
//! `EditorEvent` and drained by the host after each call.

use crate::session::EditorSession;
use crate::sidebar::SidebarState;
use crate::text_edit::TextOverlay;
use serde::{Deserialize, Serialize};

/// Screen placement of the floating media controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Whether the media is currently playing (pause icon) or not (play icon).
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "camelCase")]
pub enum EditorEvent {
    RedrawRequested,
    /// Blocking user-facing notification.
    Notify(String),
    SidebarChanged(SidebarState),
    /// Contextual toolbar for the selected element.
    ToolbarVisible(bool),
    FloatingControls(Option<PanelPlacement>),
    TextOverlayOpened(TextOverlay),
    TextOverlayClosed,
    ScrollTemplatesIntoView,
    /// The media sidebar finished loading; bind its upload inputs.
    UploadControlsRequested,
    /// Start (true) or stop (false) per-frame redraws.
    AnimationFrames(bool),
}

/// Events raised by the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalEvent {
    /// `template:apply {url}`
    TemplateApply { url: String },
    /// `video:apply {url}`
    VideoApply { url: String },
    /// `sidebar:loaded`
    SidebarLoaded,
    /// `templates:open`
    TemplatesOpen,
}

#[derive(Deserialize)]
struct UrlDetail {
    url: Option<String>,
}

impl ExternalEvent {
    /// Parse an event name and its optional JSON `detail`.
    /// Returns `None` for unknown names or a missing/empty url.
    pub fn parse(name: &str, detail: Option<&str>) -> Option<Self> {
        let url = || {
            let detail: UrlDetail = serde_json::from_str(detail?).ok()?;
            detail.url.filter(|u| !u.trim().is_empty())
        };
        match name {
            "template:apply" => url().map(|url| Self::TemplateApply { url }),
            "video:apply" => url().map(|url| Self::VideoApply { url }),
            "sidebar:loaded" => Some(Self::SidebarLoaded),
            "templates:open" => Some(Self::TemplatesOpen),
            _ => None,
        }
    }
}

impl EditorSession {
    /// Handle the collaborator events that need no I/O. `template:apply`
    /// and `video:apply` load assets and are driven by the host through
    /// `load_image_template` and `add_video`; they return false here.
    pub fn handle_external(&mut self, event: &ExternalEvent) -> bool {
        match event {
            ExternalEvent::SidebarLoaded => self.emit(EditorEvent::UploadControlsRequested),
            ExternalEvent::TemplatesOpen => self.emit(EditorEvent::ScrollTemplatesIntoView),
            ExternalEvent::TemplateApply { .. } | ExternalEvent::VideoApply { .. } => {
                log::debug!("external: {event:?} needs an async loader");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_events() {
        assert_eq!(
            ExternalEvent::parse("template:apply", Some(r#"{"url":"assets/t1.png"}"#)),
            Some(ExternalEvent::TemplateApply {
                url: "assets/t1.png".into()
            })
        );
        assert_eq!(
            ExternalEvent::parse("sidebar:loaded", None),
            Some(ExternalEvent::SidebarLoaded)
        );
        assert_eq!(
            ExternalEvent::parse("templates:open", Some("{}")),
            Some(ExternalEvent::TemplatesOpen)
        );
    }

    #[test]
    fn missing_url_is_ignored() {
        assert_eq!(ExternalEvent::parse("video:apply", None), None);
        assert_eq!(ExternalEvent::parse("video:apply", Some(r#"{"url":""}"#)), None);
        assert_eq!(ExternalEvent::parse("video:apply", Some("oops")), None);
        assert_eq!(ExternalEvent::parse("tab:switch", None), None);
    }

    #[test]
    fn sync_events_reach_the_outbox() {
        let mut s = EditorSession::new(crate::config::EditorConfig::default());
        s.drain_events();
        assert!(s.handle_external(&ExternalEvent::TemplatesOpen));
        assert!(!s.handle_external(&ExternalEvent::VideoApply { url: "clip.mp4".into() }));
        assert_eq!(s.drain_events(), vec![EditorEvent::ScrollTemplatesIntoView]);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&EditorEvent::Notify("boom".into())).unwrap();
        assert_eq!(json, r#"{"type":"notify","detail":"boom"}"#);
        let json = serde_json::to_string(&EditorEvent::RedrawRequested).unwrap();
        assert_eq!(json, r#"{"type":"redrawRequested"}"#);
    }
}
