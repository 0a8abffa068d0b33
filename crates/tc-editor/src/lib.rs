pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod factory;
pub mod history;
pub mod media;
pub mod pipeline;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod sidebar;
pub mod text_edit;

pub use config::EditorConfig;
pub use error::{ConfigError, ExportError, LoadError, MediaError};
pub use events::{EditorEvent, ExternalEvent, PanelPlacement};
pub use export::{ExportBlob, ExportRequest, Rasterizer};
pub use factory::{LoadedImage, TextOptions, TextPreset, VideoMetadata, VideoProbe, add_video, load_image_template};
pub use history::History;
pub use media::{MediaBackend, MediaHandle, NullMediaBackend};
pub use pipeline::{ImageLoader, PendingTemplate, ResolvedTemplate, load_template, load_template_by_key};
pub use selection::{CanvasEvent, TransformUpdate};
pub use session::EditorSession;
pub use shortcuts::{KeyInput, KeyOutcome, ShortcutAction, ShortcutMap};
pub use sidebar::{ChangePhase, PropertyChange, SidebarState};
pub use text_edit::{ExitTrigger, TextOverlay};
