pub mod geometry;
pub mod hit;
pub mod id;
pub mod model;
pub mod parse;
pub mod scene;
pub mod snapshot;
pub mod template;

pub use geometry::Viewport;
pub use hit::hit_test;
pub use id::NodeId;
pub use model::*;
pub use scene::SceneGraph;
pub use snapshot::{Snapshot, SnapshotError};
pub use template::{ChildDescriptor, TemplateAttrs, TemplateClass, TemplateDescriptor};

// Re-export so downstream crates don't need direct petgraph/kurbo dependencies
pub use kurbo;
pub use petgraph::graph::NodeIndex;
