//! Template instantiation.
//!
//! A template load runs in three steps so no `RefCell` borrow is held
//! across an await:
//!
//! 1. `begin_template` clears the canvas and registers the load (sync).
//! 2. `PendingTemplate::resolve` loads every image child concurrently and
//!    waits for all of them; the first failure aborts the join (async).
//! 3. `finish_template` composes the scene and commits once (sync).
//!
//! Starting a new load aborts the one in flight. A superseded load ends
//! with `LoadError::Superseded` and never touches the scene.

use crate::error::LoadError;
use crate::events::EditorEvent;
use crate::factory::LoadedImage;
use crate::session::EditorSession;
use futures::future::{AbortHandle, AbortRegistration, Abortable, try_join_all};
use std::cell::RefCell;
use std::rc::Rc;
use tc_core::template::{self, ChildDescriptor, TemplateClass, TemplateDescriptor};
use tc_core::{ImageFill, ImageProps, NodeId, NodeKind, RectProps, SceneGraph, SceneNode, TextProps};

pub const TEMPLATE_FAILURE_MESSAGE: &str =
    "Failed to load template assets. Check console for details.";

/// Fetches and decodes bitmaps.
#[allow(async_fn_in_trait)]
pub trait ImageLoader {
    async fn load(&self, src: &str) -> Result<LoadedImage, LoadError>;
}

/// A registered template load waiting for its images.
#[derive(Debug)]
pub struct PendingTemplate {
    generation: u64,
    descriptor: TemplateDescriptor,
    registration: AbortRegistration,
}

/// All images of a template, ready to compose.
#[derive(Debug)]
pub struct ResolvedTemplate {
    generation: u64,
    descriptor: TemplateDescriptor,
    images: Vec<LoadedImage>,
}

impl PendingTemplate {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Load every image child. Resolves once all succeed, or with the
    /// first error; `Superseded` if a newer load started meanwhile.
    pub async fn resolve<L: ImageLoader>(self, loader: &L) -> Result<ResolvedTemplate, LoadError> {
        let PendingTemplate {
            generation,
            descriptor,
            registration,
        } = self;

        let loads = descriptor
            .children
            .iter()
            .filter(|c| c.is_image())
            .map(|child| load_child(child, loader));
        let images = match Abortable::new(try_join_all(loads), registration).await {
            Ok(result) => result?,
            Err(_aborted) => return Err(LoadError::Superseded),
        };

        Ok(ResolvedTemplate {
            generation,
            descriptor,
            images,
        })
    }
}

async fn load_child<L: ImageLoader>(
    child: &ChildDescriptor,
    loader: &L,
) -> Result<LoadedImage, LoadError> {
    let label = || child.id.map(|id| id.to_string()).unwrap_or_else(|| "image".into());
    let src = child.src().ok_or_else(|| LoadError::MissingSource(label()))?;
    loader.load(&src).await.inspect_err(|err| {
        log::error!("template: image `{}` failed: {err}", label());
    })
}

/// The descriptor's id when it is free, otherwise a generated one.
fn child_id(scene: &SceneGraph, child: &ChildDescriptor, prefix: &str) -> NodeId {
    match child.id {
        Some(id) if !id.is_reserved() && !scene.contains(id) => id,
        Some(id) => {
            log::warn!("template: id `{id}` is taken, generating one");
            NodeId::with_prefix(prefix)
        }
        None => NodeId::with_prefix(prefix),
    }
}

/// Build the node for a non-image child, or `None` for unknown tags.
fn build_child(scene: &SceneGraph, child: &ChildDescriptor) -> Option<SceneNode> {
    let kind = match child.class_name {
        TemplateClass::Text => NodeKind::Text(TextProps::default()),
        TemplateClass::Rect => NodeKind::Rect(RectProps::default()),
        TemplateClass::Image | TemplateClass::Unknown => return None,
    };
    let prefix = if matches!(kind, NodeKind::Text(_)) { "text" } else { "rect" };
    let attrs = child.resolved();
    let mut node = SceneNode::editable(child_id(scene, child, prefix), kind);
    attrs.apply_to(&mut node);
    node.attrs.draggable = attrs.draggable != Some(false);
    Some(node)
}

fn build_image_child(scene: &SceneGraph, child: &ChildDescriptor, image: &LoadedImage) -> SceneNode {
    let mut node = SceneNode::editable(
        child_id(scene, child, "image"),
        NodeKind::Image(ImageProps {
            fill: ImageFill::Bitmap {
                src: image.src.clone(),
            },
            background: None,
        }),
    );
    node.attrs.width = image.width as f32;
    node.attrs.height = image.height as f32;
    child.resolved().apply_to(&mut node);
    node.attrs.is_background = child.is_background;
    node
}

impl EditorSession {
    /// Clear the canvas and register a new template load, aborting any
    /// load still in flight.
    pub fn begin_template(&mut self, descriptor: TemplateDescriptor) -> PendingTemplate {
        if let Some(previous) = self.inflight_template.take() {
            log::debug!("template: superseding load #{}", self.template_generation);
            previous.abort();
        }
        self.template_generation += 1;
        let (handle, registration) = AbortHandle::new_pair();
        self.inflight_template = Some(handle);

        self.clear_scene();
        self.emit(EditorEvent::RedrawRequested);
        log::debug!(
            "template: load #{} with {} children",
            self.template_generation,
            descriptor.children.len()
        );

        PendingTemplate {
            generation: self.template_generation,
            descriptor,
            registration,
        }
    }

    /// Compose a resolved template and commit one history entry.
    pub fn finish_template(&mut self, resolved: ResolvedTemplate) -> Result<(), LoadError> {
        if resolved.generation != self.template_generation {
            log::debug!("template: dropping stale load #{}", resolved.generation);
            return Err(LoadError::Superseded);
        }
        self.inflight_template = None;

        let (images, others) = resolved.descriptor.partition();
        for (child, image) in images.into_iter().zip(&resolved.images) {
            let node = build_image_child(&self.scene, child, image);
            let idx = self.attach(node);
            let id = self.scene.graph[idx].id;
            if child.is_background {
                self.scene.set_z_index(id, 0);
            }
        }

        for child in others {
            let Some(node) = build_child(&self.scene, child) else {
                log::debug!("template: skipping unsupported child {:?}", child.class_name);
                continue;
            };
            let is_rect = matches!(node.kind, NodeKind::Rect(_));
            let idx = self.attach(node);
            let id = self.scene.graph[idx].id;
            if is_rect {
                self.scene.set_z_index(id, 1);
                self.raise_overlay();
            }
        }

        self.sync_frame_driver();
        self.emit(EditorEvent::RedrawRequested);
        self.commit();
        log::debug!("template: load #{} composed", resolved.generation);
        Ok(())
    }

    /// Report a failed load. The canvas stays cleared; nothing is committed.
    pub fn fail_template(&mut self, generation: u64, err: &LoadError) {
        if generation != self.template_generation {
            return;
        }
        self.inflight_template = None;
        log::error!("template: load #{generation} failed: {err}");
        self.emit(EditorEvent::Notify(TEMPLATE_FAILURE_MESSAGE.into()));
        self.emit(EditorEvent::RedrawRequested);
    }
}

/// Replace the canvas with a template.
pub async fn load_template<L: ImageLoader>(
    session: &Rc<RefCell<EditorSession>>,
    descriptor: TemplateDescriptor,
    loader: &L,
) -> Result<(), LoadError> {
    let pending = session.borrow_mut().begin_template(descriptor);
    let generation = pending.generation();
    match pending.resolve(loader).await {
        Ok(resolved) => session.borrow_mut().finish_template(resolved),
        Err(LoadError::Superseded) => {
            log::debug!("template: load #{generation} superseded");
            Err(LoadError::Superseded)
        }
        Err(err) => {
            session.borrow_mut().fail_template(generation, &err);
            Err(err)
        }
    }
}

/// Replace the canvas with one of the built-in templates.
pub async fn load_template_by_key<L: ImageLoader>(
    session: &Rc<RefCell<EditorSession>>,
    key: &str,
    loader: &L,
) -> Result<(), LoadError> {
    let Some(descriptor) = template::builtin(key) else {
        log::error!("template: `{key}` not found");
        return Err(LoadError::TemplateNotFound(key.to_string()));
    };
    load_template(session, descriptor, loader).await
}
