//! Integration tests: template instantiation.
//!
//! Covers the await-all image join, first-failure abort, superseding
//! loads, and the single-image template flow.

use futures::channel::oneshot;
use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tc_core::{NodeId, SceneNode, TemplateDescriptor};
use tc_editor::{
    EditorConfig, EditorEvent, EditorSession, ImageLoader, LoadError, LoadedImage, TextOptions,
    load_image_template, load_template, load_template_by_key,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn shared(session: EditorSession) -> Rc<RefCell<EditorSession>> {
    init_logging();
    Rc::new(RefCell::new(session))
}

/// Resolves every image instantly except the ones listed as broken.
#[derive(Default)]
struct FakeLoader {
    broken: HashSet<String>,
}

impl FakeLoader {
    fn failing(src: &str) -> Self {
        Self {
            broken: HashSet::from([src.to_string()]),
        }
    }
}

impl ImageLoader for FakeLoader {
    async fn load(&self, src: &str) -> Result<LoadedImage, LoadError> {
        if self.broken.contains(src) {
            return Err(LoadError::Image {
                src: src.to_string(),
                reason: "404".into(),
            });
        }
        Ok(LoadedImage {
            src: src.to_string(),
            width: 1080.0,
            height: 1920.0,
        })
    }
}

/// Never resolves until released; lets a test hold a load in flight.
#[derive(Default)]
struct GatedLoader {
    gates: RefCell<Vec<oneshot::Sender<()>>>,
}

impl ImageLoader for GatedLoader {
    async fn load(&self, src: &str) -> Result<LoadedImage, LoadError> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push(tx);
        rx.await.map_err(|_| LoadError::Image {
            src: src.to_string(),
            reason: "gate dropped".into(),
        })?;
        Ok(LoadedImage {
            src: src.to_string(),
            width: 300.0,
            height: 550.0,
        })
    }
}

const PROMO: &str = r##"{
    "className": "Layer",
    "children": [
        { "className": "Image", "id": "bg", "isBackground": true,
          "attrs": { "src": "assets/bg.jpg", "width": 300, "height": 550 } },
        { "className": "Text", "id": "title", "text": "SALE", "x": 40, "y": 60,
          "fontSize": 48, "fill": "#ffffff", "fontFamily": "Anton" },
        { "className": "Text", "id": "sub", "text": "this weekend", "x": 40, "y": 120,
          "fontSize": 20, "fill": "#ffffff" },
        { "className": "Star", "id": "sparkle", "x": 10, "y": 10 }
    ]
}"##;

fn notifications(session: &mut EditorSession) -> Vec<String> {
    session
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Notify(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

#[test]
fn template_composes_in_order_and_commits_once() {
    let session = shared(EditorSession::new(EditorConfig::default()).with_welcome());
    let descriptor = TemplateDescriptor::from_json(PROMO).unwrap();

    block_on(load_template(&session, descriptor, &FakeLoader::default())).unwrap();

    let mut s = session.borrow_mut();
    let elements = s.elements();
    let ids: Vec<&str> = elements.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["bg", "title", "sub"]);
    assert_eq!(s.history().len(), 2);
    assert!(notifications(&mut s).is_empty());

    let title = s.node(NodeId::intern("title")).and_then(SceneNode::as_text).unwrap();
    assert_eq!(title.font_family, "Anton");
    assert_eq!(title.font_size, 48.0);
}

#[test]
fn failed_background_leaves_an_empty_canvas() {
    let session = shared(EditorSession::new(EditorConfig::default()).with_welcome());
    let descriptor = TemplateDescriptor::from_json(PROMO).unwrap();

    let err = block_on(load_template(
        &session,
        descriptor,
        &FakeLoader::failing("assets/bg.jpg"),
    ))
    .unwrap_err();
    assert!(matches!(err, LoadError::Image { .. }));

    let mut s = session.borrow_mut();
    assert_eq!(s.elements().len(), 0);
    assert_eq!(
        notifications(&mut s),
        vec!["Failed to load template assets. Check console for details.".to_string()]
    );
    assert_eq!(s.history().len(), 1, "a failed load commits nothing");
}

#[test]
fn newer_load_supersedes_the_one_in_flight() {
    let session = shared(EditorSession::new(EditorConfig::default()));
    let gated = Rc::new(GatedLoader::default());
    let first_result = Rc::new(RefCell::new(None));

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    {
        let (session, gated, out) = (session.clone(), gated.clone(), first_result.clone());
        spawner
            .spawn_local(async move {
                let result = load_template_by_key(&session, "carousel1", gated.as_ref()).await;
                *out.borrow_mut() = Some(result);
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(gated.gates.borrow().len(), 1, "first load is waiting on its image");

    block_on(load_template_by_key(&session, "carousel2", &FakeLoader::default())).unwrap();
    pool.run_until_stalled();

    assert_eq!(*first_result.borrow(), Some(Err(LoadError::Superseded)));
    let mut s = session.borrow_mut();
    let elements = s.elements();
    let ids: Vec<&str> = elements.iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["bg_rect", "tip_title", "tip_body"]);
    assert!(notifications(&mut s).is_empty(), "superseded loads stay silent");
}

#[test]
fn template_rect_sits_above_the_background() {
    let session = shared(EditorSession::new(EditorConfig::default()));
    block_on(load_template_by_key(&session, "carousel2", &FakeLoader::default())).unwrap();

    let s = session.borrow();
    let rect = NodeId::intern("bg_rect");
    assert_eq!(s.scene().z_index_of(rect), Some(0));
    assert!(!s.node(rect).unwrap().attrs.draggable);
    let top = *s.scene().children(s.scene().root).last().unwrap();
    assert_eq!(s.scene().graph[top].id, NodeId::transformer());
}

#[test]
fn image_template_replaces_the_welcome_text() {
    let session = shared(EditorSession::new(EditorConfig::default()).with_welcome());
    let id = block_on(load_image_template(&session, "assets/t1.png", &FakeLoader::default())).unwrap();

    let s = session.borrow();
    assert_eq!(s.elements(), vec![id]);
    assert_eq!(s.selection(), Some(id));
    let node = s.node(id).unwrap();
    // 1080x1920 fitted into 300x550 is width-bound.
    assert!((node.attrs.width - 300.0).abs() < 1e-3);
    assert!((node.attrs.height - 533.333).abs() < 1e-2);
    assert_eq!(s.history().len(), 2);
}

#[test]
fn image_template_failure_notifies_with_url() {
    let session = shared(EditorSession::new(EditorConfig::default()).with_welcome());
    let loader = FakeLoader::failing("assets/t9.png");
    assert!(block_on(load_image_template(&session, "assets/t9.png", &loader)).is_err());

    let mut s = session.borrow_mut();
    assert_eq!(s.elements().len(), 1, "welcome text stays");
    assert_eq!(
        notifications(&mut s),
        vec!["Failed to load template image: assets/t9.png".to_string()]
    );
}

const CLASHING_IDS: &str = r#"{
    "className": "Layer",
    "children": [
        { "className": "Text", "id": "layer", "text": "one" },
        { "className": "Text", "id": "transformer", "text": "two" },
        { "className": "Text", "id": "dup", "text": "three" },
        { "className": "Text", "id": "dup", "text": "four" }
    ]
}"#;

#[test]
fn template_ids_never_replace_control_nodes_or_each_other() {
    let session = shared(EditorSession::new(EditorConfig::default()));
    let descriptor = TemplateDescriptor::from_json(CLASHING_IDS).unwrap();
    block_on(load_template(&session, descriptor, &FakeLoader::default())).unwrap();

    let mut s = session.borrow_mut();
    let elements = s.elements();
    assert_eq!(elements.len(), 4, "every child is added");
    assert!(elements.iter().all(|id| !id.is_reserved()));
    assert_eq!(s.scene().graph[s.scene().root].id, NodeId::layer());
    assert_eq!(s.node(NodeId::intern("dup")).and_then(SceneNode::as_text).unwrap().text, "three");

    let texts: Vec<String> = elements
        .iter()
        .map(|id| s.node(*id).and_then(SceneNode::as_text).unwrap().text.clone())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three", "four"]);

    let last = elements[3];
    s.select(last);
    assert_eq!(s.overlay_nodes().as_slice(), &[last]);
    let top = *s.scene().children(s.scene().root).last().unwrap();
    assert_eq!(s.scene().graph[top].id, NodeId::transformer());
}

#[test]
fn generated_ids_skip_names_a_template_already_used() {
    let session = shared(EditorSession::new(EditorConfig::default()));
    let marker = NodeId::with_prefix("text");
    let n: u64 = marker.as_str()["text_".len()..].parse().unwrap();
    let children: Vec<String> = (n + 1..=n + 5)
        .map(|k| format!(r#"{{ "className": "Text", "id": "text_{k}", "text": "t{k}" }}"#))
        .collect();
    let json = format!(r#"{{ "className": "Layer", "children": [{}] }}"#, children.join(","));
    let descriptor = TemplateDescriptor::from_json(&json).unwrap();
    block_on(load_template(&session, descriptor, &FakeLoader::default())).unwrap();

    let mut s = session.borrow_mut();
    assert_eq!(s.elements().len(), 5);
    for _ in 0..20 {
        s.add_text(TextOptions::default());
    }
    assert_eq!(s.elements().len(), 25);
}
