//! Integration tests for the editor crate

use pagecraft_editor::{
    DocumentStore, DragFrame, DragSource, DropZone, EditSession, EditorConfig, EditorError,
    FileStore, ManualClock, MemoryStore, Outcome, Pipeline, PipelineError, Point, Rect, SaveStatus,
    SessionError, CURRENT_VERSION,
};
use pagecraft_model::{kind, BlockProps, NodeId, RawDocument, ValidationKind};
use pagecraft_registry::{Registry, MODULE_PAYMENTS};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn legacy_document() -> RawDocument {
    serde_json::from_value(json!({
        "version": 1,
        "rootId": "home",
        "nodes": {
            "home": { "id": "home", "type": "page", "childIds": ["hero"], "props": { "title": "Home" } },
            "hero": { "id": "hero", "type": "section", "parentId": "home", "childIds": ["img", "copy", "buy"] },
            "img": { "id": "img", "type": "image", "parentId": "hero",
                     "props": { "src": "/hero.png", "alt": "", "dimensions": "1200x600" } },
            "copy": { "id": "copy", "type": "text", "parentId": "hero",
                      "props": { "html": "<p>Hello<img src=x onerror=alert(1)></p>" } },
            "buy": { "id": "buy", "type": "payment-button", "parentId": "hero",
                     "props": { "label": "Buy", "productId": "sku-1", "priceCents": 1999 } }
        }
    }))
    .unwrap()
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

#[tokio::test]
async fn test_open_runs_full_pipeline() {
    let store = MemoryStore::new();
    store.insert("home", legacy_document());

    let (session, warnings) = EditSession::open(
        &store,
        "home",
        Arc::new(Registry::builtin()),
        EditorConfig::default(),
    )
    .await
    .unwrap();
    assert!(warnings.is_empty());

    let image = session.content().get(&id("img")).unwrap();
    let BlockProps::Image(props) = &image.props else {
        panic!("expected image props");
    };
    assert_eq!((props.width, props.height), (Some(1200), Some(600)));

    let text = session.content().get(&id("copy")).unwrap();
    let BlockProps::Text(props) = &text.props else {
        panic!("expected text props");
    };
    assert_eq!(props.html, "<p>Hello</p>");

    assert_eq!(session.snapshot().version, CURRENT_VERSION);
}

#[tokio::test]
async fn test_open_missing_document() {
    let store = MemoryStore::new();
    let err = EditSession::open(&store, "nope", Arc::new(Registry::builtin()), EditorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Store(_)));
}

#[tokio::test]
async fn test_publish_check_reports_content_rules() {
    let store = MemoryStore::new();
    store.insert("home", legacy_document());
    let registry = Arc::new(Registry::builtin());

    let (session, _) = EditSession::open(&store, "home", registry.clone(), EditorConfig::default())
        .await
        .unwrap();
    let report = session.publish_check();
    let mut nodes: Vec<_> = report.errors.iter().filter_map(|e| e.node_id.clone()).collect();
    nodes.sort();
    assert_eq!(nodes, vec![id("buy"), id("img")]);
    assert!(report.errors.iter().all(|e| e.kind == ValidationKind::ContentRule));

    let config = EditorConfig {
        enabled_modules: vec![MODULE_PAYMENTS.to_string()],
        ..EditorConfig::default()
    };
    let (session, _) = EditSession::open(&store, "home", registry, config).await.unwrap();
    assert_eq!(session.publish_check().errors.len(), 1);
}

#[test]
fn test_publish_scenario_single_image_without_alt() {
    let pipeline = Pipeline::new(Arc::new(Registry::builtin()));
    let input = json!({
        "version": CURRENT_VERSION,
        "rootId": "r",
        "nodes": {
            "r": { "id": "r", "type": "page", "childIds": ["s"] },
            "s": { "id": "s", "type": "section", "parentId": "r", "childIds": ["i"] },
            "i": { "id": "i", "type": "image", "parentId": "s", "props": { "src": "/a.png", "altText": "" } }
        }
    })
    .to_string();
    let loaded = pipeline.load_str(&input).unwrap();
    let report = pipeline.publish_validate(&loaded.content, &Default::default());

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ValidationKind::ContentRule);
    assert_eq!(report.errors[0].node_id, Some(id("i")));
    assert!(!report.is_publishable());
}

#[test]
fn test_pipeline_rejects_broken_structure() {
    let pipeline = Pipeline::new(Arc::new(Registry::builtin()));
    let input = json!({
        "version": CURRENT_VERSION,
        "rootId": "r",
        "nodes": {
            "r": { "id": "r", "type": "page", "childIds": ["s"] },
            "s": { "id": "s", "type": "section", "parentId": "elsewhere" }
        }
    })
    .to_string();
    assert!(matches!(pipeline.load_str(&input), Err(PipelineError::Structural(_))));
}

#[test]
fn test_drop_at_resolves_and_moves() {
    let mut session = EditSession::blank("doc", Arc::new(Registry::builtin()), EditorConfig::default());
    let root = session.content().root_id().clone();
    let first = session.insert_block(kind::SECTION, &root, None).unwrap();
    let second = session.insert_block(kind::SECTION, &root, None).unwrap();
    let heading = session.insert_block(kind::HEADING, &first, None).unwrap();

    let frame = DragFrame {
        pointer: Point::new(50.0, 150.0),
        zones: vec![
            DropZone {
                rect: Rect::new(0.0, 0.0, 400.0, 100.0),
                parent_id: first.clone(),
                index: None,
            },
            DropZone {
                rect: Rect::new(0.0, 100.0, 400.0, 100.0),
                parent_id: second.clone(),
                index: None,
            },
        ],
        node_rects: HashMap::new(),
    };

    let outcome = session
        .drop_at(DragSource::Existing(heading.clone()), &frame)
        .unwrap();
    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(session.content().parent_of(&heading), Some(&second));

    // Sections never go inside sections: nothing eligible, nothing changes
    let revision = session.revision();
    let err = session
        .drop_at(DragSource::Palette(kind::SECTION.into()), &frame)
        .unwrap_err();
    assert!(matches!(err, SessionError::Drop(_)));
    assert_eq!(session.revision(), revision);
}

#[test]
fn test_paste_fragment_from_other_document() {
    let mut session = EditSession::blank("doc", Arc::new(Registry::builtin()), EditorConfig::default());
    let root = session.content().root_id().clone();
    let section = session.insert_block(kind::SECTION, &root, None).unwrap();

    let fragment = json!({
        "version": 2,
        "rootId": "g",
        "nodes": {
            "g": { "id": "g", "type": "gallery", "parentId": "old-parent", "childIds": ["p1", "p2"] },
            "p1": { "id": "p1", "type": "image", "parentId": "g", "props": { "src": "/1.png", "altText": "one" } },
            "p2": { "id": "p2", "type": "image", "parentId": "g",
                    "props": { "src": "javascript:alert(1)", "altText": "two", "dimensions": "10x10" } }
        }
    })
    .to_string();

    let outcome = session.paste_fragment(&fragment, &section).unwrap();
    let gallery = outcome.created().cloned().unwrap();
    assert_ne!(gallery, id("g"));

    let node = session.content().get(&gallery).unwrap();
    assert_eq!(node.child_ids.len(), 2);
    let BlockProps::Image(second) = &session.content().get(&node.child_ids[1]).unwrap().props else {
        panic!("expected image props");
    };
    assert_eq!(second.src, "");
    assert_eq!(second.width, Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_autosave_follows_commits() {
    let store = Arc::new(MemoryStore::new());
    let mut session = EditSession::blank("doc", Arc::new(Registry::builtin()), EditorConfig::default())
        .with_autosave(store.clone());
    let root = session.content().root_id().clone();

    let section = session.insert_block(kind::SECTION, &root, None).unwrap();
    session.insert_block(kind::TEXT, &section, None).unwrap();
    tokio::time::sleep(Duration::from_millis(2000)).await;

    assert_eq!(store.save_count(), 1);
    assert_eq!(session.save_status(), SaveStatus::Saved { revision: 2 });
    assert_eq!(store.get("doc"), Some(session.snapshot()));

    // Undo is an edit to the persisted state too
    session.undo().unwrap();
    session.flush().await.unwrap();
    assert_eq!(store.save_count(), 2);
    assert_eq!(store.get("doc"), Some(session.snapshot()));

    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_edits_continue_while_store_is_offline() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let clock = Arc::new(ManualClock::new());
    let mut session = EditSession::blank("doc", Arc::new(Registry::builtin()), EditorConfig::default())
        .with_clock(clock.clone())
        .with_autosave(store.clone());
    let root = session.content().root_id().clone();

    session.insert_block(kind::SECTION, &root, None).unwrap();
    tokio::time::sleep(Duration::from_millis(1600)).await;
    clock.advance(Duration::from_millis(1600));
    assert!(matches!(session.save_status(), SaveStatus::Failed { .. }));

    session.insert_block(kind::SECTION, &root, None).unwrap();
    assert_eq!(session.history().undo_levels(), 2);

    store.set_offline(false);
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(session.save_status(), SaveStatus::Saved { revision: 2 });
}

#[tokio::test]
async fn test_file_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let registry = Arc::new(Registry::builtin());

    let mut session = EditSession::blank("landing", registry.clone(), EditorConfig::default())
        .with_autosave(store.clone());
    let root = session.content().root_id().clone();
    let section = session.insert_block(kind::SECTION, &root, None).unwrap();
    session.insert_block(kind::HEADING, &section, None).unwrap();
    session.flush().await.unwrap();
    let saved = session.content().clone();
    session.close().await;

    let (reopened, warnings) = EditSession::open(store.as_ref(), "landing", registry, EditorConfig::default())
        .await
        .unwrap();
    assert!(warnings.is_empty());
    assert_eq!(reopened.content(), &saved);
    assert!(!reopened.can_undo());

    let raw = store.load("landing").await.unwrap();
    assert_eq!(raw.version, CURRENT_VERSION);
}
