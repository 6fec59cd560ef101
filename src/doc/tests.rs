// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{json, Value};
use yrs::{Map, MapPrelim, Transact};

use super::change::ChangeAction;
use super::codec::any_from_value;
use super::SharedDocument;
use crate::model::fixtures::{demo_session_text, demo_session_value};
use crate::model::{SessionDocumentError, IDENTITY_LINK_FUNCTION};

#[fixture]
fn document() -> SharedDocument {
    let document = SharedDocument::new();
    document.set(&demo_session_text()).expect("set demo session");
    document
}

fn identity_link_value() -> Value {
    json!({
        "_type": "glue.core.component_link.ComponentLink",
        "data1": "w5",
        "data2": "w5_psc",
        "cids1": ["Declination"],
        "cids2": ["DEJ2000"],
        "cids1_labels": ["Declination"],
        "cids2_labels": ["DEJ2000"],
        "using": {"function": IDENTITY_LINK_FUNCTION}
    })
}

#[rstest]
fn set_decomposes_into_collections(document: SharedDocument) {
    let tabs = document.tabs();
    assert!(tabs.contains_key("Tab 1"));
    assert!(tabs.contains_key("Tab 2"));
    assert!(tabs["Tab 1"].contains_key("ScatterViewer"));

    assert!(document.contents().contains_key("HistogramViewer"));
    assert!(document.attributes().contains_key("psc_cid_1"));
    assert!(document.dataset().contains_key("w5_psc"));
}

#[rstest]
fn links_expose_the_uniform_schema(document: SharedDocument) {
    let links = document.links();
    assert_eq!(links.len(), 3);

    for link in links.values() {
        assert!(!link.link_type().is_empty());
        assert_eq!(link.data1(), Some("w5"));
        assert_eq!(link.data2(), Some("w5_psc"));
        assert_eq!(link.cids1().len(), link.cids1_labels().len());
        assert_eq!(link.cids2().len(), link.cids2_labels().len());
    }
}

#[rstest]
fn get_round_trips_the_flat_document(document: SharedDocument) {
    let recomposed: Value = serde_json::from_str(&document.get()).expect("get parses");
    assert_eq!(recomposed, demo_session_value());
}

#[rstest]
fn get_reflects_a_concurrently_added_tab(document: SharedDocument) {
    let spec = json!({
        "_type": "glue.viewers.scatter.qt.data_viewer.ScatterViewer",
        "layers": [],
        "state": {"values": {"layer": "st__w5"}}
    });

    {
        let mut txn = document.ydoc().transact_mut();
        let tab = document
            .collections()
            .tabs
            .insert(&mut txn, "Tab 3", MapPrelim::default());
        tab.insert(&mut txn, "NewScatter", any_from_value(&spec));
    }

    let recomposed: Value = serde_json::from_str(&document.get()).expect("get parses");
    let main = &recomposed["__main__"];
    assert_eq!(
        main["tab_names"],
        json!(["Tab 1", "Tab 2", "Tab 3"])
    );
    assert_eq!(main["viewers"][2], json!(["NewScatter"]));
    assert_eq!(recomposed["NewScatter"], spec);
}

#[rstest]
fn get_reflects_a_removed_tab(document: SharedDocument) {
    {
        let mut txn = document.ydoc().transact_mut();
        document.collections().tabs.remove(&mut txn, "Tab 1");
    }

    let recomposed: Value = serde_json::from_str(&document.get()).expect("get parses");
    let main = &recomposed["__main__"];
    assert_eq!(main["tab_names"], json!(["Tab 2"]));
    assert_eq!(main["viewers"], json!([["HistogramViewer"]]));
}

#[rstest]
fn get_recomposes_a_concurrently_added_link(document: SharedDocument) {
    {
        let mut txn = document.ydoc().transact_mut();
        document.collections().links.insert(
            &mut txn,
            "TestLink",
            any_from_value(&identity_link_value()),
        );
    }

    let recomposed: Value = serde_json::from_str(&document.get()).expect("get parses");
    let link_names = &recomposed["DataCollection"]["links"];
    assert_eq!(
        *link_names,
        json!(["Advanced Link", "Component Link", "Identity Link", "TestLink"])
    );
    assert_eq!(recomposed["TestLink"]["frm"], json!(["Declination"]));
    assert_eq!(recomposed["TestLink"]["to"], json!(["DEJ2000"]));
    assert!(recomposed["TestLink"].get("cids1_labels").is_none());
}

#[rstest]
fn tab_data_distinguishes_absent_from_empty(document: SharedDocument) {
    assert!(document.get_tab_data("Tab 9").is_none());

    {
        let mut txn = document.ydoc().transact_mut();
        document
            .collections()
            .tabs
            .insert(&mut txn, "Empty Tab", MapPrelim::default());
    }

    let data = document.get_tab_data("Empty Tab").expect("tab exists");
    assert!(data.is_empty());
}

#[rstest]
fn remove_tab_viewer_removes_one_nested_entry(document: SharedDocument) {
    document.remove_tab_viewer("Tab 1", "ScatterViewer");

    let data = document.get_tab_data("Tab 1").expect("tab exists");
    assert!(!data.contains_key("ScatterViewer"));

    // Removing from an absent tab is a no-op.
    document.remove_tab_viewer("Tab 9", "ScatterViewer");
}

#[rstest]
fn observers_see_all_five_collections_on_set() {
    let document = SharedDocument::new();
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    document.observe(Arc::new(move |_txn, collection, change| {
        assert!(!change.is_empty());
        sink.lock().expect("seen lock").push(collection.as_str());
    }));

    document.set(&demo_session_text()).expect("set demo session");

    let seen = seen.lock().expect("seen lock");
    for collection in ["contents", "attributes", "dataset", "links", "tabs"] {
        assert!(
            seen.contains(&collection),
            "expected a change event for {collection}"
        );
    }
}

#[rstest]
fn deep_tab_observation_surfaces_nested_viewer_edits(document: SharedDocument) {
    let seen: Arc<Mutex<Vec<(String, ChangeAction)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    document.observe(Arc::new(move |_txn, collection, change| {
        if collection != super::change::Collection::Tabs {
            return;
        }
        let mut sink = sink.lock().expect("seen lock");
        for key_change in &change.keys {
            sink.push((key_change.key.clone(), key_change.action));
        }
    }));

    document.remove_tab_viewer("Tab 1", "ScatterViewer");

    let seen = seen.lock().expect("seen lock");
    assert_eq!(seen.as_slice(), [("Tab 1".to_owned(), ChangeAction::Update)]);
}

#[rstest]
fn reobserving_replaces_the_previous_subscription_set(document: SharedDocument) {
    let first: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
    let first_sink = Arc::clone(&first);
    document.observe(Arc::new(move |_txn, _collection, _change| {
        *first_sink.lock().expect("count lock") += 1;
    }));

    let second: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
    let second_sink = Arc::clone(&second);
    document.observe(Arc::new(move |_txn, _collection, _change| {
        *second_sink.lock().expect("count lock") += 1;
    }));

    document.remove_tab_viewer("Tab 1", "ScatterViewer");

    assert_eq!(*first.lock().expect("count lock"), 0);
    assert!(*second.lock().expect("count lock") > 0);
}

#[rstest]
fn set_rejects_dangling_references_without_mutating() {
    let document = SharedDocument::new();
    let text = r#"{
        "__main__": {"data": "", "tab_names": ["Tab 1"], "viewers": [["Ghost"]]}
    }"#;

    let result = document.set(text);
    assert!(matches!(
        result,
        Err(SessionDocumentError::DanglingReference { .. })
    ));
    assert!(document.contents().is_empty());
    assert!(document.tabs().is_empty());
}

#[rstest]
fn set_replaces_stale_entries(document: SharedDocument) {
    let minimal = json!({
        "__main__": {"data": "", "tab_names": [], "viewers": []}
    });
    document
        .set(&minimal.to_string())
        .expect("set minimal session");

    assert_eq!(document.contents().len(), 1);
    assert!(document.tabs().is_empty());
    assert!(document.dataset().is_empty());
    assert!(document.links().is_empty());
}
