// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use super::viewers::read_view_state;
use super::{EngineWarning, SharedSession, SlotStatus};
use crate::backend::memory::{MemoryDataAccess, MemoryLinkEngine, MemoryPlotBackend};
use crate::backend::LiveLink;
use crate::doc::codec::any_from_value;
use crate::model::fixtures::{demo_session_text, demo_session_value};
use crate::model::{ViewKind, IDENTITY_LINK_FUNCTION};

const HISTOGRAM_TYPE: &str = "glue.viewers.histogram.qt.data_viewer.HistogramViewer";

struct SessionTestCtx {
    session: SharedSession,
    construct_calls: Arc<AtomicU64>,
    load_log: Arc<Mutex<Vec<PathBuf>>>,
    live_links: Arc<Mutex<Vec<LiveLink>>>,
    link_adds: Arc<AtomicU64>,
    link_removes: Arc<AtomicU64>,
}

fn ctx_with_plot(plot: MemoryPlotBackend) -> SessionTestCtx {
    let construct_calls = plot.construct_counter();
    let data_access = MemoryDataAccess::new();
    let load_log = data_access.load_log();
    let link_engine = MemoryLinkEngine::new();
    let live_links = link_engine.links_handle();
    let link_adds = link_engine.add_counter();
    let link_removes = link_engine.remove_counter();

    SessionTestCtx {
        session: SharedSession::new(
            Box::new(plot),
            Box::new(data_access),
            Box::new(link_engine),
        ),
        construct_calls,
        load_log,
        live_links,
        link_adds,
        link_removes,
    }
}

#[fixture]
fn ctx() -> SessionTestCtx {
    ctx_with_plot(MemoryPlotBackend::new())
}

#[fixture]
fn loaded(ctx: SessionTestCtx) -> SessionTestCtx {
    ctx.session
        .load_session(&demo_session_text())
        .expect("load demo session");
    ctx
}

fn insert_link(session: &SharedSession, name: &str, value: &Value) {
    use yrs::{Map, Transact};
    let document = session.document();
    let mut txn = document.ydoc().transact_mut();
    document
        .collections()
        .links
        .insert(&mut txn, name, any_from_value(value));
}

fn remove_link(session: &SharedSession, name: &str) {
    use yrs::{Map, Transact};
    let document = session.document();
    let mut txn = document.ydoc().transact_mut();
    document.collections().links.remove(&mut txn, name);
}

fn remove_tab_record(session: &SharedSession, tab_name: &str) {
    use yrs::{Map, Transact};
    let document = session.document();
    let mut txn = document.ydoc().transact_mut();
    document.collections().tabs.remove(&mut txn, tab_name);
}

fn identity_link_value(
    data1: &str,
    label1: &str,
    data2: &str,
    label2: &str,
) -> Value {
    json!({
        "_type": "glue.core.component_link.ComponentLink",
        "data1": data1,
        "data2": data2,
        "cids1": [label1],
        "cids2": [label2],
        "cids1_labels": [label1],
        "cids2_labels": [label2],
        "using": {"function": IDENTITY_LINK_FUNCTION}
    })
}

#[rstest]
fn loading_a_session_bootstraps_the_engine(loaded: SessionTestCtx) {
    assert_eq!(loaded.session.data_names(), ["w5", "w5_psc"]);

    assert_eq!(
        loaded.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Live)
    );
    assert_eq!(
        loaded.session.viewer_status("Tab 2", "HistogramViewer"),
        Some(SlotStatus::Live)
    );
    assert_eq!(loaded.session.live_placeholders(), 2);
    assert_eq!(
        loaded.session.viewer_data_label("Tab 1", "ScatterViewer"),
        Some("w5".to_owned())
    );

    // The declared identity link converged into the engine's live set.
    assert_eq!(loaded.link_adds.load(Ordering::Relaxed), 1);
    let live = loaded.live_links.lock().expect("live links");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].data1, "w5");
    assert_eq!(live[0].cids1, ["Declination"]);
}

#[rstest]
fn dataset_loading_is_memoized(loaded: SessionTestCtx) {
    assert_eq!(loaded.load_log.lock().expect("load log").len(), 2);

    loaded.session.reload_data();
    loaded.session.reload_data();

    assert_eq!(loaded.load_log.lock().expect("load log").len(), 2);
}

#[rstest]
fn reconciliation_is_idempotent(loaded: SessionTestCtx) {
    let constructed = loaded.construct_calls.load(Ordering::Relaxed);
    assert_eq!(constructed, 2);

    loaded.session.reconcile_viewers();
    loaded.session.reconcile_viewers();

    assert_eq!(loaded.construct_calls.load(Ordering::Relaxed), constructed);
    assert_eq!(
        loaded.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Live)
    );
}

#[rstest]
fn removing_a_tab_destroys_its_viewer_entries(loaded: SessionTestCtx) {
    remove_tab_record(&loaded.session, "Tab 1");

    assert_eq!(loaded.session.viewer_status("Tab 1", "ScatterViewer"), None);
    assert_eq!(
        loaded.session.viewer_status("Tab 2", "HistogramViewer"),
        Some(SlotStatus::Live)
    );
    assert_eq!(loaded.session.live_placeholders(), 1);
}

#[rstest]
fn removing_a_viewer_from_the_document_destroys_its_entry(loaded: SessionTestCtx) {
    loaded.session.document().remove_tab_viewer("Tab 1", "ScatterViewer");

    assert_eq!(loaded.session.viewer_status("Tab 1", "ScatterViewer"), None);
    assert_eq!(loaded.session.live_placeholders(), 1);
}

#[rstest]
fn preallocated_placeholders_are_reused(ctx: SessionTestCtx) {
    ctx.session.create_viewer("Tab 1", "ScatterViewer");
    assert_eq!(
        ctx.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Pending)
    );
    assert_eq!(ctx.session.live_placeholders(), 1);

    ctx.session
        .load_session(&demo_session_text())
        .expect("load demo session");

    assert_eq!(
        ctx.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Live)
    );
    assert_eq!(ctx.session.live_placeholders(), 2);
}

#[rstest]
fn construction_failure_is_isolated_to_one_viewer() {
    let ctx = ctx_with_plot(MemoryPlotBackend::new().with_failure(HISTOGRAM_TYPE));
    ctx.session
        .load_session(&demo_session_text())
        .expect("load demo session");

    assert_eq!(
        ctx.session.viewer_status("Tab 2", "HistogramViewer"),
        Some(SlotStatus::Error)
    );
    let failure = ctx
        .session
        .viewer_error("Tab 2", "HistogramViewer")
        .expect("error sentinel");
    assert_eq!(failure.kind(), "Backend");
    assert!(failure.message().contains("histogram"));

    assert_eq!(
        ctx.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Live)
    );
}

#[rstest]
fn error_sentinels_are_not_retried() {
    let ctx = ctx_with_plot(MemoryPlotBackend::new().with_failure(HISTOGRAM_TYPE));
    ctx.session
        .load_session(&demo_session_text())
        .expect("load demo session");

    let constructed = ctx.construct_calls.load(Ordering::Relaxed);
    ctx.session.reconcile_viewers();
    assert_eq!(ctx.construct_calls.load(Ordering::Relaxed), constructed);
    assert_eq!(
        ctx.session.viewer_status("Tab 2", "HistogramViewer"),
        Some(SlotStatus::Error)
    );
}

#[rstest]
fn unsupported_view_types_become_error_sentinels(ctx: SessionTestCtx) {
    let mut session_value = demo_session_value();
    session_value["ScatterViewer"]["_type"] = json!("acme.viewers.Sparkline");
    ctx.session
        .load_session(&session_value.to_string())
        .expect("load session");

    let failure = ctx
        .session
        .viewer_error("Tab 1", "ScatterViewer")
        .expect("error sentinel");
    assert_eq!(failure.kind(), "UnsupportedViewType");
}

#[rstest]
fn unresolvable_identity_links_are_inert(loaded: SessionTestCtx) {
    let adds_before = loaded.link_adds.load(Ordering::Relaxed);

    let mut broken = identity_link_value("w5", "Declination", "w5_psc", "DEJ2000");
    broken["data1"] = Value::Null;
    broken["data2"] = Value::Null;
    insert_link(&loaded.session, "Broken Link", &broken);

    assert_eq!(loaded.link_adds.load(Ordering::Relaxed), adds_before);
    assert_eq!(loaded.link_removes.load(Ordering::Relaxed), 0);
}

#[rstest]
fn identity_link_matching_is_symmetric(loaded: SessionTestCtx) {
    assert_eq!(loaded.link_adds.load(Ordering::Relaxed), 1);

    insert_link(
        &loaded.session,
        "Forward Copy",
        &identity_link_value("w5", "Declination", "w5_psc", "DEJ2000"),
    );
    insert_link(
        &loaded.session,
        "Reversed Copy",
        &identity_link_value("w5_psc", "DEJ2000", "w5", "Declination"),
    );

    // Both declarations converge onto the one live link; no duplicates.
    assert_eq!(loaded.link_adds.load(Ordering::Relaxed), 1);
    assert_eq!(loaded.live_links.lock().expect("live links").len(), 1);
}

#[rstest]
fn removing_an_identity_link_deletes_the_live_counterpart(loaded: SessionTestCtx) {
    remove_link(&loaded.session, "Identity Link");

    assert_eq!(loaded.link_removes.load(Ordering::Relaxed), 1);
    assert!(loaded.live_links.lock().expect("live links").is_empty());
}

#[rstest]
fn removal_without_a_live_counterpart_is_already_converged(loaded: SessionTestCtx) {
    loaded.live_links.lock().expect("live links").clear();

    remove_link(&loaded.session, "Identity Link");

    assert_eq!(loaded.link_removes.load(Ordering::Relaxed), 0);
}

#[rstest]
fn non_identity_links_never_reach_the_engine(loaded: SessionTestCtx) {
    remove_link(&loaded.session, "Component Link");
    remove_link(&loaded.session, "Advanced Link");

    assert_eq!(loaded.link_adds.load(Ordering::Relaxed), 1);
    assert_eq!(loaded.link_removes.load(Ordering::Relaxed), 0);
}

#[rstest]
fn effective_state_merges_the_first_layer(loaded: SessionTestCtx) {
    let tabs = loaded.session.document().tabs();
    let contents = loaded.session.document().contents();

    let view_state = read_view_state(&tabs["Tab 1"], &contents, "ScatterViewer");
    assert_eq!(view_state.kind, ViewKind::Scatter2d);
    assert!(!view_state.multi_layer);
    assert_eq!(view_state.state["layer"], json!("w5"));
    assert_eq!(view_state.state["x_att"], json!("Right Ascension"));
    assert_eq!(view_state.state["alpha"], json!(0.8));
    assert_eq!(view_state.state["markersize"], json!(3));
}

#[rstest]
fn multi_layer_specs_are_flagged(ctx: SessionTestCtx) {
    let mut session_value = demo_session_value();
    session_value["ScatterViewer"]["layers"]
        .as_array_mut()
        .expect("layers array")
        .push(json!({"state": "scatter_layer_0"}));
    ctx.session
        .load_session(&session_value.to_string())
        .expect("load session");

    let warnings = ctx.session.take_warnings();
    assert!(warnings.iter().any(|warning| matches!(
        warning,
        EngineWarning::MultiLayerState { tab, viewer }
            if tab == "Tab 1" && viewer == "ScatterViewer"
    )));
    // Only the first layer contributed; the viewer still rendered.
    assert_eq!(
        ctx.session.viewer_status("Tab 1", "ScatterViewer"),
        Some(SlotStatus::Live)
    );
}

#[rstest]
fn add_data_serializes_a_new_dataset_into_the_document(loaded: SessionTestCtx) {
    let before = loaded.session.document().contents();
    let loads_before = loaded.load_log.lock().expect("load log").len();

    loaded
        .session
        .add_data(Path::new("w6_psc.csv"))
        .expect("add data");

    let after = loaded.session.document().contents();
    assert!(after.contains_key("w6_psc"));
    assert!(loaded.session.data_names().contains(&"w6_psc".to_owned()));

    let collection = after["DataCollection"].as_object().expect("collection");
    let data_names: Vec<&str> = collection["data"]
        .as_array()
        .expect("data list")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(data_names, ["w5", "w5_psc", "w6_psc"]);

    // Nothing outside the data collection and the new records changed.
    for (key, value) in &before {
        if key == "DataCollection" {
            continue;
        }
        assert_eq!(after.get(key), Some(value), "record {key:?} changed");
    }

    // One load for add_data itself; the reload pass uses the cache.
    assert_eq!(
        loaded.load_log.lock().expect("load log").len(),
        loads_before + 1
    );

    // Adding the same file again is a no-op.
    loaded
        .session
        .add_data(Path::new("w6_psc.csv"))
        .expect("add data twice");
    assert_eq!(
        loaded.load_log.lock().expect("load log").len(),
        loads_before + 1
    );
}

#[rstest]
fn add_viewer_layer_ignores_missing_targets(loaded: SessionTestCtx) {
    loaded.session.add_viewer_layer("Tab 1", "ScatterViewer", "w5_psc");
    loaded.session.add_viewer_layer("Tab 9", "ScatterViewer", "w5_psc");
    loaded.session.add_viewer_layer("Tab 1", "ScatterViewer", "unknown");

    assert!(loaded.session.take_warnings().is_empty());
}

#[rstest]
fn rejected_documents_leave_the_engine_untouched(ctx: SessionTestCtx) {
    let text = r#"{
        "__main__": {"data": "", "tab_names": ["Tab 1"], "viewers": [["Ghost"]]}
    }"#;

    ctx.session.load_session(text).expect_err("dangling reference");

    assert!(ctx.session.data_names().is_empty());
    assert_eq!(ctx.session.live_placeholders(), 0);
    assert_eq!(ctx.construct_calls.load(Ordering::Relaxed), 0);
}
