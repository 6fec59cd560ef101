// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The shared session: one [`SharedDocument`] plus the reconciliation engine
//! that keeps loaded datasets, live viewer objects, and engine-side links
//! converged with it.
//!
//! Every document change dispatches synchronously inside the commit's
//! observer callback: `contents` reloads datasets, `tabs` reloads and
//! reconciles viewers, `links` reloads and reconciles identity links. The
//! dataset loader is memoized, so the duplicated reload work is cheap.

pub mod factory;
pub mod links;
pub mod loader;
pub mod viewers;

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map as JsonMap, Value};
use yrs::{ReadTxn, Transact};

use crate::backend::{DataAccess, DataAccessError, Dataset, LinkEngine, PlotBackend};
use crate::doc::change::{ChangeEvent, Collection};
use crate::doc::{Collections, SharedDocument};
use crate::model::session_doc::string_list;
use crate::model::{
    DatasetName, SessionDocumentError, TabName, ViewerId, MAIN_RECORD_KEY,
};
use viewers::{LiveObject, ViewerSlot};

pub use factory::ConstructFailure;
pub use viewers::{Placeholder, SlotStatus};

const ENGINE_LOCK: &str = "engine state poisoned";

/// Engine-side state owned by one session: the dataset cache, the viewer
/// cache, and the external collaborators. Locked only inside observer
/// callbacks and explicit session operations; a session operation must never
/// hold this lock across a document mutation, because commits fire observers
/// synchronously and the lock is not reentrant.
pub(crate) struct EngineState {
    pub(crate) collections: Collections,
    pub(crate) data: BTreeMap<DatasetName, Dataset>,
    pub(crate) viewers: BTreeMap<TabName, BTreeMap<ViewerId, ViewerSlot>>,
    pub(crate) plot: Box<dyn PlotBackend>,
    pub(crate) data_access: Box<dyn DataAccess>,
    pub(crate) link_engine: Box<dyn LinkEngine>,
    pub(crate) next_placeholder_id: u64,
    pub(crate) live_placeholders: u64,
    pub(crate) warnings: Vec<EngineWarning>,
}

impl EngineState {
    fn new(
        collections: Collections,
        plot: Box<dyn PlotBackend>,
        data_access: Box<dyn DataAccess>,
        link_engine: Box<dyn LinkEngine>,
    ) -> Self {
        Self {
            collections,
            data: BTreeMap::new(),
            viewers: BTreeMap::new(),
            plot,
            data_access,
            link_engine,
            next_placeholder_id: 0,
            live_placeholders: 0,
            warnings: Vec::new(),
        }
    }

    fn dispatch<T: ReadTxn>(&mut self, txn: &T, collection: Collection, change: &ChangeEvent) {
        match collection {
            Collection::Contents => self.reload_datasets(txn),
            Collection::Tabs => {
                self.reload_datasets(txn);
                self.reconcile_viewers(txn);
            }
            Collection::Links => {
                self.reload_datasets(txn);
                self.reconcile_links(change);
            }
            Collection::Attributes | Collection::Dataset => {}
        }
    }
}

/// Non-fatal conditions the engine records instead of raising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineWarning {
    DatasetLoad {
        name: String,
        path: String,
        message: String,
    },
    MultiLayerState {
        tab: String,
        viewer: String,
    },
    AddLayer {
        tab: String,
        viewer: String,
        message: String,
    },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatasetLoad {
                name,
                path,
                message,
            } => write!(f, "cannot load dataset {name:?} from {path:?}: {message}"),
            Self::MultiLayerState { tab, viewer } => write!(
                f,
                "viewer {viewer:?} in tab {tab:?} declares multiple layers; only the first contributes"
            ),
            Self::AddLayer {
                tab,
                viewer,
                message,
            } => write!(
                f,
                "cannot add layer to viewer {viewer:?} in tab {tab:?}: {message}"
            ),
        }
    }
}

/// A collaboratively edited session with a live rendering kept in sync.
pub struct SharedSession {
    document: Arc<SharedDocument>,
    state: Arc<Mutex<EngineState>>,
}

impl SharedSession {
    pub fn new(
        plot: Box<dyn PlotBackend>,
        data_access: Box<dyn DataAccess>,
        link_engine: Box<dyn LinkEngine>,
    ) -> Self {
        let document = Arc::new(SharedDocument::new());
        let state = Arc::new(Mutex::new(EngineState::new(
            document.collections().clone(),
            plot,
            data_access,
            link_engine,
        )));

        let dispatch_state = Arc::clone(&state);
        document.observe(Arc::new(move |txn, collection, change| {
            dispatch_state
                .lock()
                .expect(ENGINE_LOCK)
                .dispatch(txn, collection, change);
        }));

        Self { document, state }
    }

    pub fn document(&self) -> &Arc<SharedDocument> {
        &self.document
    }

    /// Loads a flat session into the document. The resulting change events
    /// drive the engine: datasets load and declared viewers render before
    /// this returns.
    pub fn load_session(&self, text: &str) -> Result<(), SessionDocumentError> {
        self.document.set(text)
    }

    /// The canonical flat text of the current document state.
    pub fn export_session(&self) -> String {
        self.document.get()
    }

    pub fn reload_data(&self) {
        let txn = self.document.ydoc().transact();
        self.state.lock().expect(ENGINE_LOCK).reload_datasets(&txn);
    }

    pub fn reconcile_viewers(&self) {
        let txn = self.document.ydoc().transact();
        self.state.lock().expect(ENGINE_LOCK).reconcile_viewers(&txn);
    }

    /// Eagerly allocates a viewer placeholder ahead of the reconciliation
    /// pass. A later pass fills the slot; an existing slot is left alone.
    pub fn create_viewer(&self, tab_name: &str, viewer_id: &str) {
        let (Ok(tab), Ok(viewer)) = (TabName::new(tab_name), ViewerId::new(viewer_id)) else {
            return;
        };
        self.state.lock().expect(ENGINE_LOCK).ensure_slot(&tab, &viewer);
    }

    pub fn remove_viewer(&self, tab_name: &str, viewer_id: &str) {
        let (Ok(tab), Ok(viewer)) = (TabName::new(tab_name), ViewerId::new(viewer_id)) else {
            return;
        };
        self.state
            .lock()
            .expect(ENGINE_LOCK)
            .remove_viewer_entry(&tab, &viewer);
    }

    pub fn remove_tab(&self, tab_name: &str) {
        let Ok(tab) = TabName::new(tab_name) else {
            return;
        };
        self.state.lock().expect(ENGINE_LOCK).remove_tab_entries(&tab);
    }

    /// Pushes an additional cached dataset into an already-live viewer.
    /// Missing tab, viewer, live object, or dataset makes this a no-op.
    pub fn add_viewer_layer(&self, tab_name: &str, viewer_id: &str, data_name: &str) {
        let mut engine = self.state.lock().expect(ENGINE_LOCK);
        let engine = &mut *engine;

        let Some(dataset) = engine.data.get(data_name).cloned() else {
            return;
        };
        let Some(slot) = engine
            .viewers
            .get_mut(tab_name)
            .and_then(|slots| slots.get_mut(viewer_id))
        else {
            return;
        };
        let Some(LiveObject::View(view)) = slot.live.as_mut() else {
            return;
        };

        if let Err(error) = view.add_data(&dataset) {
            engine.warnings.push(EngineWarning::AddLayer {
                tab: tab_name.to_owned(),
                viewer: viewer_id.to_owned(),
                message: error.to_string(),
            });
        }
    }

    /// Loads a dataset file and serializes it into the document: attribute
    /// and component records, the dataset record, and the data-collection
    /// bookkeeping. The loaded dataset is cached up front so the loader never
    /// re-reads the file.
    pub fn add_data(&self, path: &Path) -> Result<(), AddDataError> {
        let Some(label) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return Err(AddDataError::InvalidPath {
                path: path.to_path_buf(),
            });
        };
        let label = label.to_owned();
        let dataset_name =
            DatasetName::new(label.clone()).map_err(|_| AddDataError::InvalidPath {
                path: path.to_path_buf(),
            })?;

        let dataset = {
            let mut engine = self.state.lock().expect(ENGINE_LOCK);
            match engine.data.get(&dataset_name) {
                Some(dataset) => dataset.clone(),
                None => {
                    let dataset = engine
                        .data_access
                        .load(path)
                        .map_err(AddDataError::Load)?;
                    engine.data.insert(dataset_name, dataset.clone());
                    dataset
                }
            }
        };

        let mut contents = self.document.contents();
        let collection_name = contents
            .get(MAIN_RECORD_KEY)
            .and_then(Value::as_object)
            .and_then(|main| main.get("data"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        if collection_name.is_empty() || !contents.contains_key(&collection_name) {
            return Err(AddDataError::MissingDataCollection);
        }

        let already_declared = string_list(
            contents
                .get(&collection_name)
                .and_then(Value::as_object)
                .and_then(|collection| collection.get("data")),
        )
        .iter()
        .any(|name| name == &label);
        if already_declared {
            return Ok(());
        }

        let mut attribute_ids = Vec::new();
        let mut component_ids = Vec::new();
        let mut component_pairs = Vec::new();
        for (index, component_label) in dataset.components().iter().enumerate() {
            let attribute_id = unique_object_id(&contents, &format!("{label}_cid_{index}"));
            let component_id = unique_object_id(&contents, &format!("{label}_comp_{index}"));

            contents.insert(
                attribute_id.clone(),
                serde_json::json!({
                    "_type": "glue.core.component_id.ComponentID",
                    "label": component_label,
                }),
            );
            contents.insert(
                component_id.clone(),
                serde_json::json!({"_type": "glue.core.data.Component"}),
            );

            component_pairs.push(Value::Array(vec![
                Value::String(attribute_id.clone()),
                Value::String(component_id.clone()),
            ]));
            attribute_ids.push(attribute_id);
            component_ids.push(component_id);
        }

        contents.insert(
            label.clone(),
            serde_json::json!({
                "_type": "glue.core.data.Data",
                "components": component_pairs,
                "label": label,
                "primary_owner": attribute_ids,
            }),
        );

        if let Some(collection) = contents
            .get_mut(&collection_name)
            .and_then(Value::as_object_mut)
        {
            append_sorted(collection, "data", Value::String(label.clone()));
            for attribute_id in &attribute_ids {
                append_sorted(collection, "cids", Value::String(attribute_id.clone()));
            }
            for component_id in &component_ids {
                append_sorted(collection, "components", Value::String(component_id.clone()));
            }
        }

        let flat: JsonMap<String, Value> = contents.into_iter().collect();
        let text = serde_json::to_string(&Value::Object(flat)).expect("document serializes");
        self.document.set(&text).map_err(AddDataError::Document)
    }

    pub fn data_names(&self) -> Vec<String> {
        self.state
            .lock()
            .expect(ENGINE_LOCK)
            .data
            .keys()
            .map(|name| name.as_str().to_owned())
            .collect()
    }

    pub fn viewer_status(&self, tab_name: &str, viewer_id: &str) -> Option<SlotStatus> {
        let engine = self.state.lock().expect(ENGINE_LOCK);
        let slot = engine.viewers.get(tab_name)?.get(viewer_id)?;
        Some(slot.status())
    }

    /// The dataset label the live viewer object was constructed with.
    pub fn viewer_data_label(&self, tab_name: &str, viewer_id: &str) -> Option<String> {
        let engine = self.state.lock().expect(ENGINE_LOCK);
        let slot = engine.viewers.get(tab_name)?.get(viewer_id)?;
        match slot.live()? {
            LiveObject::View(view) => view.data_label().map(ToOwned::to_owned),
            LiveObject::Error(_) => None,
        }
    }

    /// The error sentinel recorded for a viewer whose construction failed.
    pub fn viewer_error(&self, tab_name: &str, viewer_id: &str) -> Option<ConstructFailure> {
        let engine = self.state.lock().expect(ENGINE_LOCK);
        let slot = engine.viewers.get(tab_name)?.get(viewer_id)?;
        match slot.live()? {
            LiveObject::Error(failure) => Some(failure.clone()),
            LiveObject::View(_) => None,
        }
    }

    pub fn live_placeholders(&self) -> u64 {
        self.state.lock().expect(ENGINE_LOCK).live_placeholders
    }

    pub fn take_warnings(&self) -> Vec<EngineWarning> {
        mem::take(&mut self.state.lock().expect(ENGINE_LOCK).warnings)
    }
}

fn unique_object_id(contents: &BTreeMap<String, Value>, base: &str) -> String {
    if !contents.contains_key(base) {
        return base.to_owned();
    }
    let mut suffix = 0usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !contents.contains_key(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn append_sorted(record: &mut JsonMap<String, Value>, field: &str, value: Value) {
    let entry = record
        .entry(field.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(items) = entry.as_array_mut() {
        items.push(value);
        items.sort_by(|a, b| a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()));
    }
}

#[derive(Debug)]
pub enum AddDataError {
    InvalidPath { path: PathBuf },
    MissingDataCollection,
    Load(DataAccessError),
    Document(SessionDocumentError),
}

impl fmt::Display for AddDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath { path } => write!(f, "no dataset name in path {path:?}"),
            Self::MissingDataCollection => {
                f.write_str("the document declares no data collection record")
            }
            Self::Load(source) => write!(f, "cannot load dataset: {source}"),
            Self::Document(source) => write!(f, "cannot update document: {source}"),
        }
    }
}

impl std::error::Error for AddDataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(source) => Some(source),
            Self::Document(source) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
