// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory collaborator implementations. They keep shareable handles to
//! their internals (call counters, load logs, the live link set) so the demo
//! binary and tests can observe engine behavior from outside.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{
    ConstructError, DataAccess, DataAccessError, Dataset, LinkEngine, LiveLink, LiveView,
    PlotBackend,
};
use crate::model::ViewKind;

/// A plot backend that materializes lightweight [`MemoryView`] objects.
#[derive(Debug, Default)]
pub struct MemoryPlotBackend {
    constructed: Arc<AtomicU64>,
    failing_types: BTreeSet<String>,
}

impl MemoryPlotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes construction fail for the given view type; used to exercise the
    /// engine's error-sentinel path.
    pub fn with_failure(mut self, view_type: &str) -> Self {
        self.failing_types.insert(view_type.to_owned());
        self
    }

    /// Shared counter of construction attempts.
    pub fn construct_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.constructed)
    }
}

impl PlotBackend for MemoryPlotBackend {
    fn construct(
        &mut self,
        kind: &ViewKind,
        data: Option<&Dataset>,
        state: &BTreeMap<String, Value>,
    ) -> Result<Box<dyn LiveView>, ConstructError> {
        self.constructed.fetch_add(1, Ordering::Relaxed);

        if self.failing_types.contains(kind.type_name()) {
            return Err(ConstructError::Backend {
                message: format!("cannot render {kind}"),
            });
        }

        Ok(Box::new(MemoryView {
            view_type: kind.type_name().to_owned(),
            data_label: data.map(|dataset| dataset.label().to_owned()),
            state: state.clone(),
            extra_data: Vec::new(),
        }))
    }
}

/// The live object the memory backend returns: records what it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryView {
    view_type: String,
    data_label: Option<String>,
    state: BTreeMap<String, Value>,
    extra_data: Vec<String>,
}

impl MemoryView {
    pub fn state(&self) -> &BTreeMap<String, Value> {
        &self.state
    }

    pub fn extra_data(&self) -> &[String] {
        &self.extra_data
    }
}

impl LiveView for MemoryView {
    fn view_type(&self) -> &str {
        &self.view_type
    }

    fn data_label(&self) -> Option<&str> {
        self.data_label.as_deref()
    }

    fn add_data(&mut self, dataset: &Dataset) -> Result<(), ConstructError> {
        self.extra_data.push(dataset.label().to_owned());
        Ok(())
    }
}

/// A data-access collaborator that fabricates datasets by file stem, unless a
/// dataset was registered for the stem up front. Every load is logged.
#[derive(Debug, Default)]
pub struct MemoryDataAccess {
    registered: BTreeMap<String, Dataset>,
    loads: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryDataAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.registered.insert(dataset.label().to_owned(), dataset);
        self
    }

    /// Shared log of every path handed to [`DataAccess::load`].
    pub fn load_log(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.loads)
    }
}

impl DataAccess for MemoryDataAccess {
    fn load(&mut self, path: &Path) -> Result<Dataset, DataAccessError> {
        self.loads
            .lock()
            .expect("load log poisoned")
            .push(path.to_path_buf());

        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return Err(DataAccessError::NotFound {
                path: path.to_path_buf(),
            });
        };

        match self.registered.get(stem) {
            Some(dataset) => Ok(dataset.clone()),
            None => Ok(Dataset::new(stem, vec!["x".to_owned(), "y".to_owned()])),
        }
    }
}

/// A link engine holding its live link set in memory.
#[derive(Debug, Default)]
pub struct MemoryLinkEngine {
    links: Arc<Mutex<Vec<LiveLink>>>,
    added: Arc<AtomicU64>,
    removed: Arc<AtomicU64>,
}

impl MemoryLinkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links_handle(&self) -> Arc<Mutex<Vec<LiveLink>>> {
        Arc::clone(&self.links)
    }

    pub fn add_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.added)
    }

    pub fn remove_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.removed)
    }
}

impl LinkEngine for MemoryLinkEngine {
    fn links(&self) -> Vec<LiveLink> {
        self.links.lock().expect("link set poisoned").clone()
    }

    fn add_link(&mut self, link: LiveLink) {
        self.added.fetch_add(1, Ordering::Relaxed);
        self.links.lock().expect("link set poisoned").push(link);
    }

    fn remove_link(&mut self, link: &LiveLink) {
        self.removed.fetch_add(1, Ordering::Relaxed);
        let mut links = self.links.lock().expect("link set poisoned");
        if let Some(index) = links.iter().position(|candidate| candidate == link) {
            links.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::Ordering;

    use super::{MemoryDataAccess, MemoryLinkEngine, MemoryPlotBackend};
    use crate::backend::{DataAccess, LinkEngine, LiveLink, PlotBackend};
    use crate::model::ViewKind;

    #[test]
    fn plot_backend_counts_and_fails_on_request() {
        let mut backend = MemoryPlotBackend::new()
            .with_failure("glue.viewers.histogram.qt.data_viewer.HistogramViewer");
        let counter = backend.construct_counter();
        let state = BTreeMap::new();

        let view = backend
            .construct(&ViewKind::Scatter2d, None, &state)
            .expect("scatter constructs");
        assert_eq!(
            view.view_type(),
            "glue.viewers.scatter.qt.data_viewer.ScatterViewer"
        );

        backend
            .construct(&ViewKind::Histogram, None, &state)
            .expect_err("histogram fails");
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn data_access_logs_loads_and_uses_stems() {
        let mut access = MemoryDataAccess::new();
        let log = access.load_log();

        let dataset = access.load(Path::new("data/w5.fits")).expect("load");
        assert_eq!(dataset.label(), "w5");
        assert_eq!(log.lock().expect("log").len(), 1);
    }

    #[test]
    fn link_engine_removes_matching_links() {
        let mut engine = MemoryLinkEngine::new();
        let link = LiveLink::identity("w5", "Declination", "w5_psc", "DEJ2000");
        engine.add_link(link.clone());
        assert_eq!(engine.links().len(), 1);

        engine.remove_link(&link);
        assert!(engine.links().is_empty());
        assert_eq!(engine.add_counter().load(Ordering::Relaxed), 1);
        assert_eq!(engine.remove_counter().load(Ordering::Relaxed), 1);
    }
}
