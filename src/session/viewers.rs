// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Viewer reconciliation: diffs the document's declared tab/viewer tree
//! against the locally cached tab/slot tree.
//! Rendering is at-most-once per viewer id: a live object (or error sentinel)
//! is never rebuilt in place; a rebuild requires the viewer id to disappear
//! and reappear in the document.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use yrs::ReadTxn;

use super::factory::{construct_view, ConstructFailure};
use super::{EngineState, EngineWarning};
use crate::backend::LiveView;
use crate::model::{decode_state_value, TabName, ViewKind, ViewerId, ViewerSpec};

/// The display-surface placeholder allocated for a viewer before its live
/// object exists. Owned by the cache entry until the entry is destroyed.
#[derive(Debug, PartialEq, Eq)]
pub struct Placeholder {
    id: u64,
}

impl Placeholder {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A rendered viewer, or the inert sentinel recorded when rendering failed.
pub enum LiveObject {
    View(Box<dyn LiveView>),
    Error(ConstructFailure),
}

impl fmt::Debug for LiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(view) => f
                .debug_struct("LiveObject::View")
                .field("view_type", &view.view_type())
                .finish(),
            Self::Error(failure) => f.debug_tuple("LiveObject::Error").field(failure).finish(),
        }
    }
}

/// One viewer cache entry: the placeholder plus the live object once built.
#[derive(Debug)]
pub struct ViewerSlot {
    pub(crate) placeholder: Placeholder,
    pub(crate) live: Option<LiveObject>,
}

impl ViewerSlot {
    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    pub fn live(&self) -> Option<&LiveObject> {
        self.live.as_ref()
    }

    pub fn status(&self) -> SlotStatus {
        match &self.live {
            None => SlotStatus::Pending,
            Some(LiveObject::View(_)) => SlotStatus::Live,
            Some(LiveObject::Error(_)) => SlotStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Live,
    Error,
}

/// The effective state of one declared viewer: its own `state.values` merged
/// with the first layer's record values (later wins), string values decoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ViewState {
    pub kind: ViewKind,
    pub state: BTreeMap<String, Value>,
    pub multi_layer: bool,
}

pub(crate) fn read_view_state(
    tab_data: &BTreeMap<String, Value>,
    contents: &BTreeMap<String, Value>,
    viewer_id: &str,
) -> ViewState {
    let Some(record) = tab_data.get(viewer_id).and_then(Value::as_object) else {
        return ViewState {
            kind: ViewKind::from_type_name(None),
            state: BTreeMap::new(),
            multi_layer: false,
        };
    };

    let spec = ViewerSpec::from_record(record);
    let mut state = BTreeMap::new();
    for (prop, value) in spec.state_values() {
        state.insert(prop.clone(), decode_state_value(value));
    }

    // Only the first layer contributes; additional layers are flagged by the
    // caller and otherwise ignored.
    if let Some(layer_state_id) = spec.first_layer_state_id() {
        let extra = contents
            .get(layer_state_id)
            .and_then(Value::as_object)
            .and_then(|record| record.get("values"))
            .and_then(Value::as_object);
        if let Some(extra) = extra {
            for (prop, value) in extra {
                state.insert(prop.clone(), decode_state_value(value));
            }
        }
    }

    ViewState {
        kind: spec.view_kind(),
        state,
        multi_layer: spec.layer_count() > 1,
    }
}

impl EngineState {
    /// The incremental reconciliation pass. Safe to run repeatedly: a second
    /// pass over an unchanged document touches nothing and constructs nothing.
    pub(crate) fn reconcile_viewers<T: ReadTxn>(&mut self, txn: &T) {
        let declared_tabs = self.collections.tab_names_with(txn);

        let cached_tabs: Vec<TabName> = self.viewers.keys().cloned().collect();
        for tab in cached_tabs {
            if !declared_tabs.iter().any(|name| name == tab.as_str()) {
                self.remove_tab_entries(&tab);
            }
        }

        let contents = self.collections.contents_with(txn);
        for tab_name in &declared_tabs {
            let Some(tab_data) = self.collections.tab_data_with(txn, tab_name) else {
                continue;
            };
            let Ok(tab) = TabName::new(tab_name.clone()) else {
                continue;
            };

            let cached: Vec<ViewerId> = self
                .viewers
                .get(&tab)
                .map(|slots| slots.keys().cloned().collect())
                .unwrap_or_default();
            for viewer in cached {
                if !tab_data.contains_key(viewer.as_str()) {
                    self.remove_viewer_entry(&tab, &viewer);
                }
            }

            for viewer_name in tab_data.keys() {
                let Ok(viewer) = ViewerId::new(viewer_name.clone()) else {
                    continue;
                };

                let already_rendered = self
                    .viewers
                    .get(&tab)
                    .and_then(|slots| slots.get(&viewer))
                    .map(|slot| slot.live.is_some())
                    .unwrap_or(false);
                if already_rendered {
                    continue;
                }

                let view_state = read_view_state(&tab_data, &contents, viewer_name);
                if view_state.multi_layer {
                    self.warnings.push(EngineWarning::MultiLayerState {
                        tab: tab_name.clone(),
                        viewer: viewer_name.clone(),
                    });
                }

                let data = view_state
                    .state
                    .get("layer")
                    .and_then(Value::as_str)
                    .and_then(|name| self.data.get(name));
                let live =
                    construct_view(self.plot.as_mut(), &view_state.kind, data, &view_state.state);

                let slot = self.ensure_slot(&tab, &viewer);
                slot.live = Some(live);
            }
        }
    }

    pub(crate) fn ensure_slot(&mut self, tab: &TabName, viewer: &ViewerId) -> &mut ViewerSlot {
        let exists = self
            .viewers
            .get(tab)
            .map(|slots| slots.contains_key(viewer))
            .unwrap_or(false);
        if !exists {
            let placeholder = self.allocate_placeholder();
            self.viewers.entry(tab.clone()).or_default().insert(
                viewer.clone(),
                ViewerSlot {
                    placeholder,
                    live: None,
                },
            );
        }

        self.viewers
            .get_mut(tab)
            .expect("tab entry just ensured")
            .get_mut(viewer)
            .expect("viewer slot just ensured")
    }

    /// Destroys one viewer entry and releases its placeholder. The tab entry
    /// itself stays cached even when it becomes empty.
    pub(crate) fn remove_viewer_entry(&mut self, tab: &TabName, viewer: &ViewerId) {
        let Some(slots) = self.viewers.get_mut(tab) else {
            return;
        };
        if slots.remove(viewer).is_some() {
            self.live_placeholders -= 1;
        }
    }

    pub(crate) fn remove_tab_entries(&mut self, tab: &TabName) {
        let Some(slots) = self.viewers.remove(tab) else {
            return;
        };
        self.live_placeholders -= slots.len() as u64;
    }

    fn allocate_placeholder(&mut self) -> Placeholder {
        let id = self.next_placeholder_id;
        self.next_placeholder_id += 1;
        self.live_placeholders += 1;
        Placeholder::new(id)
    }
}
