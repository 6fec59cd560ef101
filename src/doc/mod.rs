// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The shared session document: five replicated collections (`contents`,
//! `attributes`, `dataset`, `links`, `tabs`) that together are equivalent to
//! the flat session file, with typed change notification for observers.
//!
//! `set()` decomposes a flat session into the collections inside one
//! transaction; `get()` recomposes the canonical flat form (sorted tab,
//! viewer, dataset, and link names). Any client may mutate the collections
//! directly; the CRDT layer merges concurrent edits without conflict.

pub mod change;
pub(crate) mod codec;
pub mod normalize;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map as JsonMap, Value};
use yrs::types::map::MapEvent;
use yrs::types::{EntryChange, Event, Events, PathSegment, ToJson};
use yrs::{
    Any, DeepObservable, Doc, Map, MapPrelim, MapRef, Observable, Out, ReadTxn, Subscription,
    Transact, TransactionMut,
};

use crate::model::link::COMPONENT_LINK_TYPE;
use crate::model::session_doc::string_list;
use crate::model::{SessionDocument, SessionDocumentError, UniformLink, MAIN_RECORD_KEY};
use change::{ChangeAction, ChangeEvent, Collection, KeyChange};
use codec::{any_from_value, value_from_any, value_from_out};
use normalize::{denormalize_links, normalize_links};

/// Observer callback: receives the commit's transaction (the only legal read
/// handle while the commit is in flight), the collection that changed, and
/// the per-key change set.
pub type ChangeHandler = dyn Fn(&TransactionMut, Collection, &ChangeEvent) + Send + Sync + 'static;

/// The five replicated maps of one session document.
#[derive(Clone)]
pub(crate) struct Collections {
    pub(crate) contents: MapRef,
    pub(crate) attributes: MapRef,
    pub(crate) dataset: MapRef,
    pub(crate) links: MapRef,
    pub(crate) tabs: MapRef,
}

impl Collections {
    pub(crate) fn contents_with<T: ReadTxn>(&self, txn: &T) -> BTreeMap<String, Value> {
        plain_map(&self.contents, txn)
    }

    pub(crate) fn attributes_with<T: ReadTxn>(&self, txn: &T) -> BTreeMap<String, Value> {
        plain_map(&self.attributes, txn)
    }

    pub(crate) fn dataset_with<T: ReadTxn>(&self, txn: &T) -> BTreeMap<String, Value> {
        plain_map(&self.dataset, txn)
    }

    pub(crate) fn links_with<T: ReadTxn>(&self, txn: &T) -> BTreeMap<String, UniformLink> {
        plain_map(&self.links, txn)
            .iter()
            .filter_map(|(name, value)| {
                UniformLink::from_value(value).map(|link| (name.clone(), link))
            })
            .collect()
    }

    pub(crate) fn tabs_with<T: ReadTxn>(&self, txn: &T) -> BTreeMap<String, BTreeMap<String, Value>> {
        plain_map(&self.tabs, txn)
            .into_iter()
            .map(|(tab, viewers)| {
                let viewers = match viewers {
                    Value::Object(entries) => entries.into_iter().collect(),
                    _ => BTreeMap::new(),
                };
                (tab, viewers)
            })
            .collect()
    }

    pub(crate) fn tab_names_with<T: ReadTxn>(&self, txn: &T) -> Vec<String> {
        plain_map(&self.tabs, txn).into_keys().collect()
    }

    pub(crate) fn tab_data_with<T: ReadTxn>(
        &self,
        txn: &T,
        tab_name: &str,
    ) -> Option<BTreeMap<String, Value>> {
        let out = self.tabs.get(txn, tab_name)?;
        match value_from_out(&out, txn) {
            Value::Object(entries) => Some(entries.into_iter().collect()),
            _ => None,
        }
    }
}

/// A session document backed by conflict-free replicated collections.
pub struct SharedDocument {
    doc: Doc,
    collections: Collections,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SharedDocument {
    pub fn new() -> Self {
        let doc = Doc::new();
        let collections = Collections {
            contents: doc.get_or_insert_map("contents"),
            attributes: doc.get_or_insert_map("attributes"),
            dataset: doc.get_or_insert_map("dataset"),
            links: doc.get_or_insert_map("links"),
            tabs: doc.get_or_insert_map("tabs"),
        };
        Self {
            doc,
            collections,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Parses and validates a flat session, then atomically replaces all five
    /// collections. Malformed input leaves the collections untouched.
    pub fn set(&self, text: &str) -> Result<(), SessionDocumentError> {
        let document = SessionDocument::parse(text)?;
        document.validate()?;
        let decomposed = decompose(&document);

        let mut txn = self.doc.transact_mut();
        replace_entries(&self.collections.contents, &mut txn, &decomposed.contents);
        replace_entries(&self.collections.attributes, &mut txn, &decomposed.attributes);
        replace_entries(&self.collections.dataset, &mut txn, &decomposed.dataset);

        let link_values: BTreeMap<String, Value> = decomposed
            .links
            .iter()
            .map(|(name, link)| (name.clone(), link.to_value()))
            .collect();
        replace_entries(&self.collections.links, &mut txn, &link_values);
        replace_tabs(&self.collections.tabs, &mut txn, &decomposed.tabs);
        drop(txn);

        Ok(())
    }

    /// Recomposes the canonical flat session text.
    pub fn get(&self) -> String {
        let txn = self.doc.transact();
        self.get_with(&txn)
    }

    pub fn get_with<T: ReadTxn>(&self, txn: &T) -> String {
        let value = self.recompose_value(txn);
        serde_json::to_string_pretty(&value).expect("recomposed session serializes")
    }

    /// Registers the document's single active subscription set; a previous
    /// registration is torn down first. `tabs` is observed deeply so nested
    /// viewer-level edits surface as changes on the owning tab.
    pub fn observe(&self, handler: Arc<ChangeHandler>) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("subscription registry poisoned");
        subscriptions.clear();

        let shallow: [(Collection, &MapRef); 4] = [
            (Collection::Contents, &self.collections.contents),
            (Collection::Attributes, &self.collections.attributes),
            (Collection::Dataset, &self.collections.dataset),
            (Collection::Links, &self.collections.links),
        ];
        for (collection, map) in shallow {
            let handler = Arc::clone(&handler);
            subscriptions.push(map.observe(move |txn, event| {
                let change = change_from_map_event(txn, event);
                if !change.is_empty() {
                    handler(txn, collection, &change);
                }
            }));
        }

        let deep_handler = Arc::clone(&handler);
        subscriptions.push(self.collections.tabs.observe_deep(move |txn, events| {
            let change = change_from_deep_events(txn, events);
            if !change.is_empty() {
                deep_handler(txn, Collection::Tabs, &change);
            }
        }));
    }

    pub fn unobserve(&self) {
        self.subscriptions
            .lock()
            .expect("subscription registry poisoned")
            .clear();
    }

    pub fn contents(&self) -> BTreeMap<String, Value> {
        self.collections.contents_with(&self.doc.transact())
    }

    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.collections.attributes_with(&self.doc.transact())
    }

    pub fn dataset(&self) -> BTreeMap<String, Value> {
        self.collections.dataset_with(&self.doc.transact())
    }

    pub fn links(&self) -> BTreeMap<String, UniformLink> {
        self.collections.links_with(&self.doc.transact())
    }

    pub fn tabs(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        self.collections.tabs_with(&self.doc.transact())
    }

    pub fn get_tab_names(&self) -> Vec<String> {
        self.collections.tab_names_with(&self.doc.transact())
    }

    /// `None` for an absent tab, `Some(empty)` for an existing empty tab.
    pub fn get_tab_data(&self, tab_name: &str) -> Option<BTreeMap<String, Value>> {
        self.collections
            .tab_data_with(&self.doc.transact(), tab_name)
    }

    /// Atomically removes one viewer entry from a tab. Removing from an
    /// absent tab is a no-op.
    pub fn remove_tab_viewer(&self, tab_name: &str, viewer_id: &str) {
        let mut txn = self.doc.transact_mut();
        let Some(Out::YMap(tab)) = self.collections.tabs.get(&txn, tab_name) else {
            return;
        };
        tab.remove(&mut txn, viewer_id);
    }

    pub(crate) fn ydoc(&self) -> &Doc {
        &self.doc
    }

    pub(crate) fn collections(&self) -> &Collections {
        &self.collections
    }

    fn recompose_value<T: ReadTxn>(&self, txn: &T) -> Value {
        let mut contents = self.collections.contents_with(txn);
        let tabs = self.collections.tabs_with(txn);

        let tab_names: Vec<String> = tabs.keys().cloned().collect();
        let mut viewer_lists = Vec::with_capacity(tab_names.len());
        for tab_name in &tab_names {
            let viewers = &tabs[tab_name];
            let viewer_names: Vec<String> = viewers.keys().cloned().collect();
            for viewer_name in &viewer_names {
                contents.insert(viewer_name.clone(), viewers[viewer_name].clone());
            }
            viewer_lists.push(Value::Array(
                viewer_names.into_iter().map(Value::String).collect(),
            ));
        }

        {
            let main = contents
                .entry(MAIN_RECORD_KEY.to_owned())
                .or_insert_with(|| Value::Object(JsonMap::new()));
            if let Some(main) = main.as_object_mut() {
                main.insert(
                    "tab_names".to_owned(),
                    Value::Array(tab_names.iter().cloned().map(Value::String).collect()),
                );
                main.insert("viewers".to_owned(), Value::Array(viewer_lists));
            }
        }

        let collection_name = contents
            .get(MAIN_RECORD_KEY)
            .and_then(Value::as_object)
            .and_then(|main| main.get("data"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        // A declared data collection whose record vanished is unrecoverable
        // here; recompose what remains rather than failing the export.
        if !collection_name.is_empty() && contents.contains_key(&collection_name) {
            let dataset = self.collections.dataset_with(txn);
            let data_names: Vec<String> = dataset.keys().cloned().collect();
            for (data_name, record) in &dataset {
                contents.insert(data_name.clone(), record.clone());
            }

            let links = self.collections.links_with(txn);
            collect_stale_link_records(&mut contents, &collection_name);

            let denormalized = denormalize_links(&links);
            let link_names: Vec<String> = denormalized.records.keys().cloned().collect();
            for (link_name, record) in denormalized.records {
                contents.insert(link_name, record);
            }
            for (list_name, record) in denormalized.lists {
                contents.insert(list_name, record);
            }

            if let Some(collection) = contents
                .get_mut(&collection_name)
                .and_then(Value::as_object_mut)
            {
                collection.insert(
                    "data".to_owned(),
                    Value::Array(data_names.into_iter().map(Value::String).collect()),
                );
                collection.insert(
                    "links".to_owned(),
                    Value::Array(link_names.into_iter().map(Value::String).collect()),
                );
            }
        }

        Value::Object(contents.into_iter().collect())
    }
}

impl Default for SharedDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops the previous recomposition's link records and, for advanced links,
/// the auxiliary list records they pointed at. Stale lists must not
/// accumulate across repeated recompositions.
fn collect_stale_link_records(contents: &mut BTreeMap<String, Value>, collection_name: &str) {
    let stale_names = contents
        .get(collection_name)
        .and_then(Value::as_object)
        .map(|collection| string_list(collection.get("links")))
        .unwrap_or_default();

    for link_name in stale_names {
        let Some(record) = contents.remove(&link_name) else {
            continue;
        };
        let Some(record) = record.as_object() else {
            continue;
        };
        let link_type = record.get("_type").and_then(Value::as_str).unwrap_or_default();
        if link_type == COMPONENT_LINK_TYPE {
            continue;
        }
        for endpoint in ["cids1", "cids2"] {
            if let Some(list_name) = record.get(endpoint).and_then(Value::as_str) {
                contents.remove(list_name);
            }
        }
    }
}

struct Decomposed {
    contents: BTreeMap<String, Value>,
    attributes: BTreeMap<String, Value>,
    dataset: BTreeMap<String, Value>,
    links: BTreeMap<String, UniformLink>,
    tabs: BTreeMap<String, BTreeMap<String, Value>>,
}

fn decompose(document: &SessionDocument) -> Decomposed {
    let contents = document.objects().clone();

    let mut tabs = BTreeMap::new();
    for (tab_name, viewer_ids) in document.tab_names().iter().zip(document.viewer_lists()) {
        let mut viewers = BTreeMap::new();
        for viewer_id in viewer_ids {
            let spec = contents
                .get(&viewer_id)
                .cloned()
                .unwrap_or_else(|| Value::Object(JsonMap::new()));
            viewers.insert(viewer_id, spec);
        }
        tabs.insert(tab_name.clone(), viewers);
    }

    let mut dataset = BTreeMap::new();
    let mut attributes = BTreeMap::new();
    for data_name in document.data_names() {
        let record = contents
            .get(&data_name)
            .cloned()
            .unwrap_or_else(|| Value::Object(JsonMap::new()));
        for attribute in string_list(record.as_object().and_then(|r| r.get("primary_owner"))) {
            let attribute_record = contents
                .get(&attribute)
                .cloned()
                .unwrap_or_else(|| Value::Object(JsonMap::new()));
            attributes.insert(attribute, attribute_record);
        }
        dataset.insert(data_name, record);
    }

    let links = normalize_links(&document.link_names(), &contents, &dataset, &attributes);

    Decomposed {
        contents,
        attributes,
        dataset,
        links,
        tabs,
    }
}

fn plain_map<T: ReadTxn>(map: &MapRef, txn: &T) -> BTreeMap<String, Value> {
    match value_from_any(&map.to_json(txn)) {
        Value::Object(entries) => entries.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

fn replace_entries(map: &MapRef, txn: &mut TransactionMut, entries: &BTreeMap<String, Value>) {
    let current: Vec<String> = match map.to_json(&*txn) {
        Any::Map(existing) => existing.keys().cloned().collect(),
        _ => Vec::new(),
    };
    for key in current {
        if !entries.contains_key(&key) {
            map.remove(txn, &key);
        }
    }
    for (key, value) in entries {
        map.insert(txn, key.as_str(), any_from_value(value));
    }
}

fn replace_tabs(
    tabs: &MapRef,
    txn: &mut TransactionMut,
    declared: &BTreeMap<String, BTreeMap<String, Value>>,
) {
    let current: Vec<String> = match tabs.to_json(&*txn) {
        Any::Map(existing) => existing.keys().cloned().collect(),
        _ => Vec::new(),
    };
    for tab_name in current {
        if !declared.contains_key(&tab_name) {
            tabs.remove(txn, &tab_name);
        }
    }
    for (tab_name, viewers) in declared {
        let tab = tabs.insert(txn, tab_name.as_str(), MapPrelim::default());
        for (viewer_id, spec) in viewers {
            tab.insert(txn, viewer_id.as_str(), any_from_value(spec));
        }
    }
}

fn change_from_map_event(txn: &TransactionMut, event: &MapEvent) -> ChangeEvent {
    let mut keys: Vec<KeyChange> = event
        .keys(txn)
        .iter()
        .map(|(key, entry)| match entry {
            EntryChange::Inserted(new) => KeyChange {
                key: key.to_string(),
                action: ChangeAction::Add,
                old_value: None,
                new_value: Some(value_from_out(new, txn)),
            },
            EntryChange::Updated(old, new) => KeyChange {
                key: key.to_string(),
                action: ChangeAction::Update,
                old_value: Some(value_from_out(old, txn)),
                new_value: Some(value_from_out(new, txn)),
            },
            EntryChange::Removed(old) => KeyChange {
                key: key.to_string(),
                action: ChangeAction::Delete,
                old_value: Some(value_from_out(old, txn)),
                new_value: None,
            },
        })
        .collect();
    keys.sort_by(|a, b| a.key.cmp(&b.key));
    ChangeEvent { keys }
}

fn change_from_deep_events(txn: &TransactionMut, events: &Events) -> ChangeEvent {
    let mut merged: BTreeMap<String, KeyChange> = BTreeMap::new();

    for event in events.iter() {
        let Event::Map(map_event) = event else {
            continue;
        };
        let path = map_event.path();
        match path.front() {
            None => {
                for (key, entry) in map_event.keys(txn) {
                    let change = match entry {
                        EntryChange::Inserted(new) => KeyChange {
                            key: key.to_string(),
                            action: ChangeAction::Add,
                            old_value: None,
                            new_value: Some(value_from_out(new, txn)),
                        },
                        EntryChange::Updated(old, new) => KeyChange {
                            key: key.to_string(),
                            action: ChangeAction::Update,
                            old_value: Some(value_from_out(old, txn)),
                            new_value: Some(value_from_out(new, txn)),
                        },
                        EntryChange::Removed(old) => KeyChange {
                            key: key.to_string(),
                            action: ChangeAction::Delete,
                            old_value: Some(value_from_out(old, txn)),
                            new_value: None,
                        },
                    };
                    // Whole-tab changes win over nested ones for the same key.
                    merged.insert(key.to_string(), change);
                }
            }
            Some(PathSegment::Key(tab_name)) => {
                merged
                    .entry(tab_name.to_string())
                    .or_insert_with(|| KeyChange {
                        key: tab_name.to_string(),
                        action: ChangeAction::Update,
                        old_value: None,
                        new_value: Some(value_from_any(&map_event.target().to_json(txn))),
                    });
            }
            Some(PathSegment::Index(_)) => {}
        }
    }

    ChangeEvent {
        keys: merged.into_values().collect(),
    }
}

#[cfg(test)]
mod tests;
