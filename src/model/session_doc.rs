// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map as JsonMap, Value};

use super::link::{COMPONENT_LINK_TYPE, LIST_CONTENTS_KEY};

/// Key of the distinguished record holding tab names, viewer lists, and the
/// name of the data-collection record.
pub const MAIN_RECORD_KEY: &str = "__main__";

/// The flat, canonical form of a session: object id to object record.
///
/// Every record is a JSON object; the `"__main__"` record carries `tab_names`
/// (ordered tab names), `viewers` (per-tab viewer-id lists aligned by index)
/// and `data` (the data-collection record name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDocument {
    objects: BTreeMap<String, Value>,
}

impl SessionDocument {
    pub fn parse(text: &str) -> Result<Self, SessionDocumentError> {
        let value: Value = serde_json::from_str(text).map_err(SessionDocumentError::Json)?;
        let Value::Object(entries) = value else {
            return Err(SessionDocumentError::NotAnObject);
        };

        let objects: BTreeMap<String, Value> = entries.into_iter().collect();
        for (object_id, record) in &objects {
            if !record.is_object() {
                return Err(SessionDocumentError::RecordNotAnObject {
                    object_id: object_id.clone(),
                });
            }
        }

        Ok(Self { objects })
    }

    pub fn from_objects(objects: BTreeMap<String, Value>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &BTreeMap<String, Value> {
        &self.objects
    }

    pub fn record(&self, object_id: &str) -> Option<&JsonMap<String, Value>> {
        self.objects.get(object_id).and_then(Value::as_object)
    }

    pub fn tab_names(&self) -> Vec<String> {
        string_list(self.main_field("tab_names"))
    }

    /// Per-tab viewer-id lists, aligned by index with [`Self::tab_names`].
    pub fn viewer_lists(&self) -> Vec<Vec<String>> {
        let Some(Value::Array(lists)) = self.main_field("viewers") else {
            return Vec::new();
        };
        lists.iter().map(|list| string_list(Some(list))).collect()
    }

    /// Name of the data-collection record, when the document declares one.
    pub fn data_collection_name(&self) -> Option<String> {
        let name = self.main_field("data")?.as_str()?;
        if name.is_empty() {
            return None;
        }
        Some(name.to_owned())
    }

    pub fn data_names(&self) -> Vec<String> {
        self.data_collection_field("data")
    }

    pub fn link_names(&self) -> Vec<String> {
        self.data_collection_field("links")
    }

    /// Checks the referential invariants of the flat form: every id referenced
    /// as a tab member, dataset, attribute, or link endpoint must have a
    /// record in the document.
    pub fn validate(&self) -> Result<(), SessionDocumentError> {
        let tab_names = self.tab_names();
        let viewer_lists = self.viewer_lists();
        if tab_names.len() != viewer_lists.len() {
            return Err(SessionDocumentError::ViewerListMismatch {
                tab_count: tab_names.len(),
                viewer_list_count: viewer_lists.len(),
            });
        }

        for (tab_name, viewer_ids) in tab_names.iter().zip(&viewer_lists) {
            for viewer_id in viewer_ids {
                self.require_record(viewer_id, format!("tab {tab_name:?}"))?;
            }
        }

        let Some(collection_name) = self.data_collection_name() else {
            return Ok(());
        };
        self.require_record(&collection_name, format!("{MAIN_RECORD_KEY}.data"))?;

        for data_name in self.data_names() {
            self.require_record(&data_name, format!("{collection_name}.data"))?;
            for attribute in string_list(self.record_field(&data_name, "primary_owner")) {
                self.require_record(&attribute, format!("{data_name}.primary_owner"))?;
            }
        }

        for link_name in self.link_names() {
            self.require_record(&link_name, format!("{collection_name}.links"))?;
            self.validate_link(&link_name)?;
        }

        Ok(())
    }

    fn validate_link(&self, link_name: &str) -> Result<(), SessionDocumentError> {
        let link_type = self
            .record_field(link_name, "_type")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if link_type == COMPONENT_LINK_TYPE {
            for endpoint in ["frm", "to"] {
                for attribute in string_list(self.record_field(link_name, endpoint)) {
                    self.require_record(&attribute, format!("{link_name}.{endpoint}"))?;
                }
            }
            return Ok(());
        }

        for endpoint in ["cids1", "cids2"] {
            let Some(list_name) = self
                .record_field(link_name, endpoint)
                .and_then(Value::as_str)
            else {
                continue;
            };
            self.require_record(list_name, format!("{link_name}.{endpoint}"))?;
            for attribute in string_list(self.record_field(list_name, LIST_CONTENTS_KEY)) {
                self.require_record(&attribute, format!("{list_name}.{LIST_CONTENTS_KEY}"))?;
            }
        }

        Ok(())
    }

    fn require_record(
        &self,
        object_id: &str,
        referrer: String,
    ) -> Result<(), SessionDocumentError> {
        if self.objects.contains_key(object_id) {
            return Ok(());
        }
        Err(SessionDocumentError::DanglingReference {
            referrer,
            object_id: object_id.to_owned(),
        })
    }

    fn main_field(&self, field: &str) -> Option<&Value> {
        self.record(MAIN_RECORD_KEY)?.get(field)
    }

    fn record_field(&self, object_id: &str, field: &str) -> Option<&Value> {
        self.record(object_id)?.get(field)
    }

    fn data_collection_field(&self, field: &str) -> Vec<String> {
        let Some(collection_name) = self.data_collection_name() else {
            return Vec::new();
        };
        string_list(self.record_field(&collection_name, field))
    }
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug)]
pub enum SessionDocumentError {
    Json(serde_json::Error),
    NotAnObject,
    RecordNotAnObject {
        object_id: String,
    },
    ViewerListMismatch {
        tab_count: usize,
        viewer_list_count: usize,
    },
    DanglingReference {
        referrer: String,
        object_id: String,
    },
}

impl fmt::Display for SessionDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(source) => write!(f, "session document is not valid json: {source}"),
            Self::NotAnObject => f.write_str("session document must be a json object"),
            Self::RecordNotAnObject { object_id } => {
                write!(f, "record {object_id:?} must be a json object")
            }
            Self::ViewerListMismatch {
                tab_count,
                viewer_list_count,
            } => write!(
                f,
                "{tab_count} tab names but {viewer_list_count} viewer lists"
            ),
            Self::DanglingReference {
                referrer,
                object_id,
            } => write!(
                f,
                "{referrer} references {object_id:?} but the document has no such record"
            ),
        }
    }
}

impl std::error::Error for SessionDocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(source) => Some(source),
            _ => None,
        }
    }
}
