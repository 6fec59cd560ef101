// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{Map as JsonMap, Value};

use super::session_doc::string_list;

/// `_type` of a component link record in the flat session format.
pub const COMPONENT_LINK_TYPE: &str = "glue.core.component_link.ComponentLink";

/// `using.function` value marking a component link as an identity link.
pub const IDENTITY_LINK_FUNCTION: &str = "glue.core.link_helpers.identity";

/// `_type` of the auxiliary list records advanced links indirect through.
pub const LIST_RECORD_TYPE: &str = "builtins.list";

/// Field of a list record holding the literal attribute-id sequence.
pub const LIST_CONTENTS_KEY: &str = "contents";

/// The normalized link shape kept in the replicated `links` collection.
///
/// Both link variants expose the same fields: endpoint dataset names
/// (`data1`/`data2`, `None` when an endpoint attribute has no owning dataset),
/// literal attribute-id sequences (`cids1`/`cids2`), and the attributes'
/// display labels. Fields the normalizer does not consume pass through in
/// `extra` so recomposition is lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLink {
    link_type: String,
    data1: Option<String>,
    data2: Option<String>,
    cids1: Vec<String>,
    cids2: Vec<String>,
    cids1_labels: Vec<String>,
    cids2_labels: Vec<String>,
    extra: JsonMap<String, Value>,
}

impl UniformLink {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        link_type: String,
        data1: Option<String>,
        data2: Option<String>,
        cids1: Vec<String>,
        cids2: Vec<String>,
        cids1_labels: Vec<String>,
        cids2_labels: Vec<String>,
        extra: JsonMap<String, Value>,
    ) -> Self {
        Self {
            link_type,
            data1,
            data2,
            cids1,
            cids2,
            cids1_labels,
            cids2_labels,
            extra,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let link_type = record.get("_type")?.as_str()?.to_owned();

        let mut extra = record.clone();
        extra.remove("_type");
        let data1 = take_string(&mut extra, "data1");
        let data2 = take_string(&mut extra, "data2");
        let cids1 = take_string_list(&mut extra, "cids1");
        let cids2 = take_string_list(&mut extra, "cids2");
        let cids1_labels = take_string_list(&mut extra, "cids1_labels");
        let cids2_labels = take_string_list(&mut extra, "cids2_labels");

        Some(Self {
            link_type,
            data1,
            data2,
            cids1,
            cids2,
            cids1_labels,
            cids2_labels,
            extra,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut record = self.extra.clone();
        record.insert("_type".to_owned(), Value::String(self.link_type.clone()));
        record.insert("data1".to_owned(), option_string(&self.data1));
        record.insert("data2".to_owned(), option_string(&self.data2));
        record.insert("cids1".to_owned(), string_array(&self.cids1));
        record.insert("cids2".to_owned(), string_array(&self.cids2));
        record.insert("cids1_labels".to_owned(), string_array(&self.cids1_labels));
        record.insert("cids2_labels".to_owned(), string_array(&self.cids2_labels));
        Value::Object(record)
    }

    pub fn link_type(&self) -> &str {
        &self.link_type
    }

    pub fn data1(&self) -> Option<&str> {
        self.data1.as_deref()
    }

    pub fn data2(&self) -> Option<&str> {
        self.data2.as_deref()
    }

    pub fn cids1(&self) -> &[String] {
        &self.cids1
    }

    pub fn cids2(&self) -> &[String] {
        &self.cids2
    }

    pub fn cids1_labels(&self) -> &[String] {
        &self.cids1_labels
    }

    pub fn cids2_labels(&self) -> &[String] {
        &self.cids2_labels
    }

    pub fn extra(&self) -> &JsonMap<String, Value> {
        &self.extra
    }

    pub fn is_component(&self) -> bool {
        self.link_type == COMPONENT_LINK_TYPE
    }

    pub fn is_identity(&self) -> bool {
        if !self.is_component() {
            return false;
        }
        self.extra
            .get("using")
            .and_then(Value::as_object)
            .and_then(|using| using.get("function"))
            .and_then(Value::as_str)
            == Some(IDENTITY_LINK_FUNCTION)
    }

    /// The comparison tuple for identity-link reconciliation, or `None` when
    /// either endpoint has no owning dataset (such links are inert).
    pub fn identity_tuple(&self) -> Option<IdentityTuple> {
        let data1 = self.data1.clone()?;
        let data2 = self.data2.clone()?;
        Some(IdentityTuple {
            data1,
            cids1: self.cids1_labels.clone(),
            cids2: self.cids2_labels.clone(),
            data2,
        })
    }
}

/// The `(data1, cids1-labels, cids2-labels, data2)` tuple identity links are
/// matched on. Identity links are symmetric, so a declared link equals a live
/// one when the tuples match forward or reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTuple {
    pub data1: String,
    pub cids1: Vec<String>,
    pub cids2: Vec<String>,
    pub data2: String,
}

impl IdentityTuple {
    pub fn reversed(&self) -> Self {
        Self {
            data1: self.data2.clone(),
            cids1: self.cids2.clone(),
            cids2: self.cids1.clone(),
            data2: self.data1.clone(),
        }
    }

    pub fn matches(&self, other: &Self) -> bool {
        self == other || *self == other.reversed()
    }
}

fn take_string(record: &mut JsonMap<String, Value>, key: &str) -> Option<String> {
    let value = record.remove(key)?;
    value.as_str().map(ToOwned::to_owned)
}

fn take_string_list(record: &mut JsonMap<String, Value>, key: &str) -> Vec<String> {
    let value = record.remove(key);
    string_list(value.as_ref())
}

fn option_string(value: &Option<String>) -> Value {
    match value {
        Some(value) => Value::String(value.clone()),
        None => Value::Null,
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
