// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Link normalization: the pure transform between link records as the flat
//! session format spells them and the uniform cross-referenced shape kept in
//! the replicated `links` collection.

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value};

use crate::model::link::{LIST_CONTENTS_KEY, LIST_RECORD_TYPE};
use crate::model::session_doc::string_list;
use crate::model::UniformLink;

/// Resolves each named link record into the uniform shape: endpoint datasets
/// found through attribute ownership (`primary_owner`, first match wins),
/// attribute-id lists dereferenced out of list records for advanced links,
/// and display labels attached for both endpoints.
///
/// An endpoint attribute with no owning dataset yields `data1`/`data2` of
/// `None`; the link stays in the collection but is inert downstream.
pub fn normalize_links(
    link_names: &[String],
    contents: &BTreeMap<String, Value>,
    dataset: &BTreeMap<String, Value>,
    attributes: &BTreeMap<String, Value>,
) -> BTreeMap<String, UniformLink> {
    let mut links = BTreeMap::new();

    for link_name in link_names {
        let Some(record) = contents.get(link_name).and_then(Value::as_object) else {
            continue;
        };
        let Some(link_type) = record.get("_type").and_then(Value::as_str) else {
            continue;
        };

        let mut extra = record.clone();
        extra.remove("_type");

        let (cids1, cids2) = if link_type == crate::model::COMPONENT_LINK_TYPE {
            let cids1 = string_list(extra.remove("frm").as_ref());
            let cids2 = string_list(extra.remove("to").as_ref());
            (cids1, cids2)
        } else {
            let cids1 = dereference_list(extra.remove("cids1").as_ref(), contents);
            let cids2 = dereference_list(extra.remove("cids2").as_ref(), contents);
            (cids1, cids2)
        };

        let data1 = cids1.first().and_then(|attribute| owner_of(attribute, dataset));
        let data2 = cids2.first().and_then(|attribute| owner_of(attribute, dataset));
        let cids1_labels = labels_of(&cids1, attributes, contents);
        let cids2_labels = labels_of(&cids2, attributes, contents);

        links.insert(
            link_name.clone(),
            UniformLink::new(
                link_type.to_owned(),
                data1,
                data2,
                cids1,
                cids2,
                cids1_labels,
                cids2_labels,
                extra,
            ),
        );
    }

    links
}

/// The inverse transform. Component links rename `cids1`/`cids2` back to
/// `frm`/`to` and drop the derived fields; other variants allocate a fresh
/// list record per endpoint, named `"list"`, `"list_0"`, `"list_1"`, … in
/// link-processing order (sorted link names).
///
/// Links whose endpoints resolved to no dataset are invalid and are not
/// recomposed.
pub fn denormalize_links(links: &BTreeMap<String, UniformLink>) -> DenormalizedLinks {
    let mut records = BTreeMap::new();
    let mut lists = Vec::new();
    let mut list_count: i64 = -1;

    for (link_name, link) in links {
        if link.data1().is_none() || link.data2().is_none() {
            continue;
        }

        let mut record = link.extra().clone();
        record.insert(
            "_type".to_owned(),
            Value::String(link.link_type().to_owned()),
        );

        if link.is_component() {
            record.insert("frm".to_owned(), string_array(link.cids1()));
            record.insert("to".to_owned(), string_array(link.cids2()));
        } else {
            for (endpoint, cids) in [("cids1", link.cids1()), ("cids2", link.cids2())] {
                let list_name = if list_count < 0 {
                    "list".to_owned()
                } else {
                    format!("list_{list_count}")
                };
                list_count += 1;

                let mut list_record = JsonMap::new();
                list_record.insert(
                    "_type".to_owned(),
                    Value::String(LIST_RECORD_TYPE.to_owned()),
                );
                list_record.insert(LIST_CONTENTS_KEY.to_owned(), string_array(cids));

                lists.push((list_name.clone(), Value::Object(list_record)));
                record.insert(endpoint.to_owned(), Value::String(list_name));
            }
        }

        records.insert(link_name.clone(), Value::Object(record));
    }

    DenormalizedLinks { records, lists }
}

/// Output of [`denormalize_links`]: the link records plus the list records
/// they allocated, in allocation order.
#[derive(Debug, Clone, PartialEq)]
pub struct DenormalizedLinks {
    pub records: BTreeMap<String, Value>,
    pub lists: Vec<(String, Value)>,
}

fn dereference_list(value: Option<&Value>, contents: &BTreeMap<String, Value>) -> Vec<String> {
    let Some(list_name) = value.and_then(Value::as_str) else {
        return Vec::new();
    };
    let Some(list_record) = contents.get(list_name).and_then(Value::as_object) else {
        return Vec::new();
    };
    string_list(list_record.get(LIST_CONTENTS_KEY))
}

fn owner_of(attribute: &str, dataset: &BTreeMap<String, Value>) -> Option<String> {
    dataset
        .iter()
        .find(|(_, record)| {
            record
                .as_object()
                .map(|record| string_list(record.get("primary_owner")).iter().any(|id| id == attribute))
                .unwrap_or(false)
        })
        .map(|(name, _)| name.clone())
}

fn labels_of(
    attributes: &[String],
    attribute_records: &BTreeMap<String, Value>,
    contents: &BTreeMap<String, Value>,
) -> Vec<String> {
    attributes
        .iter()
        .map(|attribute| {
            attribute_records
                .get(attribute)
                .or_else(|| contents.get(attribute))
                .and_then(Value::as_object)
                .and_then(|record| record.get("label"))
                .and_then(Value::as_str)
                .unwrap_or(attribute)
                .to_owned()
        })
        .collect()
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::Value;

    use super::{denormalize_links, normalize_links};
    use crate::model::fixtures::demo_session_value;
    use crate::model::SessionDocument;

    fn demo_parts() -> (
        Vec<String>,
        BTreeMap<String, Value>,
        BTreeMap<String, Value>,
        BTreeMap<String, Value>,
    ) {
        let document =
            SessionDocument::from_objects(match demo_session_value() {
                Value::Object(entries) => entries.into_iter().collect(),
                _ => unreachable!("fixture is an object"),
            });

        let contents: BTreeMap<String, Value> = document.objects().clone();
        let mut dataset = BTreeMap::new();
        let mut attributes = BTreeMap::new();
        for data_name in document.data_names() {
            let record = contents.get(&data_name).expect("dataset record").clone();
            for attribute in crate::model::session_doc::string_list(
                record.as_object().and_then(|r| r.get("primary_owner")),
            ) {
                attributes.insert(
                    attribute.clone(),
                    contents.get(&attribute).expect("attribute record").clone(),
                );
            }
            dataset.insert(data_name, record);
        }

        (document.link_names(), contents, dataset, attributes)
    }

    #[test]
    fn normalizes_all_variants_to_the_uniform_shape() {
        let (link_names, contents, dataset, attributes) = demo_parts();
        let links = normalize_links(&link_names, &contents, &dataset, &attributes);

        assert_eq!(links.len(), 3);
        for link in links.values() {
            assert_eq!(link.data1(), Some("w5"));
            assert_eq!(link.data2(), Some("w5_psc"));
            assert!(!link.cids1().is_empty());
            assert_eq!(link.cids1().len(), link.cids1_labels().len());
        }

        let identity = &links["Identity Link"];
        assert!(identity.is_identity());
        assert_eq!(identity.cids1_labels(), ["Declination"]);
        assert_eq!(identity.cids2_labels(), ["DEJ2000"]);

        let advanced = &links["Advanced Link"];
        assert!(!advanced.is_component());
        assert_eq!(advanced.cids1(), ["w5_cid_0", "w5_cid_1"]);
        assert_eq!(advanced.cids1_labels(), ["Right Ascension", "Declination"]);
    }

    #[test]
    fn unowned_endpoint_yields_null_owner() {
        let (link_names, contents, mut dataset, attributes) = demo_parts();
        dataset.remove("w5");

        let links = normalize_links(&link_names, &contents, &dataset, &attributes);
        let identity = &links["Identity Link"];
        assert_eq!(identity.data1(), None);
        assert_eq!(identity.data2(), Some("w5_psc"));
        assert!(identity.identity_tuple().is_none());
    }

    #[test]
    fn denormalize_restores_flat_records_and_list_names() {
        let (link_names, contents, dataset, attributes) = demo_parts();
        let links = normalize_links(&link_names, &contents, &dataset, &attributes);
        let denormalized = denormalize_links(&links);

        for link_name in &link_names {
            assert_eq!(
                denormalized.records.get(link_name),
                contents.get(link_name),
                "link {link_name:?} should recompose to its flat record"
            );
        }

        let list_names: Vec<&str> = denormalized
            .lists
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(list_names, ["list", "list_0"]);
        for (name, record) in &denormalized.lists {
            assert_eq!(record, contents.get(name).expect("list record"));
        }
    }

    #[test]
    fn null_owner_links_are_not_recomposed() {
        let (link_names, contents, mut dataset, attributes) = demo_parts();
        dataset.remove("w5_psc");

        let links = normalize_links(&link_names, &contents, &dataset, &attributes);
        let denormalized = denormalize_links(&links);

        assert!(denormalized.records.is_empty());
        assert!(denormalized.lists.is_empty());
    }
}
