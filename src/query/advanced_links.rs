// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The registry of advanced linking functions and helpers, grouped by
//! category for the UI picker: `"General"` always first, the remaining
//! categories alphabetical.

use serde::Serialize;

struct RegisteredLink {
    category: &'static str,
    function: &'static str,
    link_type: &'static str,
    display: &'static str,
    description: &'static str,
    labels1: &'static [&'static str],
    labels2: &'static [&'static str],
}

const REGISTERED_LINKS: &[RegisteredLink] = &[
    RegisteredLink {
        category: "General",
        function: "identity",
        link_type: "glue.core.link_helpers.identity",
        display: "identity",
        description: "Link conceptually identical attributes",
        labels1: &["x"],
        labels2: &["y"],
    },
    RegisteredLink {
        category: "General",
        function: "lengths_to_volume",
        link_type: "glue.core.link_helpers.lengths_to_volume",
        display: "lengths to volume",
        description: "Convert linear measurements to a volume",
        labels1: &["width", "height", "depth"],
        labels2: &["volume"],
    },
    RegisteredLink {
        category: "Astronomy",
        function: "ICRS_to_Galactic",
        link_type: "glue.plugins.coordinate_helpers.link_helpers.ICRS_to_Galactic",
        display: "ICRS <-> Galactic",
        description: "Link ICRS and Galactic coordinates",
        labels1: &["ra", "dec"],
        labels2: &["l", "b"],
    },
    RegisteredLink {
        category: "Astronomy",
        function: "ICRS_to_FK5",
        link_type: "glue.plugins.coordinate_helpers.link_helpers.ICRS_to_FK5",
        display: "ICRS <-> FK5 (J2000)",
        description: "Link ICRS and FK5 (J2000) equatorial coordinates",
        labels1: &["ra", "dec"],
        labels2: &["ra (fk5)", "dec (fk5)"],
    },
    RegisteredLink {
        category: "Astronomy",
        function: "Galactic_to_FK5",
        link_type: "glue.plugins.coordinate_helpers.link_helpers.Galactic_to_FK5",
        display: "Galactic <-> FK5 (J2000)",
        description: "Link Galactic and FK5 (J2000) equatorial coordinates",
        labels1: &["l", "b"],
        labels2: &["ra (fk5)", "dec (fk5)"],
    },
    RegisteredLink {
        category: "Join",
        function: "join_on_key",
        link_type: "glue.core.link_helpers.join_on_key",
        display: "join on key",
        description: "Join two datasets on a shared key attribute",
        labels1: &["key"],
        labels2: &["key"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancedLinkEntry {
    pub function: String,
    #[serde(rename = "_type")]
    pub link_type: String,
    pub display: String,
    pub description: String,
    pub labels1: Vec<String>,
    pub labels2: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancedLinkCategory {
    pub category: String,
    pub links: Vec<AdvancedLinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancedLinksResponse {
    pub data: Vec<AdvancedLinkCategory>,
}

/// Registered links grouped by category, `"General"` first and the remaining
/// categories sorted alphabetically; entry order within a category follows
/// registration order.
pub fn advanced_link_categories() -> Vec<AdvancedLinkCategory> {
    let mut names: Vec<&str> = Vec::new();
    for link in REGISTERED_LINKS {
        if !names.contains(&link.category) {
            names.push(link.category);
        }
    }
    names.sort_by_key(|name| (*name != "General", *name));

    names
        .into_iter()
        .map(|name| AdvancedLinkCategory {
            category: name.to_owned(),
            links: REGISTERED_LINKS
                .iter()
                .filter(|link| link.category == name)
                .map(|link| AdvancedLinkEntry {
                    function: link.function.to_owned(),
                    link_type: link.link_type.to_owned(),
                    display: link.display.to_owned(),
                    description: link.description.to_owned(),
                    labels1: link.labels1.iter().map(|label| (*label).to_owned()).collect(),
                    labels2: link.labels2.iter().map(|label| (*label).to_owned()).collect(),
                })
                .collect(),
        })
        .collect()
}

pub fn advanced_links_response() -> AdvancedLinksResponse {
    AdvancedLinksResponse {
        data: advanced_link_categories(),
    }
}
