// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{json, Value};

/// A small two-dataset demo session in the flat format: two tabs with one
/// viewer each, one identity link, one non-identity component link, and one
/// advanced link indirecting through list records.
///
/// The fixture is canonical (sorted tab/dataset/link names, list records named
/// in link-processing order), so a decompose/recompose cycle reproduces it
/// verbatim.
pub fn demo_session_value() -> Value {
    json!({
        "__main__": {
            "_type": "glue.app.qt.application.GlueApplication",
            "data": "DataCollection",
            "session": "Session",
            "tab_names": ["Tab 1", "Tab 2"],
            "viewers": [["ScatterViewer"], ["HistogramViewer"]]
        },
        "Session": {
            "_type": "glue.core.session.Session"
        },
        "DataCollection": {
            "_type": "glue.core.data_collection.DataCollection",
            "cids": ["psc_cid_0", "psc_cid_1", "w5_cid_0", "w5_cid_1"],
            "components": ["psc_comp_0", "psc_comp_1", "w5_comp_0", "w5_comp_1"],
            "data": ["w5", "w5_psc"],
            "groups": [],
            "links": ["Advanced Link", "Component Link", "Identity Link"]
        },
        "LoadLog": {
            "_type": "glue.core.data_factories.helpers.LoadLog",
            "path": "w5.fits"
        },
        "LoadLog_0": {
            "_type": "glue.core.data_factories.helpers.LoadLog",
            "path": "w5_psc.csv"
        },
        "w5": {
            "_type": "glue.core.data.Data",
            "components": [["w5_cid_0", "w5_comp_0"], ["w5_cid_1", "w5_comp_1"]],
            "label": "w5",
            "primary_owner": ["w5_cid_0", "w5_cid_1"]
        },
        "w5_psc": {
            "_type": "glue.core.data.Data",
            "components": [["psc_cid_0", "psc_comp_0"], ["psc_cid_1", "psc_comp_1"]],
            "label": "w5_psc",
            "primary_owner": ["psc_cid_0", "psc_cid_1"]
        },
        "w5_cid_0": {
            "_type": "glue.core.component_id.ComponentID",
            "label": "Right Ascension"
        },
        "w5_cid_1": {
            "_type": "glue.core.component_id.ComponentID",
            "label": "Declination"
        },
        "psc_cid_0": {
            "_type": "glue.core.component_id.ComponentID",
            "label": "RAJ2000"
        },
        "psc_cid_1": {
            "_type": "glue.core.component_id.ComponentID",
            "label": "DEJ2000"
        },
        "w5_comp_0": {"_type": "glue.core.data.Component"},
        "w5_comp_1": {"_type": "glue.core.data.Component"},
        "psc_comp_0": {"_type": "glue.core.data.Component"},
        "psc_comp_1": {"_type": "glue.core.data.Component"},
        "Identity Link": {
            "_type": "glue.core.component_link.ComponentLink",
            "frm": ["w5_cid_1"],
            "to": ["psc_cid_1"],
            "using": {"function": "glue.core.link_helpers.identity"}
        },
        "Component Link": {
            "_type": "glue.core.component_link.ComponentLink",
            "frm": ["w5_cid_0"],
            "to": ["psc_cid_0"],
            "using": {"function": "glue.core.link_helpers.lengths_to_volume"}
        },
        "Advanced Link": {
            "_type": "glue.plugins.coordinate_helpers.link_helpers.ICRS_to_Galactic",
            "cids1": "list",
            "cids2": "list_0"
        },
        "list": {
            "_type": "builtins.list",
            "contents": ["w5_cid_0", "w5_cid_1"]
        },
        "list_0": {
            "_type": "builtins.list",
            "contents": ["psc_cid_0", "psc_cid_1"]
        },
        "ScatterViewer": {
            "_type": "glue.viewers.scatter.qt.data_viewer.ScatterViewer",
            "layers": [
                {"_type": "glue.viewers.scatter.state.ScatterLayerState", "state": "scatter_layer_0"}
            ],
            "pos": [0, 0],
            "session": "Session",
            "size": [600, 400],
            "state": {
                "values": {
                    "layer": "st__w5",
                    "x_att": "st__Right Ascension",
                    "y_att": "st__Declination"
                }
            }
        },
        "scatter_layer_0": {
            "_type": "glue.viewers.scatter.state.ScatterLayerState",
            "values": {"alpha": 0.8, "markersize": 3}
        },
        "HistogramViewer": {
            "_type": "glue.viewers.histogram.qt.data_viewer.HistogramViewer",
            "layers": [],
            "pos": [0, 0],
            "session": "Session",
            "size": [600, 400],
            "state": {
                "values": {
                    "hist_n_bin": 15,
                    "layer": "st__w5_psc",
                    "x_att": "st__DEJ2000"
                }
            }
        }
    })
}

pub fn demo_session_text() -> String {
    serde_json::to_string_pretty(&demo_session_value()).expect("fixture serializes")
}
