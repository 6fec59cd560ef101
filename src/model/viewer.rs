// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde_json::{Map as JsonMap, Value};

/// Prefix marking a string-encoded state value in the session format.
pub const STRING_STATE_PREFIX: &str = "st__";

const SCATTER_2D_TYPE: &str = "glue.viewers.scatter.qt.data_viewer.ScatterViewer";
const IMAGE_TYPE: &str = "glue.viewers.image.qt.data_viewer.ImageViewer";
const HISTOGRAM_TYPE: &str = "glue.viewers.histogram.qt.data_viewer.HistogramViewer";
const TABLE_TYPE: &str = "glue.viewers.table.qt.data_viewer.TableViewer";
const SCATTER_3D_TYPE: &str = "glue_vispy_viewers.scatter.scatter_viewer.VispyScatterViewer";
const PROFILE_TYPE: &str = "glue.viewers.profile.state.ProfileLayerState";

/// The closed set of visualization kinds a viewer spec can name.
///
/// Unknown `_type` strings map to [`ViewKind::Unsupported`], which constructs
/// to an inert error entry instead of failing the reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    Scatter2d,
    Image,
    Histogram,
    Table,
    Scatter3d,
    Profile,
    Unsupported(String),
}

impl ViewKind {
    pub fn from_type_name(name: Option<&str>) -> Self {
        match name {
            Some(SCATTER_2D_TYPE) => Self::Scatter2d,
            Some(IMAGE_TYPE) => Self::Image,
            Some(HISTOGRAM_TYPE) => Self::Histogram,
            Some(TABLE_TYPE) => Self::Table,
            Some(SCATTER_3D_TYPE) => Self::Scatter3d,
            Some(PROFILE_TYPE) => Self::Profile,
            Some(other) => Self::Unsupported(other.to_owned()),
            None => Self::Unsupported(String::new()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Scatter2d => SCATTER_2D_TYPE,
            Self::Image => IMAGE_TYPE,
            Self::Histogram => HISTOGRAM_TYPE,
            Self::Table => TABLE_TYPE,
            Self::Scatter3d => SCATTER_3D_TYPE,
            Self::Profile => PROFILE_TYPE,
            Self::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scatter2d => f.write_str("2d scatter"),
            Self::Image => f.write_str("image"),
            Self::Histogram => f.write_str("histogram"),
            Self::Table => f.write_str("table"),
            Self::Scatter3d => f.write_str("3d scatter"),
            Self::Profile => f.write_str("profile"),
            Self::Unsupported(name) => write!(f, "unsupported view type {name:?}"),
        }
    }
}

/// A parsed view over a viewer spec record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerSpec {
    view_type: Option<String>,
    state_values: JsonMap<String, Value>,
    layer_state_ids: Vec<Option<String>>,
}

impl ViewerSpec {
    /// Tolerant parse: absent or malformed fields degrade to empty, matching
    /// how concurrently edited specs must be read mid-merge.
    pub fn from_record(record: &JsonMap<String, Value>) -> Self {
        let view_type = record
            .get("_type")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        let state_values = record
            .get("state")
            .and_then(Value::as_object)
            .and_then(|state| state.get("values"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let layer_state_ids = record
            .get("layers")
            .and_then(Value::as_array)
            .map(|layers| {
                layers
                    .iter()
                    .map(|layer| {
                        layer
                            .as_object()
                            .and_then(|layer| layer.get("state"))
                            .and_then(Value::as_str)
                            .map(ToOwned::to_owned)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            view_type,
            state_values,
            layer_state_ids,
        }
    }

    pub fn view_type(&self) -> Option<&str> {
        self.view_type.as_deref()
    }

    pub fn view_kind(&self) -> ViewKind {
        ViewKind::from_type_name(self.view_type())
    }

    pub fn state_values(&self) -> &JsonMap<String, Value> {
        &self.state_values
    }

    pub fn layer_count(&self) -> usize {
        self.layer_state_ids.len()
    }

    pub fn first_layer_state_id(&self) -> Option<&str> {
        self.layer_state_ids.first()?.as_deref()
    }
}

/// Decodes one state value: strings carrying the `st__` prefix lose it, every
/// other value passes through unchanged.
pub fn decode_state_value(value: &Value) -> Value {
    let Some(text) = value.as_str() else {
        return value.clone();
    };
    match text.strip_prefix(STRING_STATE_PREFIX) {
        Some(stripped) => Value::String(stripped.to_owned()),
        None => value.clone(),
    }
}
