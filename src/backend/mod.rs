// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Boundary traits for the external collaborators: the plotting toolkit that
//! renders a viewer from `(kind, data, state)`, the data-access library that
//! materializes datasets from files, and the link engine that owns the live
//! link set. In-memory implementations live in [`memory`] and back the demo
//! binary and the test-suite.

pub mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::{IdentityTuple, ViewKind};

/// An in-memory dataset: a label plus its component (column) labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    label: String,
    components: Vec<String>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, components: Vec<String>) -> Self {
        Self {
            label: label.into(),
            components,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn has_component(&self, label: &str) -> bool {
        self.components.iter().any(|component| component == label)
    }
}

/// Kind of a live link as the link engine reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    Identity,
    Other(String),
}

/// A link owned by the external link engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveLink {
    pub kind: LinkKind,
    pub data1: String,
    pub cids1: Vec<String>,
    pub cids2: Vec<String>,
    pub data2: String,
}

impl LiveLink {
    pub fn identity(
        data1: impl Into<String>,
        attribute1: impl Into<String>,
        data2: impl Into<String>,
        attribute2: impl Into<String>,
    ) -> Self {
        Self {
            kind: LinkKind::Identity,
            data1: data1.into(),
            cids1: vec![attribute1.into()],
            cids2: vec![attribute2.into()],
            data2: data2.into(),
        }
    }

    pub fn tuple(&self) -> IdentityTuple {
        IdentityTuple {
            data1: self.data1.clone(),
            cids1: self.cids1.clone(),
            cids2: self.cids2.clone(),
            data2: self.data2.clone(),
        }
    }
}

/// A rendered viewer object owned by the reconciliation engine's cache.
pub trait LiveView: Send + std::fmt::Debug {
    fn view_type(&self) -> &str;

    fn data_label(&self) -> Option<&str>;

    /// Pushes an additional dataset into the live viewer.
    fn add_data(&mut self, dataset: &Dataset) -> Result<(), ConstructError>;
}

/// The plotting toolkit boundary.
pub trait PlotBackend: Send {
    fn construct(
        &mut self,
        kind: &ViewKind,
        data: Option<&Dataset>,
        state: &BTreeMap<String, Value>,
    ) -> Result<Box<dyn LiveView>, ConstructError>;
}

/// The dataset-loading boundary.
pub trait DataAccess: Send {
    fn load(&mut self, path: &Path) -> Result<Dataset, DataAccessError>;
}

/// The link-engine boundary: exposes the live link set and add/remove.
pub trait LinkEngine: Send {
    fn links(&self) -> Vec<LiveLink>;

    fn add_link(&mut self, link: LiveLink);

    fn remove_link(&mut self, link: &LiveLink);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructError {
    UnsupportedViewType { view_type: String },
    Backend { message: String },
}

impl ConstructError {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnsupportedViewType { .. } => "UnsupportedViewType",
            Self::Backend { .. } => "Backend",
        }
    }
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedViewType { view_type } => {
                write!(f, "unsupported view type {view_type:?}")
            }
            Self::Backend { message } => write!(f, "backend construction failed: {message}"),
        }
    }
}

impl std::error::Error for ConstructError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    NotFound { path: PathBuf },
    Backend { message: String },
}

impl fmt::Display for DataAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "no dataset at {path:?}"),
            Self::Backend { message } => write!(f, "dataset load failed: {message}"),
        }
    }
}

impl std::error::Error for DataAccessError {}
