// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Viewer construction dispatch. The closed set of view kinds goes through
//! the plot backend; unsupported kinds and backend failures become inert
//! error entries so one broken viewer never aborts a reconciliation pass.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::viewers::LiveObject;
use crate::backend::{ConstructError, Dataset, PlotBackend};
use crate::model::ViewKind;

/// The sentinel stored in place of a live object when construction failed:
/// the failure's kind, message, and origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructFailure {
    kind: String,
    message: String,
    origin: &'static str,
}

impl ConstructFailure {
    fn from_error(error: &ConstructError) -> Self {
        Self {
            kind: error.kind_name().to_owned(),
            message: error.to_string(),
            origin: module_path!(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn origin(&self) -> &'static str {
        self.origin
    }
}

impl fmt::Display for ConstructFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.origin, self.message)
    }
}

pub(crate) fn construct_view(
    plot: &mut dyn PlotBackend,
    kind: &ViewKind,
    data: Option<&Dataset>,
    state: &BTreeMap<String, Value>,
) -> LiveObject {
    if let ViewKind::Unsupported(view_type) = kind {
        return LiveObject::Error(ConstructFailure::from_error(
            &ConstructError::UnsupportedViewType {
                view_type: view_type.clone(),
            },
        ));
    }

    match plot.construct(kind, data, state) {
        Ok(view) => LiveObject::View(view),
        Err(error) => LiveObject::Error(ConstructFailure::from_error(&error)),
    }
}
