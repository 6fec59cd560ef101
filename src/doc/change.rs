// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde_json::Value;

/// The five replicated collections of a shared session document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Contents,
    Attributes,
    Dataset,
    Links,
    Tabs,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contents => "contents",
            Self::Attributes => "attributes",
            Self::Dataset => "dataset",
            Self::Links => "links",
            Self::Tabs => "tabs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Update,
    Delete,
}

/// One changed entry of a collection. For deep `tabs` changes the key is the
/// owning tab name and the action is `Update`, so nested viewer edits surface
/// without flattening the whole subtree into the event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyChange {
    pub key: String,
    pub action: ChangeAction,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// The per-collection payload delivered to an observer, keys sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeEvent {
    pub keys: Vec<KeyChange>,
}

impl ChangeEvent {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
