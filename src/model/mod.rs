// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model of the flat session format.
//!
//! A session document maps object ids to records; the `"__main__"` record
//! indexes tabs, viewers, and the data collection.

pub mod fixtures;
pub mod ids;
pub mod link;
pub mod session_doc;
pub mod viewer;

pub use ids::{DatasetName, Id, IdError, TabName, ViewerId};
pub use link::{
    IdentityTuple, UniformLink, COMPONENT_LINK_TYPE, IDENTITY_LINK_FUNCTION, LIST_CONTENTS_KEY,
    LIST_RECORD_TYPE,
};
pub use session_doc::{SessionDocument, SessionDocumentError, MAIN_RECORD_KEY};
pub use viewer::{decode_state_value, ViewKind, ViewerSpec, STRING_STATE_PREFIX};
