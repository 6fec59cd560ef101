// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus — collaborative visualization session engine.
//!
//! A session (datasets, viewers, tabs, data-linking rules) is kept as a set of
//! conflict-free replicated collections that round-trip losslessly with the flat
//! session file format, while a reconciliation engine keeps live viewer objects,
//! loaded datasets, and engine-side links converged with the document.

pub mod backend;
pub mod doc;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
