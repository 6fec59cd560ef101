// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries consumed by UI surfaces, not by the core engine.

pub mod advanced_links;

pub use advanced_links::{
    advanced_link_categories, advanced_links_response, AdvancedLinkCategory, AdvancedLinkEntry,
    AdvancedLinksResponse,
};
