// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Identity-link reconciliation against the external link engine. Matching is
//! symmetric (a reversed tuple is the same link) and convergent: an add that
//! finds a live counterpart, or a remove that finds none, is already done.

use super::EngineState;
use crate::backend::{LinkKind, LiveLink};
use crate::doc::change::{ChangeAction, ChangeEvent};
use crate::model::{IdentityTuple, UniformLink};

impl EngineState {
    pub(crate) fn reconcile_links(&mut self, change: &ChangeEvent) {
        for key_change in &change.keys {
            match key_change.action {
                ChangeAction::Add => {
                    let link = key_change.new_value.as_ref().and_then(UniformLink::from_value);
                    if let Some(link) = link {
                        self.apply_link_added(&link);
                    }
                }
                ChangeAction::Delete => {
                    let link = key_change.old_value.as_ref().and_then(UniformLink::from_value);
                    if let Some(link) = link {
                        self.apply_link_removed(&link);
                    }
                }
                ChangeAction::Update => {}
            }
        }
    }

    fn apply_link_added(&mut self, link: &UniformLink) {
        if !link.is_identity() {
            return;
        }
        // A link whose endpoints have no owning dataset is inert.
        let Some(tuple) = link.identity_tuple() else {
            return;
        };
        if self.find_live_identity(&tuple).is_some() {
            return;
        }
        let (Some(attribute1), Some(attribute2)) = (tuple.cids1.first(), tuple.cids2.first())
        else {
            return;
        };
        if !self.data.contains_key(tuple.data1.as_str())
            || !self.data.contains_key(tuple.data2.as_str())
        {
            return;
        }

        self.link_engine.add_link(LiveLink::identity(
            tuple.data1.clone(),
            attribute1.clone(),
            tuple.data2.clone(),
            attribute2.clone(),
        ));
    }

    fn apply_link_removed(&mut self, link: &UniformLink) {
        if !link.is_identity() {
            return;
        }
        let Some(tuple) = link.identity_tuple() else {
            return;
        };
        // Not found means the engine already converged.
        if let Some(live) = self.find_live_identity(&tuple) {
            self.link_engine.remove_link(&live);
        }
    }

    fn find_live_identity(&self, tuple: &IdentityTuple) -> Option<LiveLink> {
        self.link_engine
            .links()
            .into_iter()
            .find(|link| link.kind == LinkKind::Identity && tuple.matches(&link.tuple()))
    }
}
