// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Dataset loading policy: scans `contents` for load directives and resolves
//! each one through the data-access collaborator, memoized by dataset name.
//! A cached dataset is never reloaded or replaced, since live viewers hold
//! references to it.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use yrs::ReadTxn;

use super::{EngineState, EngineWarning};
use crate::model::DatasetName;

/// Key of the first load-directive record; subsequent ones are numbered
/// `LoadLog_0`, `LoadLog_1`, … with no gaps.
pub(crate) const LOAD_DIRECTIVE_KEY: &str = "LoadLog";

impl EngineState {
    pub(crate) fn reload_datasets<T: ReadTxn>(&mut self, txn: &T) {
        let contents = self.collections.contents_with(txn);

        for (name, path) in load_directives(&contents) {
            let Ok(dataset_name) = DatasetName::new(name.clone()) else {
                continue;
            };
            if self.data.contains_key(&dataset_name) {
                continue;
            }

            match self.data_access.load(Path::new(&path)) {
                Ok(dataset) => {
                    self.data.insert(dataset_name, dataset);
                }
                Err(error) => {
                    self.warnings.push(EngineWarning::DatasetLoad {
                        name,
                        path,
                        message: error.to_string(),
                    });
                }
            }
        }
    }
}

/// Dataset name (the path's file stem) to declared path, for the
/// distinguished record and the numbered sequence after it.
fn load_directives(contents: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    let mut directives = BTreeMap::new();

    if let Some(path) = directive_path(contents.get(LOAD_DIRECTIVE_KEY)) {
        insert_directive(&mut directives, path);
    }

    let mut index = 0usize;
    loop {
        let key = format!("{LOAD_DIRECTIVE_KEY}_{index}");
        let Some(path) = directive_path(contents.get(&key)) else {
            break;
        };
        insert_directive(&mut directives, path);
        index += 1;
    }

    directives
}

fn directive_path(record: Option<&Value>) -> Option<String> {
    record?
        .as_object()?
        .get("path")?
        .as_str()
        .map(ToOwned::to_owned)
}

fn insert_directive(directives: &mut BTreeMap<String, String>, path: String) {
    let stem = Path::new(&path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned);
    if let Some(stem) = stem {
        directives.insert(stem, path);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::load_directives;

    #[test]
    fn scans_the_numbered_directive_sequence() {
        let mut contents = BTreeMap::new();
        contents.insert("LoadLog".to_owned(), json!({"path": "w5.fits"}));
        contents.insert("LoadLog_0".to_owned(), json!({"path": "w5_psc.csv"}));
        contents.insert("LoadLog_1".to_owned(), json!({"path": "data/extra.csv"}));
        // A gap ends the sequence.
        contents.insert("LoadLog_3".to_owned(), json!({"path": "ignored.csv"}));

        let directives = load_directives(&contents);
        assert_eq!(directives.len(), 3);
        assert_eq!(directives["w5"], "w5.fits");
        assert_eq!(directives["w5_psc"], "w5_psc.csv");
        assert_eq!(directives["extra"], "data/extra.csv");
        assert!(!directives.contains_key("ignored"));
    }
}
