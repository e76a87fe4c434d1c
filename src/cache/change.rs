//! Differences between two snapshots of a namespace.

use serde::{Deserialize, Serialize};

use crate::client::ConfigSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// Change of a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChange {
    pub key: String,
    pub kind: ChangeKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Published whenever a newly applied snapshot differs from the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub namespace: String,
    pub old_release: Option<String>,
    pub new_release: String,
    pub changes: Vec<KeyChange>,
}

impl ConfigChange {
    /// Compare `new` against the snapshot it replaces.
    ///
    /// Returns `None` when neither the release nor any value changed.
    pub fn between(old: Option<&ConfigSnapshot>, new: &ConfigSnapshot) -> Option<Self> {
        let mut changes = Vec::new();

        for (key, value) in &new.key_values {
            match old.and_then(|o| o.key_values.get(key)) {
                None => changes.push(KeyChange {
                    key: key.clone(),
                    kind: ChangeKind::Added,
                    old_value: None,
                    new_value: Some(value.clone()),
                }),
                Some(previous) if previous != value => changes.push(KeyChange {
                    key: key.clone(),
                    kind: ChangeKind::Modified,
                    old_value: Some(previous.clone()),
                    new_value: Some(value.clone()),
                }),
                Some(_) => {}
            }
        }

        if let Some(old) = old {
            for (key, value) in &old.key_values {
                if !new.key_values.contains_key(key) {
                    changes.push(KeyChange {
                        key: key.clone(),
                        kind: ChangeKind::Deleted,
                        old_value: Some(value.clone()),
                        new_value: None,
                    });
                }
            }
        }

        let old_release = old.map(|o| o.release_key.clone());
        if changes.is_empty() && old_release.as_deref() == Some(new.release_key.as_str()) {
            return None;
        }

        Some(Self {
            namespace: new.namespace.clone(),
            old_release,
            new_release: new.release_key.clone(),
            changes,
        })
    }
}
