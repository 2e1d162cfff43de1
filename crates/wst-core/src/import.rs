use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::character::Character;
use crate::lua::{self, Key, Value};
use crate::projector::project_character;

/// Result of reading one addon save file. Every failure mode collapses to the
/// empty value: no characters, no version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddonData {
    pub characters: Vec<Character>,
    pub addon_version: Option<String>,
}

impl AddonData {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// True when the addon reported a version and it differs from `app_version`.
    pub fn version_mismatch(&self, app_version: &str) -> bool {
        self.addon_version
            .as_deref()
            .is_some_and(|v| v != app_version)
    }
}

pub fn parse_addon_file(path: &Path) -> AddonData {
    match fs::read(path) {
        Ok(bytes) => parse_addon_content(&bytes),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "addon file unreadable");
            AddonData::default()
        }
    }
}

pub fn parse_addon_content(text: &[u8]) -> AddonData {
    let mut out = AddonData::default();
    let Some(root) = lua::evaluate(text) else {
        return out;
    };

    out.addon_version = root
        .get_table("metadata")
        .and_then(|m| m.get_str("version"))
        .map(str::to_string);

    let Some(chars) = root.get_table("characters") else {
        tracing::debug!("addon data has no characters table");
        return out;
    };
    for (key, value) in chars.iter() {
        let (Key::Str(key), Value::Table(entry)) = (key, value) else {
            tracing::debug!(key = %key, "skipping non-character entry");
            continue;
        };
        match project_character(key, entry) {
            Some(c) => out.characters.push(c),
            None => tracing::debug!(key = %key, "skipping entry without Name-Realm key"),
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// When set, only snapshots stamped with this week contribute weekly
    /// fields; a snapshot from another week or without a week stamp does not.
    pub current_week: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub stale: usize,
}

/// Merge with default options: every addon-sourced field is applied.
pub fn import_all(parsed: &[Character], existing: &mut Vec<Character>) -> ImportSummary {
    import_all_with(parsed, existing, &ImportOptions::default())
}

/// Merge parsed characters into `existing`, keyed on exact `(realm, name)`.
///
/// Matches are updated in place (notes untouched); others are cloned in.
/// Entries with an empty name or realm are ignored.
pub fn import_all_with(
    parsed: &[Character],
    existing: &mut Vec<Character>,
    opts: &ImportOptions,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for c in parsed {
        if c.name.is_empty() || c.realm.is_empty() {
            continue;
        }
        let stale = opts
            .current_week
            .as_deref()
            .is_some_and(|current| c.week_id.as_deref() != Some(current));
        // unstamped snapshots lose their weekly fields but are not reported
        if stale && c.week_id.is_some() {
            summary.stale += 1;
            tracing::debug!(
                name = %c.name,
                realm = %c.realm,
                week = ?c.week_id,
                "stale weekly data"
            );
        }

        match find_index(existing, &c.realm, &c.name) {
            Some(i) => {
                existing[i].apply_import(c, !stale);
                summary.updated += 1;
            }
            None => {
                let mut copy = c.clone();
                if stale {
                    copy.reset_weekly();
                }
                existing.push(copy);
                summary.added += 1;
            }
        }
    }
    tracing::info!(
        added = summary.added,
        updated = summary.updated,
        stale = summary.stale,
        "addon import merged"
    );
    summary
}

pub fn find_index(chars: &[Character], realm: &str, name: &str) -> Option<usize> {
    chars.iter().position(|c| c.realm == realm && c.name == name)
}
