use std::fs;
use std::path::{Path, PathBuf};

pub const ADDON_FILE_NAME: &str = "WoWStatTracker_Addon.lua";

pub fn is_wow_root(p: &Path) -> bool { p.is_dir() && p.join("_retail_").is_dir() }

pub fn account_root(wow_root: &Path) -> PathBuf {
    wow_root.join("_retail_").join("WTF").join("Account")
}

/// Account directories under `_retail_/WTF/Account`, sorted, hidden ones skipped.
pub fn list_accounts(wow_root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(rd) = fs::read_dir(account_root(wow_root)) {
        for e in rd.flatten() {
            let p = e.path();
            let name = p.file_name().and_then(|s| s.to_str());
            let hidden = name.map(|n| n.starts_with('.')) != Some(false);
            if p.is_dir() && !hidden { out.push(p); }
        }
    }
    out.sort(); out
}

/// First account's SavedVariables file for the addon, if any.
pub fn find_addon_file(wow_root: &Path) -> Option<PathBuf> {
    let found = list_accounts(wow_root)
        .into_iter()
        .map(|acct| acct.join("SavedVariables").join(ADDON_FILE_NAME))
        .find(|p| p.is_file());
    if found.is_none() {
        tracing::debug!(root = %wow_root.display(), "no addon SavedVariables file found");
    }
    found
}
