use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::character::Character;
use crate::error::StoreError;
use crate::import::{self, ImportOptions, ImportSummary};

/// Character collection persisted as a pretty JSON array.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    path: PathBuf,
    characters: Vec<Character>,
}

impl CharacterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            characters: Vec::new(),
        }
    }

    /// Create and load in one step.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory collection with the file's contents. A missing or
    /// empty file is an empty collection.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let Some(data) = read_optional(&self.path)? else {
            self.characters.clear();
            return Ok(());
        };
        self.characters =
            serde_json::from_slice(&data).map_err(|e| StoreError::json(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            count = self.characters.len(),
            "characters loaded"
        );
        Ok(())
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&self.characters)
            .map_err(|e| StoreError::json(&self.path, e))?;
        write_atomic(&self.path, &json)
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }
    pub fn len(&self) -> usize {
        self.characters.len()
    }
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&Character> {
        self.characters.get(index)
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Character> {
        self.characters.get_mut(index)
    }

    /// Append without a uniqueness check.
    pub fn add(&mut self, c: Character) {
        self.characters.push(c);
    }

    pub fn update(&mut self, index: usize, c: Character) -> Result<(), StoreError> {
        let len = self.characters.len();
        let slot = self
            .characters
            .get_mut(index)
            .ok_or(StoreError::OutOfRange { index, len })?;
        *slot = c;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Character, StoreError> {
        if index >= self.characters.len() {
            return Err(StoreError::OutOfRange {
                index,
                len: self.characters.len(),
            });
        }
        Ok(self.characters.remove(index))
    }

    pub fn find(&self, realm: &str, name: &str) -> Option<usize> {
        import::find_index(&self.characters, realm, name)
    }

    pub fn reset_weekly_all(&mut self) {
        for c in &mut self.characters {
            c.reset_weekly();
        }
    }

    pub fn import(&mut self, parsed: &[Character], opts: &ImportOptions) -> ImportSummary {
        import::import_all_with(parsed, &mut self.characters, opts)
    }
}

pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(data) if data.iter().all(|b| b.is_ascii_whitespace()) => Ok(None),
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Write to `<path>.tmp`, flush, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = (|| {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
        drop(f);
        fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::io(path, e));
    }
    Ok(())
}
