use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::store::{read_optional, write_atomic};

/// WoW installation folder, the one containing `_retail_`.
pub const WOW_PATH_KEY: &str = "wow_path";

/// Flat key/value settings stored as a JSON object.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    data: Map<String, Value>,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Map::new(),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut cfg = Self::new(path);
        cfg.load()?;
        Ok(cfg)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<(), StoreError> {
        self.data = match read_optional(&self.path)? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::json(&self.path, e))?
            }
            None => Map::new(),
        };
        Ok(())
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let json =
            serde_json::to_vec_pretty(&self.data).map_err(|e| StoreError::json(&self.path, e))?;
        write_atomic(&self.path, &json)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.data.get(key).and_then(Value::as_i64).unwrap_or(default)
    }
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.data.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.data.insert(key.to_string(), value.into());
    }
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }
}
