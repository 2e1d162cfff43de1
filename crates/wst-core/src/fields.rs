use serde::Serialize;

use crate::lua::{Table, Value};

/// Vault slots at or above this delve tier / keystone level reward top-track gear.
pub const HIGH_TIER_THRESHOLD: i64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SlotUpgrade<'a> {
    slot: i64,
    slot_name: &'a str,
    track: &'a str,
    current: i64,
    max: i64,
}

// Typed, absent-tolerant accessors. A missing key and a value of the wrong
// type are the same thing to callers: `None`.
impl Table {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(Value::as_number)
    }
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(Value::as_bool)
    }
    pub fn get_table(&self, key: &str) -> Option<&Table> {
        self.field(key).and_then(Value::as_table)
    }

    pub fn nested_number(&self, outer: &str, inner: &str) -> Option<f64> {
        self.get_table(outer)?.get_number(inner)
    }
    pub fn nested_bool(&self, outer: &str, inner: &str) -> Option<bool> {
        self.get_table(outer)?.get_bool(inner)
    }

    /// Count entries of `outer.inner` (a `{ [slot] = level }` map) whose level is
    /// at least `threshold`. Levels are truncated toward zero first.
    pub fn count_threshold_rewards(&self, outer: &str, inner: &str, threshold: i64) -> usize {
        let Some(levels) = self.get_table(outer).and_then(|t| t.get_table(inner)) else {
            return 0;
        };
        levels
            .iter()
            .filter_map(|(_, v)| v.as_number())
            .filter(|n| (*n as i64) >= threshold)
            .count()
    }

    /// Render the numeric array at `outer.inner` as compact JSON, e.g. `[1,6,9]`.
    /// Integer-keyed elements come first in key order, then any others.
    /// Non-numeric elements are dropped; an empty table gives `[]`.
    pub fn array_to_json_string(&self, outer: &str, inner: &str) -> Option<String> {
        let arr = self.get_table(outer)?.get_table(inner)?;
        let nums: Vec<i64> = arr
            .ordered_values()
            .into_iter()
            .filter_map(Value::as_number)
            .map(|n| n as i64)
            .collect();
        serde_json::to_string(&nums).ok()
    }

    /// Render `slot_upgrades` as a JSON array of
    /// `{"slot","slot_name","track","current","max"}` objects.
    ///
    /// Records without a positive `slot` or a non-empty `track` are skipped.
    /// Returns `None` when nothing survives.
    pub fn slot_upgrades_to_json_string(&self) -> Option<String> {
        let records = self.get_table("slot_upgrades")?;
        let mut out = Vec::new();
        for v in records.ordered_values() {
            let Some(rec) = v.as_table() else { continue };
            let slot = rec.get_number("slot").map(|n| n as i64).unwrap_or(0);
            let track = rec.get_str("track").unwrap_or("");
            if slot <= 0 || track.is_empty() {
                continue;
            }
            out.push(SlotUpgrade {
                slot,
                slot_name: rec.get_str("slot_name").unwrap_or(""),
                track,
                current: rec.get_number("current").map(|n| n as i64).unwrap_or(0),
                max: rec.get_number("max").map(|n| n as i64).unwrap_or(0),
            });
        }
        if out.is_empty() {
            return None;
        }
        serde_json::to_string(&out).ok()
    }
}
