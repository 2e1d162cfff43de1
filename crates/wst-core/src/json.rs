use serde_json::{Map, Value as Json, json};

use crate::lua::{Table, Value};

#[derive(Clone, Copy)]
pub struct JsonOpts {
    pub max_array_elems: usize,
    pub max_depth: usize,
}

impl Default for JsonOpts {
    fn default() -> Self {
        Self {
            max_array_elems: 128,
            max_depth: 16,
        }
    }
}

/// Dump an evaluated save-file tree for inspection. Sequence tables become
/// arrays, everything else an object keyed by the stringified table key.
pub fn tree_to_json(v: &Value, opts: JsonOpts) -> Json {
    write_value(v, 0, &opts)
}

fn write_value(v: &Value, depth: usize, opts: &JsonOpts) -> Json {
    match v {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number(*n),
        Value::Str(s) => json!(s),
        Value::Table(t) if depth >= opts.max_depth => json!({"$table": true, "len": t.len()}),
        Value::Table(t) if t.is_sequence() => write_array(t, depth, opts),
        Value::Table(t) => {
            let mut map = Map::with_capacity(t.len());
            for (k, val) in t.iter() {
                map.insert(k.to_string(), write_value(val, depth + 1, opts));
            }
            Json::Object(map)
        }
    }
}

fn write_array(t: &Table, depth: usize, opts: &JsonOpts) -> Json {
    let items = t.int_entries();
    let max = opts.max_array_elems.min(items.len());
    let mut arr = Vec::with_capacity(max + 1);
    for (_, it) in items.iter().take(max) {
        arr.push(write_value(it, depth + 1, opts));
    }
    if items.len() > max {
        arr.push(json!({"$truncated": true, "$omitted": items.len() - max }));
    }
    Json::Array(arr)
}

// Integral values print without a fractional part
fn number(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        json!(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Json::Number)
            .unwrap_or(Json::Null)
    }
}
