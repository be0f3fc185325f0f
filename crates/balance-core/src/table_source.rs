//! Table source adapter: reads unit records out of the Lua data module
//!
//! The data module is published as an HTML page with the Lua source embedded
//! between two marker comments. [`extract_script`] recovers the source and
//! [`extract_units`] turns the literal table into a [`CanonicalDataset`].

use crate::dataset::CanonicalDataset;
use crate::error::{Error, Result};
use crate::lua::{parse_chunk, LuaNode, TableKey};
use crate::stats::{capitalize_title, Mode, StatBlock, StatField, Unit};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Cut the Lua source out of the published page and undo HTML escaping
pub fn extract_script(html: &str, start_marker: &str, end_marker: &str) -> Result<String> {
    let start = html
        .find(start_marker)
        .ok_or_else(|| Error::MarkerNotFound(start_marker.to_string()))?
        + start_marker.len();
    let end = html[start..]
        .find(end_marker)
        .ok_or_else(|| Error::MarkerNotFound(end_marker.to_string()))?
        + start;

    Ok(unescape_html(&html[start..end].replace("\r\n", "\n")))
}

/// Minimal entity decoding for the embedded script
fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// SHA-256 fingerprint of a script, used to skip unchanged publications
pub fn fingerprint(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse the Lua data module into canonical unit records
///
/// Grammar errors are fatal, and so is any record that does not have the
/// expected shape: every record must be a table with a positive integer `id`,
/// string `apiname` and `title`, and a `stats` table. No partial dataset is
/// ever returned.
pub fn extract_units(source: &str) -> Result<CanonicalDataset> {
    let root = parse_chunk(source)?;
    let records = root
        .as_table()
        .ok_or_else(|| Error::TableShape("data module does not return a table".to_string()))?;

    let mut dataset = CanonicalDataset::new();
    for entry in records {
        let label = record_label(&entry.key);
        dataset.insert(read_unit(&label, &entry.value)?);
    }

    debug!(units = dataset.len(), "extracted units from table source");
    Ok(dataset)
}

fn record_label(key: &TableKey) -> String {
    match key {
        TableKey::Positional(index) => format!("#{}", index),
        other => other.as_str().unwrap_or("<non-string key>").to_string(),
    }
}

fn shape_error(label: &str, problem: &str) -> Error {
    Error::TableShape(format!("record '{}' {}", label, problem))
}

fn read_unit(label: &str, record: &LuaNode) -> Result<Unit> {
    if record.as_table().is_none() {
        return Err(shape_error(label, "is not a table"));
    }

    let id = record
        .field("id")
        .and_then(LuaNode::as_number)
        .ok_or_else(|| shape_error(label, "has no numeric id"))?;
    if id < 1.0 || id.fract() != 0.0 || id > u32::MAX as f64 {
        return Err(shape_error(label, &format!("has invalid id {}", id)));
    }

    let name = record
        .field("apiname")
        .and_then(LuaNode::as_str)
        .ok_or_else(|| shape_error(label, "has no apiname"))?;
    let title = record
        .field("title")
        .and_then(LuaNode::as_str)
        .map(capitalize_title)
        .ok_or_else(|| shape_error(label, "has no title"))?;
    let stats = record
        .field("stats")
        .filter(|s| s.as_table().is_some())
        .ok_or_else(|| shape_error(label, "has no stats table"))?;

    let mut unit = Unit::new(id as u32, name, title);
    for mode in Mode::ALL {
        if let Some(block) = stats.field(mode.code()).map(read_stat_block) {
            unit.stats.insert(mode, block);
        }
    }
    unit.normalize();
    Ok(unit)
}

/// Read every known stat field present in a mode table
fn read_stat_block(fields: &LuaNode) -> StatBlock {
    StatField::ALL
        .into_iter()
        .filter_map(|field| {
            fields
                .field(field.key())
                .and_then(LuaNode::as_number)
                .map(|value| (field, value))
        })
        .collect()
}
