//! Percentile map keyed by floating-point percentile.
//!
//! The map holds the 102 keys 1, 2, …, 99, 99.9, 99.99, 99.999. Keys are
//! floats because 99.9, 99.99 and 99.999 are distinct entries; JSON only
//! allows string keys, so serialization converts each key with the shortest
//! round-tripping decimal form and emits them in ascending numeric order.
//! The stock serde derive cannot express either requirement, hence the
//! hand-written impls.

use crate::record::LogRecord;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record reference held by a percentile map.
///
/// Serializes as `{"time": .., "value": ..}` only. `idx` is the position in
/// the value-sorted sequence the entry was taken from; it exists so callers
/// can slice the sorted sequence around an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileRecord {
    pub time: u32,
    pub value: u32,
    #[serde(skip)]
    pub idx: u32,
}

/// Percentile key → record map, kept in ascending key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentileMap {
    entries: Vec<(f64, PercentileRecord)>,
}

impl PercentileMap {
    /// Build a map from key/record pairs, sorting by key.
    pub fn from_entries(mut entries: Vec<(f64, PercentileRecord)>) -> Self {
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    /// Look up an entry by exact key.
    pub fn get(&self, key: f64) -> Option<&PercentileRecord> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rec)| rec)
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &(f64, PercentileRecord)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PercentileMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, rec) in &self.entries {
            // f64 Display is the shortest form that parses back exactly,
            // so 1 serializes as "1" and 99.999 as "99.999".
            map.serialize_entry(&format!("{}", key), rec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PercentileMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = PercentileMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of percentile keys to records")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, rec)) = access.next_entry::<String, PercentileRecord>()? {
                    let parsed: f64 = key.parse().map_err(|_| {
                        serde::de::Error::custom(format!("invalid percentile key '{}'", key))
                    })?;
                    entries.push((parsed, rec));
                }
                Ok(PercentileMap::from_entries(entries))
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

/// Index the percentile keys out of a value-sorted record sequence.
///
/// Key `p` maps to the record at index `⌊len · p/100⌋`. Each returned entry
/// remembers the sorted position it was taken from so the sub-P1 and
/// super-P99 regions can be sliced out afterwards. An empty input yields an
/// empty map.
pub fn percentiles(sorted: &[LogRecord]) -> PercentileMap {
    if sorted.is_empty() {
        return PercentileMap::default();
    }

    let index_of = |p: f64| ((sorted.len() as f64) * (p / 100.0)).floor() as usize;
    let entry_at = |i: usize| {
        let rec = sorted[i];
        PercentileRecord {
            time: rec.time,
            value: rec.value,
            idx: i as u32,
        }
    };

    let mut entries = Vec::with_capacity(102);
    for p in 1..=99u32 {
        entries.push((p as f64, entry_at(index_of(p as f64))));
    }
    for p in [99.9, 99.99, 99.999] {
        entries.push((p, entry_at(index_of(p))));
    }

    PercentileMap { entries }
}
