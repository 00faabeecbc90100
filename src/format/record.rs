// Persisted record layout for formats:
//   { "id": "<hex>", "segments": [{"text": ..} | {"values": {..}}], "count": N, "sample": ".." }
// Fixed segment counts are not stored; every segment's count equals the
// format count, so they are restored from it.
use super::Format;
use crate::config::{FormatOptions, ValueOrder};
use crate::error::{LogshapeError, Result};
use crate::segment::{FixedSegment, Segment, VariableSegment};
use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

impl Serialize for Format {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let segments: Vec<SegmentRecordRef<'_>> = self
            .segments
            .iter()
            .map(|segment| SegmentRecordRef {
                segment,
                order: self.options.value_order,
            })
            .collect();

        let mut state = serializer.serialize_struct("Format", 4)?;
        state.serialize_field("id", &self.hash)?;
        state.serialize_field("segments", &segments)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("sample", &self.sample)?;
        state.end()
    }
}

struct SegmentRecordRef<'a> {
    segment: &'a Segment,
    order: ValueOrder,
}

impl Serialize for SegmentRecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.segment {
            Segment::Fixed(fixed) => {
                let mut state = serializer.serialize_struct("Fixed", 1)?;
                state.serialize_field("text", fixed.text())?;
                state.end()
            }
            Segment::Variable(variable) => {
                let mut state = serializer.serialize_struct("Variable", 1)?;
                state.serialize_field(
                    "values",
                    &ValuesRef {
                        values: variable.values(self.order),
                    },
                )?;
                state.end()
            }
        }
    }
}

struct ValuesRef<'a> {
    values: Vec<(&'a str, u64)>,
}

impl Serialize for ValuesRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (value, count) in &self.values {
            map.serialize_entry(value, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SegmentRecord {
    Fixed { text: String },
    Variable { values: RecordValues },
}

/// Value table as written, in document order
#[derive(Debug)]
struct RecordValues(Vec<(String, u64)>);

impl<'de> Deserialize<'de> for RecordValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = RecordValues;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of value to occurrence count")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut values = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, u64>()? {
                    values.push(entry);
                }
                Ok(RecordValues(values))
            }
        }

        deserializer.deserialize_map(ValuesVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct FormatRecord {
    id: String,
    segments: Vec<SegmentRecord>,
    count: u64,
    #[serde(default)]
    sample: String,
}

impl Format {
    /// Serialize to the persisted JSON record
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LogshapeError::Json {
            source: e,
            context: format!("Failed to serialize format {}", self.short_id()),
        })
    }

    /// Restore a format from its persisted JSON record.
    ///
    /// `options` must use the wildcard the record was written with, otherwise
    /// the recomputed id will not match the stored one.
    pub fn from_json(json: &str, options: FormatOptions) -> Result<Self> {
        let record: FormatRecord = serde_json::from_str(json).map_err(|e| LogshapeError::Json {
            source: e,
            context: "Failed to parse format record".to_string(),
        })?;
        Self::from_record(record, options)
    }

    fn from_record(record: FormatRecord, options: FormatOptions) -> Result<Self> {
        let mut segments = Vec::with_capacity(record.segments.len());

        for (position, segment) in record.segments.into_iter().enumerate() {
            match segment {
                SegmentRecord::Fixed { text } => {
                    segments.push(Segment::Fixed(FixedSegment::with_count(text, record.count)));
                }
                SegmentRecord::Variable { values } => {
                    let total: u64 = values.0.iter().map(|(_, count)| count).sum();
                    if total != record.count {
                        return Err(LogshapeError::InvalidInput(format!(
                            "segment {} counts sum to {}, record count is {}",
                            position, total, record.count
                        )));
                    }
                    segments.push(Segment::Variable(VariableSegment::from_values(values.0)));
                }
            }
        }

        let hash = super::shape_hash(&segments, &options.wildcard);
        if hash != record.id {
            return Err(LogshapeError::InvalidInput(format!(
                "record id {} does not match its segments (wildcard {:?})",
                record.id, options.wildcard
            )));
        }

        Ok(Self {
            hash,
            segments,
            count: record.count,
            sample: record.sample,
            cluster_key: None,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Chunk;
    use crate::config::Highlight;
    use serde_json::json;

    fn chunks(tokens: &[&str]) -> Vec<Chunk> {
        tokens.iter().map(|t| Chunk::new(*t)).collect()
    }

    fn sorted() -> FormatOptions {
        FormatOptions {
            value_order: ValueOrder::Sorted,
            highlight: Highlight::Never,
            ..FormatOptions::default()
        }
    }

    fn build(options: FormatOptions) -> Format {
        let logs = [
            ["GET", "/a", "200"],
            ["GET", "/b", "200"],
            ["GET", "/a", "200"],
        ];
        let mut format = Format::seed(&chunks(&logs[0]), options);
        for log in &logs {
            format.merge(&chunks(log)).unwrap();
        }
        format.refresh_sample();
        format
    }

    #[test]
    fn test_record_layout() {
        let format = build(sorted());
        let value = serde_json::to_value(&format).unwrap();

        assert_eq!(
            value,
            json!({
                "id": format.id(),
                "segments": [
                    { "text": "GET" },
                    { "values": { "/a": 2, "/b": 1 } },
                    { "text": "200" }
                ],
                "count": 3,
                "sample": format.sample(),
            })
        );
    }

    #[test]
    fn test_sorted_values_serialize_in_order() {
        let format = build(sorted());
        let json = format.to_json().unwrap();

        let a = json.find("\"/a\"").unwrap();
        let b = json.find("\"/b\"").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_restore_from_record() {
        let format = build(sorted());
        let json = format.to_json().unwrap();

        let restored = Format::from_json(&json, sorted()).unwrap();

        assert_eq!(restored.id(), format.id());
        assert_eq!(restored.count(), 3);
        assert_eq!(restored.sample(), format.sample());
        assert_eq!(restored.segments(), format.segments());
    }

    #[test]
    fn test_insertion_order_survives_restore() {
        let options = FormatOptions {
            highlight: Highlight::Never,
            ..FormatOptions::default()
        };
        let mut format = Format::seed(&chunks(&["k", "v9"]), options.clone());
        for value in ["v9", "v3", "v7", "v1", "v3"] {
            format.merge(&chunks(&["k", value])).unwrap();
        }

        let json = format.to_json().unwrap();
        assert!(json.contains(r#"{"values":{"v9":1,"v3":2,"v7":1,"v1":1}}"#));

        let restored = Format::from_json(&json, options).unwrap();
        assert_eq!(restored.to_json().unwrap(), json);
    }

    #[test]
    fn test_restore_rejects_wrong_wildcard() {
        let json = build(sorted()).to_json().unwrap();
        let options = FormatOptions {
            wildcard: "?".to_string(),
            ..sorted()
        };

        assert!(matches!(
            Format::from_json(&json, options),
            Err(LogshapeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_restore_rejects_inconsistent_counts() {
        let format = build(sorted());
        let json = json!({
            "id": format.id(),
            "segments": [
                { "text": "GET" },
                { "values": { "/a": 1, "/b": 1 } },
                { "text": "200" }
            ],
            "count": 3,
            "sample": "",
        })
        .to_string();

        assert!(Format::from_json(&json, sorted()).is_err());
    }
}
