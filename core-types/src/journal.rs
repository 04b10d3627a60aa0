// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Typed views over decoded journal documents.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::document::{DecodeError, Value};

pub const COMPLETED_MANIFEST_SUFFIX: &str = ".completed.manifest";

/// Timestamp layout used by JSON-formatted exports.
const BLOCK_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// One journal block. The sequence number is validated when the block is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    value: Value,
    sequence_no: u64,
}

impl Block {
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        if value.as_map().is_none() {
            return Err(DecodeError::WrongType {
                context: "block",
                field: "<root>",
                actual: value.type_name(),
            });
        }
        let address = value.get("blockAddress").ok_or(DecodeError::MissingField {
            context: "block",
            field: "blockAddress",
        })?;
        let seq = address.get("sequenceNo").ok_or(DecodeError::MissingField {
            context: "blockAddress",
            field: "sequenceNo",
        })?;
        let sequence_no = seq.as_u64().ok_or(DecodeError::WrongType {
            context: "blockAddress",
            field: "sequenceNo",
            actual: seq.type_name(),
        })?;
        Ok(Self { value, sequence_no })
    }

    pub fn sequence_no(&self) -> u64 {
        self.sequence_no
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp_value(&self) -> Option<&Value> {
        self.value.get("blockTimestamp")
    }

    /// Parsed block timestamp, accepting native timestamps or the string form.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, DecodeError> {
        let raw = self.timestamp_value().ok_or(DecodeError::MissingField {
            context: "block",
            field: "blockTimestamp",
        })?;
        parse_block_timestamp(raw)
    }

    pub fn has_transaction_info(&self) -> bool {
        self.value.contains_key("transactionInfo")
    }

    /// `transactionInfo.documents`: document id to `{tableName, tableId, ...}`.
    pub fn transaction_documents(&self) -> Option<&BTreeMap<String, Value>> {
        self.value
            .get_path(&["transactionInfo", "documents"])
            .and_then(Value::as_map)
    }

    pub fn has_revisions(&self) -> bool {
        self.revision_values().is_some()
    }

    fn revision_values(&self) -> Option<&[Value]> {
        self.value.get("revisions").and_then(Value::as_list)
    }

    pub fn revisions(&self) -> impl Iterator<Item = Revision<'_>> {
        self.revision_values()
            .unwrap_or_default()
            .iter()
            .map(Revision::new)
    }
}

/// Borrowed view of one revision inside a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Revision<'a> {
    value: &'a Value,
}

impl<'a> Revision<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn metadata(&self) -> Option<&'a Value> {
        self.value.get("metadata")
    }

    pub fn document_id(&self) -> Option<&'a str> {
        self.metadata()
            .and_then(|meta| meta.get("id"))
            .and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<i64> {
        self.metadata()
            .and_then(|meta| meta.get("version"))
            .and_then(Value::as_i64)
    }

    pub fn has_data(&self) -> bool {
        self.value.contains_key("data")
    }

    pub fn has_data_hash(&self) -> bool {
        self.value.contains_key("dataHash")
    }

    pub fn has_block_address(&self) -> bool {
        self.value.contains_key("blockAddress")
    }

    /// Placeholder entries (redacted or foreign) carry no metadata.
    pub fn is_redacted(&self) -> bool {
        self.metadata().is_none()
    }
}

pub fn parse_block_timestamp(raw: &Value) -> Result<DateTime<Utc>, DecodeError> {
    match raw {
        Value::Timestamp(ts) => Ok(*ts),
        Value::String(s) => NaiveDateTime::parse_from_str(s, BLOCK_TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
            .map_err(|err| {
                DecodeError::Malformed(format!("unable to parse block timestamp {s:?}: {err}"))
            }),
        other => Err(DecodeError::WrongType {
            context: "block",
            field: "blockTimestamp",
            actual: other.type_name(),
        }),
    }
}

/// Inclusive block-sequence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockRange {
    pub first: u64,
    pub last: u64,
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// Storage key of one export data file: `<prefix>.<first>-<last>.<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataFileKey(String);

impl DataFileKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Range encoded in the key name, `None` when the name does not conform.
    pub fn block_range(&self) -> Option<BlockRange> {
        let mut parts = self.0.rsplitn(3, '.');
        let suffix = parts.next()?;
        let range = parts.next()?;
        parts.next()?;
        if !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        let (first, last) = range.split_once('-')?;
        let first = parse_digits(first)?;
        let last = parse_digits(last)?;
        (first <= last).then_some(BlockRange { first, last })
    }
}

impl fmt::Display for DataFileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// File name of a completed manifest: `<stream-id>.<strand-id>.completed.manifest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestName {
    pub stream_id: String,
    pub strand_id: String,
}

impl ManifestName {
    pub fn parse(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let stem = name.strip_suffix(COMPLETED_MANIFEST_SUFFIX)?;
        let (stream_id, strand_id) = stem.split_once('.')?;
        if !is_word(stream_id) || !is_word(strand_id) {
            return None;
        }
        Some(Self {
            stream_id: stream_id.to_string(),
            strand_id: strand_id.to_string(),
        })
    }

    /// Storage key of the completed manifest under an export prefix.
    pub fn key(prefix: &str, export_id: &str, strand_id: &str) -> String {
        format!("{prefix}{export_id}.{strand_id}{COMPLETED_MANIFEST_SUFFIX}")
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
