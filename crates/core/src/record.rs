//! Product records and the in-memory database.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lookup status of a product code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    /// Resolved to a product name.
    Ok,
    /// The service knows the code but has no name for it yet.
    Pending,
    /// The lookup itself failed.
    Exception,
    /// The service does not know the code.
    NotFound,
}

impl Status {
    /// Numeric code used in the compact encoding.
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 1,
            Status::Pending => 2,
            Status::Exception => 3,
            Status::NotFound => 4,
        }
    }

    /// Status word used by the legacy verbose encodings.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Pending => "pending",
            Status::Exception => "except",
            Status::NotFound => "not found",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Status::Ok),
            2 => Ok(Status::Pending),
            3 => Ok(Status::Exception),
            4 => Ok(Status::NotFound),
            other => Err(format!("invalid status code {other}")),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Status::Ok),
            "pending" => Ok(Status::Pending),
            "except" => Ok(Status::Exception),
            "not found" => Ok(Status::NotFound),
            other => Err(format!("invalid legacy status {other:?}")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.legacy_name())
    }
}

/// A single product code entry.
///
/// Field order matches the serialized key order so the encoded output is
/// sorted without a post-processing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Day the code was last queried or confirmed.
    #[serde(rename = "d", with = "timestamp")]
    pub last_checked: DateTime<Utc>,

    /// Failure detail when `status` is [`Status::Exception`].
    #[serde(rename = "e", with = "sentinel")]
    pub exception: Option<String>,

    /// Product name when `status` is [`Status::Ok`].
    #[serde(rename = "n", with = "sentinel")]
    pub name: Option<String>,

    #[serde(rename = "s")]
    pub status: Status,
}

impl Record {
    pub fn ok(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self { last_checked: at, exception: None, name: Some(name.into()), status: Status::Ok }
    }

    pub fn pending(at: DateTime<Utc>) -> Self {
        Self { last_checked: at, exception: None, name: None, status: Status::Pending }
    }

    pub fn not_found(at: DateTime<Utc>) -> Self {
        Self { last_checked: at, exception: None, name: None, status: Status::NotFound }
    }

    pub fn exception(detail: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self { last_checked: at, exception: Some(detail.into()), name: None, status: Status::Exception }
    }

    /// True when both records carry the same observation, ignoring when it was made.
    pub fn same_observation(&self, other: &Record) -> bool {
        self.status == other.status && self.name == other.name && self.exception == other.exception
    }
}

/// Product code → record mapping.
///
/// Backed by a sorted map so iteration and serialization order never depend
/// on insertion history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Database {
    records: BTreeMap<String, Record>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Insert or overwrite the record for `id`.
    pub fn insert(&mut self, id: impl Into<String>, record: Record) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Number of records with the given status.
    pub fn count_status(&self, status: Status) -> usize {
        self.records.values().filter(|r| r.status == status).count()
    }
}

impl FromIterator<(String, Record)> for Database {
    fn from_iter<T: IntoIterator<Item = (String, Record)>>(iter: T) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

/// Optional strings stored as either the string or a literal `0`.
pub(crate) mod sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_u8(0),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(text)) => Ok(Some(text)),
            Some(Raw::Number(_)) | None => Ok(None),
        }
    }
}

/// Unix-seconds timestamps, accepting the float form older writers produced.
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        from_secs(secs).ok_or_else(|| D::Error::custom(format!("timestamp {secs} out of range")))
    }

    pub fn from_secs(secs: f64) -> Option<DateTime<Utc>> {
        if !secs.is_finite() {
            return None;
        }
        DateTime::from_timestamp(secs.trunc() as i64, 0)
    }
}
