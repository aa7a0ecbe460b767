//! On-disk encodings and migration of legacy entries.
//!
//! Three encodings exist, selected by file extension:
//!
//! - `.zjson`: zlib-compressed compact JSON (current)
//! - `.json`: uncompressed JSON, usually with verbose field names
//! - `.yaml` / `.yml`: verbose entries with calendar dates
//!
//! Every entry is parsed as either a compact or a verbose record and
//! normalized to [`Record`], whichever file it came from.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Deserialize;
use serde_json::ser::Formatter;

use crate::record::{Database, Record, Status, sentinel, timestamp};

/// Canonical extension for saved databases.
pub const CANONICAL_EXTENSION: &str = "zjson";

const LEGACY_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// zlib level used for saved databases.
pub const COMPRESSION_LEVEL: u32 = 9;

/// Encoding of a database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// zlib-compressed JSON.
    Compressed,
    /// Plain JSON.
    Json,
    /// YAML with calendar dates.
    Yaml,
}

impl SourceFormat {
    /// Pick the encoding from the file extension.
    ///
    /// Unknown extensions are treated as compressed, matching what [`save`](super::save)
    /// writes to such paths.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SourceFormat::Json,
            Some("yaml" | "yml") => SourceFormat::Yaml,
            _ => SourceFormat::Compressed,
        }
    }

    /// Decode a whole file into a database.
    pub fn parse(self, bytes: &[u8]) -> Result<Database, String> {
        let entries: BTreeMap<String, StoredRecord> = match self {
            SourceFormat::Compressed => {
                let mut json = Vec::new();
                ZlibDecoder::new(bytes).read_to_end(&mut json).map_err(|e| format!("decompression failed: {e}"))?;
                serde_json::from_slice(&json).map_err(|e| e.to_string())?
            }
            SourceFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string())?,
            SourceFormat::Yaml => {
                // An empty YAML document is null rather than an empty mapping.
                let entries: Option<BTreeMap<String, StoredRecord>> =
                    serde_yaml::from_slice(bytes).map_err(|e| e.to_string())?;
                entries.unwrap_or_default()
            }
        };

        entries
            .into_iter()
            .map(|(id, stored)| {
                let record = stored.into_record().map_err(|reason| format!("entry {id}: {reason}"))?;
                Ok((id, record))
            })
            .collect()
    }
}

/// Replace a legacy extension with the canonical one.
pub fn canonical_path(path: &Path) -> std::path::PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if LEGACY_EXTENSIONS.contains(&ext) => path.with_extension(CANONICAL_EXTENSION),
        _ => path.to_path_buf(),
    }
}

/// Serialize a database into the canonical compressed encoding.
///
/// Keys are sorted and each field sits on its own line, so the decompressed
/// form diffs cleanly between runs.
pub fn to_bytes(db: &Database) -> Result<Vec<u8>, String> {
    let mut json = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut json, LineFormatter::default());
    serde::Serialize::serialize(db, &mut serializer).map_err(|e| e.to_string())?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder.write_all(&json).map_err(|e| format!("compression failed: {e}"))?;
    encoder.finish().map_err(|e| format!("compression failed: {e}"))
}

/// One object member per line, no indentation, no space after `:`, and
/// non-ASCII characters escaped as `\uXXXX`.
///
/// This is byte-for-byte the layout older versions of the tool wrote.
#[derive(Debug, Default)]
struct LineFormatter {
    has_value: bool,
}

impl Formatter for LineFormatter {
    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.has_value {
            writer.write_all(b"\n")?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        writer.write_all(if first { b"\n".as_slice() } else { b",\n".as_slice() })
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// An entry as found on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Compact(Record),
    Verbose(VerboseRecord),
}

/// Entry shape written by older versions of the tool.
#[derive(Debug, Deserialize)]
struct VerboseRecord {
    #[serde(deserialize_with = "sentinel::deserialize")]
    name: Option<String>,

    #[serde(rename = "except", deserialize_with = "sentinel::deserialize")]
    exception: Option<String>,

    status: String,

    date: LegacyDate,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyDate {
    Seconds(f64),
    Day(NaiveDate),
}

impl LegacyDate {
    fn to_utc(&self) -> Result<DateTime<Utc>, String> {
        match self {
            LegacyDate::Seconds(secs) => timestamp::from_secs(*secs).ok_or_else(|| format!("invalid date {secs}")),
            LegacyDate::Day(day) => local_midnight(*day).ok_or_else(|| format!("invalid date {day}")),
        }
    }
}

/// Start of `day` in the local time zone.
pub(crate) fn local_midnight(day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Local.from_local_datetime(&midnight).earliest().map(|t| t.with_timezone(&Utc))
}

impl StoredRecord {
    fn into_record(self) -> Result<Record, String> {
        match self {
            StoredRecord::Compact(record) => Ok(record),
            StoredRecord::Verbose(verbose) => Ok(Record {
                last_checked: verbose.date.to_utc()?,
                exception: verbose.exception,
                name: verbose.name,
                status: verbose.status.parse::<Status>()?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(SourceFormat::detect(Path::new("Products.zjson")), SourceFormat::Compressed);
        assert_eq!(SourceFormat::detect(Path::new("Products.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::detect(Path::new("Products.yaml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::detect(Path::new("Products.yml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::detect(Path::new("Products")), SourceFormat::Compressed);
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(canonical_path(Path::new("db/Products.json")), Path::new("db/Products.zjson"));
        assert_eq!(canonical_path(Path::new("Products.yaml")), Path::new("Products.zjson"));
        assert_eq!(canonical_path(Path::new("Products.zjson")), Path::new("Products.zjson"));
        assert_eq!(canonical_path(Path::new("Products.db")), Path::new("Products.db"));
    }

    #[test]
    fn test_verbose_json_is_normalized() {
        let json = br#"{
            "01P": {"name": "MacBook Air", "except": null, "status": "ok", "date": 1588291200.0},
            "J094": {"name": null, "except": null, "status": "pending", "date": 1588291200},
            "CURL": {"name": null, "except": "HTTP Error 403: Forbidden", "status": "except", "date": 1588291200}
        }"#;

        let db = SourceFormat::Json.parse(json).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.get("01P"), Some(&Record::ok("MacBook Air", at(1_588_291_200))));
        assert_eq!(db.get("J094"), Some(&Record::pending(at(1_588_291_200))));
        assert_eq!(db.get("CURL"), Some(&Record::exception("HTTP Error 403: Forbidden", at(1_588_291_200))));
    }

    #[test]
    fn test_compact_json_is_accepted() {
        let json = br#"{"000": {"n": 0, "e": 0, "s": 4, "d": 1588291200.0}}"#;
        let db = SourceFormat::Json.parse(json).unwrap();
        assert_eq!(db.get("000"), Some(&Record::not_found(at(1_588_291_200))));
    }

    #[test]
    fn test_yaml_with_calendar_dates() {
        let yaml = b"J6FL:\n  name: \"MacBook Pro (15-inch, 2019)\"\n  except: null\n  status: ok\n  date: 2020-05-01\n\"000\":\n  name: null\n  except: null\n  status: not found\n  date: 2020-05-02\n";

        let db = SourceFormat::Yaml.parse(yaml).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();

        let record = db.get("J6FL").unwrap();
        assert_eq!(record.status, Status::Ok);
        assert_eq!(record.name.as_deref(), Some("MacBook Pro (15-inch, 2019)"));
        assert_eq!(record.last_checked, local_midnight(day).unwrap());
        assert_eq!(db.get("000").unwrap().status, Status::NotFound);
    }

    #[test]
    fn test_empty_yaml_is_empty_database() {
        assert!(SourceFormat::Yaml.parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_legacy_status() {
        let json = br#"{"000": {"name": null, "except": null, "status": "gone", "date": 0}}"#;
        let err = SourceFormat::Json.parse(json).unwrap_err();
        assert!(err.contains("000"));
        assert!(err.contains("gone"));
    }

    #[test]
    fn test_unrecognized_entry_shape() {
        assert!(SourceFormat::Json.parse(br#"{"000": {"title": "x"}}"#).is_err());
        assert!(SourceFormat::Json.parse(b"[1, 2, 3]").is_err());
    }

    #[test]
    fn test_compressed_rejects_plain_json() {
        assert!(SourceFormat::Compressed.parse(b"{}").is_err());
    }

    fn inflate(bytes: &[u8]) -> String {
        let mut json = String::new();
        ZlibDecoder::new(bytes).read_to_string(&mut json).unwrap();
        json
    }

    fn deflate(json: &str) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
        encoder.write_all(json.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_to_bytes_layout() {
        let mut db = Database::new();
        db.insert("000", Record::ok("iMac", at(86_400)));
        db.insert("001", Record::pending(at(86_400)));

        let json = inflate(&to_bytes(&db).unwrap());
        assert_eq!(
            json,
            "{\n\"000\":{\n\"d\":86400,\n\"e\":0,\n\"n\":\"iMac\",\n\"s\":1\n},\n\"001\":{\n\"d\":86400,\n\"e\":0,\n\"n\":0,\n\"s\":2\n}\n}"
        );
    }

    #[test]
    fn test_to_bytes_empty_database() {
        assert_eq!(inflate(&to_bytes(&Database::new()).unwrap()), "{}");
    }

    #[test]
    fn test_to_bytes_escapes_non_ascii() {
        let mut db = Database::new();
        db.insert("J6FL", Record::ok("Pro – 27\u{2033} \u{1F34E}", at(0)));

        let json = inflate(&to_bytes(&db).unwrap());
        assert!(json.is_ascii());
        assert!(json.contains(r#""n":"Pro \u2013 27\u2033 \ud83c\udf4e""#));
        assert_eq!(SourceFormat::Compressed.parse(&to_bytes(&db).unwrap()).unwrap(), db);
    }

    #[test]
    fn test_reads_zlib_database_from_older_versions() {
        let json = "{\n\"01P\":{\n\"d\":1588291200.0,\n\"e\":0,\n\"n\":\"MacBook Air \\u2013 13\\u2033\",\n\"s\":1\n},\n\
                    \"CURL\":{\n\"d\":1588291200.0,\n\"e\":\"HTTP Error 403: Forbidden\",\n\"n\":0,\n\"s\":3\n}\n}";

        let db = SourceFormat::Compressed.parse(&deflate(json)).unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.get("01P"), Some(&Record::ok("MacBook Air – 13\u{2033}", at(1_588_291_200))));
        assert_eq!(db.get("CURL"), Some(&Record::exception("HTTP Error 403: Forbidden", at(1_588_291_200))));
    }

    #[test]
    fn test_written_bytes_match_older_versions() {
        let json = "{\n\"000\":{\n\"d\":86400,\n\"e\":0,\n\"n\":0,\n\"s\":4\n}\n}";
        let db = SourceFormat::Compressed.parse(&deflate(json)).unwrap();
        assert_eq!(to_bytes(&db).unwrap(), deflate(json));
    }
}
