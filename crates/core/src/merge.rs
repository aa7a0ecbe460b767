//! Reconcile another database file into the primary one.
//!
//! Rules, per code present in the other database:
//!
//! - unknown locally: take the other record
//! - identical: nothing to do
//! - same observation, different date: keep the newer date
//! - local record is not a success and the other one is newer: take it
//! - anything else is a conflict and the local record stays

use std::path::Path;

use crate::{Database, Error, Record, store};

/// A disagreement the merge rules could not settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub id: String,
    /// Record kept in the primary database.
    pub kept: Record,
    /// Record from the other database that was dropped.
    pub skipped: Record,
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Codes that were missing from the primary database.
    pub added: usize,
    /// Codes whose date moved forward with the same observation.
    pub refreshed: usize,
    /// Codes whose non-success record was superseded by a newer one.
    pub replaced: usize,
    pub conflicts: Vec<Conflict>,
}

impl MergeReport {
    /// Total number of records written into the primary database.
    pub fn changed(&self) -> usize {
        self.added + self.refreshed + self.replaced
    }
}

enum Resolution {
    Add,
    Refresh,
    Replace,
    Keep,
    Conflict,
}

fn resolve(old: Option<&Record>, new: &Record) -> Resolution {
    let Some(old) = old else {
        return Resolution::Add;
    };

    if old == new {
        Resolution::Keep
    } else if old.same_observation(new) {
        if new.last_checked > old.last_checked { Resolution::Refresh } else { Resolution::Keep }
    } else if old.status != crate::Status::Ok && new.last_checked > old.last_checked {
        Resolution::Replace
    } else {
        Resolution::Conflict
    }
}

/// Merge `other` into `primary` in memory.
pub fn merge(primary: &mut Database, other: &Database) -> MergeReport {
    let mut report = MergeReport::default();

    for (id, new) in other.iter() {
        match resolve(primary.get(id), new) {
            Resolution::Add => report.added += 1,
            Resolution::Refresh => report.refreshed += 1,
            Resolution::Replace => report.replaced += 1,
            Resolution::Keep => continue,
            Resolution::Conflict => {
                if let Some(old) = primary.get(id) {
                    tracing::warn!(id, kept = ?old, skipped = ?new, "merge conflict, keeping local record");
                    report.conflicts.push(Conflict { id: id.to_string(), kept: old.clone(), skipped: new.clone() });
                }
                continue;
            }
        }
        primary.insert(id, new.clone());
    }

    report
}

/// Merge the database at `other_path` into `primary` and save it to `db_path`.
pub fn merge_file(
    primary: &mut Database,
    db_path: impl AsRef<Path>,
    other_path: impl AsRef<Path>,
) -> Result<MergeReport, Error> {
    let other_path = other_path.as_ref();
    tracing::info!(path = %other_path.display(), "merging");

    if !other_path.exists() {
        return Err(Error::MergeFileMissing(other_path.to_path_buf()));
    }

    let other = store::load(other_path)?;
    let report = merge(primary, &other);
    let written = store::save(primary, db_path)?;

    tracing::info!(
        added = report.added,
        refreshed = report.refreshed,
        replaced = report.replaced,
        conflicts = report.conflicts.len(),
        path = %written.display(),
        "merge complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn db(entries: &[(&str, Record)]) -> Database {
        entries.iter().map(|(id, record)| (id.to_string(), record.clone())).collect()
    }

    #[test]
    fn test_merge_into_self_is_noop() {
        let original = db(&[
            ("000", Record::not_found(at(100))),
            ("01P", Record::ok("MacBook Air", at(200))),
            ("CURL", Record::exception("HTTP Error 403", at(300))),
        ]);
        let mut primary = original.clone();

        let report = merge(&mut primary, &original);

        assert_eq!(report, MergeReport::default());
        assert_eq!(primary, original);
    }

    #[test]
    fn test_missing_codes_are_added() {
        let mut primary = db(&[("000", Record::not_found(at(100)))]);
        let other = db(&[("001", Record::ok("iMac", at(50)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.added, 1);
        assert_eq!(primary.get("001"), Some(&Record::ok("iMac", at(50))));
    }

    #[test]
    fn test_newer_date_refreshes_same_observation() {
        let mut primary = db(&[("000", Record::not_found(at(100)))]);
        let other = db(&[("000", Record::not_found(at(200)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.refreshed, 1);
        assert_eq!(primary.get("000"), Some(&Record::not_found(at(200))));
    }

    #[test]
    fn test_older_date_is_ignored() {
        let mut primary = db(&[("01P", Record::ok("MacBook Air", at(200)))]);
        let other = db(&[("01P", Record::ok("MacBook Air", at(100)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.changed(), 0);
        assert!(report.conflicts.is_empty());
        assert_eq!(primary.get("01P").unwrap().last_checked, at(200));
    }

    #[test]
    fn test_newer_record_replaces_non_success() {
        let mut primary = db(&[("J094", Record::pending(at(100)))]);
        let other = db(&[("J094", Record::ok("iMac Pro", at(200)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.replaced, 1);
        assert_eq!(primary.get("J094"), Some(&Record::ok("iMac Pro", at(200))));
    }

    #[test]
    fn test_success_is_not_overwritten() {
        let kept = Record::ok("MacBook Pro", at(100));
        let mut primary = db(&[("J6FL", kept.clone())]);
        let other = db(&[("J6FL", Record::not_found(at(200)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.changed(), 0);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].id, "J6FL");
        assert_eq!(primary.get("J6FL"), Some(&kept));
    }

    #[test]
    fn test_older_different_record_is_conflict() {
        let mut primary = db(&[("000", Record::not_found(at(200)))]);
        let other = db(&[("000", Record::exception("timed out", at(100)))]);

        let report = merge(&mut primary, &other);

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(primary.get("000"), Some(&Record::not_found(at(200))));
    }

    #[test]
    fn test_merge_file_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("Other.zjson");

        let err = merge_file(&mut Database::new(), dir.path().join("Products.zjson"), &missing).unwrap_err();
        assert!(matches!(err, Error::MergeFileMissing(path) if path == missing));
    }

    #[test]
    fn test_merge_file_saves_primary() {
        let dir = TempDir::new().unwrap();
        let primary_path = dir.path().join("Products.zjson");
        let other_path = dir.path().join("Other.zjson");
        store::save(&db(&[("001", Record::ok("iMac", at(50)))]), &other_path).unwrap();

        let mut primary = db(&[("000", Record::not_found(at(100)))]);
        let report = merge_file(&mut primary, &primary_path, &other_path).unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(store::load(&primary_path).unwrap(), primary);
    }
}
