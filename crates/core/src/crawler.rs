//! Sequential crawl over a range of product codes.
//!
//! Each code is visited in ordinal order. Successful lookups are saved
//! immediately; negative, pending and failed lookups are batched and saved
//! every `savenum` outcomes, plus once at the end of the range.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::codec;
use crate::policy::{Decision, Policy, SkipReason};
use crate::resolver::{Lookup, LookupFailure, Resolver};
use crate::store::format::local_midnight;
use crate::{Database, Error, Record, store};

/// Source of the timestamp stamped on new records.
pub trait Clock: Send + Sync {
    fn today(&self) -> DateTime<Utc>;
}

/// Local midnight of the current day.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> DateTime<Utc> {
        let today = Local::now().date_naive();
        local_midnight(today).unwrap_or_else(Utc::now)
    }
}

/// Inclusive range of product codes, validated up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    start: u32,
    end: u32,
}

impl IdRange {
    /// Validate and decode both ends of the range.
    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        let start_num = codec::decode(start).map_err(|e| Error::invalid_id(start, e))?;
        let end_num = codec::decode(end).map_err(|e| Error::invalid_id(end, e))?;
        Ok(Self { start: start_num, end: end_num })
    }

    /// Number of codes in the range.
    pub fn len(&self) -> u32 {
        if self.end < self.start { 0 } else { self.end - self.start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Codes in ordinal order.
    pub fn ids(&self) -> impl Iterator<Item = String> {
        (self.start..=self.end).filter_map(|n| codec::encode(n).ok())
    }
}

/// Result of visiting one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Nothing was queried or written.
    Skipped(SkipReason),
    /// A product name was stored and saved.
    New,
    /// A pending or not-found answer was stored.
    Dummy,
    /// The lookup failed and the failure was stored.
    Exception,
}

/// Tunables for a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub policy: Policy,
    /// Non-successful outcomes between checkpoint saves.
    pub savenum: u32,
    /// Pause after a failed lookup.
    pub exception_pause: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self { policy: Policy::default(), savenum: 2048, exception_pause: Duration::from_secs(1) }
    }
}

/// Counters for a finished crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub visited: u32,
    pub new: u32,
    pub dummy: u32,
    pub exception: u32,
    pub skipped: u32,
    /// Saves triggered by the checkpoint counter.
    pub checkpoints: u32,
}

impl CrawlStats {
    fn record(&mut self, visit: Visit) {
        self.visited += 1;
        match visit {
            Visit::Skipped(_) => self.skipped += 1,
            Visit::New => self.new += 1,
            Visit::Dummy => self.dummy += 1,
            Visit::Exception => self.exception += 1,
        }
    }
}

/// Owns the database for the duration of a crawl.
pub struct Crawler<R> {
    db: Database,
    path: PathBuf,
    resolver: R,
    settings: CrawlSettings,
    clock: Box<dyn Clock>,
}

impl<R: Resolver> Crawler<R> {
    pub fn new(db: Database, path: impl Into<PathBuf>, resolver: R, settings: CrawlSettings) -> Self {
        Self { db, path: path.into(), resolver, settings, clock: Box::new(LocalClock) }
    }

    /// Replace the clock used to stamp records.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the database as it stands.
    ///
    /// Safe to call between any two visits, including after a crawl future
    /// was dropped mid-lookup.
    pub fn flush(&self) -> Result<PathBuf, Error> {
        store::save(&self.db, &self.path)
    }

    /// Visit one code: skip it, or query it and store the answer.
    ///
    /// Only a failed save of a new product name is an error; lookup failures
    /// are recorded in the database.
    pub async fn update(&mut self, id: &str) -> Result<Visit, Error> {
        let now = self.clock.today();

        if let Decision::Skip(reason) = self.settings.policy.decide(self.db.get(id), now) {
            if let Some(prev) = self.db.get(id) {
                match reason {
                    SkipReason::Cached => tracing::info!(id, name = prev.name.as_deref(), "cached, skip"),
                    _ => tracing::info!(id, status = %prev.status, checked = %prev.last_checked.date_naive(), "skip"),
                }
            }
            return Ok(Visit::Skipped(reason));
        }

        match self.resolver.resolve(id).await {
            Ok(Lookup::Found(name)) => {
                tracing::info!(id, name = %name, "found");
                self.db.insert(id, Record::ok(name, now));
                self.flush()?;
                Ok(Visit::New)
            }
            Ok(Lookup::Pending) => {
                tracing::info!(id, "pending");
                self.db.insert(id, Record::pending(now));
                Ok(Visit::Dummy)
            }
            Ok(Lookup::NotFound) => {
                tracing::info!(id, "not found");
                self.db.insert(id, Record::not_found(now));
                Ok(Visit::Dummy)
            }
            Err(LookupFailure(detail)) => {
                tracing::warn!(id, error = %detail, "lookup failed");
                self.db.insert(id, Record::exception(detail, now));
                if !self.settings.exception_pause.is_zero() {
                    tokio::time::sleep(self.settings.exception_pause).await;
                }
                Ok(Visit::Exception)
            }
        }
    }

    /// Visit every code in `range`, checkpointing as configured, and save at the end.
    pub async fn run(&mut self, range: &IdRange) -> Result<CrawlStats, Error> {
        let savenum = self.settings.savenum.max(1);
        let mut countdown = savenum;
        let mut stats = CrawlStats::default();

        tracing::info!(count = range.len(), path = %self.path.display(), "starting crawl");

        for id in range.ids() {
            let visit = self.update(&id).await?;
            stats.record(visit);

            match visit {
                Visit::New => countdown = savenum,
                Visit::Dummy | Visit::Exception => {
                    countdown -= 1;
                    if countdown == 0 {
                        self.flush()?;
                        stats.checkpoints += 1;
                        countdown = savenum;
                    }
                }
                Visit::Skipped(_) => {}
            }
        }

        let written = self.flush()?;
        tracing::info!(
            visited = stats.visited,
            new = stats.new,
            dummy = stats.dummy,
            exception = stats.exception,
            skipped = stats.skipped,
            path = %written.display(),
            "crawl complete"
        );

        Ok(stats)
    }
}
