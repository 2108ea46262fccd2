use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::JobKey;

/// A generation job launched during this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub job_id: JobKey,
    pub display_name: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRowView {
    pub job_id: JobKey,
    pub display_name: String,
    pub elapsed_minutes: i64,
}

/// In-memory mapping from job id to what was launched and when.
///
/// Entries are never mutated. They leave only through `resolve`,
/// `resolve_oldest_started_by` or TTL eviction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobQueue {
    entries: BTreeMap<JobKey, QueueEntry>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.entries.contains_key(job_id)
    }

    /// Inserts a new entry stamped with `now`. Returns false and leaves the
    /// existing entry untouched if `job_id` is already queued.
    pub fn enqueue(
        &mut self,
        job_id: impl Into<JobKey>,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let job_id = job_id.into();
        if self.entries.contains_key(&job_id) {
            return false;
        }
        self.entries.insert(
            job_id.clone(),
            QueueEntry {
                job_id,
                display_name: display_name.into(),
                start_time: now,
            },
        );
        true
    }

    pub fn resolve(&mut self, job_id: &str) -> Option<QueueEntry> {
        self.entries.remove(job_id)
    }

    /// Removes the oldest entry that started at or before `cutoff`
    /// (or the oldest overall when `cutoff` is `None`).
    pub fn resolve_oldest_started_by(
        &mut self,
        cutoff: Option<DateTime<Utc>>,
    ) -> Option<QueueEntry> {
        let key = self
            .ordered()
            .into_iter()
            .find(|entry| cutoff.is_none_or(|at| entry.start_time <= at))
            .map(|entry| entry.job_id.clone())?;
        self.entries.remove(&key)
    }

    /// Drops every entry older than `ttl` and returns them, oldest first.
    pub fn evict_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> Vec<QueueEntry> {
        let expired: Vec<JobKey> = self
            .entries
            .values()
            .filter(|entry| now.signed_duration_since(entry.start_time) >= ttl)
            .map(|entry| entry.job_id.clone())
            .collect();
        let mut evicted: Vec<QueueEntry> = expired
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect();
        evicted.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.job_id.cmp(&b.job_id)));
        evicted
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<QueueRowView> {
        self.ordered()
            .into_iter()
            .map(|entry| QueueRowView {
                job_id: entry.job_id.clone(),
                display_name: entry.display_name.clone(),
                elapsed_minutes: elapsed_minutes(entry.start_time, now),
            })
            .collect()
    }

    fn ordered(&self) -> Vec<&QueueEntry> {
        let mut entries: Vec<&QueueEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.job_id.cmp(&b.job_id)));
        entries
    }
}

/// Whole minutes between `start` and `now`, floored, never negative.
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = now.signed_duration_since(start).num_seconds();
    seconds.max(0) / 60
}

/// Key for a job the platform launched without returning an id.
///
/// Derived from the clock and suffixed until it misses every queued key.
pub fn placeholder_job_id(queue: &JobQueue, now: DateTime<Utc>) -> JobKey {
    let base = format!("local-{}", now.timestamp_millis());
    if !queue.contains(&base) {
        return base;
    }
    (1u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !queue.contains(candidate))
        .unwrap_or(base)
}
