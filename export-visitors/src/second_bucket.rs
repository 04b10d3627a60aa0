// Copyright (c) James Kassemi, SC, US. All rights reserved.
use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Number of blocks committed within one whole second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondBucket {
    pub second: DateTime<Utc>,
    pub count: u64,
}

impl SecondBucket {
    fn open(second: DateTime<Utc>) -> Self {
        Self { second, count: 1 }
    }
}

/// Truncates to the start of the containing second.
pub fn align_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::seconds(1)).unwrap_or(ts)
}

/// Keeps a single open bucket; block timestamps only move forward, so a closed bucket is
/// never revisited.
#[derive(Debug, Default)]
pub struct SecondBucketTracker {
    active: Option<SecondBucket>,
}

impl SecondBucketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&SecondBucket> {
        self.active.as_ref()
    }

    /// Counts `ts` into its second, flushing the open bucket first when the second changes.
    pub fn observe<E, Flush>(&mut self, ts: DateTime<Utc>, mut flush: Flush) -> Result<(), E>
    where
        Flush: FnMut(SecondBucket) -> Result<(), E>,
    {
        let second = align_to_second(ts);
        if let Some(bucket) = self.active.as_mut() {
            if bucket.second == second {
                bucket.count += 1;
                return Ok(());
            }
        }
        if let Some(done) = self.active.replace(SecondBucket::open(second)) {
            flush(done)?;
        }
        Ok(())
    }

    pub fn finish<E, Flush>(&mut self, mut flush: Flush) -> Result<(), E>
    where
        Flush: FnMut(SecondBucket) -> Result<(), E>,
    {
        if let Some(done) = self.active.take() {
            flush(done)?;
        }
        Ok(())
    }
}
