// Copyright (c) James Kassemi, SC, US. All rights reserved.
use rand::Rng;
use std::{future::Future, time::Duration};
use tokio::time::sleep;

/// Jittered exponential backoff applied by object-store clients around single requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: usize,
        base_delay_ms: u64,
        max_delay_ms: u64,
        jitter_pct: f64,
    ) -> Self {
        let base_delay_ms = base_delay_ms.max(1);
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            jitter_pct: jitter_pct.clamp(0.0, 1.0),
        }
    }

    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self::new(1, 1, 1, 0.0)
    }

    /// Delay before retry number `retry` (zero based), capped then jittered.
    fn backoff(&self, retry: usize) -> Duration {
        let factor = 2_u64.saturating_pow(retry.min(u32::MAX as usize) as u32);
        let capped = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        if self.jitter_pct == 0.0 {
            return Duration::from_millis(capped);
        }
        let spread = (capped as f64 * self.jitter_pct) as i64;
        let delta = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_millis(capped.saturating_add_signed(delta))
    }

    pub async fn retry_async<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_async_when(op, |_| true).await
    }

    /// Runs `op` until it succeeds, attempts run out, or `should_retry` rejects the error.
    pub async fn retry_async_when<F, Fut, T, E, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            let err = match op(attempt).await {
                Ok(val) => return Ok(val),
                Err(err) => err,
            };
            attempt += 1;
            if attempt >= self.max_attempts || !should_retry(&err) {
                if attempt > 1 {
                    log::warn!("request failed after {attempt} attempts");
                }
                return Err(err);
            }
            sleep(self.backoff(attempt - 1)).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 250, 5_000, 0.25)
    }
}
