use std::time::Duration;

/// Progress counters sampled from the engine's atomics at one instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressSample {
    pub total: u64,
    pub processed: u64,
    pub success: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub global_used: usize,
    pub global_total: usize,
    pub target_used: usize,
    pub target_total: usize,
}

/// Picks the progress-task tick interval from the total item count, per
/// the start algorithm's cadence table.
pub fn tick_interval(total_items: u64) -> Duration {
    if total_items < 100 {
        Duration::from_secs(2)
    } else if total_items < 1000 {
        Duration::from_secs(1)
    } else {
        Duration::from_millis(500)
    }
}

impl ProgressSample {
    pub fn rate_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.processed as f64 / secs
        }
    }

    pub fn eta(&self) -> Option<Duration> {
        let rate = self.rate_per_sec();
        if rate <= 0.0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.processed) as f64;
        Some(Duration::from_secs_f64(remaining / rate))
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total as f64) * 100.0
        }
    }

    /// Renders the single progress line described by the progress
    /// reporter: `processed/total (percent)`, success/failed counts, rate,
    /// ETA (blank if the rate is zero), and concurrency usage.
    pub fn render(&self) -> String {
        let eta = self
            .eta()
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_default();
        format!(
            "{}/{} ({:.1}%) success={} failed={} rate={:.1}/s eta={} slots={}/{} target_slots={}/{}",
            self.processed,
            self.total,
            self.percent(),
            self.success,
            self.failed,
            self.rate_per_sec(),
            eta,
            self.global_used,
            self.global_total,
            self.target_used,
            self.target_total,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_thresholds() {
        assert_eq!(tick_interval(10), Duration::from_secs(2));
        assert_eq!(tick_interval(500), Duration::from_secs(1));
        assert_eq!(tick_interval(5000), Duration::from_millis(500));
    }

    #[test]
    fn eta_blank_when_rate_zero() {
        let sample = ProgressSample {
            total: 10,
            processed: 0,
            elapsed: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(sample.eta().is_none());
        assert!(sample.render().ends_with("eta= slots=0/0 target_slots=0/0"));
    }
}
