//! Progress tracking
//!
//! A counter attached to one pagination walk. It only logs; it never
//! changes what the walk yields.

use std::time::{Duration, Instant};

/// Default number of records between "so far" lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Running count for one (context, type) walk
#[derive(Debug)]
pub struct ProgressLog {
    label: String,
    interval: u64,
    count: u64,
    start: Instant,
}

impl ProgressLog {
    /// Start counting; an interval of 0 disables the periodic lines
    pub fn new(label: impl Into<String>, interval: u64) -> Self {
        Self {
            label: label.into(),
            interval,
            count: 0,
            start: Instant::now(),
        }
    }

    /// Count one record, logging every `interval` records
    pub fn tick(&mut self) {
        self.count += 1;
        if self.interval > 0 && self.count % self.interval == 0 {
            tracing::info!("Retrieved {} {} names so far...", self.count, self.label);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log the final count and elapsed time
    pub fn finish(&self) -> u64 {
        tracing::info!(
            "Retrieved {} {} names in {:.2}s",
            self.count,
            self.label,
            self.elapsed().as_secs_f64()
        );
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_lines(interval: u64, ticks: usize) -> Vec<String> {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut progress = ProgressLog::new("lambda", interval);
            for _ in 0..ticks {
                progress.tick();
            }
            progress.finish();
        });

        let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        out.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_logs_every_interval_then_final_count() {
        let lines = logged_lines(2, 5);

        let so_far: Vec<&String> = lines.iter().filter(|l| l.contains("so far")).collect();
        assert_eq!(so_far.len(), 2);
        assert!(so_far[0].contains("Retrieved 2 lambda names so far..."));
        assert!(so_far[1].contains("Retrieved 4 lambda names so far..."));

        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("Retrieved 5 lambda names in "));
    }

    #[test]
    fn test_zero_interval_logs_only_final_count() {
        let lines = logged_lines(0, 3);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Retrieved 3 lambda names in "));
    }

    #[test]
    fn test_counts_ticks() {
        let mut progress = ProgressLog::new("lambda", 2);
        for _ in 0..5 {
            progress.tick();
        }
        assert_eq!(progress.count(), 5);
        assert_eq!(progress.finish(), 5);
    }

    #[test]
    fn test_zero_interval_does_not_panic() {
        let mut progress = ProgressLog::new("sqs", 0);
        progress.tick();
        assert_eq!(progress.count(), 1);
    }
}
