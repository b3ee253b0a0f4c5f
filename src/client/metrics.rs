use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::common::messages::VerificationResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission_id: Uuid,
    pub started_at_ms: u64, // milliseconds since epoch
    pub latency_ms: u64,
    /// `None` when the submission failed
    pub verified: Option<bool>,
    pub confidence: Option<f64>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_submissions: usize,
    pub verified: usize,
    pub not_verified: usize,
    pub failed: usize,
    pub failure_rate: f64,

    // Latency statistics over all submissions (milliseconds)
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub latency_avg_ms: f64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,

    pub failure_reasons: HashMap<String, usize>,
}

#[derive(Debug)]
pub struct SubmissionMetrics {
    client_name: String,
    start_time: Instant,
    records: Vec<SubmissionRecord>,
}

impl SubmissionMetrics {
    pub fn new(client_name: String) -> Self {
        Self {
            client_name,
            start_time: Instant::now(),
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    pub fn record_submission(
        &mut self,
        submission_id: Uuid,
        started_at_ms: u64,
        latency: Duration,
        result: &VerificationResult,
    ) {
        let (verified, confidence, failure_reason) = match result {
            VerificationResult::Success(outcome) => {
                (Some(outcome.verified), Some(outcome.confidence), None)
            }
            VerificationResult::Failure { message } => (None, None, Some(message.clone())),
        };

        self.records.push(SubmissionRecord {
            submission_id,
            started_at_ms,
            latency_ms: latency.as_millis() as u64,
            verified,
            confidence,
            failure_reason,
        });
    }

    pub fn aggregate(&self) -> AggregatedStats {
        let mut stats = AggregatedStats::default();

        if self.records.is_empty() {
            return stats;
        }

        stats.total_submissions = self.records.len();
        stats.verified = self.records.iter().filter(|r| r.verified == Some(true)).count();
        stats.not_verified = self.records.iter().filter(|r| r.verified == Some(false)).count();
        stats.failed = self.records.iter().filter(|r| r.verified.is_none()).count();
        stats.failure_rate = (stats.failed as f64 / stats.total_submissions as f64) * 100.0;

        let mut latencies: Vec<u64> = self.records.iter().map(|r| r.latency_ms).collect();
        latencies.sort_unstable();

        stats.latency_min_ms = latencies[0];
        stats.latency_max_ms = latencies[latencies.len() - 1];
        stats.latency_avg_ms = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
        stats.latency_p50_ms = percentile(&latencies, 50.0);
        stats.latency_p95_ms = percentile(&latencies, 95.0);

        for record in &self.records {
            if let Some(reason) = &record.failure_reason {
                *stats.failure_reasons.entry(reason.clone()).or_insert(0) += 1;
            }
        }

        stats
    }

    pub fn export_to_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let output = serde_json::json!({
            "client_name": self.client_name,
            "session_duration_secs": self.start_time.elapsed().as_secs(),
            "aggregated_stats": self.aggregate(),
            "submissions": self.records,
        });

        let json_string = serde_json::to_string_pretty(&output)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;

        Ok(())
    }
}

/// Nearest-rank percentile: the smallest value with at least `percentile`%
/// of the data at or below it.
fn percentile(sorted_data: &[u64], percentile: f64) -> u64 {
    if sorted_data.is_empty() {
        return 0;
    }

    let rank = (percentile / 100.0 * sorted_data.len() as f64).ceil() as usize;
    sorted_data[rank.saturating_sub(1).min(sorted_data.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::VerificationOutcome;

    fn success(verified: bool, confidence: f64) -> VerificationResult {
        VerificationResult::Success(VerificationOutcome {
            verified,
            confidence,
            message: String::new(),
            extracted_faces: None,
            id_box: None,
            live_box: None,
            quality: None,
        })
    }

    #[test]
    fn test_percentile() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        assert_eq!(percentile(&data, 50.0), 5);
        assert_eq!(percentile(&data, 95.0), 10);
        assert_eq!(percentile(&data, 0.0), 1);
        assert_eq!(percentile(&data, 100.0), 10);
        assert_eq!(percentile(&[], 50.0), 0);
    }

    #[test]
    fn test_percentile_small_samples() {
        assert_eq!(percentile(&[7], 95.0), 7);
        assert_eq!(percentile(&[100, 200], 50.0), 100);
        assert_eq!(percentile(&[100, 200], 95.0), 200);
        assert_eq!(percentile(&[100, 200, 300], 50.0), 200);
    }

    #[test]
    fn test_metrics_aggregation() {
        let mut metrics = SubmissionMetrics::new("Kiosk".to_string());

        metrics.record_submission(Uuid::new_v4(), 0, Duration::from_millis(100), &success(true, 0.9));
        metrics.record_submission(Uuid::new_v4(), 0, Duration::from_millis(300), &success(false, 0.2));
        metrics.record_submission(
            Uuid::new_v4(),
            0,
            Duration::from_millis(200),
            &VerificationResult::Failure {
                message: "model unavailable".to_string(),
            },
        );

        let stats = metrics.aggregate();

        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.not_verified, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.latency_min_ms, 100);
        assert_eq!(stats.latency_max_ms, 300);
        assert_eq!(stats.latency_p50_ms, 200);
        assert_eq!(stats.failure_reasons.get("model unavailable"), Some(&1));
    }

    #[test]
    fn test_export_to_json() {
        let mut metrics = SubmissionMetrics::new("Kiosk".to_string());
        metrics.record_submission(Uuid::new_v4(), 42, Duration::from_millis(150), &success(true, 0.8));

        let file = tempfile::NamedTempFile::new().unwrap();
        metrics.export_to_json(file.path()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(written["client_name"], "Kiosk");
        assert_eq!(written["aggregated_stats"]["total_submissions"], 1);
        assert_eq!(written["submissions"][0]["started_at_ms"], 42);
    }
}
