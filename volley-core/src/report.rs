//! Run report: throughput, latency and error breakdown

use crate::aggregator::AggregatorSnapshot;
use crate::error::{ErrorKind, HarnessError, HarnessResult};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const NO_DATA: &str = "no data";

/// Min, max and mean over the recorded latency samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    #[serde(rename = "min_ms", serialize_with = "serialize_millis")]
    pub min: Duration,
    #[serde(rename = "max_ms", serialize_with = "serialize_millis")]
    pub max: Duration,
    #[serde(rename = "avg_ms", serialize_with = "serialize_millis")]
    pub avg: Duration,
    pub count: usize,
}

impl LatencyStats {
    /// `None` when there are no samples
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = samples.iter().min().copied()?;
        let max = samples.iter().max().copied()?;
        let total: Duration = samples.iter().sum();
        let count = samples.len();
        let avg = total.div_f64(count as f64);

        Some(Self {
            min,
            max,
            avg,
            count,
        })
    }
}

/// Callback matching results for the latency-tracking variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseStats {
    /// Responses paired with an outstanding request
    pub matched: u64,
    /// Requests still waiting for a response when the report was built
    pub pending: u64,
    /// Late, duplicate or unknown responses
    pub unmatched: u64,
}

impl ResponseStats {
    pub fn expected(&self) -> u64 {
        self.matched + self.pending
    }
}

/// Coarse judgement on the average latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Average below 100ms
    Excellent,
    /// Average below 500ms
    Good,
    Slow,
}

impl Verdict {
    pub fn from_average(avg: Duration) -> Self {
        if avg < Duration::from_millis(100) {
            Verdict::Excellent
        } else if avg < Duration::from_millis(500) {
            Verdict::Good
        } else {
            Verdict::Slow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Excellent => "excellent",
            Verdict::Good => "good",
            Verdict::Slow => "slow",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for rendered reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub label: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total_issued: u64,
    pub succeeded: u64,
    pub errored: u64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Requests per second, `None` when nothing was issued or no time elapsed
    pub rps: Option<f64>,
    pub latency: Option<LatencyStats>,
    pub verdict: Option<Verdict>,
    pub responses: Option<ResponseStats>,
    pub concurrency: usize,
    pub peak_in_flight: usize,
}

impl Report {
    pub fn new(label: impl Into<String>, snapshot: &AggregatorSnapshot, elapsed: Duration) -> Self {
        let latency = LatencyStats::from_samples(&snapshot.latencies);

        Self {
            label: label.into(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            total_issued: snapshot.total_issued,
            succeeded: snapshot.success_count,
            errored: snapshot.error_count,
            errors_by_kind: snapshot.errors_by_kind.clone(),
            elapsed,
            rps: requests_per_second(snapshot.total_issued, elapsed),
            verdict: latency.map(|stats| Verdict::from_average(stats.avg)),
            latency,
            responses: None,
            concurrency: 0,
            peak_in_flight: 0,
        }
    }

    pub fn with_run(mut self, run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        self.run_id = run_id;
        self.started_at = started_at;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize, peak_in_flight: usize) -> Self {
        self.concurrency = concurrency;
        self.peak_in_flight = peak_in_flight;
        self
    }

    pub fn with_responses(mut self, responses: Option<ResponseStats>) -> Self {
        self.responses = responses;
        self
    }

    /// One-line summary: requests, time, rps and errors
    pub fn status_line(&self) -> String {
        format!(
            "Requests: {} | Time: {:.2}s | RPS: {} | Errors: {}",
            self.total_issued,
            self.elapsed.as_secs_f64(),
            self.rps_display(),
            self.errored
        )
    }

    pub fn render(&self, format: ReportFormat) -> HarnessResult<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    pub fn to_json(&self) -> HarnessResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| HarnessError::Sink(format!("failed to serialize report: {}", e)))
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    fn rps_display(&self) -> String {
        match self.rps {
            Some(rps) => format!("{:.2}", rps),
            None => NO_DATA.to_string(),
        }
    }

    fn errors_display(&self) -> String {
        if self.errors_by_kind.is_empty() {
            return self.errored.to_string();
        }

        let breakdown: Vec<String> = self
            .errors_by_kind
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        format!("{} ({})", self.errored, breakdown.join(", "))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== volley report: {} ===", self.label)?;
        writeln!(f, "run id:       {}", self.run_id)?;
        writeln!(f, "started:      {}", self.started_at.to_rfc3339())?;
        writeln!(f, "requests:     {}", self.total_issued)?;
        writeln!(f, "succeeded:    {}", self.succeeded)?;
        writeln!(f, "errors:       {}", self.errors_display())?;
        writeln!(f, "elapsed:      {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "rps:          {}", self.rps_display())?;

        match &self.latency {
            Some(stats) => writeln!(
                f,
                "latency:      min {} / avg {} / max {} ({} samples)",
                format_millis(stats.min),
                format_millis(stats.avg),
                format_millis(stats.max),
                stats.count
            )?,
            None => writeln!(f, "latency:      {}", NO_DATA)?,
        }

        if let Some(responses) = &self.responses {
            writeln!(
                f,
                "responses:    matched {}/{} ({} unmatched)",
                responses.matched,
                responses.expected(),
                responses.unmatched
            )?;
        }

        writeln!(
            f,
            "concurrency:  {} (peak {})",
            self.concurrency, self.peak_in_flight
        )?;

        match self.verdict {
            Some(verdict) => write!(f, "verdict:      {}", verdict),
            None => write!(f, "verdict:      {}", NO_DATA),
        }
    }
}

fn requests_per_second(total_issued: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if total_issued == 0 || secs <= 0.0 {
        return None;
    }
    Some(total_issued as f64 / secs)
}

fn format_millis(duration: Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(issued: u64, ok: u64, latencies_ms: &[u64]) -> AggregatorSnapshot {
        let mut errors_by_kind = BTreeMap::new();
        if issued > ok {
            errors_by_kind.insert(ErrorKind::Connection, issued - ok);
        }
        AggregatorSnapshot {
            total_issued: issued,
            success_count: ok,
            error_count: issued - ok,
            errors_by_kind,
            latencies: latencies_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        }
    }

    #[test]
    fn test_rps_uses_total_issued() {
        let report = Report::new("test", &snapshot(100, 90, &[]), Duration::from_secs(4));
        assert_eq!(report.rps, Some(25.0));
        assert!(report.status_line().contains("RPS: 25.00"));
        assert!(report.status_line().contains("Errors: 10"));
    }

    #[test]
    fn test_empty_run_reports_no_data() {
        let report = Report::new("empty", &snapshot(0, 0, &[]), Duration::ZERO);
        assert_eq!(report.rps, None);
        assert_eq!(report.latency, None);
        assert_eq!(report.verdict, None);

        let text = report.render_text();
        assert!(text.contains("rps:          no data"));
        assert!(text.contains("latency:      no data"));
    }

    #[test]
    fn test_zero_elapsed_has_no_rps() {
        let report = Report::new("instant", &snapshot(5, 5, &[]), Duration::ZERO);
        assert_eq!(report.rps, None);
    }

    #[test]
    fn test_latency_stats() {
        let stats = LatencyStats::from_samples(&[
            Duration::from_millis(10),
            Duration::from_millis(30),
            Duration::from_millis(20),
        ])
        .unwrap();
        assert_eq!(stats.min, Duration::from_millis(10));
        assert_eq!(stats.max, Duration::from_millis(30));
        assert_eq!(stats.avg, Duration::from_millis(20));
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_average(Duration::from_millis(99)), Verdict::Excellent);
        assert_eq!(Verdict::from_average(Duration::from_millis(100)), Verdict::Good);
        assert_eq!(Verdict::from_average(Duration::from_millis(499)), Verdict::Good);
        assert_eq!(Verdict::from_average(Duration::from_millis(500)), Verdict::Slow);
    }

    #[test]
    fn test_text_includes_error_breakdown_and_responses() {
        let report = Report::new("http", &snapshot(10, 8, &[5, 15]), Duration::from_secs(1))
            .with_concurrency(3, 3)
            .with_responses(Some(ResponseStats {
                matched: 7,
                pending: 1,
                unmatched: 2,
            }));

        let text = report.render_text();
        assert!(text.contains("errors:       2 (connection: 2)"));
        assert!(text.contains("matched 7/8 (2 unmatched)"));
        assert!(text.contains("concurrency:  3 (peak 3)"));
        assert!(text.contains("verdict:      excellent"));
    }

    #[test]
    fn test_json_output() {
        let report = Report::new("json", &snapshot(4, 4, &[250]), Duration::from_secs(2));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["total_issued"], 4);
        assert_eq!(json["rps"], 2.0);
        assert_eq!(json["elapsed_secs"], 2.0);
        assert_eq!(json["latency"]["avg_ms"], 250.0);
        assert_eq!(json["verdict"], "good");
        assert!(json["responses"].is_null());
    }

    #[test]
    fn test_report_format_from_str() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("xml".parse::<ReportFormat>().is_err());
    }
}
