//! Report rendering: line-oriented text or JSON.
//!
//! JSON is one object with three top-level keys. `elapsed_ms` is the report
//! age, `metrics` maps each metric name (in registration order) to
//! `{"type", "contains", "values"}`, and `samples` holds the accepted count
//! and the drop ledger. Per-metric statistics therefore sit under
//! `metrics.<name>.values`, not at the top level.
//!
//! Absent trend statistics (empty trend) render as `null` in JSON and `-` in
//! text. A value that is present but not finite renders as the string
//! `"inf"`, `"-inf"` or `"NaN"`, so `null` always means absent.

use std::fmt::Write;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use super::{MetricSummary, Report};
use crate::error::{MetricsError, Result};
use crate::metric::{MetricSnapshot, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    Text,
    Json,
}

impl FromStr for ReportStyle {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ReportStyle::Text),
            "json" => Ok(ReportStyle::Json),
            other => Err(MetricsError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl ReportStyle {
    pub fn render(self, report: &Report) -> Result<String> {
        match self {
            ReportStyle::Text => Ok(render_text(report)),
            ReportStyle::Json => serde_json::to_string_pretty(&to_json(report))
                .map_err(|e| MetricsError::Internal(format!("json render failed: {e}"))),
        }
    }
}

/// Render `report` in the named style (`text` or `json`).
pub fn format(report: &Report, style: &str) -> Result<String> {
    style.parse::<ReportStyle>()?.render(report)
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn fmt_value(v: Option<f64>, value_type: ValueType) -> String {
    match (v, value_type) {
        (None, _) => "-".to_string(),
        (Some(v), ValueType::Default) => fmt_num(v),
        (Some(v), ValueType::Time) => format!("{}ms", fmt_num(v)),
    }
}

fn json_num(v: f64) -> Value {
    if v.is_finite() {
        json!(v)
    } else {
        Value::String(v.to_string())
    }
}

fn json_opt(v: Option<f64>) -> Value {
    v.map_or(Value::Null, json_num)
}

fn rate(total: f64, report: &Report) -> f64 {
    let secs = report.elapsed.as_secs_f64();
    if secs > 0.0 {
        total / secs
    } else {
        0.0
    }
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "elapsed: {:.2}s", report.elapsed.as_secs_f64());

    let width = report.metrics.iter().map(|m| m.name.chars().count()).max().unwrap_or(0) + 3;
    for m in &report.metrics {
        let _ = writeln!(out, "  {:.<width$}: {}", m.name, text_values(m, report));
    }

    let _ = writeln!(
        out,
        "samples: accepted={} dropped={}",
        report.accepted,
        report.dropped_total()
    );
    for d in &report.dropped {
        let _ = writeln!(out, "  dropped {} {}={}", d.reason.as_str(), d.metric, d.count);
    }
    out
}

fn text_values(m: &MetricSummary, report: &Report) -> String {
    match &m.snapshot {
        MetricSnapshot::Counter(c) => format!(
            "count={} rate={:.2}/s",
            fmt_value(Some(c.total), m.value_type),
            rate(c.total, report)
        ),
        MetricSnapshot::Trend(t) => {
            let mut parts = vec![
                format!("count={}", t.count),
                format!("avg={}", fmt_value(t.avg, m.value_type)),
                format!("min={}", fmt_value(t.min, m.value_type)),
                format!("med={}", fmt_value(t.med, m.value_type)),
                format!("max={}", fmt_value(t.max, m.value_type)),
            ];
            for (p, v) in &t.percentiles {
                parts.push(format!("{}={}", p.label(), fmt_value(*v, m.value_type)));
            }
            parts.join(" ")
        }
    }
}

/// JSON form of a report.
pub fn to_json(report: &Report) -> Value {
    let mut metrics = Map::new();
    for m in &report.metrics {
        let values = match &m.snapshot {
            MetricSnapshot::Counter(c) => json!({
                "count": json_num(c.total),
                "rate": json_num(rate(c.total, report)),
                "adds": c.adds,
            }),
            MetricSnapshot::Trend(t) => {
                let mut v = Map::new();
                v.insert("count".into(), json!(t.count));
                v.insert("avg".into(), json_opt(t.avg));
                v.insert("min".into(), json_opt(t.min));
                v.insert("med".into(), json_opt(t.med));
                v.insert("max".into(), json_opt(t.max));
                for (p, val) in &t.percentiles {
                    v.insert(p.label(), json_opt(*val));
                }
                Value::Object(v)
            }
        };
        metrics.insert(
            m.name.clone(),
            json!({
                "type": m.kind.as_str(),
                "contains": m.value_type.as_str(),
                "values": values,
            }),
        );
    }

    let dropped: Vec<Value> = report
        .dropped
        .iter()
        .map(|d| json!({ "reason": d.reason.as_str(), "metric": d.metric, "count": d.count }))
        .collect();

    json!({
        "elapsed_ms": report.elapsed.as_millis() as u64,
        "metrics": metrics,
        "samples": {
            "accepted": report.accepted,
            "dropped": report.dropped_total(),
            "dropped_by_reason": dropped,
        },
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;
    use crate::error::ErrorCode;
    use crate::metric::{CounterSnapshot, MetricKind, Percentile, TrendSnapshot};
    use crate::router::DropCount;

    fn sample_report() -> Report {
        Report {
            elapsed: Duration::from_secs(2),
            metrics: vec![
                MetricSummary {
                    name: "iterations".into(),
                    kind: MetricKind::Counter,
                    value_type: ValueType::Default,
                    snapshot: MetricSnapshot::Counter(CounterSnapshot { total: 4.0, adds: 4 }),
                },
                MetricSummary {
                    name: "my_trend".into(),
                    kind: MetricKind::Trend,
                    value_type: ValueType::Time,
                    snapshot: MetricSnapshot::Trend(TrendSnapshot {
                        count: 4,
                        sum: 1000.0,
                        min: Some(100.0),
                        max: Some(400.0),
                        avg: Some(250.0),
                        med: Some(250.0),
                        percentiles: vec![(Percentile::P90, Some(370.0))],
                        retained: 4,
                    }),
                },
            ],
            accepted: 8,
            dropped: vec![DropCount {
                reason: ErrorCode::NotFound,
                metric: "ghost".into(),
                count: 1,
            }],
        }
    }

    #[test]
    fn text_lines() {
        let s = format(&sample_report(), "text").unwrap();
        assert!(s.contains("iterations...: count=4 rate=2.00/s"), "{s}");
        assert!(s.contains(
            "my_trend.....: count=4 avg=250ms min=100ms med=250ms max=400ms p(90)=370ms"
        ));
        assert!(s.contains("samples: accepted=8 dropped=1"));
        assert!(s.contains("dropped NOT_FOUND ghost=1"));
    }

    #[test]
    fn json_shape_and_order() {
        let s = format(&sample_report(), "json").unwrap();
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["metrics"]["my_trend"]["type"], "trend");
        assert_eq!(v["metrics"]["my_trend"]["contains"], "time");
        assert_eq!(v["metrics"]["my_trend"]["values"]["avg"], 250.0);
        assert_eq!(v["metrics"]["my_trend"]["values"]["p(90)"], 370.0);
        assert_eq!(v["metrics"]["iterations"]["values"]["rate"], 2.0);
        assert_eq!(v["samples"]["dropped"], 1);
        assert_eq!(v["samples"]["dropped_by_reason"][0]["reason"], "NOT_FOUND");

        let keys: Vec<&String> = v["metrics"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["iterations", "my_trend"]);

        // statistics are nested under "metrics", never at the top level
        let top: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(top, ["elapsed_ms", "metrics", "samples"]);
        assert!(v.get("my_trend").is_none());
    }

    #[test]
    fn empty_trend_renders_absent() {
        let report = Report {
            elapsed: Duration::ZERO,
            metrics: vec![MetricSummary {
                name: "t".into(),
                kind: MetricKind::Trend,
                value_type: ValueType::Default,
                snapshot: MetricSnapshot::Trend(TrendSnapshot {
                    count: 0,
                    sum: 0.0,
                    min: None,
                    max: None,
                    avg: None,
                    med: None,
                    percentiles: vec![(Percentile::P95, None)],
                    retained: 0,
                }),
            }],
            accepted: 0,
            dropped: vec![],
        };
        let text = format(&report, "text").unwrap();
        assert!(text.contains("count=0 avg=- min=- med=- max=- p(95)=-"));
        let v = to_json(&report);
        assert!(v["metrics"]["t"]["values"]["avg"].is_null());
    }

    #[test]
    fn non_finite_values_are_not_null() {
        let report = Report {
            elapsed: Duration::from_secs(1),
            metrics: vec![
                MetricSummary {
                    name: "huge".into(),
                    kind: MetricKind::Counter,
                    value_type: ValueType::Default,
                    snapshot: MetricSnapshot::Counter(CounterSnapshot {
                        total: f64::INFINITY,
                        adds: 2,
                    }),
                },
                MetricSummary {
                    name: "t".into(),
                    kind: MetricKind::Trend,
                    value_type: ValueType::Default,
                    snapshot: MetricSnapshot::Trend(TrendSnapshot {
                        count: 2,
                        sum: f64::INFINITY,
                        min: Some(f64::MAX),
                        max: Some(f64::MAX),
                        avg: Some(f64::INFINITY),
                        med: Some(f64::MAX),
                        percentiles: vec![(Percentile::P95, Some(f64::NEG_INFINITY))],
                        retained: 2,
                    }),
                },
            ],
            accepted: 4,
            dropped: vec![],
        };
        let v = to_json(&report);
        assert_eq!(v["metrics"]["huge"]["values"]["count"], "inf");
        assert_eq!(v["metrics"]["huge"]["values"]["rate"], "inf");
        assert_eq!(v["metrics"]["t"]["values"]["avg"], "inf");
        assert_eq!(v["metrics"]["t"]["values"]["p(95)"], "-inf");
        assert_eq!(v["metrics"]["t"]["values"]["max"], f64::MAX);
        // must still serialize
        assert!(format(&report, "json").is_ok());
    }

    #[test]
    fn columns_align_on_non_ascii_names() {
        let mut report = sample_report();
        report.metrics[0].name = "café".into();
        let s = format(&report, "text").unwrap();
        assert!(s.contains("  café.......: count=4"), "{s}");
        assert!(s.contains("  my_trend...: count=4"), "{s}");
        let cols: Vec<usize> = s
            .lines()
            .filter(|l| l.contains(".: count="))
            .map(|l| l.chars().take_while(|c| *c != ':').count())
            .collect();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], cols[1]);
    }

    #[test]
    fn unsupported_style() {
        let err = format(&sample_report(), "xml").unwrap_err();
        assert_eq!(err.code().as_str(), "UNSUPPORTED_FORMAT");
    }
}
