//! `report`: summary statistics over the sample store.

use std::path::Path;

use dust_core::error::Result;
use dust_core::{Sample, read_samples};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize(samples: &[Sample]) -> Option<Summary> {
    if samples.is_empty() {
        return None;
    }
    let (sum, min, max) = samples.iter().fold(
        (0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), s| {
            (
                sum + s.concentration,
                min.min(s.concentration),
                max.max(s.concentration),
            )
        },
    );
    Some(Summary {
        count: samples.len(),
        mean: sum / samples.len() as f64,
        min,
        max,
    })
}

pub fn render(path: &Path, last: usize, json: bool) -> Result<String> {
    let samples = read_samples(path)?;
    let tail = &samples[samples.len().saturating_sub(last)..];
    let summary = summarize(&samples);

    if json {
        let body = match &summary {
            Some(s) => serde_json::json!({
                "count": s.count,
                "mean": s.mean,
                "min": s.min,
                "max": s.max,
                "last": tail,
            }),
            None => serde_json::json!({ "count": 0, "last": tail }),
        };
        return Ok(body.to_string());
    }

    let Some(s) = summary else {
        return Ok(format!("{}: no samples", path.display()));
    };
    let mut out = format!(
        "{}: {} samples, concentration mean {:.3} min {:.3} max {:.3}\n",
        path.display(),
        s.count,
        s.mean,
        s.min,
        s.max
    );
    for sample in tail {
        out.push_str(&sample.to_csv_row());
    }
    Ok(out.trim_end().to_string())
}
