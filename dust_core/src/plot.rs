//! Concentration-over-time chart rendered from the sample store.
//!
//! Output is SVG; a path ending in `.html` gets the SVG wrapped in a minimal
//! page so it can be served as-is next to the data.
use std::path::Path;

use chrono::DateTime;
use plotters::prelude::*;

use crate::error::{DustError, Result};
use crate::sink::read_samples;
use crate::types::Sample;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 480;

fn render_err(e: impl std::fmt::Display) -> eyre::Report {
    DustError::Io(format!("render chart: {e}")).into()
}

fn time_label(secs: f64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map_or_else(|| format!("{secs:.0}"), |t| t.format("%m/%d %H:%M").to_string())
}

/// Time span covered by the samples, padded when it is a single instant.
fn x_range(samples: &[Sample]) -> (f64, f64) {
    let (lo, hi) = samples
        .iter()
        .map(|s| s.epoch_start_secs)
        .filter(|t| t.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t), hi.max(t))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 60.0, hi + 60.0);
    }
    (lo, hi)
}

/// Zero up to 10% above the largest finite concentration.
fn y_range(samples: &[Sample]) -> (f64, f64) {
    let max = samples
        .iter()
        .map(|s| s.concentration)
        .filter(|c| c.is_finite())
        .fold(0.0_f64, f64::max);
    (0.0, if max > 0.0 { max * 1.1 } else { 1.0 })
}

/// Scatter of concentration against epoch start. Non-finite points are skipped.
pub fn render_svg(samples: &[Sample], title: &str) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (x0, x1) = x_range(samples);
        let (y0, y1) = y_range(samples);
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|t| time_label(*t))
            .y_desc("particles > 1 µm per 0.01 ft³")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(
                samples
                    .iter()
                    .filter(|s| s.epoch_start_secs.is_finite() && s.concentration.is_finite())
                    .map(|s| Circle::new((s.epoch_start_secs, s.concentration), 2, BLACK.filled())),
            )
            .map_err(render_err)?;
        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn wrap_html(svg: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{svg}\n</body>\n</html>\n"
    )
}

/// Read `store` and write the chart to `out`. Returns the number of samples
/// plotted.
pub fn write_chart(store: &Path, out: &Path, title: &str) -> Result<usize> {
    let samples = read_samples(store)?;
    let svg = render_svg(&samples, title)?;
    let is_html = out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    let body = if is_html { wrap_html(&svg, title) } else { svg };

    if let Some(dir) = out.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .map_err(|e| DustError::Io(format!("create directory {}: {e}", dir.display())))?;
    }
    std::fs::write(out, body)
        .map_err(|e| DustError::Io(format!("write chart {}: {e}", out.display())))?;
    tracing::debug!(path = %out.display(), samples = samples.len(), "chart written");
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, c: f64) -> Sample {
        Sample {
            epoch_start_secs: t,
            low_duration_secs: 0.0,
            epoch_duration_secs: 5.0,
            concentration: c,
        }
    }

    #[test]
    fn single_instant_gets_padded() {
        assert_eq!(x_range(&[sample(100.0, 1.0)]), (40.0, 160.0));
        assert_eq!(x_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn y_axis_starts_at_zero_and_ignores_nan() {
        let (lo, hi) = y_range(&[sample(0.0, 10.0), sample(1.0, f64::NAN)]);
        assert_eq!(lo, 0.0);
        assert!((hi - 11.0).abs() < 1e-9);
        assert_eq!(y_range(&[]), (0.0, 1.0));
    }

    #[test]
    fn labels_are_utc_times() {
        assert_eq!(time_label(1_600_000_000.0), "09/13 12:26");
    }

    #[test]
    fn svg_contains_one_marker_per_point() {
        let samples = [sample(0.0, 1.0), sample(60.0, 2.0), sample(120.0, f64::NAN)];
        let svg = render_svg(&samples, "Test chart").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Test chart"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn html_output_wraps_the_svg() {
        use crate::sink::{CsvSampleStore, SampleSink};

        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("data.csv");
        let mut sink = CsvSampleStore::open(&store).unwrap();
        sink.append(&sample(1_600_000_000.0, 87.186)).unwrap();
        sink.append(&sample(1_600_000_006.0, 0.62)).unwrap();

        let out = dir.path().join("site").join("index.html");
        assert_eq!(write_chart(&store, &out, "Park").unwrap(), 2);
        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Park</title>"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_chart(&dir.path().join("none.csv"), &dir.path().join("c.svg"), "x")
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DustError>(), Some(DustError::Store(_))));
        assert!(!dir.path().join("c.svg").exists());
    }
}
