//! Solar-cell figures of merit parsed out of the executable's console text.

use serde::Serialize;
use std::collections::BTreeMap;

/// Up to three rows (Simulated, Experimental, Deviation) keyed by figure of
/// merit. Rows only hold the columns the console actually reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolarCellMetrics {
    #[serde(rename = "Simulated")]
    pub simulated: BTreeMap<String, String>,
    #[serde(rename = "Experimental")]
    pub experimental: BTreeMap<String, String>,
    #[serde(rename = "Deviation")]
    pub deviation: BTreeMap<String, String>,
}

impl SolarCellMetrics {
    pub fn is_empty(&self) -> bool {
        self.simulated.is_empty() && self.experimental.is_empty() && self.deviation.is_empty()
    }
}

struct MetricSpec {
    marker: &'static str,
    /// Unit substring removed from the line before tokenisation; `None`
    /// when the console prints the value without one (FF) or the unit never
    /// appears outside the stripped text (Vmpp, Voc use plain `V`).
    strip_unit: Option<&'static str>,
    column: &'static str,
}

const METRIC_SPECS: [MetricSpec; 5] = [
    MetricSpec {
        marker: "Jsc",
        strip_unit: Some("A/m2"),
        column: "Jsc [Am⁻²]",
    },
    MetricSpec {
        marker: "Vmpp",
        strip_unit: Some("V"),
        column: "Vmpp [V]",
    },
    MetricSpec {
        marker: "MPP",
        strip_unit: Some("W/m2"),
        column: "MPP [Wm⁻²]",
    },
    MetricSpec {
        marker: "Voc",
        strip_unit: Some("V"),
        column: "Voc [V]",
    },
    MetricSpec {
        marker: "FF",
        strip_unit: None,
        column: "FF",
    },
];

/// Scans the console text for the five marker lines. Returns `None` when no
/// marker appears at all: the run was not a solar-cell simulation.
pub fn extract_metrics(console: &str) -> Option<SolarCellMetrics> {
    let mut metrics = SolarCellMetrics::default();
    let mut solar_cell = false;

    for line in console.lines() {
        for spec in &METRIC_SPECS {
            if line.contains(spec.marker) {
                record_metric_line(line, spec, &mut metrics);
                solar_cell = true;
            }
        }
    }

    solar_cell.then_some(metrics)
}

/// A marker line is positional: after stripping the marker and its unit,
/// tokens 1-3 are the simulated value/operator/error triple, 4-6 the
/// experimental triple, and 7 the deviation.
fn record_metric_line(line: &str, spec: &MetricSpec, metrics: &mut SolarCellMetrics) {
    let mut stripped = line.replace(&format!("{}:", spec.marker), "");
    if let Some(unit) = spec.strip_unit {
        stripped = stripped.replace(unit, "");
    }
    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    if tokens.len() >= 3 {
        metrics
            .simulated
            .insert(spec.column.to_string(), tokens[..3].concat());
    }
    if tokens.len() >= 6 {
        metrics
            .experimental
            .insert(spec.column.to_string(), tokens[3..6].concat());
    }
    if tokens.len() >= 7 {
        metrics
            .deviation
            .insert(spec.column.to_string(), tokens[6].to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::extract_metrics;

    #[test]
    fn single_simulated_triple_fills_only_the_simulated_row() {
        let metrics = extract_metrics("Jsc: 120.5 +/- 0.3 A/m2\n")
            .expect("Jsc marker should flag a solar-cell run");

        assert_eq!(metrics.simulated["Jsc [Am⁻²]"], "120.5+/-0.3");
        assert!(!metrics.experimental.contains_key("Jsc [Am⁻²]"));
        assert!(!metrics.deviation.contains_key("Jsc [Am⁻²]"));
    }

    #[test]
    fn console_without_markers_is_not_a_solar_cell_run() {
        let console = "Simulation of a resistor\nconverged in 12 iterations\n";
        assert!(extract_metrics(console).is_none());
    }

    #[test]
    fn experimental_and_deviation_columns_parse_positionally() {
        let console = "Voc: 0.812 +/- 0.001 V 0.825 +/- 0.002 V 1.6\n";
        let metrics = extract_metrics(console).expect("Voc marker should be found");

        assert_eq!(metrics.simulated["Voc [V]"], "0.812+/-0.001");
        assert_eq!(metrics.experimental["Voc [V]"], "0.825+/-0.002");
        assert_eq!(metrics.deviation["Voc [V]"], "1.6");
    }

    #[test]
    fn full_console_fills_all_five_columns() {
        let console = "\
Solar cell parameters:
Jsc: 200.4 +/- 0.1 A/m2
Vmpp: 0.690 +/- 0.001 V
MPP: 120.3 +/- 0.2 W/m2
Voc: 0.810 +/- 0.001 V
FF: 0.741 +/- 0.003
";
        let metrics = extract_metrics(console).expect("all markers should be found");
        assert_eq!(metrics.simulated.len(), 5);
        assert_eq!(metrics.simulated["MPP [Wm⁻²]"], "120.3+/-0.2");
        assert_eq!(metrics.simulated["Vmpp [V]"], "0.690+/-0.001");
        assert_eq!(metrics.simulated["FF"], "0.741+/-0.003");
        assert!(metrics.experimental.is_empty());
        assert!(metrics.deviation.is_empty());
    }

    #[test]
    fn unit_stripping_does_not_disturb_numeric_tokens() {
        // The lower-case unit text must vanish while signed values survive.
        let metrics = extract_metrics("Jsc: -210.7 +/- 0.4 A/m2\n")
            .expect("Jsc marker should be found");
        assert_eq!(metrics.simulated["Jsc [Am⁻²]"], "-210.7+/-0.4");
    }
}
