use crate::core::PerformanceTable;
use indexmap::IndexMap;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Decode ISO-8859-1: every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Simulator result log, decoded once and scanned per metric.
#[derive(Clone, Debug, Default)]
pub struct MetricLog {
    text: String,
}

impl MetricLog {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_text(decode_latin1(bytes))
    }

    /// Read a log from disk. An unreadable or missing log behaves as an empty
    /// one: the simulator may have died before writing it.
    pub fn read(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(e) => {
                tracing::warn!("Could not read result log {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// First parseable value following `key` on any line.
    ///
    /// A line whose captured number does not parse is skipped and scanning
    /// moves on to the next line.
    pub fn extract(&self, key: &str) -> Option<f64> {
        let pattern = match metric_pattern(key) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!("Metric '{}': bad pattern ({})", key, e);
                return None;
            }
        };
        for line in self.text.lines() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let raw = &caps[1];
            match raw.parse::<f64>() {
                Ok(value) => return Some(value),
                Err(e) => {
                    tracing::warn!("Metric '{}': cannot parse '{}' ({})", key, raw, e);
                }
            }
        }
        None
    }

    /// Value for every performance entry, substituting the configured default
    /// for metrics the log does not contain.
    pub fn read_all(&self, specs: &PerformanceTable) -> IndexMap<String, f64> {
        specs
            .iter()
            .map(|(name, spec)| {
                let value = self.extract(&spec.log_key).unwrap_or_else(|| {
                    tracing::warn!(
                        "Metric '{}' missing from log, using default {}",
                        spec.log_key,
                        spec.default_on_missing
                    );
                    spec.default_on_missing
                });
                (name.clone(), value)
            })
            .collect()
    }
}

fn metric_pattern(key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\s*{}\s*([\d.eE+\-]+)", regex::escape(key)))
}

/// Scan the log at `path` for one metric.
pub fn extract(path: &Path, key: &str) -> Option<f64> {
    MetricLog::read(path).extract(key)
}

/// Scan the log at `path` for every metric in `specs`.
pub fn read_all(path: &Path, specs: &PerformanceTable) -> IndexMap<String, f64> {
    let log = MetricLog::read(path);
    let metrics = log.read_all(specs);
    tracing::debug!("Extracted metrics from {}: {:?}", path.display(), metrics);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PerformanceSpec;
    use tempfile::TempDir;

    #[test]
    fn finds_value_after_key() {
        let log = MetricLog::from_text("header\nF_Min 4.75e9\nF_Max 5.2e9\n");
        assert_eq!(log.extract("F_Min"), Some(4.75e9));
        assert_eq!(log.extract("F_Max"), Some(5.2e9));
    }

    #[test]
    fn missing_key_is_not_found() {
        let log = MetricLog::from_text("nothing here\n");
        assert_eq!(log.extract("F_Min"), None);
    }

    #[test]
    fn unparseable_capture_is_skipped() {
        let log = MetricLog::from_text("F_Min abc\nF_Min e+\nF_Min 4.1e9\nF_Min 9\n");
        assert_eq!(log.extract("F_Min"), Some(4.1e9));
    }

    #[test]
    fn first_match_wins_and_leading_space_is_allowed() {
        let log = MetricLog::from_text("   PN_1M   -101.5\nPN_1M -90\n");
        assert_eq!(log.extract("PN_1M"), Some(-101.5));
    }

    #[test]
    fn key_is_matched_literally() {
        let log = MetricLog::from_text("PN_10K -55\nPN_1K -30\n");
        assert_eq!(log.extract("PN_1K"), Some(-30.0));

        let dotted = MetricLog::from_text("IDCX 5\nI.C 7\n");
        assert_eq!(dotted.extract("I.C"), Some(7.0));
    }

    #[test]
    fn non_utf8_bytes_do_not_fail() {
        let mut bytes = b"\xff\xfe garbage \xe9\n".to_vec();
        bytes.extend_from_slice(b"IDC 0.012\n");
        let log = MetricLog::from_bytes(&bytes);
        assert_eq!(log.extract("IDC"), Some(0.012));
    }

    #[test]
    fn zero_is_a_real_measurement() {
        let log = MetricLog::from_text("Kvco_11 0\n");
        assert_eq!(log.extract("Kvco_11"), Some(0.0));
    }

    #[test]
    fn read_all_substitutes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pll_vco.log");
        fs::write(&path, "F_Min 4.75e9\n").unwrap();

        let mut specs = PerformanceTable::new();
        specs.insert("F_Min".into(), PerformanceSpec::new("F_Min").less_than(4.8e9));
        specs.insert("F_Max".into(), PerformanceSpec::new("F_Max").greater_than(5e9));
        specs.insert("IDC".into(), PerformanceSpec::new("IDC").default_on_missing(10.0));

        let metrics = read_all(&path, &specs);
        assert_eq!(metrics["F_Min"], 4.75e9);
        assert_eq!(metrics["F_Max"], 0.0);
        assert_eq!(metrics["IDC"], 10.0);
        assert_eq!(extract(&path, "F_Min"), Some(4.75e9));
    }

    #[test]
    fn missing_log_defaults_everything() {
        let dir = TempDir::new().unwrap();
        let mut specs = PerformanceTable::new();
        specs.insert("IDC".into(), PerformanceSpec::new("IDC").default_on_missing(10.0));
        let metrics = read_all(&dir.path().join("absent.log"), &specs);
        assert_eq!(metrics["IDC"], 10.0);
    }
}
