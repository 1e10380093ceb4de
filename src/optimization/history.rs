use crate::core::TrialResult;
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// One finished trial as kept in the history.
///
/// JSON has no infinities, so a non-finite metric or cost is written as
/// `null` and read back as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: u64,
    pub real_parameters: IndexMap<String, f64>,
    #[serde(deserialize_with = "nullable_map")]
    pub measured_metrics: IndexMap<String, f64>,
    #[serde(deserialize_with = "nullable")]
    pub figure_of_merit: f64,
    #[serde(deserialize_with = "nullable")]
    pub cost: f64,
    pub unix_time: f64,
}

fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nullable_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, f64>, D::Error> {
    let raw = IndexMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
        .collect())
}

impl From<&TrialResult> for TrialRecord {
    fn from(result: &TrialResult) -> Self {
        let unix_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            index: result.index,
            real_parameters: result.real_parameters.clone(),
            measured_metrics: result.measured_metrics.clone(),
            figure_of_merit: result.figure_of_merit,
            cost: result.cost,
            unix_time,
        }
    }
}

#[derive(Default)]
struct HistoryState {
    records: Vec<TrialRecord>,
    sink: Option<File>,
}

/// Append-only trial history keyed by trial index.
///
/// Records are kept in memory and, when a file is attached, mirrored to it
/// as JSON lines. Appends are serialized by the internal mutex.
#[derive(Default)]
pub struct TrialHistory {
    state: Mutex<HistoryState>,
    path: Option<PathBuf>,
}

impl TrialHistory {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Mirror records to `path`, appending to whatever it already holds.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sink = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            state: Mutex::new(HistoryState {
                records: Vec::new(),
                sink: Some(sink),
            }),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        // A panic mid-append leaves at worst a missing record.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, record: TrialRecord) -> Result<()> {
        let mut state = self.lock();
        if let Some(sink) = state.sink.as_mut() {
            let mut line = serde_json::to_string(&record)?;
            line.push('\n');
            sink.write_all(line.as_bytes())?;
            sink.flush()?;
        }
        state.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> Vec<TrialRecord> {
        self.lock().records.clone()
    }

    pub fn get(&self, index: u64) -> Option<TrialRecord> {
        self.lock().records.iter().find(|r| r.index == index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest-cost record so far.
    pub fn best(&self) -> Option<TrialRecord> {
        self.lock()
            .records
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .cloned()
    }

    /// Read back a JSON-lines history file.
    ///
    /// Lines that do not parse (a torn final write, say) are skipped with a
    /// warning instead of rejecting the whole file.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<TrialRecord>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut records = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    "Skipping line {} of {}: {}",
                    number + 1,
                    path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

impl std::fmt::Debug for TrialHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialHistory")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn record(index: u64, cost: f64) -> TrialRecord {
        let mut params = IndexMap::new();
        params.insert("r_cvar".to_string(), 5000.0);
        TrialRecord {
            index,
            real_parameters: params,
            measured_metrics: IndexMap::new(),
            figure_of_merit: 0.01,
            cost,
            unix_time: 0.0,
        }
    }

    #[test]
    fn keeps_records_in_append_order() {
        let history = TrialHistory::in_memory();
        assert!(history.is_empty());
        history.append(record(0, 1.5)).unwrap();
        history.append(record(1, -0.2)).unwrap();
        history.append(record(2, 0.7)).unwrap();

        let indices: Vec<u64> = history.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(history.best().unwrap().index, 1);
        assert_eq!(history.get(2).unwrap().cost, 0.7);
        assert!(history.get(9).is_none());
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        {
            let history = TrialHistory::with_file(&path).unwrap();
            history.append(record(0, 1.0)).unwrap();
        }
        {
            let history = TrialHistory::with_file(&path).unwrap();
            history.append(record(1, 2.0)).unwrap();
            assert_eq!(history.len(), 1);
        }
        let loaded = TrialHistory::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].index, 1);
        assert_eq!(loaded[0].real_parameters["r_cvar"], 5000.0);
    }

    #[test]
    fn non_finite_values_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let history = TrialHistory::with_file(&path).unwrap();

        let mut overflowed = record(0, f64::INFINITY);
        overflowed.measured_metrics.insert("IDC".to_string(), f64::INFINITY);
        overflowed.figure_of_merit = f64::INFINITY;
        history.append(overflowed).unwrap();
        history.append(record(1, 0.5)).unwrap();
        drop(history);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"index\": 2, \"cost\"").unwrap();

        let loaded = TrialHistory::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].cost.is_nan());
        assert!(loaded[0].figure_of_merit.is_nan());
        assert!(loaded[0].measured_metrics["IDC"].is_nan());
        assert_eq!(loaded[1].cost, 0.5);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let history = Arc::new(TrialHistory::in_memory());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let history = Arc::clone(&history);
                thread::spawn(move || history.append(record(i, i as f64)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 8);
    }
}
