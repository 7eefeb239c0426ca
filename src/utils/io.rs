//! File input/output utilities.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Save any serializable data to pretty-printed JSON
pub fn save_json<T: Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, data)?;
    Ok(())
}

/// Load data from JSON
pub fn load_json<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    let data = serde_json::from_reader(file)?;
    Ok(data)
}

/// Create directory if it doesn't exist
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    if !path.as_ref().exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Save a topic-count metric curve as CSV with a named score column.
pub fn save_metric_csv<P: AsRef<Path>>(
    scores: &[(usize, f64)],
    score_name: &str,
    path: P,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["num_topics", score_name])?;
    for (num_topics, score) in scores {
        writer.write_record(&[num_topics.to_string(), score.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let data = vec![("alpha".to_string(), 1.0), ("beta".to_string(), 2.0)];
        save_json(&data, &path).unwrap();

        let loaded: Vec<(String, f64)> = load_json(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_ensure_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");

        ensure_directory(&nested).unwrap();
        assert!(nested.exists());
        // Second call is a no-op
        ensure_directory(&nested).unwrap();
    }

    #[test]
    fn test_save_metric_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greene.csv");

        save_metric_csv(&[(2, 0.9), (3, 0.7)], "agreement", &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("num_topics,agreement"));
        assert!(content.contains("2,0.9"));
    }
}
