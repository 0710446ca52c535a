use crate::types::NormalizedResult;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File holding the root identifiers, one per line
pub const RESULTS_FILE: &str = "results.jsonl";

/// Writes normalized tables to JSON Lines files, one per entity type
pub struct TableWriter {
    output_dir: PathBuf,
    writers: HashMap<String, BufWriter<File>>,
}

impl TableWriter {
    /// Create a writer for files in `output_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

        Ok(TableWriter {
            output_dir,
            writers: HashMap::new(),
        })
    }

    /// Write every table and the root identifiers, replacing the files'
    /// previous contents
    pub fn write_result(&mut self, result: &NormalizedResult) -> Result<()> {
        for (entity, table) in &result.entities {
            let writer = self.create(&format!("{}.jsonl", entity))?;
            for record in table.values() {
                let json = serde_json::to_string(record)
                    .context("Failed to serialize record")?;
                writeln!(writer, "{}", json).context("Failed to write record")?;
            }
        }

        let writer = self.create(RESULTS_FILE)?;
        for id in &result.results {
            let json = serde_json::to_string(id).context("Failed to serialize identifier")?;
            writeln!(writer, "{}", json).context("Failed to write identifier")?;
        }
        Ok(())
    }

    /// Flush all writers
    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush().context("Failed to flush writer")?;
        }
        Ok(())
    }

    /// Open `filename` truncated, flushing any writer previously open on it
    fn create(&mut self, filename: &str) -> Result<&mut BufWriter<File>> {
        if let Some(mut previous) = self.writers.remove(filename) {
            previous.flush().context("Failed to flush writer")?;
        }

        let path = self.output_dir.join(filename);
        let file = File::create(&path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        Ok(self
            .writers
            .entry(filename.to_string())
            .or_insert(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use serde_json::json;

    #[test]
    fn test_writes_one_file_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut normalizer = Normalizer::builder()
            .root("articles")
            .unwrap()
            .nested("users", "author")
            .unwrap()
            .build();

        let result = normalizer
            .parse_values(vec![
                json!({"id": 1, "author": {"id": 5, "name": "Dan"}}),
                json!({"id": 2, "author": {"id": 5, "name": "Dan"}}),
            ])
            .unwrap()
            .unwrap();

        let mut writer = TableWriter::new(dir.path()).unwrap();
        writer.write_result(&result).unwrap();
        writer.flush().unwrap();

        let articles = std::fs::read_to_string(dir.path().join("articles.jsonl")).unwrap();
        assert_eq!(articles.lines().count(), 2);
        assert!(articles.contains(r#""author":5"#));

        let users = std::fs::read_to_string(dir.path().join("users.jsonl")).unwrap();
        assert_eq!(users.trim(), r#"{"id":5,"name":"Dan"}"#);

        let results = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        assert_eq!(results, "1\n2\n");
    }

    #[test]
    fn test_empty_table_still_gets_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut normalizer = Normalizer::builder()
            .root("articles")
            .unwrap()
            .nested("users", "author")
            .unwrap()
            .build();

        let result = normalizer
            .parse_values(vec![json!({"id": 1, "title": "solo"})])
            .unwrap()
            .unwrap();

        let mut writer = TableWriter::new(dir.path()).unwrap();
        writer.write_result(&result).unwrap();
        writer.flush().unwrap();

        let users = std::fs::read_to_string(dir.path().join("users.jsonl")).unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_rewriting_replaces_previous_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut normalizer = Normalizer::builder().root("articles").unwrap().build();
        let result = normalizer
            .parse_values(vec![json!({"id": 1})])
            .unwrap()
            .unwrap();

        let mut writer = TableWriter::new(dir.path()).unwrap();
        writer.write_result(&result).unwrap();
        writer.write_result(&result).unwrap();
        writer.flush().unwrap();

        // a second run into the same directory
        let mut rerun = TableWriter::new(dir.path()).unwrap();
        rerun.write_result(&result).unwrap();
        rerun.flush().unwrap();

        let articles = std::fs::read_to_string(dir.path().join("articles.jsonl")).unwrap();
        assert_eq!(articles, "{\"id\":1}\n");
        let results = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        assert_eq!(results, "1\n");
    }
}
