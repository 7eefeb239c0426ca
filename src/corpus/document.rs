//! Source documents and dataset loading.
//!
//! A dataset is a delimited text file (tab-separated by default) with a
//! header row. The `title` and `text` columns are required; `date`,
//! `author` and `affiliation` are optional. Multiple authors or
//! affiliations in one cell are separated by `", "`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::CorpusError;

/// Separator between several values inside one metadata cell.
const MULTI_VALUE_SEPARATOR: &str = ", ";

/// One document of a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Dense index, aligned with the corpus matrix row
    pub id: usize,
    pub title: String,
    pub text: String,
    pub date: Option<NaiveDate>,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(id: usize, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            date: None,
            authors: Vec::new(),
            affiliations: Vec::new(),
        }
    }

    /// Set the publication date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the author list
    pub fn with_authors(mut self, authors: &[&str]) -> Self {
        self.authors = authors.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Set the affiliation list
    pub fn with_affiliations(mut self, affiliations: &[&str]) -> Self {
        self.affiliations = affiliations.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Title and body as one string.
    pub fn full_text(&self) -> String {
        if self.title.is_empty() {
            self.text.clone()
        } else {
            format!("{}. {}", self.title, self.text)
        }
    }
}

/// Load documents from a tab-separated file with a header row.
pub fn load_tsv<P: AsRef<Path>>(path: P) -> Result<Vec<Document>, CorpusError> {
    load_delimited(path, b'\t')
}

/// Load documents from a delimited file with a header row.
pub fn load_delimited<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<Vec<Document>, CorpusError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let title_col = column("title").ok_or_else(|| CorpusError::MissingColumn("title".into()))?;
    let text_col = column("text").ok_or_else(|| CorpusError::MissingColumn("text".into()))?;
    let date_col = column("date");
    let author_col = column("author");
    let affiliation_col = column("affiliation");

    let mut documents = Vec::new();
    for (id, record) in reader.records().enumerate() {
        let record = record?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(str::trim)
                .unwrap_or("")
                .to_string()
        };

        let mut document = Document::new(id, field(Some(title_col)), field(Some(text_col)));
        let date_text = field(date_col);
        if !date_text.is_empty() {
            // Malformed dates degrade to missing metadata, not a load failure
            document.date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").ok();
        }
        document.authors = split_multi_value(&field(author_col));
        document.affiliations = split_multi_value(&field(affiliation_col));
        documents.push(document);
    }

    Ok(documents)
}

/// Load documents from a JSON array file.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<Document>, CorpusError> {
    let file = std::fs::File::open(path)?;
    let mut documents: Vec<Document> = serde_json::from_reader(file)?;
    // Ids are reassigned: matrix rows must stay dense and in file order
    for (id, document) in documents.iter_mut().enumerate() {
        document.id = id;
    }
    Ok(documents)
}

fn split_multi_value(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.split(MULTI_VALUE_SEPARATOR)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
