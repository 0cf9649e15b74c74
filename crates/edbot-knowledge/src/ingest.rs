//! Course catalog and general-info CSV ingestion.
//!
//! Every course row becomes one document; general-info rows with an empty
//! description are skipped. Any unreadable file or malformed row aborts the
//! whole ingestion.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::document::{COURSE_TYPE, Document};
use crate::error::IngestError;

const COURSE_COLUMNS: &[&str] = &[
    "course_name",
    "category",
    "duration",
    "format",
    "target_audience",
    "prerequisites",
    "description",
    "key_topics",
    "learning_outcomes",
    "pricing",
    "customization",
    "course_page",
];

const INFO_COLUMNS: &[&str] = &["title", "description", "url", "info_type"];

#[derive(Debug, Clone, Deserialize)]
pub struct CourseRecord {
    pub course_name: String,
    pub category: String,
    pub duration: String,
    pub format: String,
    pub target_audience: String,
    pub prerequisites: String,
    pub description: String,
    pub key_topics: String,
    pub learning_outcomes: String,
    pub pricing: String,
    pub customization: String,
    pub course_page: String,
}

impl CourseRecord {
    #[must_use]
    pub fn into_document(self, id: String) -> Document {
        let text = format!(
            "Course: {}\n\
             Category: {}\n\
             Duration: {}\n\
             Format: {}\n\
             Target Audience: {}\n\
             Prerequisites: {}\n\
             Description: {}\n\
             Key Topics: {}\n\
             Learning Outcomes: {}\n\
             Pricing: {}\n\
             Customization: {}\n\
             Course Page: {}",
            self.course_name,
            self.category,
            self.duration,
            self.format,
            self.target_audience,
            self.prerequisites,
            self.description,
            self.key_topics,
            self.learning_outcomes,
            self.pricing,
            self.customization,
            self.course_page,
        );

        let metadata = BTreeMap::from([
            ("course_name".to_owned(), self.course_name),
            ("category".to_owned(), self.category),
            ("course_page".to_owned(), self.course_page),
            ("type".to_owned(), COURSE_TYPE.to_owned()),
        ]);

        Document { id, text, metadata }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoRecord {
    pub title: String,
    pub description: String,
    pub url: String,
    pub info_type: String,
}

impl InfoRecord {
    /// Returns `None` for rows without a description.
    #[must_use]
    pub fn into_document(self, id: String) -> Option<Document> {
        if self.description.trim().is_empty() {
            return None;
        }

        let text = format!("{}\n{}\nURL: {}", self.title, self.description, self.url);
        let metadata = BTreeMap::from([
            ("title".to_owned(), self.title),
            ("url".to_owned(), self.url),
            ("type".to_owned(), self.info_type),
        ]);

        Some(Document { id, text, metadata })
    }
}

/// Locations of the two tabular sources.
#[derive(Debug, Clone)]
pub struct KnowledgeSources {
    pub courses: PathBuf,
    pub general_info: PathBuf,
}

/// Load the course catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks a required column, or
/// contains a malformed row.
pub fn load_courses(path: &Path) -> Result<Vec<Document>, IngestError> {
    let records: Vec<CourseRecord> = read_records(path, COURSE_COLUMNS)?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_document(format!("course-{i}")))
        .collect())
}

/// Load general-info rows, skipping rows with an empty description.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks a required column, or
/// contains a malformed row.
pub fn load_general_info(path: &Path) -> Result<Vec<Document>, IngestError> {
    let records: Vec<InfoRecord> = read_records(path, INFO_COLUMNS)?;
    let total = records.len();
    let docs: Vec<Document> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| r.into_document(format!("info-{i}")))
        .collect();
    if docs.len() < total {
        tracing::debug!(
            skipped = total - docs.len(),
            "skipped general-info rows without description"
        );
    }
    Ok(docs)
}

/// Ingest both sources into one flat collection: courses first, then info rows.
///
/// # Errors
///
/// Returns an error if either source fails to load or nothing was ingested.
pub fn ingest(sources: &KnowledgeSources) -> Result<Vec<Document>, IngestError> {
    let mut documents = load_courses(&sources.courses)?;
    let courses = documents.len();
    documents.extend(load_general_info(&sources.general_info)?);

    if documents.is_empty() {
        return Err(IngestError::Empty);
    }

    tracing::info!(
        courses,
        general_info = documents.len() - courses,
        "ingested knowledge documents"
    );
    Ok(documents)
}

fn read_records<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<Vec<T>, IngestError> {
    let open_err = |source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(open_err)?;

    let headers = reader.headers().map_err(open_err)?.clone();
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| (*col).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    for result in reader.deserialize::<T>() {
        let record = result.map_err(|source| IngestError::Row {
            path: path.to_path_buf(),
            line: source.position().map_or(0, csv::Position::line),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
