use std::collections::BTreeMap;

/// Metadata `type` tag attached to course catalog documents.
pub const COURSE_TYPE: &str = "course";

/// Normalized text record produced from one source row. Immutable after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    #[must_use]
    pub fn doc_type(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }

    /// Display title: the course name for courses, the row title otherwise.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get("course_name")
            .or_else(|| self.metadata.get("title"))
            .map(String::as_str)
    }

    /// Reference link: the course page for courses, the row URL otherwise.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.metadata
            .get("course_page")
            .or_else(|| self.metadata.get("url"))
            .map(String::as_str)
            .filter(|l| !l.is_empty())
    }
}
