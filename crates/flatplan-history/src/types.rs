use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No commits reachable from '{0}'")]
    NoCommits(String),
    #[error("Tree entry '{0}' would be written outside the checkout")]
    UnsafePath(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// One commit of the document's history
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoricalState {
    /// Full commit hash
    pub id: String,
    /// Abbreviated hash for display
    pub short_id: String,
    /// First line of the commit message
    pub summary: String,
    /// Commit time in seconds since the Unix epoch
    pub timestamp: i64,
}

impl HistoricalState {
    pub fn new(id: impl Into<String>, summary: impl Into<String>, timestamp: i64) -> Self {
        let id = id.into();
        let short_id = id.chars().take(7).collect();
        Self {
            id,
            short_id,
            summary: summary.into(),
            timestamp,
        }
    }
}
