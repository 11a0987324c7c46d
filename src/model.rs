//! Records held by the store. Coverage payloads arrive already parsed; the
//! engine never computes ratios itself, it only stores and merges them.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Tool or language that produced a coverage payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Clover,
    Go,
    Lcov,
    Perl,
    Python,
    Ruby,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Clover => "clover",
            ReportType::Go => "go",
            ReportType::Lcov => "lcov",
            ReportType::Perl => "perl",
            ReportType::Python => "python",
            ReportType::Ruby => "ruby",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clover" => Ok(ReportType::Clover),
            "go" => Ok(ReportType::Go),
            "lcov" => Ok(ReportType::Lcov),
            "perl" => Ok(ReportType::Perl),
            "python" => Ok(ReportType::Python),
            "ruby" => Ok(ReportType::Ruby),
            _ => Err(StoreError::Parse(format!(
                "Unknown report type: '{}'. Supported: clover, go, lcov, perl, python, ruby",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement coverage of a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    #[serde(default)]
    pub statement_coverage: f64,
}

/// One tool's coverage payload inside a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    #[serde(rename = "type")]
    pub kind: ReportType,
    #[serde(default)]
    pub statement_coverage: f64,
    #[serde(default)]
    pub files: Vec<File>,
}

impl CoverageReport {
    pub fn new(kind: ReportType) -> Self {
        Self {
            kind,
            statement_coverage: 0.0,
            files: Vec::new(),
        }
    }
}

/// Coverage uploaded for one commit of one report group.
///
/// `(group_id, commit)` is the identity. `created_at` is assigned by the
/// store on first upload and ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub group_id: String,
    pub commit: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub coverages: Vec<CoverageReport>,
}

impl Report {
    pub fn new(group_id: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            commit: commit.into(),
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_coverage(mut self, coverage: CoverageReport) -> Self {
        self.coverages.push(coverage);
        self
    }

    pub fn coverage(&self, kind: ReportType) -> Option<&CoverageReport> {
        self.coverages.iter().find(|c| c.kind == kind)
    }
}

/// Filter for `find`/`finds`. Empty strings mean "not given".
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub group_id: String,
    pub commit: String,
    pub reference: String,
}

impl ReportQuery {
    pub fn group(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            ..Default::default()
        }
    }

    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }
}

impl std::fmt::Display for ReportQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group '{}'", self.group_id)?;
        if !self.commit.is_empty() {
            write!(f, ", commit '{}'", self.commit)?;
        }
        if !self.reference.is_empty() {
            write!(f, ", reference '{}'", self.reference)?;
        }
        Ok(())
    }
}

/// Pull-request comment posted for a report group. `comment` is the id of
/// the comment on the SCM side, so it can be edited rather than re-posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportComment {
    pub number: i64,
    pub comment: i64,
}
