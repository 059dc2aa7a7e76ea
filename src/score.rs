// src/score.rs

//! Per-test score records.
//!
//! A [`ScoreRecord`] is one graded test: its display name, visibility,
//! formats, optional output text and its scoring state.
//!
//! Scoring comes in two modes:
//! - **Scored**: a non-zero point budget. The score must stay inside
//!   `[min(0, points), max(0, points)]`, so both positive budgets and
//!   negative penalty budgets are supported.
//! - **Boolean**: no point budget. The test simply passed or failed.
//!
//! Every setter validates before committing. A failed update returns a
//! [`ValidationError`] and leaves the record exactly as it was.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/* ---------------- enumerations ---------------- */

/// Who can see a test (or the whole report) on the grading platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Hidden,
    AfterDueDate,
    AfterPublished,
    Visible,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Hidden => "hidden",
            Visibility::AfterDueDate => "after_due_date",
            Visibility::AfterPublished => "after_published",
            Visibility::Visible => "visible",
        }
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hidden" => Ok(Visibility::Hidden),
            "after_due_date" => Ok(Visibility::AfterDueDate),
            "after_published" => Ok(Visibility::AfterPublished),
            "visible" => Ok(Visibility::Visible),
            other => Err(ValidationError::InvalidVisibility(other.to_string())),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup flavour of a name or output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Text,
    Html,
    SimpleFormat,
    Md,
    Ansi,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Html => "html",
            Format::SimpleFormat => "simple_format",
            Format::Md => "md",
            Format::Ansi => "ansi",
        }
    }
}

impl FromStr for Format {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "html" => Ok(Format::Html),
            "simple_format" => Ok(Format::SimpleFormat),
            "md" => Ok(Format::Md),
            "ansi" => Ok(Format::Ansi),
            other => Err(ValidationError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a test as the grading platform sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

/* ---------------- scoring state ---------------- */

/// Scoring state of a record.
///
/// `Scored.points` is never zero; a zero or missing budget is always
/// represented as `Boolean`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scoring {
    Scored { points: f64, score: f64 },
    Boolean { passed: bool },
}

impl Scoring {
    fn passing(&self) -> bool {
        match *self {
            Scoring::Scored { points, score } => {
                if points > 0.0 {
                    score == points
                } else {
                    score == 0.0
                }
            }
            Scoring::Boolean { passed } => passed,
        }
    }
}

/// Inclusive score range for a non-zero point budget.
pub fn score_range(points: f64) -> (f64, f64) {
    (points.min(0.0), points.max(0.0))
}

fn check_range(points: f64, score: f64) -> Result<(), ValidationError> {
    let (low, high) = score_range(points);
    // Written so that NaN fails the check.
    if low <= score && score <= high {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange { score, low, high })
    }
}

/* ---------------- record ---------------- */

/// One graded test.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    name: String,
    name_format: Option<Format>,
    output: Option<String>,
    output_format: Option<Format>,
    visibility: Option<Visibility>,
    scoring: Scoring,
}

impl ScoreRecord {
    /// Create a failing boolean-mode record.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        Ok(Self {
            name,
            name_format: None,
            output: None,
            output_format: None,
            visibility: None,
            scoring: Scoring::Boolean { passed: false },
        })
    }

    /// Create a record with a point budget and, optionally, an initial score.
    ///
    /// Without a score the record starts failing: its score is
    /// `min(0, points)`.
    pub fn with_budget(
        name: impl Into<String>,
        points: Option<f64>,
        score: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let mut record = Self::new(name)?;
        record.set_points(points)?;
        if let Some(score) = score {
            record.set_score(score)?;
        }
        Ok(record)
    }

    pub fn with_points(mut self, points: f64) -> Result<Self, ValidationError> {
        self.set_points(Some(points))?;
        Ok(self)
    }

    pub fn with_score(mut self, score: f64) -> Result<Self, ValidationError> {
        self.set_score(score)?;
        Ok(self)
    }

    pub fn with_passing(mut self, passed: bool) -> Self {
        self.set_passing(passed);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_name_format(mut self, format: Format) -> Self {
        self.name_format = Some(format);
        self
    }

    pub fn with_output_format(mut self, format: Format) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.set_output(output);
        self
    }

    /* ---------------- accessors ---------------- */

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_format(&self) -> Option<Format> {
        self.name_format
    }

    /// Output text, or the empty string when none was set.
    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or("")
    }

    pub fn output_format(&self) -> Option<Format> {
        self.output_format
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    /// Point budget, `None` in boolean mode.
    pub fn points(&self) -> Option<f64> {
        match self.scoring {
            Scoring::Scored { points, .. } => Some(points),
            Scoring::Boolean { .. } => None,
        }
    }

    /// Achieved score. In boolean mode this is `1.0` or `0.0`.
    pub fn score(&self) -> f64 {
        match self.scoring {
            Scoring::Scored { score, .. } => score,
            Scoring::Boolean { passed } => {
                if passed {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Whether this record contributes to the report's total score.
    pub fn is_counted(&self) -> bool {
        matches!(self.scoring, Scoring::Scored { .. })
    }

    pub fn passing(&self) -> bool {
        self.scoring.passing()
    }

    pub fn failing(&self) -> bool {
        !self.passing()
    }

    pub fn status(&self) -> Status {
        if self.passing() {
            Status::Passed
        } else {
            Status::Failed
        }
    }

    /* ---------------- validated setters ---------------- */

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    /// Set the visibility from its wire name. An empty string unsets it.
    pub fn set_visibility_str(&mut self, visibility: &str) -> Result<(), ValidationError> {
        self.visibility = if visibility.is_empty() {
            None
        } else {
            Some(visibility.parse()?)
        };
        Ok(())
    }

    pub fn set_visibility(&mut self, visibility: Option<Visibility>) {
        self.visibility = visibility;
    }

    /// Set the name format from its wire name. An empty string unsets it.
    pub fn set_name_format_str(&mut self, format: &str) -> Result<(), ValidationError> {
        self.name_format = parse_format(format)?;
        Ok(())
    }

    pub fn set_name_format(&mut self, format: Option<Format>) {
        self.name_format = format;
    }

    /// Set the output format from its wire name. An empty string unsets it.
    pub fn set_output_format_str(&mut self, format: &str) -> Result<(), ValidationError> {
        self.output_format = parse_format(format)?;
        Ok(())
    }

    pub fn set_output_format(&mut self, format: Option<Format>) {
        self.output_format = format;
    }

    pub fn set_output(&mut self, output: impl Into<String>) {
        let output = output.into();
        self.output = if output.is_empty() { None } else { Some(output) };
    }

    /// Change the point budget.
    ///
    /// - `None` or `0` switches to boolean mode; any non-zero score counts
    ///   as passed.
    /// - From boolean mode, the current pass/fail state is carried over as
    ///   `max(0, points)` or `min(0, points)`.
    /// - From scored mode, the current score must fit the new range.
    pub fn set_points(&mut self, points: Option<f64>) -> Result<(), ValidationError> {
        let points = points.unwrap_or(0.0);
        if !points.is_finite() {
            return Err(ValidationError::InvalidPoints(points));
        }

        let next = if points == 0.0 {
            Scoring::Boolean {
                passed: self.score() != 0.0,
            }
        } else {
            let (low, high) = score_range(points);
            match self.scoring {
                Scoring::Boolean { passed } => Scoring::Scored {
                    points,
                    score: if passed { high } else { low },
                },
                Scoring::Scored { score, .. } => {
                    check_range(points, score)?;
                    Scoring::Scored { points, score }
                }
            }
        };

        self.scoring = next;
        Ok(())
    }

    /// Change the achieved score.
    ///
    /// In boolean mode the value is narrowed to `score != 0`.
    pub fn set_score(&mut self, score: f64) -> Result<(), ValidationError> {
        self.scoring = match self.scoring {
            Scoring::Scored { points, .. } => {
                check_range(points, score)?;
                Scoring::Scored { points, score }
            }
            Scoring::Boolean { .. } => Scoring::Boolean {
                passed: score != 0.0,
            },
        };
        Ok(())
    }

    /// Record a score without the range check.
    ///
    /// This is how penalties are recorded: a negative score against a
    /// positive budget. In boolean mode the value is narrowed as usual.
    pub fn set_raw_score(&mut self, score: f64) {
        self.scoring = match self.scoring {
            Scoring::Scored { points, .. } => Scoring::Scored { points, score },
            Scoring::Boolean { .. } => Scoring::Boolean {
                passed: score != 0.0,
            },
        };
    }

    /// Whether a negative score was recorded against a positive budget.
    pub fn is_penalized(&self) -> bool {
        matches!(self.scoring, Scoring::Scored { points, score } if points > 0.0 && score < 0.0)
    }

    /// `true` snaps to the best valid score, `false` to the worst.
    pub fn set_passing(&mut self, passing: bool) {
        self.scoring = match self.scoring {
            Scoring::Scored { points, .. } => {
                let (low, high) = score_range(points);
                Scoring::Scored {
                    points,
                    score: if passing { high } else { low },
                }
            }
            Scoring::Boolean { .. } => Scoring::Boolean { passed: passing },
        };
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.set_passing(!failing);
    }

    /* ---------------- export ---------------- */

    /// Plain record in the grading platform's per-test schema.
    pub fn export(&self) -> TestExport {
        let mut name = self.name.clone();
        let mut score = None;
        let mut max_score = None;

        if let Scoring::Scored { points, score: s } = self.scoring {
            if self.is_penalized() {
                name.push_str(&format!(" ({})", s));
            } else if points > 0.0 {
                max_score = Some(points);
            }
            score = Some(s);
        }

        TestExport {
            name,
            status: self.status(),
            score,
            max_score,
            output: self.output.clone(),
            output_format: self.output_format,
            name_format: self.name_format,
            visibility: self.visibility,
        }
    }
}

fn parse_format(format: &str) -> Result<Option<Format>, ValidationError> {
    if format.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format.parse()?))
    }
}

/// Serialisable form of a [`ScoreRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestExport {
    pub name: String,
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}
