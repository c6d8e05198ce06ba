use serde::Serialize;
use std::fmt;

use crate::error::WorkflowError;

/// One broken contract rule, precise enough for the caller to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(expected) = &self.expected {
            write!(f, " (expected {}", expected)?;
            match &self.actual {
                Some(actual) => write!(f, ", got {})", actual)?,
                None => write!(f, ")")?,
            }
        }
        Ok(())
    }
}

/// Collector for every violation found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
            expected: None,
            actual: None,
        });
    }

    pub fn push_detail(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        });
    }

    /// Requires `value` to hold at least `min` characters after trimming.
    pub fn require_text(&mut self, field: &str, value: Option<&str>, min: usize) {
        match value {
            None => self.push_detail(
                field,
                "required field is missing",
                format!("at least {} characters", min),
                "missing",
            ),
            Some(text) => {
                let len = char_len(text);
                if len < min {
                    self.push_detail(
                        field,
                        "text is too short",
                        format!("at least {} characters", min),
                        format!("{} characters", len),
                    );
                }
            }
        }
    }

    /// Requires `count` to fall in `[min, max]`.
    pub fn require_count(&mut self, field: &str, count: usize, min: usize, max: usize) {
        if count < min || count > max {
            let expected = if min == max {
                format!("exactly {}", min)
            } else {
                format!("between {} and {}", min, max)
            };
            self.push_detail(field, "wrong number of entries", expected, count.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn extend(&mut self, other: Violations) {
        self.0.extend(other.0);
    }

    /// `Ok(value)` when nothing was collected, otherwise one aggregate error.
    pub fn into_result<T>(self, value: T) -> Result<T, WorkflowError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(WorkflowError::ContractViolation(self))
        }
    }

    pub fn finish(self) -> Result<(), WorkflowError> {
        self.into_result(())
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.0.len())?;
        for (i, violation) in self.0.iter().enumerate() {
            write!(f, "{} {}", if i == 0 { ":" } else { ";" }, violation)?;
        }
        Ok(())
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Character count after trimming surrounding whitespace.
pub fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// Quoted, comma separated list for "expected one of" messages.
pub fn one_of<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = values
        .into_iter()
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect();
    format!("one of [{}]", quoted.join(", "))
}
