//! Pure contract checks for each workflow step.
//!
//! Validators never touch the token store or collaborators. Each one
//! collects every violation in a submission and returns a single
//! aggregate error.

pub mod analysis;
pub mod classification;
pub mod final_selection;
pub mod program_filter;
pub mod report;
pub mod selection;

use std::collections::HashSet;
use std::hash::Hash;

use crate::violation::Violations;

/// Exactly one of two chaining tokens must be supplied.
pub fn exactly_one_token<'a>(
    first_field: &str,
    first: Option<&'a str>,
    second_field: &str,
    second: Option<&'a str>,
    violations: &mut Violations,
) -> Option<ChainToken<'a>> {
    match (first, second) {
        (Some(token), None) => Some(ChainToken::First(token)),
        (None, Some(token)) => Some(ChainToken::Second(token)),
        (Some(_), Some(_)) => {
            violations.push(
                format!("{first_field}/{second_field}"),
                format!("supply only one of {first_field} or {second_field}"),
            );
            None
        }
        (None, None) => {
            violations.push(
                format!("{first_field}/{second_field}"),
                format!(
                    "{first_field} is required on the first call, {second_field} on every later call"
                ),
            );
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainToken<'a> {
    First(&'a str),
    Second(&'a str),
}

/// Values that occur more than once, in first-repeat order.
pub fn duplicates<T>(values: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut repeated = Vec::new();
    for value in values {
        if !seen.insert(value) && reported.insert(value) {
            repeated.push(value.clone());
        }
    }
    repeated
}
