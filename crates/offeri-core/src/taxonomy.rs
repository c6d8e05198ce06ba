//! Fixed field-of-study taxonomy used to pre-filter programs.
//!
//! Names are matched exactly: no case folding, no trimming.

pub const CLASSIFICATIONS: [&str; 15] = [
    "Computer Science & IT",
    "Engineering",
    "Business & Management",
    "Economics & Finance",
    "Data Science & Analytics",
    "Mathematics & Statistics",
    "Natural Sciences",
    "Medicine & Health",
    "Social Sciences",
    "Law",
    "Education",
    "Arts & Design",
    "Humanities",
    "Media & Communication",
    "Environment & Agriculture",
];

pub fn is_classification(name: &str) -> bool {
    CLASSIFICATIONS.contains(&name)
}

pub fn classification_names() -> Vec<String> {
    CLASSIFICATIONS.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn taxonomy_has_fifteen_unique_entries() {
        let unique: HashSet<_> = CLASSIFICATIONS.iter().collect();
        assert_eq!(unique.len(), 15);
    }

    #[test]
    fn membership_is_exact() {
        assert!(is_classification("Law"));
        assert!(!is_classification("law"));
        assert!(!is_classification(" Law"));
        assert!(!is_classification("Law "));
    }
}
