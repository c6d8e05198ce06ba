//! Closed enums of the workflow contract and the size policies derived
//! from how many universities are in play.
//!
//! Every enum parses exactly: `"Conservative"` or `"high "` are rejected.

use offeri_core::WorkflowConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Conservative,
    Aggressive,
}

impl Strategy {
    pub const NAMES: [&'static str; 2] = ["conservative", "aggressive"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "conservative" => Some(Self::Conservative),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
        }
    }

    /// Target mix of competitiveness bands, in percent.
    pub fn ratios(&self) -> StrategyRatios {
        match self {
            Self::Conservative => StrategyRatios {
                lottery: 10,
                reach: 30,
                target: 40,
                safety: 20,
            },
            Self::Aggressive => StrategyRatios {
                lottery: 20,
                reach: 40,
                target: 30,
                safety: 10,
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percent split across long-shot (lottery), reach, target and safety picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StrategyRatios {
    pub lottery: u8,
    pub reach: u8,
    pub target: u8,
    pub safety: u8,
}

impl StrategyRatios {
    /// Suggested number of picks per band for `total` programs.
    /// Rounding remainders go to the target band so the sum equals `total`.
    pub fn apply(&self, total: usize) -> TierCounts {
        let share = |pct: u8| (total * pct as usize) / 100;
        let lottery = share(self.lottery);
        let reach = share(self.reach);
        let safety = share(self.safety);
        let target = total.saturating_sub(lottery + reach + safety);
        TierCounts {
            lottery,
            reach,
            target,
            safety,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub lottery: usize,
    pub reach: usize,
    pub target: usize,
    pub safety: usize,
}

/// Caller-declared confidence about the student's career direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CareerClarity {
    High,
    Medium,
    Low,
}

impl CareerClarity {
    pub const NAMES: [&'static str; 3] = ["high", "medium", "low"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// `(reputation_weight, fit_weight)`
    pub fn weights(&self) -> ScoreWeights {
        let (reputation, fit) = match self {
            Self::High => (0.3, 0.7),
            Self::Medium => (0.5, 0.5),
            Self::Low => (0.7, 0.3),
        };
        ScoreWeights { reputation, fit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub reputation: f64,
    pub fit: f64,
}

/// Research section a detailed-tier search must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchSection {
    Curriculum,
    Admissions,
    Outcomes,
}

impl ResearchSection {
    pub const ALL: [ResearchSection; 3] = [Self::Curriculum, Self::Admissions, Self::Outcomes];
    pub const NAMES: [&'static str; 3] = ["curriculum", "admissions", "outcomes"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "curriculum" => Some(Self::Curriculum),
            "admissions" => Some(Self::Admissions),
            "outcomes" => Some(Self::Outcomes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curriculum => "curriculum",
            Self::Admissions => "admissions",
            Self::Outcomes => "outcomes",
        }
    }
}

/// How many programs the final report covers, split by depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScale {
    pub university_count: usize,
    pub detailed: usize,
    pub concise: usize,
}

impl ReportScale {
    pub fn for_universities(university_count: usize, config: &WorkflowConfig) -> Self {
        let (detailed, concise) = if university_count >= config.large_report_threshold {
            (config.large_report_detailed, config.large_report_concise)
        } else {
            (config.small_report_detailed, config.small_report_concise)
        };
        Self {
            university_count,
            detailed,
            concise,
        }
    }

    pub fn total(&self) -> usize {
        self.detailed + self.concise
    }
}

/// Smallest final selection that still fills the report for this many universities.
pub fn minimum_final_count(university_count: usize, config: &WorkflowConfig) -> usize {
    ReportScale::for_universities(university_count, config).total()
}
