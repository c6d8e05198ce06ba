//! Token-gated consultation workflow.
//!
//! Seven steps, each issuing an opaque continuation token that the next
//! step must present. The [`engine::WorkflowEngine`] owns the chain; the
//! validators are pure and report every broken rule at once.

pub mod collaborators;
pub mod debug_logger;
pub mod engine;
pub mod error;
pub mod payload;
pub mod policy;
pub mod requests;
pub mod research;
pub mod responses;
pub mod scoring;
pub mod token_store;
pub mod validators;
pub mod violation;

pub use collaborators::{
    CompletionSummary, NoopUsageMeter, ProgramCatalog, QuotaDecision, QuotaGate, UnmeteredQuota,
    UsageMeter,
};
pub use debug_logger::DebugLogger;
pub use engine::{BuildError, WorkflowEngine, WorkflowEngineBuilder};
pub use error::{Result, WorkflowError};
pub use payload::{StepKind, StepPayload};
pub use policy::{CareerClarity, ReportScale, ResearchSection, ScoreWeights, Strategy, StrategyRatios};
pub use requests::*;
pub use research::{ResearchRecord, ResearchSearch};
pub use responses::*;
pub use scoring::{KeywordReputation, ReputationLookup};
pub use token_store::{InMemoryTokenStore, TokenStore};
pub use violation::{Violation, Violations};
