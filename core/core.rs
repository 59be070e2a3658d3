pub mod config;
pub mod error;
pub mod gather;
pub mod output_formats;
pub mod rules;

pub use config::{Config, ExtensionFilters, FiltersConfig, OutputConfig};
pub use error::{AppError, Result, Warning};
pub use gather::{Concatenation, RecordSummary, concatenate_project};
pub use output_formats::{OutputRecord, RecordKind};
pub use rules::{Decision, EntryKind, RuleResolver, RuleSet, SkipReason, TraversalMode};
