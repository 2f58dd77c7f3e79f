//! Error types and result handling for counterexample search.

use std::fmt;
use std::time::Duration;

use crate::config::ConfigError;
use crate::descriptor::Descriptor;
use crate::value::Value;

/// Errors surfaced by resolution and search
#[derive(Debug, Clone)]
pub enum FalsifyError {
    /// The attempt budget was spent without a single falsifying example
    Unfalsifiable {
        predicate: String,
        attempts: usize,
        skipped: usize,
    },

    /// A strategy broke its own contract on a value it claims to own
    ContractViolation {
        descriptor: Descriptor,
        value: Option<Value>,
        reason: String,
    },

    /// No rule could resolve the descriptor
    Unresolvable { descriptor: Descriptor },

    /// A user-registered rule reported a failure while resolving
    Rule {
        descriptor: Descriptor,
        message: String,
    },

    /// The search configuration is invalid
    Config(ConfigError),
}

impl fmt::Display for FalsifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FalsifyError::Unfalsifiable {
                predicate,
                attempts,
                skipped,
            } => {
                write!(
                    f,
                    "Unable to falsify {} after {} attempts",
                    predicate, attempts
                )?;
                if *skipped > 0 {
                    write!(f, " ({} skipped: production exhausted)", skipped)?;
                }
                Ok(())
            }
            FalsifyError::ContractViolation {
                descriptor,
                value,
                reason,
            } => {
                write!(f, "Strategy for {} violated its contract: {}", descriptor, reason)?;
                if let Some(value) = value {
                    write!(f, " (value: {})", value)?;
                }
                Ok(())
            }
            FalsifyError::Unresolvable { descriptor } => {
                write!(f, "No strategy for descriptor {}", descriptor)
            }
            FalsifyError::Rule {
                descriptor,
                message,
            } => write!(f, "Rule for {} failed: {}", descriptor, message),
            FalsifyError::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl std::error::Error for FalsifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FalsifyError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for FalsifyError {
    fn from(err: ConfigError) -> Self {
        FalsifyError::Config(err)
    }
}

impl FalsifyError {
    pub fn unfalsifiable(predicate: impl Into<String>, attempts: usize, skipped: usize) -> Self {
        Self::Unfalsifiable {
            predicate: predicate.into(),
            attempts,
            skipped,
        }
    }

    pub fn contract_violation(
        descriptor: &Descriptor,
        value: Option<&Value>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ContractViolation {
            descriptor: descriptor.clone(),
            value: value.cloned(),
            reason: reason.into(),
        }
    }

    pub fn unresolvable(descriptor: &Descriptor) -> Self {
        Self::Unresolvable {
            descriptor: descriptor.clone(),
        }
    }

    pub fn rule_failed(descriptor: &Descriptor, message: impl Into<String>) -> Self {
        Self::Rule {
            descriptor: descriptor.clone(),
            message: message.into(),
        }
    }

    /// Whether this is the "no counterexample found" outcome
    pub fn is_unfalsifiable(&self) -> bool {
        matches!(self, FalsifyError::Unfalsifiable { .. })
    }
}

/// A strategy could not produce a value under the requested flags
#[derive(Debug, Clone, PartialEq)]
pub enum ProduceError {
    Exhausted {
        descriptor: Descriptor,
        reason: String,
    },
}

impl ProduceError {
    pub fn exhausted(descriptor: &Descriptor, reason: impl Into<String>) -> Self {
        Self::Exhausted {
            descriptor: descriptor.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProduceError::Exhausted { descriptor, reason } => {
                write!(f, "Production exhausted for {}: {}", descriptor, reason)
            }
        }
    }
}

impl std::error::Error for ProduceError {}

/// Why the predicate rejected an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFailure {
    pub message: String,
}

impl PropertyFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PropertyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Property failed: {}", self.message)
    }
}

/// A counterexample found and minimized by the search loop
#[derive(Debug, Clone)]
pub struct Falsified {
    /// Lowest-complexity falsifying input seen during search
    pub original: Vec<Value>,
    /// Locally minimal falsifying input after simplification
    pub minimal: Vec<Value>,
    /// Complexity of `minimal` under the argument tuple strategy
    pub complexity: f64,
    /// Failure reported by the predicate for `minimal`
    pub failure: PropertyFailure,
    /// Attempts spent in the search phase
    pub attempts: usize,
    /// Number of simplifications adopted
    pub shrink_steps: usize,
    pub search_duration: Duration,
    pub shrink_duration: Duration,
}

impl Falsified {
    /// Concise one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Falsified with {} (simplified from {} in {} steps)",
            render_args(&self.minimal),
            render_args(&self.original),
            self.shrink_steps
        )
    }

    /// Multi-line report including timing
    pub fn detailed_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("{}\n", self.failure));
        report.push_str(&format!("Minimal input: {}\n", render_args(&self.minimal)));
        report.push_str(&format!("Original input: {}\n", render_args(&self.original)));
        report.push_str(&format!("Complexity: {:.3}\n", self.complexity));
        report.push_str(&format!("Search attempts: {}\n", self.attempts));
        report.push_str(&format!("Simplification steps: {}\n", self.shrink_steps));
        report.push_str(&format!("Search time: {:?}\n", self.search_duration));
        report.push_str(&format!("Simplification time: {:?}\n", self.shrink_duration));
        report
    }
}

impl fmt::Display for Falsified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

fn render_args(args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    format!("({})", rendered.join(", "))
}
