//! Configuration types for controlling the search budget and size schedule.

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid number of attempts (must be > 0)
    InvalidAttempts(usize),
    /// Invalid number of simplification rounds (must be > 0)
    InvalidSimplifyRounds(usize),
    /// The size schedule has no entries
    EmptySchedule,
    /// A size is negative or not finite
    InvalidSize(f64),
    /// The size schedule decreases at the given index
    NonAscendingSchedule(usize),
    /// Invalid thread count (must be > 0)
    InvalidThreads(usize),
    /// The option key is not recognized
    UnknownOption(String),
    /// The option value could not be parsed
    InvalidValue { option: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidAttempts(n) => {
                write!(f, "Invalid attempts count: {} (must be > 0)", n)
            }
            ConfigError::InvalidSimplifyRounds(n) => {
                write!(f, "Invalid simplify rounds: {} (must be > 0)", n)
            }
            ConfigError::EmptySchedule => write!(f, "Size schedule must not be empty"),
            ConfigError::InvalidSize(size) => {
                write!(f, "Invalid size: {} (must be finite and >= 0)", size)
            }
            ConfigError::NonAscendingSchedule(idx) => {
                write!(f, "Size schedule decreases at index {}", idx)
            }
            ConfigError::InvalidThreads(n) => {
                write!(f, "Invalid thread count: {} (must be > 0)", n)
            }
            ConfigError::UnknownOption(key) => write!(f, "Unknown option: {}", key),
            ConfigError::InvalidValue { option, value } => {
                write!(f, "Invalid value for {}: {:?}", option, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Default ascending size schedule
pub const DEFAULT_SIZE_SCHEDULE: [f64; 11] =
    [0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0];

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "FALSIFY_";

/// Configuration for parallel search attempts
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    /// Number of worker threads
    pub num_threads: usize,
    /// Whether to spread attempts across workers
    pub enabled: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            enabled: false,
        }
    }
}

impl ParallelConfig {
    /// Parallel search on every available core
    pub fn all_cores() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            enabled: true,
        }
    }
}

/// Configuration for one falsification run
#[derive(Debug, Clone, PartialEq)]
pub struct FalsifyConfig {
    /// Number of produce-and-evaluate attempts in the search phase
    pub max_attempts: usize,
    /// Ascending sizes; each gets an equal share of the attempts
    pub size_schedule: Vec<f64>,
    /// Maximum number of adopted simplifications
    pub max_simplify_rounds: usize,
    /// Optional seed for reproducible runs
    pub seed: Option<u64>,
    pub parallel: ParallelConfig,
}

impl Default for FalsifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 200,
            size_schedule: DEFAULT_SIZE_SCHEDULE.to_vec(),
            max_simplify_rounds: 2000,
            seed: None,
            parallel: ParallelConfig::default(),
        }
    }
}

impl FalsifyConfig {
    /// Create a new configuration with validation
    pub fn new(
        max_attempts: usize,
        size_schedule: Vec<f64>,
        max_simplify_rounds: usize,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_attempts,
            size_schedule,
            max_simplify_rounds,
            seed,
            parallel: ParallelConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts(self.max_attempts));
        }
        if self.max_simplify_rounds == 0 {
            return Err(ConfigError::InvalidSimplifyRounds(self.max_simplify_rounds));
        }
        if self.size_schedule.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        for (idx, size) in self.size_schedule.iter().enumerate() {
            if !size.is_finite() || *size < 0.0 {
                return Err(ConfigError::InvalidSize(*size));
            }
            if idx > 0 && *size < self.size_schedule[idx - 1] {
                return Err(ConfigError::NonAscendingSchedule(idx));
            }
        }
        if self.parallel.enabled && self.parallel.num_threads == 0 {
            return Err(ConfigError::InvalidThreads(0));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_size_schedule(mut self, size_schedule: Vec<f64>) -> Self {
        self.size_schedule = size_schedule;
        self
    }

    pub fn with_max_simplify_rounds(mut self, max_simplify_rounds: usize) -> Self {
        self.max_simplify_rounds = max_simplify_rounds;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// The size used for attempt `attempt` out of `max_attempts`
    pub fn size_for_attempt(&self, attempt: usize) -> f64 {
        let len = self.size_schedule.len();
        let idx = (attempt * len / self.max_attempts.max(1)).min(len - 1);
        self.size_schedule[idx]
    }

    /// Apply a single `key = value` option
    ///
    /// Recognized keys: `max_attempts`, `size_schedule` (comma separated),
    /// `max_simplify_rounds`, `seed`, `threads` (enables parallel search).
    pub fn apply_option(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            option: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();
        match key.trim() {
            "max_attempts" => self.max_attempts = value.parse().map_err(|_| invalid())?,
            "max_simplify_rounds" => {
                self.max_simplify_rounds = value.parse().map_err(|_| invalid())?
            }
            "seed" => self.seed = Some(value.parse().map_err(|_| invalid())?),
            "threads" => {
                self.parallel = ParallelConfig::with_threads(value.parse().map_err(|_| invalid())?)
            }
            "size_schedule" => {
                self.size_schedule = value
                    .split(',')
                    .map(|part| part.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid())?
            }
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        Ok(())
    }

    /// Build a validated configuration from `(key, value)` pairs over the defaults
    pub fn from_options<'a, I>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, value) in options {
            config.apply_option(key, value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Build a validated configuration from a variable lookup
    ///
    /// Each recognized option is looked up as `FALSIFY_<OPTION>` in upper case.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        for key in [
            "max_attempts",
            "size_schedule",
            "max_simplify_rounds",
            "seed",
            "threads",
        ] {
            let variable = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&variable) {
                config.apply_option(key, &value)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Build a validated configuration from `FALSIFY_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = FalsifyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_attempts, 200);
        assert_eq!(config.max_simplify_rounds, 2000);
        assert!(config.seed.is_none());
        assert!(!config.parallel.enabled);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            FalsifyConfig::new(0, vec![1.0], 10, None),
            Err(ConfigError::InvalidAttempts(0))
        );
        assert_eq!(
            FalsifyConfig::new(10, vec![1.0], 0, None),
            Err(ConfigError::InvalidSimplifyRounds(0))
        );
        assert_eq!(
            FalsifyConfig::new(10, vec![], 10, None),
            Err(ConfigError::EmptySchedule)
        );
        assert_eq!(
            FalsifyConfig::new(10, vec![0.0, 4.0, 2.0], 10, None),
            Err(ConfigError::NonAscendingSchedule(2))
        );
        assert_eq!(
            FalsifyConfig::new(10, vec![-1.0], 10, None),
            Err(ConfigError::InvalidSize(-1.0))
        );
        let parallel = FalsifyConfig::default().with_parallel(ParallelConfig::with_threads(0));
        assert_eq!(parallel.validate(), Err(ConfigError::InvalidThreads(0)));
    }

    #[test]
    fn test_size_for_attempt_is_ascending() {
        let config = FalsifyConfig::default()
            .with_max_attempts(10)
            .with_size_schedule(vec![0.0, 5.0]);
        let sizes: Vec<f64> = (0..10).map(|i| config.size_for_attempt(i)).collect();
        assert_eq!(&sizes[..5], &[0.0; 5]);
        assert_eq!(&sizes[5..], &[5.0; 5]);

        let few = FalsifyConfig::default().with_max_attempts(3);
        assert_eq!(few.size_for_attempt(0), 0.0);
        assert_eq!(few.size_for_attempt(2), 24.0);
    }

    #[test]
    fn test_from_options() {
        let config = FalsifyConfig::from_options([
            ("max_attempts", "500"),
            ("size_schedule", "0, 2, 8"),
            ("max_simplify_rounds", "50"),
            ("seed", "42"),
        ])
        .unwrap();
        assert_eq!(config.max_attempts, 500);
        assert_eq!(config.size_schedule, vec![0.0, 2.0, 8.0]);
        assert_eq!(config.max_simplify_rounds, 50);
        assert_eq!(config.seed, Some(42));

        assert_eq!(
            FalsifyConfig::from_options([("budget", "1")]),
            Err(ConfigError::UnknownOption("budget".to_string()))
        );
        assert!(matches!(
            FalsifyConfig::from_options([("max_attempts", "lots")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            FalsifyConfig::from_options([("size_schedule", "4,1")]),
            Err(ConfigError::NonAscendingSchedule(1))
        );
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [("FALSIFY_MAX_ATTEMPTS", "64"), ("FALSIFY_THREADS", "2")]
            .into_iter()
            .collect();
        let config =
            FalsifyConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.max_attempts, 64);
        assert_eq!(config.parallel, ParallelConfig::with_threads(2));
        assert_eq!(config.size_schedule, DEFAULT_SIZE_SCHEDULE.to_vec());
    }
}
