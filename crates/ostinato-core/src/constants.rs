/// Engine constants shared across crates

/// Number of consecutive candidate years a rule may produce without yielding
/// an instance before iteration is abandoned.
pub const DEFAULT_MAX_UNPRODUCTIVE_YEARS: u32 = 100;

/// Number of generator steps allowed while positioning an iterator on its
/// first candidate.
pub const DEFAULT_MAX_PRIMING_STEPS: u32 = 1000;

/// Largest year any generator will emit.
pub const MAX_YEAR: i32 = 9999;

pub const ENV_PREFIX: &str = "OSTINATO";
pub const CONFIG_FILE_STEM: &str = "ostinato";
pub const CONFIG_FILE: &str = const_str::concat!(CONFIG_FILE_STEM, ".toml");
