use std::env;
use std::fs;
use std::num::NonZeroU64;
use std::path::PathBuf;
use cross_xdg::BaseDirs;
use crate::engine::EngineError;

/// Steps between two statistics reports unless configured otherwise.
pub const DEFAULT_STATS_INTERVAL: NonZeroU64 = NonZeroU64::new(10_000_000).unwrap();

/// Supported cell widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellBits {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl CellBits {
    pub fn bits(self) -> u32 {
        match self {
            CellBits::Eight => 8,
            CellBits::Sixteen => 16,
            CellBits::ThirtyTwo => 32,
        }
    }

    /// `2^bits - 1`
    pub fn max_value(self) -> i64 {
        (1i64 << self.bits()) - 1
    }
}

impl TryFrom<u32> for CellBits {
    type Error = EngineError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(CellBits::Eight),
            16 => Ok(CellBits::Sixteen),
            32 => Ok(CellBits::ThirtyTwo),
            _ => Err(EngineError::InvalidCellBits { bits }),
        }
    }
}

/// How many characters a merged `,` token consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputRepeat {
    /// Read `count` characters and keep the last one, same as `count` single reads.
    #[default]
    PerCount,
    /// Read exactly one character whatever the count.
    Once,
}

/// Immutable engine configuration, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub allow_negative_addresses: bool,
    pub allow_negative_values: bool,
    pub cell_bits: CellBits,
    pub statistics: bool,
    pub stats_interval: NonZeroU64,
    pub input_repeat: InputRepeat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_negative_addresses: true,
            allow_negative_values: false,
            cell_bits: CellBits::ThirtyTwo,
            statistics: false,
            stats_interval: DEFAULT_STATS_INTERVAL,
            input_repeat: InputRepeat::PerCount,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the four basic parameters.
    ///
    /// Fails with [`EngineError::InvalidCellBits`] unless `cell_bits` is 8, 16 or 32.
    pub fn new(
        allow_negative_addresses: bool,
        allow_negative_values: bool,
        cell_bits: u32,
        statistics: bool,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            allow_negative_addresses,
            allow_negative_values,
            cell_bits: CellBits::try_from(cell_bits)?,
            statistics,
            ..Self::default()
        })
    }

    pub fn with_stats_interval(mut self, interval: NonZeroU64) -> Self {
        self.stats_interval = interval;
        self
    }

    pub fn with_input_repeat(mut self, input_repeat: InputRepeat) -> Self {
        self.input_repeat = input_repeat;
        self
    }

    pub fn max_cell_value(&self) -> i64 {
        self.cell_bits.max_value()
    }

    /// Lowest value a cell may hold: `0`, or `-max` when negative values are allowed.
    pub fn min_cell_value(&self) -> i64 {
        if self.allow_negative_values { -self.max_cell_value() } else { 0 }
    }

    /// Number of distinct values a cell cycles through.
    pub fn value_span(&self) -> i64 {
        self.max_cell_value() - self.min_cell_value() + 1
    }

    /// Reduce `value` cyclically into `[min_cell_value, max_cell_value]`.
    pub fn wrap(&self, value: i64) -> i64 {
        let lo = self.min_cell_value();
        lo + (value - lo).rem_euclid(self.value_span())
    }
}

/// Engine settings read from the `[engine]` section of `bf.toml`.
///
/// Every field is optional; missing or malformed keys leave the base
/// configuration untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub negative_addresses: Option<bool>,
    pub negative_values: Option<bool>,
    pub cell_bits: Option<CellBits>,
    pub statistics: Option<bool>,
    pub stats_interval: Option<NonZeroU64>,
    pub input_repeat: Option<InputRepeat>,
}

impl FileConfig {
    pub fn apply(&self, mut base: EngineConfig) -> EngineConfig {
        if let Some(v) = self.negative_addresses { base.allow_negative_addresses = v; }
        if let Some(v) = self.negative_values { base.allow_negative_values = v; }
        if let Some(v) = self.cell_bits { base.cell_bits = v; }
        if let Some(v) = self.statistics { base.statistics = v; }
        if let Some(v) = self.stats_interval { base.stats_interval = v; }
        if let Some(v) = self.input_repeat { base.input_repeat = v; }
        base
    }
}

/// Location of the config file: `$BF_CONFIG` if set, else `bf.toml` in the
/// XDG config home.
pub fn config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(p));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Read and parse the config file, if there is one.
pub fn load_file_config() -> Option<(PathBuf, FileConfig)> {
    let path = config_path()?;
    let content = fs::read_to_string(&path).ok()?;
    Some((path, parse_file_config(&content)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_input_repeat(value: &str) -> Option<InputRepeat> {
    match value.to_ascii_lowercase().as_str() {
        "once" => Some(InputRepeat::Once),
        "per-count" | "per_count" | "count" => Some(InputRepeat::PerCount),
        _ => None,
    }
}

/// Very small line parser: look for the `[engine]` section and `key = value`
/// pairs inside it. Values may be quoted.
pub fn parse_file_config(content: &str) -> FileConfig {
    let mut in_engine = false;
    let mut cfg = FileConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_engine = &line[1..line.len() - 1] == "engine";
            continue;
        }
        if !in_engine { continue; }

        let Some((key, raw)) = line.split_once('=') else { continue };
        let key = key.trim();
        let raw = raw.trim();
        let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            &raw[1..raw.len() - 1]
        } else {
            raw
        };

        match key {
            "negative_addresses" => cfg.negative_addresses = parse_bool(value).or(cfg.negative_addresses),
            "negative_values" => cfg.negative_values = parse_bool(value).or(cfg.negative_values),
            "cell_bits" => {
                if let Some(bits) = value.parse::<u32>().ok().and_then(|b| CellBits::try_from(b).ok()) {
                    cfg.cell_bits = Some(bits);
                }
            }
            "statistics" => cfg.statistics = parse_bool(value).or(cfg.statistics),
            "stats_interval" => {
                if let Some(n) = value.parse::<u64>().ok().and_then(NonZeroU64::new) {
                    cfg.stats_interval = Some(n);
                }
            }
            "input" => cfg.input_repeat = parse_input_repeat(value).or(cfg.input_repeat),
            _ => {}
        }
    }

    cfg
}
