use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{format::LoggerFormat, level::LoggerLevel, timer::LoggerTimeZone};

/// Logger settings, usually embedded in the simulation config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` expression, e.g. `"info"` or `"atc_core=debug,info"`.
    pub level: LoggerLevel,
    /// Timezone of the RFC3339 timestamps.
    pub tz: LoggerTimeZone,
    /// Print module paths next to each line.
    pub with_targets: bool,
    /// ANSI colors for text output; ignored when stdout is not a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: false,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Colors are used only when requested and stdout is a terminal.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
