use std::path::{Path, PathBuf};

use crate::diagnostic::Violation;

/// File name searched for by [`SynthConfig::find`].
pub const CONFIG_FILE: &str = "synth.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "BRACKET_SYNTH_CONFIG";

/// Knobs for the construction algorithms and the built-in interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthConfig {
    /// Derive an uncached character by indexing into a cached text value
    /// that contains it.
    pub letter_fallback: bool,
    /// Register letters derived through the fallback for later reuse.
    pub register_derived: bool,
    /// Nesting limit of the interpreter's parser.
    pub max_depth: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            letter_fallback: true,
            register_derived: true,
            max_depth: 256,
        }
    }
}

impl SynthConfig {
    /// Load configuration from a `synth.toml` file.
    pub fn load(toml_path: &Path) -> Result<SynthConfig, Violation> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Violation::config(format!("cannot read '{}': {}", toml_path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| e.with_note(format!("while loading '{}'", toml_path.display())))
    }

    /// Parse configuration text.
    ///
    /// Minimal TOML: `key = value` lines under an optional `[synth]` header,
    /// `#` comments. Other sections are skipped.
    pub fn parse(content: &str) -> Result<SynthConfig, Violation> {
        let mut config = SynthConfig::default();
        let mut in_synth = true;

        for (lineno, line) in content.lines().enumerate() {
            let trimmed = line.split('#').next().unwrap_or("").trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') {
                in_synth = trimmed == "[synth]";
                continue;
            }
            if !in_synth {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(Violation::config(format!(
                    "line {}: expected `key = value`",
                    lineno + 1
                )));
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim().trim_matches('"');
            match key {
                "letter_fallback" => config.letter_fallback = parse_bool(key, value)?,
                "register_derived" => config.register_derived = parse_bool(key, value)?,
                "max_depth" => {
                    config.max_depth = value.parse().map_err(|_| {
                        Violation::config(format!(
                            "'max_depth' must be a non-negative integer, got '{}'",
                            value
                        ))
                    })?;
                }
                _ => {
                    return Err(Violation::config(format!("unknown key '{}'", key)).with_help(
                        "known keys: letter_fallback, register_derived, max_depth".to_string(),
                    ));
                }
            }
        }

        Ok(config)
    }

    /// Try to find a `synth.toml` in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Resolve configuration for the current process.
    /// Search order:
    ///   1. BRACKET_SYNTH_CONFIG environment variable
    ///   2. `synth.toml` in the working directory or an ancestor
    ///   3. built-in defaults
    pub fn discover() -> Result<SynthConfig, Violation> {
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&p));
        }
        if let Ok(cwd) = std::env::current_dir() {
            if let Some(path) = Self::find(&cwd) {
                return Self::load(&path);
            }
        }
        Ok(SynthConfig::default())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Violation> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Violation::config(format!(
            "'{}' must be true or false, got '{}'",
            key, value
        ))),
    }
}
