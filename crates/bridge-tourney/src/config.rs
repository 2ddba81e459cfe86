use bridge_bot::BotStyle;
use bridge_core::model::ids::PairId;
use bridge_core::movement::{BoardInventory, schedule_movement};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const NAME_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root tournament configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TournamentConfig {
    pub run_id: String,
    pub tournament: TournamentBlock,
    pub pairs: Vec<PairConfig>,
    #[serde(default)]
    pub bots: BotsConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TournamentConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: TournamentConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_name("run_id", &self.run_id)?;
        self.tournament.validate()?;
        self.bots.validate()?;
        validate_pairs(&self.pairs)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();

        // Surface movement problems (board counts, table counts) before any hand is dealt.
        let ids: Vec<PairId> = self.pairs.iter().map(|p| PairId::new(&p.name)).collect();
        schedule_movement(
            &ids,
            BoardInventory {
                total_boards: self.tournament.total_boards,
            },
            self.tournament.boards_per_round,
        )
        .map_err(|err| ValidationError::InvalidField {
            field: "tournament".to_string(),
            message: err.to_string(),
        })?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            results_jsonl: resolve_template(&self.run_id, &self.outputs.results_jsonl),
            standings_md: resolve_template(&self.run_id, &self.outputs.standings_md),
            event_log: self
                .outputs
                .event_log
                .as_deref()
                .map(|template| resolve_template(&self.run_id, template)),
        }
    }

    /// Bot style for `pair`, falling back to the table-wide default.
    pub fn style_for(&self, pair: &PairConfig) -> BotStyle {
        pair.style
            .as_deref()
            .unwrap_or(&self.bots.style)
            .parse()
            .unwrap_or_default()
    }
}

/// Tournament identity and board settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TournamentBlock {
    pub id: String,
    pub secret: String,
    pub total_boards: u32,
    pub boards_per_round: u32,
    /// Delay between bot actions, in milliseconds.
    #[serde(default)]
    pub tempo_ms: u64,
}

impl TournamentBlock {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_name("tournament.id", &self.id)?;
        if self.secret.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "tournament.secret".to_string(),
                message: "secret must not be empty".to_string(),
            });
        }
        if self.total_boards == 0 {
            return Err(ValidationError::InvalidField {
                field: "tournament.total_boards".to_string(),
                message: "total boards must be greater than zero".to_string(),
            });
        }
        if self.boards_per_round == 0 {
            return Err(ValidationError::InvalidField {
                field: "tournament.boards_per_round".to_string(),
                message: "boards per round must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PairConfig {
    pub name: String,
    pub players: [String; 2],
    /// Overrides `bots.style` for this pair.
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BotsConfig {
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for BotsConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
        }
    }
}

impl BotsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.style
            .parse::<BotStyle>()
            .map(|_| ())
            .map_err(|message| ValidationError::InvalidField {
                field: "bots.style".to_string(),
                message,
            })
    }
}

fn default_style() -> String {
    BotStyle::default().as_str().to_string()
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub results_jsonl: String,
    pub standings_md: String,
    /// Append-only action log; hands are kept in memory when absent.
    #[serde(default)]
    pub event_log: Option<String>,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let mut paths = vec![
            ("outputs.results_jsonl", &self.results_jsonl),
            ("outputs.standings_md", &self.standings_md),
        ];
        if let Some(event_log) = self.event_log.as_ref() {
            paths.push(("outputs.event_log", event_log));
        }
        for (label, value) in paths {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: format!("{field} must not be empty"),
        });
    }

    if !value.chars().all(|c| NAME_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: format!(
                "{field} may only contain alphanumeric characters, '.', '_' or '-'"
            ),
        });
    }

    Ok(())
}

fn validate_pairs(pairs: &[PairConfig]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    let mut players = HashSet::new();
    for (index, pair) in pairs.iter().enumerate() {
        validate_name(&format!("pairs[{index}].name"), &pair.name)?;
        if !names.insert(pair.name.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "pairs".to_string(),
                message: format!("pair name '{}' defined more than once", pair.name),
            });
        }

        for player in &pair.players {
            if player.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: format!("pairs[{}].players", pair.name),
                    message: "player name must not be empty".to_string(),
                });
            }
            if !players.insert(player.as_str()) {
                return Err(ValidationError::InvalidField {
                    field: format!("pairs[{}].players", pair.name),
                    message: format!("player '{player}' appears in more than one seat"),
                });
            }
        }

        if let Some(style) = pair.style.as_deref() {
            style
                .parse::<BotStyle>()
                .map_err(|message| ValidationError::InvalidField {
                    field: format!("pairs[{}].style", pair.name),
                    message,
                })?;
        }
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub results_jsonl: PathBuf,
    pub standings_md: PathBuf,
    pub event_log: Option<PathBuf>,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
