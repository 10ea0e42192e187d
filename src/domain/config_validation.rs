//! Configuration validation and typed settings.
//!
//! Every reader here returns the first violation it finds as
//! `ConfigInvalid` or `ConfigMissing`. Empty values count as absent.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::domain::auxiliary::DEFAULT_SECTOR_WEIGHTS;
use crate::domain::ensemble::{Breakpoints, Composition, EnsembleConfig};
use crate::domain::error::VotecastError;
use crate::domain::forest::ForestConfig;
use crate::domain::models::MlVariant;
use crate::ports::config_port::ConfigPort;

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Where series come from and which symbols to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub directory: PathBuf,
    pub primary: String,
    pub vix: Option<String>,
    pub sectors: Vec<(String, f64)>,
    pub cache_ttl: Duration,
}

/// Backtest range as configured; either end may be left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub parallel: bool,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), VotecastError> {
    data_settings_from(config)?;
    ensemble_config_from(config)?;
    backtest_settings_from(config)?;
    Ok(())
}

pub fn data_settings_from(config: &dyn ConfigPort) -> Result<DataSettings, VotecastError> {
    let directory = required_string(config, "data", "directory")?;
    let primary = required_string(config, "data", "primary")?;
    let vix = non_empty(config, "data", "vix");
    let sectors = match non_empty(config, "data", "sectors") {
        Some(list) => parse_sectors(&list)?,
        None => Vec::new(),
    };
    let ttl: u64 = parse_value(config, "data", "cache_ttl_secs")?.unwrap_or(DEFAULT_CACHE_TTL_SECS);

    Ok(DataSettings {
        directory: PathBuf::from(directory),
        primary: primary.to_uppercase(),
        vix: vix.map(|v| v.to_uppercase()),
        sectors,
        cache_ttl: Duration::from_secs(ttl),
    })
}

pub fn ensemble_config_from(config: &dyn ConfigPort) -> Result<EnsembleConfig, VotecastError> {
    let defaults = EnsembleConfig::default();
    let forest_defaults = ForestConfig::default();

    let composition = match non_empty(config, "ensemble", "composition") {
        Some(s) => s
            .parse::<Composition>()
            .map_err(|reason| invalid("ensemble", "composition", reason))?,
        None => defaults.composition,
    };
    let ml_variant = match non_empty(config, "ensemble", "ml_variant") {
        Some(s) => parse_ml_variant(&s)?,
        None => defaults.ml_variant,
    };

    let n_trees = positive(config, "ensemble", "ml_trees", forest_defaults.n_trees)?;
    let max_depth = positive(config, "ensemble", "ml_max_depth", forest_defaults.max_depth)?;
    let seed: u64 = parse_value(config, "ensemble", "ml_seed")?.unwrap_or(forest_defaults.seed);
    let garch_max_iterations = positive(
        config,
        "ensemble",
        "garch_max_iterations",
        defaults.garch_max_iterations,
    )?;

    let buy: Option<i32> = parse_value(config, "ensemble", "buy_threshold")?;
    let strong: Option<i32> = parse_value(config, "ensemble", "strong_threshold")?;
    let breakpoints = match (buy, strong) {
        (None, None) => None,
        (Some(buy), Some(strong)) => Some(Breakpoints::new(buy, strong).ok_or_else(|| {
            invalid(
                "ensemble",
                "buy_threshold",
                "thresholds must satisfy 0 < buy_threshold < strong_threshold",
            )
        })?),
        (Some(_), None) => return Err(missing("ensemble", "strong_threshold")),
        (None, Some(_)) => return Err(missing("ensemble", "buy_threshold")),
    };

    Ok(EnsembleConfig {
        composition,
        ml_variant,
        forest: ForestConfig {
            n_trees,
            max_depth,
            seed,
            ..forest_defaults
        },
        garch_max_iterations,
        parallel: config.get_bool("ensemble", "parallel", defaults.parallel),
        breakpoints,
    })
}

pub fn backtest_settings_from(config: &dyn ConfigPort) -> Result<BacktestSettings, VotecastError> {
    let start_date = non_empty(config, "backtest", "start_date")
        .map(|s| parse_date(&s, "start_date"))
        .transpose()?;
    let end_date = non_empty(config, "backtest", "end_date")
        .map(|s| parse_date(&s, "end_date"))
        .transpose()?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(BacktestSettings {
        start_date,
        end_date,
        parallel: config.get_bool("backtest", "parallel", true),
    })
}

/// Parse `YYYY-MM-DD` for the backtest section.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, VotecastError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            "backtest",
            field,
            format!("invalid {} format, expected YYYY-MM-DD", field),
        )
    })
}

fn parse_ml_variant(value: &str) -> Result<MlVariant, VotecastError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "basic" => Ok(MlVariant::Basic),
        "enhanced" => Ok(MlVariant::Enhanced),
        other => Err(invalid(
            "ensemble",
            "ml_variant",
            format!("unknown ml_variant '{}', expected basic or enhanced", other),
        )),
    }
}

/// `SYM:weight` entries separated by commas. A bare symbol takes its
/// default weight if it has one.
fn parse_sectors(list: &str) -> Result<Vec<(String, f64)>, VotecastError> {
    let mut sectors: Vec<(String, f64)> = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, weight) = match entry.split_once(':') {
            Some((symbol, weight)) => {
                let weight = weight.trim().parse::<f64>().map_err(|_| {
                    invalid("data", "sectors", format!("invalid weight in '{}'", entry))
                })?;
                (symbol.trim().to_uppercase(), weight)
            }
            None => {
                let symbol = entry.to_uppercase();
                let weight = DEFAULT_SECTOR_WEIGHTS
                    .iter()
                    .find(|(s, _)| *s == symbol)
                    .map(|(_, w)| *w)
                    .ok_or_else(|| {
                        invalid("data", "sectors", format!("no weight given for '{}'", entry))
                    })?;
                (symbol, weight)
            }
        };
        if symbol.is_empty() {
            return Err(invalid("data", "sectors", format!("empty symbol in '{}'", entry)));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(invalid(
                "data",
                "sectors",
                format!("weight for {} must be positive", symbol),
            ));
        }
        if sectors.iter().any(|(s, _)| *s == symbol) {
            return Err(invalid("data", "sectors", format!("{} listed twice", symbol)));
        }
        sectors.push((symbol, weight));
    }
    Ok(sectors)
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, VotecastError> {
    let value: i64 = match parse_value(config, section, key)? {
        Some(v) => v,
        None => return Ok(default),
    };
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{} is too large", key)))
}

fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, VotecastError> {
    non_empty(config, section, key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| invalid(section, key, format!("'{}' is not a valid {}", raw, key)))
        })
        .transpose()
}

fn required_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, VotecastError> {
    non_empty(config, section, key).ok_or_else(|| missing(section, key))
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> VotecastError {
    VotecastError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> VotecastError {
    VotecastError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\ndirectory = ./data\nprimary = spy\n";

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[data]
directory = ./data
primary = SPY
vix = VIX
sectors = XLK:0.30,XLF:0.13,XLE:0.04
cache_ttl_secs = 600

[ensemble]
composition = full
ml_variant = enhanced
ml_trees = 50
ml_max_depth = 4
ml_seed = 7
garch_max_iterations = 300
parallel = false

[backtest]
start_date = 2023-01-01
end_date = 2023-12-31
"#,
        );
        assert!(validate_config(&config).is_ok());

        let data = data_settings_from(&config).unwrap();
        assert_eq!(data.vix.as_deref(), Some("VIX"));
        assert_eq!(data.sectors.len(), 3);
        assert_eq!(data.cache_ttl, Duration::from_secs(600));

        let ensemble = ensemble_config_from(&config).unwrap();
        assert_eq!(ensemble.ml_variant, MlVariant::Enhanced);
        assert_eq!(ensemble.forest.n_trees, 50);
        assert_eq!(ensemble.forest.max_depth, 4);
        assert_eq!(ensemble.forest.seed, 7);
        assert_eq!(ensemble.garch_max_iterations, 300);
        assert!(!ensemble.parallel);
    }

    #[test]
    fn minimal_config_takes_defaults() {
        let config = make_config(DATA);
        let data = data_settings_from(&config).unwrap();
        assert_eq!(data.primary, "SPY");
        assert_eq!(data.vix, None);
        assert!(data.sectors.is_empty());
        assert_eq!(data.cache_ttl, Duration::from_secs(3600));
        assert_eq!(ensemble_config_from(&config).unwrap(), EnsembleConfig::default());
        let bt = backtest_settings_from(&config).unwrap();
        assert_eq!((bt.start_date, bt.end_date), (None, None));
    }

    #[test]
    fn missing_primary_fails() {
        let config = make_config("[data]\ndirectory = ./data\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigMissing { key, .. } if key == "primary"));
    }

    #[test]
    fn missing_directory_fails() {
        let config = make_config("[data]\nprimary = SPY\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigMissing { key, .. } if key == "directory"));
    }

    #[test]
    fn sector_weight_must_be_positive() {
        let config = make_config(&format!("{}sectors = XLK:0.3,XLF:-1\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "sectors"));
    }

    #[test]
    fn bare_sector_uses_default_weight() {
        let config = make_config(&format!("{}sectors = xle, XLB:0.02\n", DATA));
        let data = data_settings_from(&config).unwrap();
        assert_eq!(
            data.sectors,
            vec![("XLE".to_string(), 0.04), ("XLB".to_string(), 0.02)]
        );
    }

    #[test]
    fn unknown_bare_sector_fails() {
        let config = make_config(&format!("{}sectors = XLB\n", DATA));
        assert!(data_settings_from(&config).is_err());
    }

    #[test]
    fn duplicate_sector_fails() {
        let config = make_config(&format!("{}sectors = XLK:0.3,xlk:0.2\n", DATA));
        assert!(data_settings_from(&config).is_err());
    }

    #[test]
    fn unknown_composition_fails() {
        let config = make_config(&format!("{}[ensemble]\ncomposition = most\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "composition"));
    }

    #[test]
    fn unknown_ml_variant_fails() {
        let config = make_config(&format!("{}[ensemble]\nml_variant = deep\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "ml_variant"));
    }

    #[test]
    fn zero_trees_fails() {
        let config = make_config(&format!("{}[ensemble]\nml_trees = 0\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "ml_trees"));
    }

    #[test]
    fn non_numeric_iterations_fails() {
        let config = make_config(&format!("{}[ensemble]\ngarch_max_iterations = lots\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(
            matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "garch_max_iterations")
        );
    }

    #[test]
    fn threshold_override_applied() {
        let config = make_config(&format!(
            "{}[ensemble]\nbuy_threshold = 4\nstrong_threshold = 8\n",
            DATA
        ));
        let ensemble = ensemble_config_from(&config).unwrap();
        assert_eq!(ensemble.breakpoints, Breakpoints::new(4, 8));
    }

    #[test]
    fn threshold_override_must_be_ordered() {
        let config = make_config(&format!(
            "{}[ensemble]\nbuy_threshold = 5\nstrong_threshold = 5\n",
            DATA
        ));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "buy_threshold"));
    }

    #[test]
    fn lone_threshold_fails() {
        let config = make_config(&format!("{}[ensemble]\nbuy_threshold = 2\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(
            matches!(err, VotecastError::ConfigMissing { key, .. } if key == "strong_threshold")
        );
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config(&format!("{}[backtest]\nstart_date = 01/02/2023\n", DATA));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, VotecastError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(&format!(
            "{}[backtest]\nstart_date = 2024-02-01\nend_date = 2024-01-01\n",
            DATA
        ));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn same_start_and_end_accepted_here() {
        let config = make_config(&format!(
            "{}[backtest]\nstart_date = 2024-02-01\nend_date = 2024-02-01\n",
            DATA
        ));
        assert!(backtest_settings_from(&config).is_ok());
    }
}
