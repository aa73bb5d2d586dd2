use anyhow::{bail, Context, Result};
use dashboard_orchestrator::{parse_ticker_list, LoadSettings};
use dashboard_render::Theme;
use score_engine::{ScoringConfig, WeightSet};
use std::env;
use std::path::PathBuf;
use valuation_client::BackendConfig;

pub const DEFAULT_TICKERS: &str = "NFLX,AMD,GOOG,NVDA,INTC,AMZN";

/// Command-line overrides. Every flag is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub tickers: Option<Vec<String>>,
    pub years: Option<u32>,
    pub chart_years: Option<u32>,
    pub smoothing: Option<u32>,
    pub valuation_weight: Option<f64>,
    pub svg_dir: Option<PathBuf>,
    pub fixture: Option<PathBuf>,
    pub theme: Option<Theme>,
    pub fetch_missing: bool,
    pub help: bool,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => match args.get(i + 1) {
            Some(v) if !v.starts_with("--") => Ok(Some(v.as_str())),
            _ => bail!("{} needs a value", flag),
        },
    }
}

fn parse_flag<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, flag)?
        .map(|v| v.parse::<T>().with_context(|| format!("invalid {} value '{}'", flag, v)))
        .transpose()
}

impl CliArgs {
    /// Parse from the process arguments, program name excluded
    pub fn parse(args: &[String]) -> Result<Self> {
        let theme = match flag_value(args, "--theme")? {
            Some(raw) => Some(Theme::parse(raw).with_context(|| format!("unknown theme '{}'", raw))?),
            None => None,
        };

        Ok(Self {
            tickers: flag_value(args, "--tickers")?.map(parse_ticker_list),
            years: parse_flag(args, "--years")?,
            chart_years: parse_flag(args, "--chart-years")?,
            smoothing: parse_flag(args, "--smoothing")?,
            valuation_weight: parse_flag(args, "--valuation-weight")?,
            svg_dir: flag_value(args, "--svg-dir")?.map(PathBuf::from),
            fixture: flag_value(args, "--fixture")?.map(PathBuf::from),
            theme,
            fetch_missing: args.iter().any(|a| a == "--fetch-missing"),
            help: args.iter().any(|a| a == "--help" || a == "-h"),
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  pe-dashboard [--tickers A,B,C] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tickers LIST            Comma-separated tickers (default: {})", DEFAULT_TICKERS);
    eprintln!("  --years N                 Valuation look-back in years (default: 2)");
    eprintln!("  --chart-years N           Chart history in years (default: 5)");
    eprintln!("  --smoothing N             Rolling-mean window for chart series (default: 0)");
    eprintln!("  --valuation-weight P      Valuation share of the composite, 0-100 (default: 50)");
    eprintln!("  --svg-dir DIR             Write gauge and chart SVGs to DIR");
    eprintln!("  --theme light|dark        SVG theme (default: light)");
    eprintln!("  --fixture FILE            Serve data from a JSON fixture instead of the API");
    eprintln!("  --fetch-missing           Request remote data for missing tickers and reload");
}

/// Resolved configuration: environment first, then command-line overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub load: LoadSettings,
    pub scoring: ScoringConfig,
    pub weights: WeightSet,
    pub tickers: Vec<String>,
    pub theme: Theme,
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {} value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let backend = BackendConfig::from_env()?;

        let load = LoadSettings {
            years: env_parse("VALUATION_YEARS", 2)?,
            chart_years: env_parse("CHART_YEARS", 5)?,
            include_forward: env_parse("INCLUDE_FORWARD", true)?,
            smoothing: env_parse("CHART_SMOOTHING", 0)?,
            source: backend.source.clone(),
        };

        let scoring = ScoringConfig {
            factor_slots: env_parse("COMPOSITE_FACTOR_SLOTS", score_engine::DEFAULT_FACTOR_SLOTS)?,
            ..ScoringConfig::default()
        };

        let valuation_weight: f64 = env_parse("VALUATION_WEIGHT", 50.0)?;
        let tickers = env::var("DASHBOARD_TICKERS").unwrap_or_else(|_| DEFAULT_TICKERS.to_string());
        let theme = match env::var("DASHBOARD_THEME") {
            Ok(raw) => Theme::parse(&raw).with_context(|| format!("unknown DASHBOARD_THEME '{}'", raw))?,
            Err(_) => Theme::default(),
        };

        Ok(Self {
            backend,
            load,
            scoring,
            weights: WeightSet::from_valuation_percent(valuation_weight)?,
            tickers: parse_ticker_list(&tickers),
            theme,
        })
    }

    pub fn apply(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(tickers) = &args.tickers {
            self.tickers = tickers.clone();
        }
        if let Some(years) = args.years {
            self.load.years = years;
        }
        if let Some(chart_years) = args.chart_years {
            self.load.chart_years = chart_years;
        }
        if let Some(smoothing) = args.smoothing {
            self.load.smoothing = smoothing;
        }
        if let Some(weight) = args.valuation_weight {
            self.weights = WeightSet::from_valuation_percent(weight)?;
        }
        if let Some(theme) = args.theme {
            self.theme = theme;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        self.load.validate()?;
        self.scoring.validate()?;
        if self.tickers.is_empty() {
            bail!("no tickers given");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_engine::ScoreAggregator;
    use valuation_core::MetricKind;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn base_config() -> AppConfig {
        AppConfig {
            backend: BackendConfig::default(),
            load: LoadSettings::default(),
            scoring: ScoringConfig::default(),
            weights: WeightSet::default(),
            tickers: parse_ticker_list(DEFAULT_TICKERS),
            theme: Theme::Light,
        }
    }

    #[test]
    fn test_parse_flags() {
        let parsed = CliArgs::parse(&args(&[
            "--tickers",
            "aapl, msft",
            "--years",
            "3",
            "--valuation-weight",
            "90",
            "--fetch-missing",
            "--theme",
            "dark",
        ]))
        .unwrap();

        assert_eq!(parsed.tickers, Some(vec!["AAPL".to_string(), "MSFT".to_string()]));
        assert_eq!(parsed.years, Some(3));
        assert_eq!(parsed.valuation_weight, Some(90.0));
        assert_eq!(parsed.theme, Some(Theme::Dark));
        assert!(parsed.fetch_missing);
        assert!(parsed.chart_years.is_none());
    }

    #[test]
    fn test_invalid_flag_value_is_an_error() {
        assert!(CliArgs::parse(&args(&["--years", "two"])).is_err());
        assert!(CliArgs::parse(&args(&["--years"])).is_err());
        assert!(CliArgs::parse(&args(&["--svg-dir", "--fetch-missing"])).is_err());
        assert!(CliArgs::parse(&args(&["--theme", "sepia"])).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = base_config();
        let parsed = CliArgs::parse(&args(&["--chart-years", "10", "--valuation-weight", "90"])).unwrap();
        config.apply(&parsed).unwrap();

        assert_eq!(config.load.chart_years, 10);
        assert_eq!(config.weights.get(MetricKind::Leverage), Some(10.0));
        assert_eq!(config.tickers.len(), 6);
        assert!(ScoreAggregator::new(config.scoring.clone()).is_ok());
    }

    #[test]
    fn test_apply_rejects_out_of_range() {
        let mut config = base_config();
        let parsed = CliArgs::parse(&args(&["--valuation-weight", "150"])).unwrap();
        assert!(config.apply(&parsed).is_err());

        let mut config = base_config();
        let parsed = CliArgs::parse(&args(&["--years", "0"])).unwrap();
        assert!(config.apply(&parsed).is_err());
    }
}
