//! Command implementations for the RACiMo CLI.
//!
//! Provides subcommands that resolve station observations the way the web
//! front end does: one station and day, every station for a day, chart
//! series, summary statistics and the chat assistant prompt.

use chrono::NaiveDate;
use clap::Subcommand;
use racimo_core::Variable;
use racimo_utils::dates::parse_date;
use std::io::Write;

pub mod resolve;
pub mod series;
pub mod settings;

pub use settings::Settings;

/// Variables charted when none are given: the air quality panel.
pub const DEFAULT_SERIES_VARIABLES: &str = "ica,humedad,pm_1,pm_2_5,pm_10";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the station catalog
    Stations,

    /// Resolve one station for one day (today uses the live endpoint)
    Resolve {
        /// Station id, e.g. 219668
        station: String,

        /// Day to resolve (YYYY-MM-DD), today by default
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Resolve every day from --date up to this day (at most 7 days)
        #[arg(short, long, value_parser = parse_date, requires = "date")]
        end: Option<NaiveDate>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Daily averages for every station of the catalog
    Averages {
        /// Day (YYYY-MM-DD), today by default
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Time series of one past day as CSV, for charts
    Series {
        station: String,

        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,

        /// Comma separated canonical keys
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_SERIES_VARIABLES)]
        variables: Vec<Variable>,

        /// Smooth each variable with a trailing mean over this many points
        #[arg(long)]
        window: Option<usize>,
    },

    /// Count, min, max, mean and latest value per variable for one past day
    Stats {
        station: String,

        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long, value_delimiter = ',', default_value = DEFAULT_SERIES_VARIABLES)]
        variables: Vec<Variable>,
    },

    /// Chat assistant prompt for one observation
    Prompt {
        station: String,

        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Ask for one analysis (1-5) instead of showing the menu
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        option: Option<u8>,
    },
}

pub async fn run(settings: Settings, command: Command) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    run_to(&settings, command, &mut out).await?;
    out.flush()?;
    Ok(())
}

/// Run a command, writing its report to `out`.
pub async fn run_to(
    settings: &Settings,
    command: Command,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Stations => resolve::run_stations(settings, out).await,
        Command::Resolve {
            station,
            date,
            end,
            json,
        } => resolve::run_resolve(settings, &station, date, end, json, out).await,
        Command::Averages { date, json } => resolve::run_averages(settings, date, json, out).await,
        Command::Series {
            station,
            date,
            variables,
            window,
        } => series::run_series(settings, &station, date, &variables, window, out).await,
        Command::Stats {
            station,
            date,
            variables,
        } => series::run_stats(settings, &station, date, &variables, out).await,
        Command::Prompt {
            station,
            date,
            option,
        } => resolve::run_prompt(settings, &station, date, option, out).await,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clap::Parser;
    use std::{io::Write as _, path::Path};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
        #[command(subcommand)]
        command: Command,
    }

    pub const SNAPSHOT: &str = r#"station_id,timestamp,temp,humedad,pm_1,pm_2_5,pm_10,ica
219668,2025-09-10T08:00:00,19.5,70,5.0,12.0,20.0,38
219668,2025-09-10T14:00:00,26.5,,7.0,18.0,30.0,57
219666,2025-09-10T09:00:00,22.0,65,9.0,30.5,44.0,90
219668,2025-09-11T09:00:00,20.0,75,4.0,10.0,15.0,32
"#;

    pub fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        file
    }

    /// Settings pointing at `snapshot` and at a live endpoint nobody serves.
    pub fn settings_for(snapshot: &Path) -> Settings {
        Settings {
            api_url: String::from("http://127.0.0.1:9/api"),
            snapshot: snapshot.to_path_buf(),
            utc_offset: -5.0,
            timeout_secs: 1,
            trend_threshold: 5.0,
            remote_catalog: false,
        }
    }

    pub async fn run_capture(settings: &Settings, command: Command) -> String {
        let mut out = Vec::new();
        run_to(settings, command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let cli = TestCli::try_parse_from([
            "racimo-cli",
            "--utc-offset",
            "-5",
            "resolve",
            "219668",
            "--date",
            "2025-09-10",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.settings.utc_offset, -5.0);
        match cli.command {
            Command::Resolve {
                station,
                date,
                end,
                json,
            } => {
                assert_eq!(station, "219668");
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 10));
                assert_eq!(end, None);
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_series_variables() {
        let cli = TestCli::try_parse_from([
            "racimo-cli",
            "series",
            "219668",
            "--date",
            "2025-09-10",
            "--variables",
            "humedad,pm_2_5",
        ])
        .unwrap();
        match cli.command {
            Command::Series { variables, .. } => {
                assert_eq!(variables, vec![Variable::Humidity, Variable::Pm2_5])
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(TestCli::try_parse_from([
            "racimo-cli", "series", "219668", "--date", "2025-09-10", "--variables", "co2",
        ])
        .is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(TestCli::try_parse_from(["racimo-cli", "resolve", "219668", "--date", "10/09/2025"]).is_err());
        assert!(TestCli::try_parse_from(["racimo-cli", "resolve", "219668", "--end", "2025-09-10"]).is_err());
        assert!(TestCli::try_parse_from(["racimo-cli", "prompt", "219668", "--option", "6"]).is_err());
    }
}
