//! Chart series and statistics over one past station-day.

use crate::settings::Settings;
use chrono::{NaiveDate, SecondsFormat};
use csv::WriterBuilder;
use log::info;
use racimo_core::Variable;
use racimo_data::{
    series::chart_series,
    stats::{rolling_mean, summarize_rows},
};
use racimo_resolver::Resolver;
use std::{io::Write, sync::Arc};

/// Series and statistics come from the snapshot, which never covers today.
fn ensure_past(resolver: &Resolver, date: NaiveDate) -> anyhow::Result<()> {
    let today = resolver.today();
    if date >= today {
        anyhow::bail!("{} is not a past day (today is {}); use `resolve` for live data", date, today);
    }
    Ok(())
}

async fn rows_index(
    settings: &Settings,
    date: NaiveDate,
) -> anyhow::Result<Arc<racimo_core::HistoricalIndex>> {
    let resolver = settings.build_resolver().await?;
    ensure_past(&resolver, date)?;
    Ok(resolver.snapshot().index().await?)
}

/// Write one CSV row per timestamp: `timestamp,<variable keys...>`.
///
/// With `window`, every column is replaced by its trailing mean.
pub async fn run_series(
    settings: &Settings,
    station_id: &str,
    date: NaiveDate,
    variables: &[Variable],
    window: Option<usize>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let index = rows_index(settings, date).await?;
    let points = chart_series(index.rows_for(station_id, date), variables);
    info!("{} points for station {} on {}", points.len(), station_id, date);

    let mut columns: Vec<Vec<Option<f64>>> = variables
        .iter()
        .map(|&v| points.iter().map(|p| p.values.get(v)).collect())
        .collect();
    if let Some(window) = window {
        for column in columns.iter_mut() {
            *column = rolling_mean(column, window);
        }
    }

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);
    let mut header = vec![String::from("timestamp")];
    header.extend(variables.iter().map(|v| v.key().to_string()));
    wtr.write_record(&header)?;
    for (i, point) in points.iter().enumerate() {
        let mut record = vec![point.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)];
        record.extend(
            columns
                .iter()
                .map(|column| column[i].map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub async fn run_stats(
    settings: &Settings,
    station_id: &str,
    date: NaiveDate,
    variables: &[Variable],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let index = rows_index(settings, date).await?;
    let rows = index.rows_for(station_id, date);
    writeln!(
        out,
        "{:<16} {:>6} {:>14} {:>14} {:>14} {:>14}",
        "VARIABLE", "COUNT", "MIN", "MAX", "MEAN", "LATEST"
    )?;
    for &variable in variables {
        match summarize_rows(rows, variable) {
            Some(summary) => writeln!(
                out,
                "{:<16} {:>6} {:>14} {:>14} {:>14} {:>14}",
                variable.label(),
                summary.count,
                variable.format_value(Some(summary.min)),
                variable.format_value(Some(summary.max)),
                variable.format_value(Some(summary.mean)),
                variable.format_value(Some(summary.latest)),
            )?,
            None => writeln!(out, "{:<16} {:>6}", variable.label(), 0)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        tests::{run_capture, settings_for, snapshot_file},
        Command, run_to,
    };
    use chrono::NaiveDate;
    use racimo_core::Variable;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[tokio::test]
    async fn test_series_csv() {
        let file = snapshot_file();
        let text = run_capture(
            &settings_for(file.path()),
            Command::Series {
                station: String::from("219668"),
                date: day(10),
                variables: vec![Variable::Humidity, Variable::Pm2_5],
                window: None,
            },
        )
        .await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "timestamp,humedad,pm_2_5",
                "2025-09-10T08:00:00-05:00,70,12",
                "2025-09-10T14:00:00-05:00,,18",
            ]
        );
    }

    #[tokio::test]
    async fn test_series_rolling_window() {
        let file = snapshot_file();
        let text = run_capture(
            &settings_for(file.path()),
            Command::Series {
                station: String::from("219668"),
                date: day(10),
                variables: vec![Variable::Pm2_5],
                window: Some(2),
            },
        )
        .await;
        assert_eq!(text.lines().last(), Some("2025-09-10T14:00:00-05:00,15"));
    }

    #[tokio::test]
    async fn test_series_rejects_today() {
        let file = snapshot_file();
        let settings = settings_for(file.path());
        let today = racimo_utils::dates::today_in(&settings.zone().unwrap());
        let mut out = Vec::new();
        let result = run_to(
            &settings,
            Command::Series {
                station: String::from("219668"),
                date: today,
                variables: vec![Variable::Pm2_5],
                window: None,
            },
            &mut out,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let file = snapshot_file();
        let text = run_capture(
            &settings_for(file.path()),
            Command::Stats {
                station: String::from("219668"),
                date: day(10),
                variables: vec![Variable::Pm2_5, Variable::Precipitation],
            },
        )
        .await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("PM2.5"));
        assert!(lines[1].contains("12.00 µg/m³"));
        assert!(lines[1].ends_with("18.00 µg/m³"));
        assert!(lines[2].starts_with("Precipitation"));
        assert!(lines[2].trim_end().ends_with('0'));
    }
}
