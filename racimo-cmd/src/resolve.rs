//! Station, observation, averages and prompt commands.

use crate::settings::Settings;
use chrono::NaiveDate;
use log::info;
use racimo_core::Variable;
use racimo_resolver::{
    prompt::{build_absence_prompt, build_prompt, AnalysisOption},
    ObservationRecord, ObservedAt, Resolution,
};
use serde_json::json;
use std::io::Write;

/// Multi-line text rendering of a record.
pub fn render_record(record: &ObservationRecord) -> String {
    let when = match record.observed_at {
        ObservedAt::Instant(instant) => format!("{} (live)", instant.format("%Y-%m-%d %H:%M %:z")),
        ObservedAt::Day(date) => format!("{} (historical, {} samples)", date, record.sample_count),
    };
    let mut text = format!("{} {} {}\n", record.station_id, record.station_name, when);
    for (variable, value) in record.values.iter() {
        let trend = record
            .trends
            .get(&variable)
            .map(|t| t.label())
            .unwrap_or("");
        text.push_str(&format!(
            "  {:<16}{:>14}  {}\n",
            variable.label(),
            variable.format_value(value),
            trend
        ));
    }
    text
}

fn write_outcome(
    out: &mut dyn Write,
    station_id: &str,
    date: NaiveDate,
    outcome: &Resolution,
    as_json: bool,
) -> anyhow::Result<()> {
    if as_json {
        let value = match outcome {
            Ok(record) => json!({"station_id": station_id, "date": date, "record": record}),
            Err(reason) => json!({"station_id": station_id, "date": date, "absence": reason}),
        };
        writeln!(out, "{}", serde_json::to_string(&value)?)?;
    } else {
        match outcome {
            Ok(record) => write!(out, "{}", render_record(record))?,
            Err(reason) => writeln!(out, "{} {}: {}", station_id, date, reason)?,
        }
    }
    Ok(())
}

pub async fn run_stations(settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    let catalog = settings.catalog().await?;
    writeln!(
        out,
        "{:<8} {:<26} {:<8} {:>10} {:>11}",
        "ID", "NAME", "TYPE", "LAT", "LON"
    )?;
    for station in catalog.iter() {
        writeln!(
            out,
            "{:<8} {:<26} {:<8} {:>10.6} {:>11.6}",
            station.station_id,
            station.station_name,
            station.equipment,
            station.latitude,
            station.longitude
        )?;
    }
    Ok(())
}

pub async fn run_resolve(
    settings: &Settings,
    station_id: &str,
    date: Option<NaiveDate>,
    end: Option<NaiveDate>,
    as_json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let resolver = settings.build_resolver().await?;
    let start = date.unwrap_or_else(|| resolver.today());
    match end {
        None => {
            let outcome = resolver.resolve(station_id, start).await;
            write_outcome(out, station_id, start, &outcome, as_json)
        }
        Some(end) => {
            let outcomes = resolver.resolve_range(station_id, start, end).await?;
            for (day, outcome) in &outcomes {
                write_outcome(out, station_id, *day, outcome, as_json)?;
            }
            Ok(())
        }
    }
}

pub async fn run_averages(
    settings: &Settings,
    date: Option<NaiveDate>,
    as_json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let resolver = settings.build_resolver().await?;
    let date = date.unwrap_or_else(|| resolver.today());
    info!("Computing averages for {}", date);
    let outcomes = resolver.resolve_all(date).await;

    if as_json {
        for (station_id, outcome) in &outcomes {
            write_outcome(out, station_id, date, outcome, true)?;
        }
        return Ok(());
    }

    write!(out, "{:<8} {:<26}", "ID", "NAME")?;
    for variable in Variable::AIR_QUALITY {
        write!(out, " {:>14}", variable.label())?;
    }
    writeln!(out)?;
    for (station_id, outcome) in &outcomes {
        let name = resolver.catalog().display_name(station_id);
        write!(out, "{:<8} {:<26}", station_id, name)?;
        match outcome {
            Ok(record) => {
                for variable in Variable::AIR_QUALITY {
                    write!(out, " {:>14}", variable.format_value(record.values.get(variable)))?;
                }
                writeln!(out)?;
            }
            Err(reason) => writeln!(out, " {}", reason)?,
        }
    }
    Ok(())
}

pub async fn run_prompt(
    settings: &Settings,
    station_id: &str,
    date: Option<NaiveDate>,
    option: Option<u8>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let resolver = settings.build_resolver().await?;
    let date = date.unwrap_or_else(|| resolver.today());
    let station = resolver.catalog().get(station_id);
    let text = match resolver.resolve(station_id, date).await {
        Ok(record) => build_prompt(&record, station, option.and_then(AnalysisOption::from_number)),
        Err(reason) => build_absence_prompt(
            station_id,
            &resolver.catalog().display_name(station_id),
            station,
            date,
            &reason,
        ),
    };
    writeln!(out, "{}", text)?;
    Ok(())
}
