//! Text handed to the chat assistant for one observation.

use crate::record::{AbsenceReason, ObservationRecord, ObservedAt};
use chrono::NaiveDate;
use racimo_core::{Station, Variable};
use racimo_utils::dates::format_date;
use std::fmt::Write;

const PREAMBLE: &str = "Analyze the following weather and air quality data:\n\n";

/// The follow-up analyses the assistant offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOption {
    AirQuality = 1,
    Patterns = 2,
    Recommendations = 3,
    Standards = 4,
    Complete = 5,
}

impl AnalysisOption {
    pub const ALL: [AnalysisOption; 5] = [
        AnalysisOption::AirQuality,
        AnalysisOption::Patterns,
        AnalysisOption::Recommendations,
        AnalysisOption::Standards,
        AnalysisOption::Complete,
    ];

    /// Option by its menu number (1-5).
    pub fn from_number(number: u8) -> Option<AnalysisOption> {
        AnalysisOption::ALL
            .into_iter()
            .find(|option| *option as u8 == number)
    }

    pub fn title(self) -> &'static str {
        match self {
            AnalysisOption::AirQuality => "Air quality and weather conditions assessment",
            AnalysisOption::Patterns => "Analysis of concerning patterns and trends",
            AnalysisOption::Recommendations => "Recommendations based on this data",
            AnalysisOption::Standards => "Comparison with air quality standards",
            AnalysisOption::Complete => "Complete analysis (all of the above)",
        }
    }

    fn request(self) -> &'static str {
        match self {
            AnalysisOption::AirQuality => {
                "Evaluate this data and explain what it says about the current air quality \
                 and weather conditions. Interpret each variable and what it means for public health."
            }
            AnalysisOption::Patterns => {
                "Identify and analyze any concerning pattern or trend in this data. Do any values \
                 suggest environmental or health problems? What could be causing them?"
            }
            AnalysisOption::Recommendations => {
                "Based on this specific data, give practical recommendations for residents, \
                 environmental authorities and preventive action."
            }
            AnalysisOption::Standards => {
                "Compare these values with national and international air quality standards. \
                 Are they within safe limits? How would they rank on the WHO and EPA scales?"
            }
            AnalysisOption::Complete => {
                "Provide a complete analysis including:\n\
                 1. Air quality and weather conditions assessment\n\
                 2. Concerning patterns and trends\n\
                 3. Specific recommendations based on the data\n\
                 4. Comparison with air quality standards"
            }
        }
    }
}

fn push_station(out: &mut String, station_id: &str, station_name: &str, station: Option<&Station>) {
    let _ = writeln!(out, "**Station:** {} (ID: {})", station_name, station_id);
    if let Some(station) = station {
        let _ = writeln!(
            out,
            "**Location:** Lat {}, Lon {}",
            station.latitude, station.longitude
        );
    }
}

fn push_menu(out: &mut String) {
    out.push_str("**Choose what you want analyzed:**\n\n");
    for option in AnalysisOption::ALL {
        let _ = writeln!(out, "**{}.** {}", option as u8, option.title());
    }
    out.push_str("\nPlease answer with the **number** of the option you are most interested in.");
}

/// Prompt for a resolved observation.
///
/// Without an option the prompt ends with the analysis menu; with one it
/// ends with that specific request.
pub fn build_prompt(
    record: &ObservationRecord,
    station: Option<&Station>,
    option: Option<AnalysisOption>,
) -> String {
    let mut out = String::from(PREAMBLE);
    push_station(&mut out, &record.station_id, &record.station_name, station);
    match record.observed_at {
        ObservedAt::Instant(instant) => {
            let _ = writeln!(
                out,
                "**Observed at:** {} (current conditions)",
                instant.format("%Y-%m-%d %H:%M %:z")
            );
        }
        ObservedAt::Day(date) => {
            let _ = writeln!(
                out,
                "**Date:** {} (daily average of {} measurements)",
                format_date(&date),
                record.sample_count
            );
        }
    }
    out.push('\n');

    out.push_str("**Values:**\n");
    for (variable, value) in record.values.iter() {
        if value.is_none() && !Variable::AIR_QUALITY.contains(&variable) {
            continue;
        }
        let _ = writeln!(out, "- {}: {}", variable.label(), variable.format_value(value));
    }
    out.push('\n');

    let moving: Vec<_> = record
        .trends
        .iter()
        .filter(|(_, trend)| trend.is_moving())
        .collect();
    if !moving.is_empty() {
        out.push_str("**Trends over the day:**\n");
        for (variable, trend) in moving {
            let _ = writeln!(out, "- {}: {}", variable.label(), trend);
        }
        out.push('\n');
    }

    match option {
        None => push_menu(&mut out),
        Some(option) => {
            let _ = writeln!(out, "**Requested analysis:** {}", option.title());
            out.push_str(option.request());
        }
    }
    out
}

/// Prompt used when nothing could be resolved for the station and day.
pub fn build_absence_prompt(
    station_id: &str,
    station_name: &str,
    station: Option<&Station>,
    date: NaiveDate,
    reason: &AbsenceReason,
) -> String {
    let mut out = String::from(PREAMBLE);
    push_station(&mut out, station_id, station_name, station);
    let _ = writeln!(out, "**Date:** {}", format_date(&date));
    out.push('\n');
    let _ = writeln!(out, "No data is available for this station and date ({}).", reason);
    out.push_str("Explain what this station usually measures and suggest checking a nearby station or another date.");
    out
}
