use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// The fixed set of measurement slots every observation carries.
///
/// The canonical key of each variable is the column name used by the
/// reference CSV snapshot (`promedios.csv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    /// Relative humidity (%)
    Humidity,
    /// PM1.0 (µg/m³)
    Pm1,
    /// PM2.5 (µg/m³)
    Pm2_5,
    /// PM10 (µg/m³)
    Pm10,
    /// Air-quality index (ICA), unitless
    Aqi,
    /// Air temperature (°C)
    Temperature,
    /// Barometric pressure (hPa)
    Pressure,
    /// Wind speed (m/s)
    WindSpeed,
    /// Wind direction, degrees in [0, 360)
    WindDirection,
    /// Precipitation (mm)
    Precipitation,
}

impl Variable {
    pub const COUNT: usize = 10;

    pub const ALL: [Variable; Variable::COUNT] = [
        Variable::Humidity,
        Variable::Pm1,
        Variable::Pm2_5,
        Variable::Pm10,
        Variable::Aqi,
        Variable::Temperature,
        Variable::Pressure,
        Variable::WindSpeed,
        Variable::WindDirection,
        Variable::Precipitation,
    ];

    /// Variables shown in the map popup and averaged per day.
    pub const AIR_QUALITY: [Variable; 5] = [
        Variable::Aqi,
        Variable::Humidity,
        Variable::Pm1,
        Variable::Pm2_5,
        Variable::Pm10,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical key, e.g. `pm_2_5`.
    pub fn key(self) -> &'static str {
        match self {
            Variable::Humidity => "humedad",
            Variable::Pm1 => "pm_1",
            Variable::Pm2_5 => "pm_2_5",
            Variable::Pm10 => "pm_10",
            Variable::Aqi => "ica",
            Variable::Temperature => "temp",
            Variable::Pressure => "presion",
            Variable::WindSpeed => "viento_vel",
            Variable::WindDirection => "viento_dir",
            Variable::Precipitation => "precipitacion",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variable::Humidity => "Humidity",
            Variable::Pm1 => "PM1.0",
            Variable::Pm2_5 => "PM2.5",
            Variable::Pm10 => "PM10",
            Variable::Aqi => "AQI",
            Variable::Temperature => "Temperature",
            Variable::Pressure => "Pressure",
            Variable::WindSpeed => "Wind speed",
            Variable::WindDirection => "Wind direction",
            Variable::Precipitation => "Precipitation",
        }
    }

    /// Display suffix, including the leading space where one is wanted.
    pub fn unit(self) -> &'static str {
        match self {
            Variable::Humidity => "%",
            Variable::Pm1 | Variable::Pm2_5 | Variable::Pm10 => " µg/m³",
            Variable::Aqi => "",
            Variable::Temperature => "°C",
            Variable::Pressure => " hPa",
            Variable::WindSpeed => " m/s",
            Variable::WindDirection => "°",
            Variable::Precipitation => " mm",
        }
    }

    pub fn decimals(self) -> usize {
        match self {
            Variable::Pm1 | Variable::Pm2_5 | Variable::Pm10 => 2,
            Variable::Aqi | Variable::WindDirection => 0,
            _ => 1,
        }
    }

    /// Bring an already unit-converted value into the variable's domain.
    pub fn canonicalize(self, value: f64) -> f64 {
        match self {
            Variable::WindDirection => value.rem_euclid(360.0),
            _ => value,
        }
    }

    /// Render a value the way charts and popups do: `NA` when absent.
    pub fn format_value(self, value: Option<f64>) -> String {
        match value {
            Some(v) if v.is_finite() => format!("{:.*}{}", self.decimals(), v, self.unit()),
            _ => String::from("NA"),
        }
    }

    /// Parse a comma separated list of canonical keys.
    pub fn parse_list(list: &str) -> Result<Vec<Variable>, UnknownVariable> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariable(pub String);

impl fmt::Display for UnknownVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variable: {}", self.0)
    }
}

impl std::error::Error for UnknownVariable {}

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// One optional value per canonical variable.
///
/// Every slot always exists; `None` is the explicit "not available" marker,
/// never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading([Option<f64>; Variable::COUNT]);

impl Reading {
    pub fn empty() -> Self {
        Reading::default()
    }

    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.0[variable.index()]
    }

    /// Store a value; non-finite numbers are stored as absent.
    pub fn set(&mut self, variable: Variable, value: Option<f64>) {
        self.0[variable.index()] = value.filter(|v| v.is_finite());
    }

    pub fn with(mut self, variable: Variable, value: f64) -> Self {
        self.set(variable, Some(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, Option<f64>)> + '_ {
        Variable::ALL.into_iter().map(|v| (v, self.get(v)))
    }

    pub fn present_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }

    /// Keep only `variables`; every other slot becomes absent.
    pub fn restrict(&self, variables: &[Variable]) -> Reading {
        let mut out = Reading::empty();
        for &v in variables {
            out.set(v, self.get(v));
        }
        out
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Variable::COUNT))?;
        for (variable, value) in self.iter() {
            map.serialize_entry(variable.key(), &value)?;
        }
        map.end()
    }
}
