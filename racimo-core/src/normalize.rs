//! Alias-table driven normalization of raw source fields into a [`Reading`].
//!
//! Snapshot CSV headers and live API JSON use different names (and
//! sometimes different units) for the same quantity. A [`FieldMap`] lists,
//! for each canonical [`Variable`], the accepted source names in priority
//! order together with the conversion into the canonical unit. Fields that
//! are not listed are ignored.

use crate::{measurement::RawRow, variable::Reading, variable::Variable};
use serde_json::{Map, Value};

/// Version of the built-in alias table.
pub const FIELD_MAP_VERSION: u32 = 1;

/// Unit conversion applied to a source value before it lands in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    FahrenheitToCelsius,
    MphToMetersPerSecond,
    InHgToHectopascal,
    InchesToMillimeters,
}

impl Conversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::Identity => value,
            Conversion::FahrenheitToCelsius => (value - 32.0) * 5.0 / 9.0,
            Conversion::MphToMetersPerSecond => value * 0.44704,
            Conversion::InHgToHectopascal => value * 33.863_886_666_7,
            Conversion::InchesToMillimeters => value * 25.4,
        }
    }
}

/// One accepted source name for a canonical variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub conversion: Conversion,
}

/// Canonical variable -> accepted aliases, tried in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    version: u32,
    aliases: [Vec<Alias>; Variable::COUNT],
}

const DEFAULT_ALIASES: &[(Variable, &str, Conversion)] = &[
    (Variable::Humidity, "humedad", Conversion::Identity),
    (Variable::Humidity, "humidity", Conversion::Identity),
    (Variable::Humidity, "hum", Conversion::Identity),
    (Variable::Humidity, "hum_out", Conversion::Identity),
    (Variable::Pm1, "pm_1", Conversion::Identity),
    (Variable::Pm1, "pm1_avg", Conversion::Identity),
    (Variable::Pm1, "pm_1p0", Conversion::Identity),
    (Variable::Pm2_5, "pm_2_5", Conversion::Identity),
    (Variable::Pm2_5, "pm25_avg", Conversion::Identity),
    (Variable::Pm2_5, "pm_2p5", Conversion::Identity),
    (Variable::Pm2_5, "pm2_5", Conversion::Identity),
    (Variable::Pm10, "pm_10", Conversion::Identity),
    (Variable::Pm10, "pm10_avg", Conversion::Identity),
    (Variable::Pm10, "pm_10p0", Conversion::Identity),
    (Variable::Aqi, "ica", Conversion::Identity),
    (Variable::Aqi, "aqi", Conversion::Identity),
    (Variable::Aqi, "aqi_val", Conversion::Identity),
    (Variable::Temperature, "temp", Conversion::Identity),
    (Variable::Temperature, "temperatura", Conversion::Identity),
    (Variable::Temperature, "temperature", Conversion::Identity),
    (Variable::Temperature, "temp_out", Conversion::FahrenheitToCelsius),
    (Variable::Pressure, "presion", Conversion::Identity),
    (Variable::Pressure, "pressure", Conversion::Identity),
    (Variable::Pressure, "bar_sea_level", Conversion::InHgToHectopascal),
    (Variable::Pressure, "bar_absolute", Conversion::InHgToHectopascal),
    (Variable::WindSpeed, "viento_vel", Conversion::Identity),
    (Variable::WindSpeed, "wind_speed", Conversion::Identity),
    (Variable::WindSpeed, "wind_speed_last", Conversion::MphToMetersPerSecond),
    (Variable::WindSpeed, "wind_speed_avg_last_10_min", Conversion::MphToMetersPerSecond),
    (Variable::WindDirection, "viento_dir", Conversion::Identity),
    (Variable::WindDirection, "wind_dir", Conversion::Identity),
    (Variable::WindDirection, "wind_dir_last", Conversion::Identity),
    (Variable::Precipitation, "precipitacion", Conversion::Identity),
    (Variable::Precipitation, "precipitation", Conversion::Identity),
    (Variable::Precipitation, "rainfall_daily_mm", Conversion::Identity),
    (Variable::Precipitation, "rainfall_daily_in", Conversion::InchesToMillimeters),
];

impl FieldMap {
    /// A map with no aliases at all; every slot normalizes to absent.
    pub fn empty(version: u32) -> Self {
        FieldMap {
            version,
            aliases: Default::default(),
        }
    }

    /// Append an alias at the lowest priority for `variable`.
    pub fn with_alias(mut self, variable: Variable, name: &str, conversion: Conversion) -> Self {
        self.aliases[variable.index()].push(Alias {
            name: name.to_string(),
            conversion,
        });
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn aliases(&self, variable: Variable) -> &[Alias] {
        &self.aliases[variable.index()]
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        DEFAULT_ALIASES
            .iter()
            .fold(FieldMap::empty(FIELD_MAP_VERSION), |map, (variable, name, conversion)| {
                map.with_alias(*variable, name, *conversion)
            })
    }
}

/// A raw field value as found in a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Text(&'a str),
    Number(f64),
    Null,
}

impl RawValue<'_> {
    /// Interpret as a finite number. Blank and placeholder text is absent.
    pub fn as_number(&self) -> Option<f64> {
        let value = match *self {
            RawValue::Number(n) => n,
            RawValue::Null => return None,
            RawValue::Text(s) => {
                let s = s.trim();
                if is_placeholder(s) {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }
}

fn is_placeholder(s: &str) -> bool {
    s.is_empty()
        || s == "---"
        || ["null", "nan", "na", "n/a", "none"]
            .iter()
            .any(|p| s.eq_ignore_ascii_case(p))
}

/// Anything fields can be looked up in by name.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<RawValue<'_>>;
}

impl FieldSource for RawRow {
    fn field(&self, name: &str) -> Option<RawValue<'_>> {
        self.get(name).map(RawValue::Text)
    }
}

impl FieldSource for Map<String, Value> {
    fn field(&self, name: &str) -> Option<RawValue<'_>> {
        self.get(name).map(|value| match value {
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Null),
            Value::String(s) => RawValue::Text(s.as_str()),
            _ => RawValue::Null,
        })
    }
}

/// Map raw source fields onto the canonical slots.
///
/// For each variable the aliases are tried in priority order and the first
/// one holding a usable number wins. Nothing here fails: a missing or
/// malformed field leaves its slot absent.
pub fn normalize<S: FieldSource + ?Sized>(raw: &S, field_map: &FieldMap) -> Reading {
    let mut reading = Reading::empty();
    for variable in Variable::ALL {
        let value = field_map.aliases(variable).iter().find_map(|alias| {
            raw.field(&alias.name)
                .and_then(|v| v.as_number())
                .map(|v| variable.canonicalize(alias.conversion.apply(v)))
        });
        reading.set(variable, value);
    }
    reading
}
