//! Display-row formatting.
//!
//! A row is declared as a [`RowSpec`]: a label, an optional symbol field and
//! an ordered list of [`ValueSpec`] directives. Evaluating the specs against a
//! decoded [`Conditions`] record yields the [`DisplayRow`] sequence. Directives
//! whose source field is absent contribute nothing.

use chrono::{Local, TimeZone};
use chrono_tz::Tz;
use std::fmt;

use crate::types::{Conditions, DisplayRow, Field, FieldValue};

/// Compass directions, 45 degrees apart starting at north
pub const BEARINGS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

const TIME_FORMAT: &str = "%H:%M:%S %Z %m-%d-%Y";

/// Format a number with `precision` decimals.
///
/// Precision 0 adds 0.5 and truncates. Otherwise the shortest decimal
/// representation of `value` is rounded half-up, so `1.005` becomes `1.01`.
pub fn format_double(value: f64, precision: usize) -> String {
    if precision == 0 {
        return ((value + 0.5) as i64).to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let magnitude = if frac_part.len() <= precision {
        format!("{}.{:0<width$}", int_part, frac_part, width = precision)
    } else {
        let mut digits: Vec<u8> = int_part
            .bytes()
            .chain(frac_part.bytes().take(precision))
            .map(|b| b - b'0')
            .collect();

        if frac_part.as_bytes()[precision] >= b'5' {
            let mut carry = true;
            for d in digits.iter_mut().rev() {
                if *d == 9 {
                    *d = 0;
                } else {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                digits.insert(0, 1);
            }
        }

        let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        let split = text.len() - precision;
        format!("{}.{}", &text[..split], &text[split..])
    };

    if value < 0.0 && magnitude.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

/// Name of the compass bucket centred nearest to `degrees`
pub fn bearing_name(degrees: f64) -> &'static str {
    let span = 360.0 / BEARINGS.len() as f64;
    let index = ((degrees + span / 2.0) / span).floor() as i64;
    BEARINGS[index.rem_euclid(BEARINGS.len() as i64) as usize]
}

/// Format unix seconds as wall-clock time in `tz`
pub fn format_epoch<Z>(tz: &Z, seconds: i64) -> Option<String>
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    tz.timestamp_opt(seconds, 0)
        .single()
        .map(|dt| dt.format(TIME_FORMAT).to_string())
}

/// Format unix seconds in the local zone.
///
/// The zone comes from `TZ`, then the system setting. When neither names an
/// IANA zone `%Z` degrades to the numeric offset.
pub fn format_local_epoch(seconds: i64) -> Option<String> {
    let system = || iana_time_zone::get_timezone().ok();
    match local_zone(std::env::var("TZ").ok(), system) {
        Some(tz) => format_epoch(&tz, seconds),
        None => format_epoch(&Local, seconds),
    }
}

fn local_zone(tz_var: Option<String>, system: impl FnOnce() -> Option<String>) -> Option<Tz> {
    let parse = |name: &str| name.trim_start_matches(':').parse::<Tz>().ok();
    tz_var
        .as_deref()
        .and_then(parse)
        .or_else(|| system().as_deref().and_then(parse))
}

/// How a single sub-value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Text,
    Degrees,
    Percent,
    Speed,
    Distance,
    Pressure,
    Bearing,
    Time,
}

/// One formatted sub-value inside a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSpec {
    pub field: Field,
    pub format: ValueFormat,
    pub precision: usize,
    pub label: Option<&'static str>,
    pub parenthesized: bool,
}

impl ValueSpec {
    pub const fn new(field: Field, format: ValueFormat) -> Self {
        Self {
            field,
            format,
            precision: 0,
            label: None,
            parenthesized: false,
        }
    }

    /// Prefix the value with a short label, e.g. "feels like"
    pub const fn labeled(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Wrap label and value in parentheses
    pub const fn parenthesized(mut self) -> Self {
        self.parenthesized = true;
        self
    }

    pub const fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Render against `conditions`; `None` when the field is absent or of the wrong kind
    pub fn render(&self, conditions: &Conditions) -> Option<String> {
        let value = conditions.value(self.field)?;
        let body = self.format_value(value)?;
        let labeled = match self.label {
            Some(label) => format!("{} {}", label, body),
            None => body,
        };
        Some(if self.parenthesized {
            format!("({})", labeled)
        } else {
            labeled
        })
    }

    fn format_value(&self, value: FieldValue<'_>) -> Option<String> {
        let p = self.precision;
        let s = match self.format {
            ValueFormat::Text => value.as_text()?.to_string(),
            ValueFormat::Degrees => format!("{}˚", format_double(value.as_number()?, p)),
            ValueFormat::Percent => format!("{}%", format_double(value.as_number()? * 100.0, p)),
            ValueFormat::Speed => format!("{} MPH", format_double(value.as_number()?, p)),
            ValueFormat::Distance => format!("{} miles", format_double(value.as_number()?, p)),
            ValueFormat::Pressure => {
                format!("{} millibars", format_double(value.as_number()?, p))
            }
            ValueFormat::Bearing => bearing_name(value.as_number()?).to_string(),
            ValueFormat::Time => format_local_epoch(value.as_epoch()?)?,
        };
        Some(s)
    }
}

/// Declaration of one display row
#[derive(Debug, Clone, Copy)]
pub struct RowSpec {
    pub label: &'static str,
    pub symbol: Option<Field>,
    pub values: &'static [ValueSpec],
}

impl RowSpec {
    pub fn build(&self, conditions: &Conditions) -> DisplayRow {
        let text = self
            .values
            .iter()
            .filter_map(|v| v.render(conditions))
            .collect::<Vec<_>>()
            .join(" ");
        let symbol = self
            .symbol
            .and_then(|field| conditions.value(field))
            .and_then(|value| value.as_text().map(str::to_string));

        DisplayRow {
            label: self.label.to_string(),
            text,
            symbol,
        }
    }
}

/// Evaluate every spec in order
pub fn build_rows(specs: &[RowSpec], conditions: &Conditions) -> Vec<DisplayRow> {
    specs.iter().map(|spec| spec.build(conditions)).collect()
}
