//! Station time series and their CSV export.
//!
//! Discharge forecasts arrive flattened into station properties as
//! comma-separated strings: one list of timestamps plus one list of values per
//! forecast model. GeoSFM river depth and streamflow come as JSON records.

use std::io::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use floodwatch_common::{FloodwatchError, FloodwatchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const TIME_PERIOD_KEY: &str = "time_period";
pub const GFS_DISCHARGE_KEY: &str = "time_series_discharge_simulated-gfs";
pub const ICON_DISCHARGE_KEY: &str = "time_series_discharge_simulated-icon";

const TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Timestamp in any of the formats the backend emits; bare dates mean midnight.
fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn list_property<'a>(props: &'a Map<String, Value>, key: &str) -> FloodwatchResult<Vec<&'a str>> {
    match props.get(key) {
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s.split(',').collect()),
        Some(other) => Err(FloodwatchError::MalformedData(format!(
            "{} is not a string: {}",
            key, other
        ))),
        None => Err(FloodwatchError::MalformedData(format!("missing {}", key))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DischargeSample {
    pub time: NaiveDateTime,
    /// m³/s
    pub gfs: f64,
    /// m³/s
    pub icon: f64,
}

/// GFS and ICON simulated discharge for one station.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DischargeSeries {
    pub station: Option<String>,
    pub samples: Vec<DischargeSample>,
}

impl DischargeSeries {
    /// Parse the series, treating malformed properties as an empty series.
    pub fn from_properties(props: &Map<String, Value>) -> Self {
        Self::try_from_properties(props).unwrap_or_else(|e| {
            warn!(error = %e, "Unusable discharge properties, showing empty series");
            Self {
                station: station_name(props),
                samples: Vec::new(),
            }
        })
    }

    /// Parse the series. Samples with an unreadable time or value are dropped.
    pub fn try_from_properties(props: &Map<String, Value>) -> FloodwatchResult<Self> {
        let times = list_property(props, TIME_PERIOD_KEY)?;
        let gfs = list_property(props, GFS_DISCHARGE_KEY)?;
        let icon = list_property(props, ICON_DISCHARGE_KEY)?;

        if times.len() != gfs.len() || times.len() != icon.len() {
            warn!(
                times = times.len(),
                gfs = gfs.len(),
                icon = icon.len(),
                "Discharge list lengths differ, truncating to shortest"
            );
        }

        let total = times.len().min(gfs.len()).min(icon.len());
        let samples: Vec<DischargeSample> = times
            .iter()
            .zip(gfs.iter().zip(icon.iter()))
            .filter_map(|(t, (g, i))| {
                Some(DischargeSample {
                    time: parse_time(t)?,
                    gfs: parse_value(g)?,
                    icon: parse_value(i)?,
                })
            })
            .collect();

        if samples.len() < total {
            debug!(dropped = total - samples.len(), "Dropped unreadable discharge samples");
        }

        Ok(Self {
            station: station_name(props),
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest discharge across both models.
    pub fn peak(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.gfs.max(s.icon))
            .reduce(f64::max)
    }

    pub fn write_csv<W: Write>(
        &self,
        writer: W,
        generated_at: DateTime<Utc>,
    ) -> std::io::Result<()> {
        let title = match &self.station {
            Some(name) => format!("Discharge forecast - {}", name),
            None => "Discharge forecast".to_string(),
        };
        let rows = self.samples.iter().map(|s| {
            vec![
                s.time.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.gfs.to_string(),
                s.icon.to_string(),
            ]
        });
        write_csv(
            writer,
            &title,
            generated_at,
            &["Date", "GFS Discharge (m3/s)", "ICON Discharge (m3/s)"],
            rows,
        )
    }
}

fn station_name(props: &Map<String, Value>) -> Option<String> {
    props
        .get("station_name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// GeoSFM output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSfmKind {
    RiverDepth,
    Streamflow,
}

impl GeoSfmKind {
    pub fn label(&self) -> &'static str {
        match self {
            GeoSfmKind::RiverDepth => "River Depth",
            GeoSfmKind::Streamflow => "Streamflow",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            GeoSfmKind::RiverDepth => "m",
            GeoSfmKind::Streamflow => "m3/s",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoSfmRecord {
    timestamp: String,
    #[serde(default)]
    depth: Option<f64>,
    #[serde(default)]
    streamflow: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoSfmSeries {
    pub kind: GeoSfmKind,
    pub samples: Vec<(NaiveDateTime, f64)>,
}

impl GeoSfmSeries {
    /// Parse `[{timestamp, depth|streamflow}]` records, keeping the field for `kind`.
    pub fn from_json(body: &str, kind: GeoSfmKind) -> FloodwatchResult<Self> {
        let records: Vec<GeoSfmRecord> = serde_json::from_str(body)?;
        let samples = records
            .into_iter()
            .filter_map(|r| {
                let value = match kind {
                    GeoSfmKind::RiverDepth => r.depth,
                    GeoSfmKind::Streamflow => r.streamflow,
                };
                Some((parse_time(&r.timestamp)?, value.filter(|v| v.is_finite())?))
            })
            .collect();
        Ok(Self { kind, samples })
    }

    pub fn write_csv<W: Write>(
        &self,
        writer: W,
        title: &str,
        generated_at: DateTime<Utc>,
    ) -> std::io::Result<()> {
        let column = format!("{} ({})", self.kind.label(), self.kind.unit());
        let rows = self
            .samples
            .iter()
            .map(|(t, v)| vec![t.format("%Y-%m-%d %H:%M:%S").to_string(), v.to_string()]);
        write_csv(
            writer,
            &format!("{} - {}", title, self.kind.label()),
            generated_at,
            &["Timestamp", column.as_str()],
            rows,
        )
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write a CSV document with a `#` comment block naming the chart and export time.
pub fn write_csv<W, R>(
    mut writer: W,
    title: &str,
    generated_at: DateTime<Utc>,
    columns: &[&str],
    rows: R,
) -> std::io::Result<()>
where
    W: Write,
    R: IntoIterator<Item = Vec<String>>,
{
    writeln!(writer, "# {}", title)?;
    writeln!(writer, "# Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

    let header: Vec<String> = columns.iter().map(|c| escape_field(c)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in rows {
        let fields: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()
}
