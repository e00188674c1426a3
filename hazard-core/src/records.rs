use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical-record contract shared by every hazard category.
///
/// `id` is the dedupe key: it is assigned by the upstream source, never
/// changes, and two records carrying the same `id` describe the same logical
/// event even when their other fields differ.
pub trait HazardRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    /// Event time; `None` when the feed omitted it or it failed to parse.
    fn occurred_at(&self) -> Option<DateTime<Utc>>;
    fn alert_title(&self) -> String;
    fn alert_body(&self) -> String;
}

/// One seismic event from the USGS GeoJSON summary feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuakeEvent {
    pub id: String,
    pub magnitude: f64,
    pub place: String,
    pub occurred_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl QuakeEvent {
    /// Normalize one `features[]` element. `None` means a hard-required field
    /// (id, magnitude) is missing and the entry must be dropped.
    pub fn from_feature(feature: &Value) -> Option<Self> {
        let id = feature.get("id")?.as_str()?.to_owned();
        let props = feature.get("properties")?;
        let magnitude = props.get("mag")?.as_f64()?;
        let place = props
            .get("place")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let occurred_at = props
            .get("time")
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        let url = props
            .get("url")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        Some(Self {
            id,
            magnitude,
            place,
            occurred_at,
            url,
        })
    }
}

impl HazardRecord for QuakeEvent {
    fn id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
    }

    fn alert_title(&self) -> String {
        format!("Earthquake alert: M{:.1}", self.magnitude)
    }

    fn alert_body(&self) -> String {
        let mut body = format!("Magnitude {:.1} {}", self.magnitude, self.place);
        if let Some(url) = &self.url {
            body.push('\n');
            body.push_str(url);
        }
        body
    }
}

/// NWS alert severity scale; anything unrecognized maps to `Unknown` rather
/// than invalidating the entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    #[default]
    Unknown,
}

impl Severity {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Extreme" => Self::Extreme,
            "Severe" => Self::Severe,
            "Moderate" => Self::Moderate,
            "Minor" => Self::Minor,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extreme => "Extreme",
            Self::Severe => "Severe",
            Self::Moderate => "Moderate",
            Self::Minor => "Minor",
            Self::Unknown => "Unknown",
        }
    }
}

/// One active warning from the NWS alerts feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherWarning {
    pub id: String,
    pub event: String,
    pub severity: Severity,
    pub area: String,
    pub headline: Option<String>,
    pub sent: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl WeatherWarning {
    pub fn from_feature(feature: &Value) -> Option<Self> {
        let props = feature.get("properties")?;
        // NWS carries the stable URN under properties.id; the top-level id is
        // the self link.
        let id = props
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| feature.get("id").and_then(Value::as_str))?
            .to_owned();
        let event = props.get("event")?.as_str()?.to_owned();
        let severity = props
            .get("severity")
            .and_then(Value::as_str)
            .map(Severity::from_label)
            .unwrap_or_default();
        let area = props
            .get("areaDesc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let headline = props
            .get("headline")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        let sent = parse_rfc3339(props.get("sent"));
        let url = feature
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        Some(Self {
            id,
            event,
            severity,
            area,
            headline,
            sent,
            url,
        })
    }
}

impl HazardRecord for WeatherWarning {
    fn id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.sent
    }

    fn alert_title(&self) -> String {
        format!("Weather alert: {}", self.event)
    }

    fn alert_body(&self) -> String {
        match &self.headline {
            Some(headline) => format!("[{}] {}", self.severity.as_str(), headline),
            None => format!("[{}] {} for {}", self.severity.as_str(), self.event, self.area),
        }
    }
}

/// One registry entry from the ReliefWeb disasters listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisasterAlert {
    pub id: String,
    pub kind: String,
    pub country: String,
    pub status: String,
    pub reported_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl DisasterAlert {
    pub fn from_entry(entry: &Value) -> Option<Self> {
        // ReliefWeb ids are numeric in the wire payload.
        let id = match entry.get("id")? {
            Value::String(raw) => raw.clone(),
            Value::Number(raw) => raw.to_string(),
            _ => return None,
        };
        let fields = entry.get("fields")?;
        let kind = fields
            .get("type")
            .and_then(Value::as_array)
            .and_then(|types| types.first())
            .and_then(|first| first.get("name"))
            .and_then(Value::as_str)?
            .to_owned();
        let country = fields
            .get("country")
            .and_then(Value::as_array)
            .and_then(|countries| countries.first())
            .and_then(|first| first.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_owned();
        let status = fields
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        let reported_at = parse_rfc3339(fields.get("date").and_then(|date| date.get("created")));
        let url = fields
            .get("url")
            .and_then(Value::as_str)
            .filter(|raw| !raw.is_empty())
            .map(ToOwned::to_owned);

        Some(Self {
            id,
            kind,
            country,
            status,
            reported_at,
            url,
        })
    }
}

impl HazardRecord for DisasterAlert {
    fn id(&self) -> &str {
        &self.id
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.reported_at
    }

    fn alert_title(&self) -> String {
        format!("Disaster alert: {}", self.kind)
    }

    fn alert_body(&self) -> String {
        let mut body = format!("{} in {} ({})", self.kind, self.country, self.status);
        if let Some(url) = &self.url {
            body.push('\n');
            body.push_str(url);
        }
        body
    }
}

fn parse_rfc3339(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
