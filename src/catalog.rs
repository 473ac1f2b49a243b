use serde_json::Value;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://app.ticketmaster.com/discovery/v2";
const PAGE_SIZE: &str = "50";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CatalogEntity {
    pub(super) id: String,
    pub(super) name: String,
}

#[derive(Debug, Error)]
pub(super) enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed catalog record: missing `{0}`")]
    MalformedRecord(&'static str),
}

/// Thin client for the Ticketmaster Discovery API. Parsing is split from the
/// HTTP calls so the parse layer can be exercised against JSON fixtures.
pub(super) struct CatalogClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CatalogClient {
    pub(super) fn new(api_key: String) -> Self {
        CatalogClient {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub(super) async fn find_artists(&self, keyword: &str) -> Result<Vec<CatalogEntity>, CatalogError> {
        let body = self.fetch("attractions.json", keyword).await?;
        parse_entities(&body, "attractions")
    }

    pub(super) async fn find_events(&self, keyword: &str) -> Result<Vec<CatalogEntity>, CatalogError> {
        let body = self.fetch("events.json", keyword).await?;
        parse_entities(&body, "events")
    }

    pub(super) async fn find_event_details(
        &self,
        keyword: &str,
    ) -> Result<Vec<EventDetails>, CatalogError> {
        let body = self.fetch("events.json", keyword).await?;
        parse_event_details(&body)
    }

    async fn fetch(&self, resource: &str, keyword: &str) -> Result<Value, CatalogError> {
        let url = format!("{}/{}", self.base_url, resource);
        let body = self
            .http
            .get(&url)
            .query(&[
                ("keyword", keyword),
                ("size", PAGE_SIZE),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body)
    }
}

/// Extracts (id, name) pairs from a Discovery API page. A missing `_embedded`
/// section means the search matched nothing and is not an error; a record
/// without an id or name is a malformed-record fault.
pub(super) fn parse_entities(
    body: &Value,
    kind: &'static str,
) -> Result<Vec<CatalogEntity>, CatalogError> {
    let Some(items) = embedded_array(body, kind) else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|item| {
            let id = required_str(item, "id")?;
            let name = required_str(item, "name")?;
            Ok(CatalogEntity {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct PriceRange {
    pub(super) min: f64,
    pub(super) max: f64,
    pub(super) currency: String,
}

/// Everything the event detail view renders. All fields except the name are
/// optional in the upstream payload.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct EventDetails {
    pub(super) name: String,
    pub(super) status: Option<String>,
    pub(super) price_range: Option<PriceRange>,
    pub(super) local_date: Option<String>,
    pub(super) local_time: Option<String>,
    pub(super) venues: Vec<String>,
    pub(super) url: Option<String>,
}

pub(super) fn parse_event_details(body: &Value) -> Result<Vec<EventDetails>, CatalogError> {
    let Some(items) = embedded_array(body, "events") else {
        return Ok(Vec::new());
    };
    items.iter().map(parse_event_detail).collect()
}

fn parse_event_detail(item: &Value) -> Result<EventDetails, CatalogError> {
    let name = required_str(item, "name")?.to_string();

    let status = item
        .pointer("/dates/status/code")
        .and_then(Value::as_str)
        .map(str::to_string);

    let price_range = item
        .get("priceRanges")
        .and_then(Value::as_array)
        .and_then(|ranges| ranges.first())
        .and_then(|range| {
            let min = range.get("min").and_then(Value::as_f64)?;
            let max = range.get("max").and_then(Value::as_f64)?;
            let currency = range
                .get("currency")
                .and_then(Value::as_str)
                .unwrap_or("EUR")
                .to_string();
            Some(PriceRange { min, max, currency })
        });

    let (local_date, local_time) = start_fields(item);

    let venues = item
        .pointer("/_embedded/venues")
        .and_then(Value::as_array)
        .map(|venues| {
            venues
                .iter()
                .filter_map(|venue| {
                    let name = venue.get("name").and_then(Value::as_str)?;
                    match venue.pointer("/city/name").and_then(Value::as_str) {
                        Some(city) => Some(format!("{name}, {city}")),
                        None => Some(name.to_string()),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let url = item.get("url").and_then(Value::as_str).map(str::to_string);

    Ok(EventDetails {
        name,
        status,
        price_range,
        local_date,
        local_time,
        venues,
        url,
    })
}

/// Prefers the venue-local date/time the API already provides; falls back to
/// the UTC timestamp when only `dateTime` is present.
fn start_fields(item: &Value) -> (Option<String>, Option<String>) {
    let start = item.pointer("/dates/start");
    let local_date = start
        .and_then(|s| s.get("localDate"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let local_time = start
        .and_then(|s| s.get("localTime"))
        .and_then(Value::as_str)
        .map(str::to_string);
    if local_date.is_some() {
        return (local_date, local_time);
    }

    let parsed = start
        .and_then(|s| s.get("dateTime"))
        .and_then(Value::as_str)
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok());
    match parsed {
        Some(dt) => (
            Some(dt.format("%Y-%m-%d").to_string()),
            Some(dt.format("%H:%M").to_string()),
        ),
        None => (None, None),
    }
}

fn embedded_array<'a>(body: &'a Value, kind: &str) -> Option<&'a Vec<Value>> {
    body.get("_embedded")
        .and_then(|embedded| embedded.get(kind))
        .and_then(Value::as_array)
}

fn required_str<'a>(item: &'a Value, field: &'static str) -> Result<&'a str, CatalogError> {
    item.get(field)
        .and_then(Value::as_str)
        .ok_or(CatalogError::MalformedRecord(field))
}
