//! Typed MISP records.
//!
//! MISP serializes most numeric fields as JSON strings ("distribution": "1")
//! but accepts and occasionally emits plain numbers, so all numeric and
//! boolean fields go through tolerant deserializers. Records are decoded at
//! the client boundary; everything downstream of the client works on these
//! structs, never on raw JSON maps.

use serde::{Deserialize, Deserializer, Serialize};

fn u8_lenient<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n as u8),
        Raw::Str(s) => s.parse::<u8>().map_err(serde::de::Error::custom),
    }
}

fn bool_lenient<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Num(u64),
        Str(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Num(n) => n != 0,
        Raw::Str(s) => !matches!(s.as_str(), "" | "0" | "false"),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    pub uuid: String,
    pub info: String,
    #[serde(deserialize_with = "u8_lenient")]
    pub distribution: u8,
    #[serde(deserialize_with = "u8_lenient")]
    pub threat_level_id: u8,
    #[serde(deserialize_with = "u8_lenient")]
    pub analysis: u8,
    pub date: String,
    #[serde(default, deserialize_with = "bool_lenient")]
    pub published: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub orgc_id: String,
    #[serde(default, rename = "Attribute")]
    pub attributes: Vec<Attribute>,
    #[serde(default, rename = "Tag")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    pub id: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
    pub category: String,
    #[serde(default, deserialize_with = "bool_lenient")]
    pub to_ids: bool,
    #[serde(deserialize_with = "u8_lenient")]
    pub distribution: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub source_format: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub input_source: Option<String>,
    #[serde(default, deserialize_with = "bool_lenient")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "bool_lenient")]
    pub caching_enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload of `GET /servers/getVersion`. The module/taxonomy/galaxy lists are
/// only ever counted, so their element shape is left opaque.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub modules: Vec<serde_json::Value>,
    #[serde(default)]
    pub taxonomies: Vec<serde_json::Value>,
    #[serde(default)]
    pub galaxy_clusters: Vec<serde_json::Value>,
}

/// Outcome of the connectivity probe. Transport and protocol errors are folded
/// into `Error`; this type never carries a raw error value.
#[derive(Debug, Clone)]
pub enum ConnectionStatus {
    Connected {
        version: String,
        client_version: String,
    },
    Error {
        message: String,
    },
}

// --- Request payloads -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub info: String,
    pub distribution: u8,
    pub threat_level_id: u8,
    pub analysis: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAttribute {
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub value: String,
    pub category: String,
    pub to_ids: bool,
    pub distribution: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Filters for `POST /events/restSearch`. The client maps these onto MISP's
/// restSearch body keys (`from`/`to` are the date bounds there).
#[derive(Debug, Clone, Default)]
pub struct EventSearchQuery {
    pub limit: u32,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub org: Option<String>,
    pub tags: Option<String>,
    pub threat_level: Option<u8>,
}

// --- Response envelopes -----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "Event")]
    pub event: Event,
}

#[derive(Debug, Deserialize)]
pub struct AttributeEnvelope {
    #[serde(rename = "Attribute")]
    pub attribute: Attribute,
}

#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    #[serde(rename = "Feed")]
    pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct SearchEventsResponse {
    #[serde(default)]
    pub response: Vec<EventEnvelope>,
}

// --- Enum display names -----------------------------------------------------

pub fn distribution_name(id: u8) -> String {
    match id {
        0 => "Your Organization Only".to_string(),
        1 => "This Community Only".to_string(),
        2 => "Connected Communities".to_string(),
        3 => "All Communities".to_string(),
        5 => "Inherit from Event".to_string(),
        other => format!("Unknown ({})", other),
    }
}

pub fn threat_level_name(id: u8) -> String {
    match id {
        1 => "High".to_string(),
        2 => "Medium".to_string(),
        3 => "Low".to_string(),
        4 => "Undefined".to_string(),
        other => format!("Unknown ({})", other),
    }
}

pub fn analysis_name(id: u8) -> String {
    match id {
        0 => "Initial".to_string(),
        1 => "Ongoing".to_string(),
        2 => "Complete".to_string(),
        other => format!("Unknown ({})", other),
    }
}
