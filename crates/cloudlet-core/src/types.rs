//! Client and application descriptors
//!
//! Both descriptors are open maps from string keys to a small closed set of
//! value kinds. Well-known keys (see [`crate::keys`]) get typed accessors;
//! every other key is preserved and passed through to the directory query
//! and the probe body as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CloudletError, Result};
use crate::keys;

/// A single descriptor value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<String>),
}

impl DescriptorValue {
    /// Numeric view; numeric strings such as `"1600"` are accepted too
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DescriptorValue::Number(n) => n.as_f64(),
            DescriptorValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DescriptorValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            DescriptorValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value as a query string parameter
    pub fn to_query_value(&self) -> String {
        match self {
            DescriptorValue::Bool(b) => b.to_string(),
            DescriptorValue::Number(n) => n.to_string(),
            DescriptorValue::Text(s) => s.clone(),
            DescriptorValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for DescriptorValue {
    fn from(value: &str) -> Self {
        DescriptorValue::Text(value.to_string())
    }
}

impl From<String> for DescriptorValue {
    fn from(value: String) -> Self {
        DescriptorValue::Text(value)
    }
}

impl From<bool> for DescriptorValue {
    fn from(value: bool) -> Self {
        DescriptorValue::Bool(value)
    }
}

impl From<i64> for DescriptorValue {
    fn from(value: i64) -> Self {
        DescriptorValue::Number(value.into())
    }
}

impl From<u32> for DescriptorValue {
    fn from(value: u32) -> Self {
        DescriptorValue::Number(value.into())
    }
}

impl From<Vec<String>> for DescriptorValue {
    fn from(value: Vec<String>) -> Self {
        DescriptorValue::List(value)
    }
}

impl TryFrom<f64> for DescriptorValue {
    type Error = CloudletError;

    fn try_from(value: f64) -> Result<Self> {
        serde_json::Number::from_f64(value)
            .map(DescriptorValue::Number)
            .ok_or_else(|| CloudletError::InvalidDescriptor(format!("{value} is not a finite number")))
    }
}

impl From<&DescriptorValue> for serde_json::Value {
    fn from(value: &DescriptorValue) -> Self {
        match value {
            DescriptorValue::Bool(b) => serde_json::Value::Bool(*b),
            DescriptorValue::Number(n) => serde_json::Value::Number(n.clone()),
            DescriptorValue::Text(s) => serde_json::Value::String(s.clone()),
            DescriptorValue::List(items) => {
                serde_json::Value::Array(items.iter().cloned().map(serde_json::Value::String).collect())
            }
        }
    }
}

/// Ordered attribute map shared by both descriptors
pub type Attributes = BTreeMap<String, DescriptorValue>;

/// Returns `(latitude, longitude)` only when both are present
fn coordinates_in(attributes: &Attributes) -> Option<(String, String)> {
    let lat = attributes.get(keys::client::LATITUDE)?;
    let lon = attributes.get(keys::client::LONGITUDE)?;
    Some((lat.to_query_value(), lon.to_query_value()))
}

/// Information about the mobile client
///
/// No key is required. Typical keys are `GPS_latitude`, `GPS_longitude`,
/// `ip_address` and `network_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientInfo {
    attributes: Attributes,
}

impl ClientInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary attribute
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DescriptorValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set GPS coordinates (decimal degrees, kept as given)
    pub fn with_coordinates(self, latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        self.with(keys::client::LATITUDE, latitude.into())
            .with(keys::client::LONGITUDE, longitude.into())
    }

    pub fn with_ip_address(self, ip: impl Into<String>) -> Self {
        self.with(keys::client::IP_ADDRESS, ip.into())
    }

    /// Network type, e.g. `wifi` or `cellular`
    pub fn with_network_type(self, network_type: impl Into<String>) -> Self {
        self.with(keys::client::NETWORK_TYPE, network_type.into())
    }

    pub fn get(&self, key: &str) -> Option<&DescriptorValue> {
        self.attributes.get(key)
    }

    pub fn coordinates(&self) -> Option<(String, String)> {
        coordinates_in(&self.attributes)
    }

    pub fn ip_address(&self) -> Option<String> {
        self.get(keys::client::IP_ADDRESS).map(DescriptorValue::to_query_value)
    }

    pub fn network_type(&self) -> Option<&str> {
        self.get(keys::client::NETWORK_TYPE).and_then(DescriptorValue::as_str)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Information about the requesting application
///
/// The application id namespaces per-application snapshots on each
/// candidate. It may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppInfo {
    attributes: Attributes,
}

impl AppInfo {
    /// Create a descriptor with the given application id
    pub fn new(app_id: impl Into<String>) -> Self {
        Self::default().with(keys::app::APP_ID, app_id.into())
    }

    /// Set an arbitrary attribute
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DescriptorValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Minimum CPU clock speed (MHz) a cloudlet must offer
    pub fn with_min_cpu_clock_mhz(self, mhz: u32) -> Self {
        self.with(keys::app::REQUIRED_MIN_CPU_CLOCK, mhz)
    }

    /// Maximum tolerated RTT (ms); forwarded to cloudlets, never filtered on locally
    pub fn with_max_rtt_ms(self, rtt_ms: u32) -> Self {
        self.with(keys::app::REQUIRED_RTT, rtt_ms)
    }

    pub fn with_cache_urls(self, urls: Vec<String>) -> Self {
        self.with(keys::app::REQUIRED_CACHE_URLS, urls)
    }

    pub fn with_cache_files(self, patterns: Vec<String>) -> Self {
        self.with(keys::app::REQUIRED_CACHE_FILES, patterns)
    }

    pub fn get(&self, key: &str) -> Option<&DescriptorValue> {
        self.attributes.get(key)
    }

    /// Application id, empty when absent
    pub fn app_id(&self) -> &str {
        self.get(keys::app::APP_ID)
            .and_then(DescriptorValue::as_str)
            .unwrap_or_default()
    }

    pub fn min_cpu_clock_mhz(&self) -> Option<f64> {
        self.get(keys::app::REQUIRED_MIN_CPU_CLOCK)
            .and_then(DescriptorValue::as_f64)
    }

    pub fn max_rtt_ms(&self) -> Option<f64> {
        self.get(keys::app::REQUIRED_RTT).and_then(DescriptorValue::as_f64)
    }

    pub fn cache_urls(&self) -> &[String] {
        self.get(keys::app::REQUIRED_CACHE_URLS)
            .and_then(DescriptorValue::as_list)
            .unwrap_or_default()
    }

    pub fn cache_files(&self) -> &[String] {
        self.get(keys::app::REQUIRED_CACHE_FILES)
            .and_then(DescriptorValue::as_list)
            .unwrap_or_default()
    }

    /// Coordinates carried on the application descriptor, if any
    pub fn coordinates(&self) -> Option<(String, String)> {
        coordinates_in(&self.attributes)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Body sent to a cloudlet probe: `{"application": {...}}`
    pub fn probe_body(&self) -> serde_json::Value {
        let application: serde_json::Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect();

        let mut body = serde_json::Map::new();
        body.insert(
            keys::app::APPLICATION.to_string(),
            serde_json::Value::Object(application),
        );
        serde_json::Value::Object(body)
    }
}
