//! Source payload schema
//!
//! The listing source omits fields freely and is not consistent about whether
//! scalar values arrive as strings or numbers. Every field is therefore
//! optional and scalars are read leniently; unknown fields are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level search response
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "Results", default)]
    pub results: Option<Vec<RawListing>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawListing {
    #[serde(rename = "Id", deserialize_with = "lenient_string")]
    pub id: Option<String>,

    #[serde(rename = "MlsNumber", deserialize_with = "lenient_string")]
    pub mls_number: Option<String>,

    #[serde(rename = "PublicRemarks", deserialize_with = "lenient_string")]
    pub public_remarks: Option<String>,

    #[serde(rename = "Building")]
    pub building: Option<RawBuilding>,

    #[serde(rename = "Property")]
    pub property: Option<RawProperty>,

    #[serde(rename = "Land")]
    pub land: Option<RawLand>,

    #[serde(rename = "RelativeDetailsURL", deserialize_with = "lenient_string")]
    pub relative_details_url: Option<String>,

    #[serde(rename = "RelativeURLEn", deserialize_with = "lenient_string")]
    pub relative_url_en: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBuilding {
    #[serde(rename = "BathroomTotal", deserialize_with = "lenient_string")]
    pub bathroom_total: Option<String>,

    #[serde(rename = "Bedrooms", deserialize_with = "lenient_string")]
    pub bedrooms: Option<String>,

    #[serde(rename = "StoriesTotal", deserialize_with = "lenient_string")]
    pub stories_total: Option<String>,

    #[serde(rename = "Type", deserialize_with = "lenient_string")]
    pub building_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawProperty {
    #[serde(rename = "Price", deserialize_with = "lenient_string")]
    pub price: Option<String>,

    #[serde(rename = "Type", deserialize_with = "lenient_string")]
    pub property_type: Option<String>,

    #[serde(rename = "Address")]
    pub address: Option<RawAddress>,

    #[serde(rename = "Photo", deserialize_with = "lenient_list")]
    pub photos: Vec<RawPhoto>,

    #[serde(rename = "Parking", deserialize_with = "lenient_list")]
    pub parkings: Vec<RawParking>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAddress {
    #[serde(rename = "AddressText", deserialize_with = "lenient_string")]
    pub address_text: Option<String>,

    #[serde(rename = "Latitude", deserialize_with = "lenient_string")]
    pub latitude: Option<String>,

    #[serde(rename = "Longitude", deserialize_with = "lenient_string")]
    pub longitude: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPhoto {
    #[serde(rename = "HighResPath", deserialize_with = "lenient_string")]
    pub high_res_path: Option<String>,

    #[serde(rename = "MedResPath", deserialize_with = "lenient_string")]
    pub med_res_path: Option<String>,

    #[serde(rename = "LowResPath", deserialize_with = "lenient_string")]
    pub low_res_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawParking {
    #[serde(rename = "Name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLand {
    #[serde(rename = "SizeTotal", deserialize_with = "lenient_string")]
    pub size_total: Option<String>,
}

/// Reads a scalar as text: strings as-is, numbers and booleans via their JSON
/// rendering, anything else (null, arrays, objects) as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Reads an array, treating null as empty
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_read_as_text() {
        let raw: RawAddress =
            serde_json::from_str(r#"{"Latitude": 42.5, "Longitude": "-83.0"}"#).unwrap();
        assert_eq!(raw.latitude.as_deref(), Some("42.5"));
        assert_eq!(raw.longitude.as_deref(), Some("-83.0"));
        assert_eq!(raw.address_text, None);
    }

    #[test]
    fn test_null_fields_are_absent() {
        let raw: RawProperty =
            serde_json::from_str(r#"{"Price": null, "Photo": null, "Address": null}"#).unwrap();
        assert_eq!(raw.price, None);
        assert!(raw.photos.is_empty());
        assert!(raw.address.is_none());
    }

    #[test]
    fn test_missing_results() {
        let response: SearchResponse = serde_json::from_str(r#"{"Paging": {}}"#).unwrap();
        assert!(response.results.is_none());
    }
}
