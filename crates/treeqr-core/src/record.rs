//! Tree record model
//!
//! Field names follow the stored document schema exactly (`Name`, `QR`,
//! `environmentalBenefits`, ...). The three collection fields may be missing from a
//! stored document; [`Record::normalize`] turns them into empty containers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Key/value attributes such as taxonomy ranks or site details
pub type Attributes = BTreeMap<String, String>;

/// A tree record as stored in the document store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID", default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(rename = "Name", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "Published", default, deserialize_with = "null_as_default")]
    pub published: bool,

    #[serde(rename = "QR", default, deserialize_with = "null_as_default")]
    pub qr_enabled: bool,

    #[serde(rename = "Saved", default, deserialize_with = "null_as_default")]
    pub saved: bool,

    /// Taxonomic attributes (family, genus, ...)
    #[serde(default, deserialize_with = "nullable_attributes")]
    pub classification: Option<Attributes>,

    /// Site attributes (campus, latitude, ...)
    #[serde(default, deserialize_with = "nullable_attributes")]
    pub location: Option<Attributes>,

    /// One entry per photo, typically `url` and `caption`
    #[serde(default, deserialize_with = "nullable_images")]
    pub images: Option<Vec<Attributes>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(
        rename = "environmentalBenefits",
        default,
        deserialize_with = "null_as_default"
    )]
    pub environmental_benefits: String,

    #[serde(
        rename = "medicinalBenefits",
        default,
        deserialize_with = "null_as_default"
    )]
    pub medicinal_benefits: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub botanical: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub native: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,

    #[serde(rename = "lastUpdated", default, deserialize_with = "null_as_default")]
    pub last_updated: String,

    #[serde(rename = "volunteerName", default, deserialize_with = "null_as_default")]
    pub volunteer: String,

    /// Owner of the record in the admin app
    #[serde(default, deserialize_with = "null_as_default")]
    pub uid: String,
}

impl Record {
    /// Fill absent collections with empty ones.
    ///
    /// Total and idempotent; every other field passes through untouched.
    pub fn normalize(mut self) -> Self {
        self.classification.get_or_insert_with(Attributes::new);
        self.location.get_or_insert_with(Attributes::new);
        self.images.get_or_insert_with(Vec::new);
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.classification.is_some() && self.location.is_some() && self.images.is_some()
    }

    pub fn classification(&self) -> &Attributes {
        static EMPTY: Attributes = Attributes::new();
        self.classification.as_ref().unwrap_or(&EMPTY)
    }

    pub fn location(&self) -> &Attributes {
        static EMPTY: Attributes = Attributes::new();
        self.location.as_ref().unwrap_or(&EMPTY)
    }

    pub fn images(&self) -> &[Attributes] {
        self.images.as_deref().unwrap_or(&[])
    }
}

// Stored documents occasionally carry explicit nulls for scalar fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

type RawAttributes = BTreeMap<String, Option<String>>;

fn fill_nulls(raw: RawAttributes) -> Attributes {
    raw.into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect()
}

// Null attribute values read as empty strings.
fn nullable_attributes<'de, D>(deserializer: D) -> Result<Option<Attributes>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawAttributes>::deserialize(deserializer)?.map(fill_nulls))
}

// Firebase leaves `null` in place of deleted array entries; those read as empty maps.
fn nullable_images<'de, D>(deserializer: D) -> Result<Option<Vec<Attributes>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<RawAttributes>>>::deserialize(deserializer)?;
    Ok(raw.map(|images| {
        images
            .into_iter()
            .map(|image| image.map(fill_nulls).unwrap_or_default())
            .collect()
    }))
}
