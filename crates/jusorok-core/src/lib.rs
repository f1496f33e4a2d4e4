use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config_file;
pub mod gazetteer;
pub mod ocr;
pub mod rescore;

// Re-export for convenience
pub use ocr::{OcrBackend, OcrError, OcrMetadata, OcrResponse, Recognized};
pub use rescore::{GazetteerRescorer, NoopRescorer, Rescorer, apply_rescorer};

/// One of the eleven scored fields of a contact entry.
///
/// The declaration order is the canonical order: name, phone, then the
/// address components in Korean address grammar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Phone,
    Sido,
    Sigungu,
    RoadName,
    BuildingNumber,
    Dong,
    Ho,
    LegalDong,
    BuildingName,
    Floor,
}

impl Field {
    /// Every scored field, in canonical order.
    pub const ALL: [Field; 11] = [
        Field::Name,
        Field::Phone,
        Field::Sido,
        Field::Sigungu,
        Field::RoadName,
        Field::BuildingNumber,
        Field::Dong,
        Field::Ho,
        Field::LegalDong,
        Field::BuildingName,
        Field::Floor,
    ];

    /// The nine address components, in cascade order.
    pub const ADDRESS: [Field; 9] = [
        Field::Sido,
        Field::Sigungu,
        Field::RoadName,
        Field::BuildingNumber,
        Field::Dong,
        Field::Ho,
        Field::LegalDong,
        Field::BuildingName,
        Field::Floor,
    ];

    /// Key used in confidence maps and in the JSON wire format.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Sido => "sido",
            Field::Sigungu => "sigungu",
            Field::RoadName => "road_name",
            Field::BuildingNumber => "building_number",
            Field::Dong => "dong",
            Field::Ho => "ho",
            Field::LegalDong => "legal_dong",
            Field::BuildingName => "building_name",
            Field::Floor => "floor",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn is_address(self) -> bool {
        !matches!(self, Field::Name | Field::Phone)
    }

    /// Suffix character the component conventionally carries, if any.
    ///
    /// `legal_dong` shares the `동` suffix with `dong`.
    pub fn suffix(self) -> Option<char> {
        match self {
            Field::Dong | Field::LegalDong => Some('동'),
            Field::Ho => Some('호'),
            Field::Floor => Some('층'),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Kind of phone number, decided by which canonical shape matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneType {
    Cellphone,
    Landline,
    Unknown,
}

impl fmt::Display for PhoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneType::Cellphone => write!(f, "cellphone"),
            PhoneType::Landline => write!(f, "landline"),
            PhoneType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Korean address split into its nine components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub road_name: Option<String>,
    pub building_number: Option<String>,
    pub dong: Option<String>,
    pub ho: Option<String>,
    pub legal_dong: Option<String>,
    pub building_name: Option<String>,
    pub floor: Option<String>,
    /// Confidence per component; every one of the nine keys is present.
    pub confidence: BTreeMap<String, f64>,
    pub human_review: bool,
}

impl AddressComponents {
    /// Value of an address component. Always `None` for name and phone.
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::Sido => &self.sido,
            Field::Sigungu => &self.sigungu,
            Field::RoadName => &self.road_name,
            Field::BuildingNumber => &self.building_number,
            Field::Dong => &self.dong,
            Field::Ho => &self.ho,
            Field::LegalDong => &self.legal_dong,
            Field::BuildingName => &self.building_name,
            Field::Floor => &self.floor,
            Field::Name | Field::Phone => return None,
        };
        slot.as_deref()
    }

    /// Mutable slot for an address component. `None` for name and phone.
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Sido => Some(&mut self.sido),
            Field::Sigungu => Some(&mut self.sigungu),
            Field::RoadName => Some(&mut self.road_name),
            Field::BuildingNumber => Some(&mut self.building_number),
            Field::Dong => Some(&mut self.dong),
            Field::Ho => Some(&mut self.ho),
            Field::LegalDong => Some(&mut self.legal_dong),
            Field::BuildingName => Some(&mut self.building_name),
            Field::Floor => Some(&mut self.floor),
            Field::Name | Field::Phone => None,
        }
    }

    /// Number of resolved (non-null) components.
    pub fn resolved_count(&self) -> usize {
        Field::ADDRESS
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved_count() == 0
    }

    /// Mean confidence over the nine components.
    pub fn mean_confidence(&self) -> f64 {
        mean_of(Field::ADDRESS.iter().map(|f| {
            self.confidence.get(f.key()).copied().unwrap_or(0.0)
        }))
    }

    /// Render as a single Korean address line:
    /// `시·도 시·군·구 도로명 건물번호 동 호 (법정동, 건물명)`.
    pub fn to_formatted_address(&self) -> String {
        let parenthetical = match (&self.legal_dong, &self.building_name) {
            (Some(legal), Some(building)) => Some(format!("({}, {})", legal, building)),
            _ => None,
        };

        [
            Field::Sido,
            Field::Sigungu,
            Field::RoadName,
            Field::BuildingNumber,
            Field::Dong,
            Field::Ho,
        ]
        .iter()
        .filter_map(|f| self.get(*f))
        .chain(parenthetical.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// One contact record within a multi-record page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    /// `None` only when no phone number was found at all.
    pub phone_type: Option<PhoneType>,
    pub address: Option<AddressComponents>,
    /// Confidence per field; keys are exactly [`Field::ALL`].
    pub confidence: BTreeMap<String, f64>,
    /// 1-based position in source order.
    pub entry_number: usize,
    pub human_review: bool,
}

impl ContactEntry {
    /// Value of any field, address components included.
    pub fn field_value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Phone => self.phone_number.as_deref(),
            _ => self.address.as_ref().and_then(|a| a.get(field)),
        }
    }

    pub fn field_confidence(&self, field: Field) -> f64 {
        self.confidence.get(field.key()).copied().unwrap_or(0.0)
    }

    /// Mean over every field confidence, address sub-components included.
    pub fn aggregate_confidence(&self) -> f64 {
        mean_of(Field::ALL.iter().map(|f| self.field_confidence(*f)))
    }
}

/// Final product of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiEntryResult {
    pub entries: Vec<ContactEntry>,
    pub total_entries: usize,
    pub processing_metadata: BTreeMap<String, serde_json::Value>,
    pub image_id: String,
}

impl MultiEntryResult {
    /// Number of entries flagged for human review.
    pub fn flagged_count(&self) -> usize {
        self.entries.iter().filter(|e| e.human_review).count()
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
