//! Shared typed models used across the store, query, synthesis and sampling
//! layers.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Graph vocabulary
// ---------------------------------------------------------------------------

/// Node labels present in the medical graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Disease,
    Drug,
    Symptom,
    Group,
    Chapter,
}

impl NodeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Disease => "Disease",
            NodeLabel::Drug => "Drug",
            NodeLabel::Symptom => "Symptom",
            NodeLabel::Group => "Group",
            NodeLabel::Chapter => "Chapter",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge types written by the graph importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// `Drug -> Disease`
    Treats,
    /// `Disease -> Symptom`
    HasSymptom,
    /// `Disease -> Group` and `Group -> Chapter`
    BelongsTo,
    /// `Disease -> Disease` (sub-disease to parent)
    IsA,
}

impl Relationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Relationship::Treats => "TREATS",
            Relationship::HasSymptom => "HAS_SYMPTOM",
            Relationship::BelongsTo => "BELONGS_TO",
            Relationship::IsA => "IS_A",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node row as stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub label: NodeLabel,
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl NodeRecord {
    pub fn new(label: NodeLabel, id: &str, name: &str) -> Self {
        Self {
            label,
            id: id.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source_label: NodeLabel,
    pub source_id: String,
    pub relationship: Relationship,
    pub target_label: NodeLabel,
    pub target_id: String,
}

impl EdgeRecord {
    pub fn new(
        source_label: NodeLabel,
        source_id: &str,
        relationship: Relationship,
        target_label: NodeLabel,
        target_id: &str,
    ) -> Self {
        Self {
            source_label,
            source_id: source_id.to_string(),
            relationship,
            target_label,
            target_id: target_id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampling models
// ---------------------------------------------------------------------------

/// A disease node from which paths are sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntity {
    pub id: String,
    pub name: String,
}

/// Structural path class sampled from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HopClass {
    #[serde(rename = "1-hop")]
    OneHop,
    #[serde(rename = "2-hop")]
    TwoHop,
    #[serde(rename = "3-hop")]
    ThreeHop,
}

impl HopClass {
    /// Processing order within a seed.
    pub const ALL: [HopClass; 3] = [HopClass::OneHop, HopClass::TwoHop, HopClass::ThreeHop];

    pub fn as_str(self) -> &'static str {
        match self {
            HopClass::OneHop => "1-hop",
            HopClass::TwoHop => "2-hop",
            HopClass::ThreeHop => "3-hop",
        }
    }

    /// Array slot used by per-class counters.
    pub(crate) fn slot(self) -> usize {
        match self {
            HopClass::OneHop => 0,
            HopClass::TwoHop => 1,
            HopClass::ThreeHop => 2,
        }
    }
}

impl fmt::Display for HopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HopClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1-hop" | "one_hop" | "onehop" => Ok(HopClass::OneHop),
            "2-hop" | "two_hop" | "twohop" => Ok(HopClass::TwoHop),
            "3-hop" | "three_hop" | "threehop" => Ok(HopClass::ThreeHop),
            other => Err(format!("unknown hop class: {other}")),
        }
    }
}

/// One value per hop class. Used for quotas, fan-out limits and counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HopTable<T> {
    #[serde(rename = "1-hop")]
    pub one_hop: T,
    #[serde(rename = "2-hop")]
    pub two_hop: T,
    #[serde(rename = "3-hop")]
    pub three_hop: T,
}

impl<T> HopTable<T> {
    pub fn new(one_hop: T, two_hop: T, three_hop: T) -> Self {
        Self {
            one_hop,
            two_hop,
            three_hop,
        }
    }

    pub fn get(&self, hop: HopClass) -> &T {
        match hop {
            HopClass::OneHop => &self.one_hop,
            HopClass::TwoHop => &self.two_hop,
            HopClass::ThreeHop => &self.three_hop,
        }
    }

    pub fn get_mut(&mut self, hop: HopClass) -> &mut T {
        match hop {
            HopClass::OneHop => &mut self.one_hop,
            HopClass::TwoHop => &mut self.two_hop,
            HopClass::ThreeHop => &mut self.three_hop,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(HopClass, &T) -> U) -> HopTable<U> {
        HopTable {
            one_hop: f(HopClass::OneHop, &self.one_hop),
            two_hop: f(HopClass::TwoHop, &self.two_hop),
            three_hop: f(HopClass::ThreeHop, &self.three_hop),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (HopClass, &T)> {
        HopClass::ALL.into_iter().map(move |hop| (hop, self.get(hop)))
    }
}

impl<T: Default> Default for HopTable<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default(), T::default())
    }
}

impl<T> std::ops::Index<HopClass> for HopTable<T> {
    type Output = T;

    fn index(&self, hop: HopClass) -> &T {
        self.get(hop)
    }
}

/// Field names carried by [`PathRecord`]s.
pub mod fields {
    pub const DISEASE: &str = "disease";
    pub const DISEASE_DESC: &str = "disease_desc";
    pub const SYMPTOM: &str = "symptom";
    pub const DRUG: &str = "drug";
    pub const DRUG_DESC: &str = "drug_desc";
    pub const GROUP_NAME: &str = "group_name";
    pub const GROUP_DESC: &str = "group_desc";
    pub const SUB_DISEASE: &str = "sub_disease";
    pub const SUB_DESC: &str = "sub_desc";
    pub const CHAPTER_NAME: &str = "chapter_name";
    pub const CHAPTER_DESC: &str = "chapter_desc";
}

/// A single path returned by a hop query: field name to optional value.
///
/// Field order follows the query's column order. Missing values come from
/// optional graph matches and are not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRecord {
    fields: IndexMap<String, Option<String>>,
}

impl PathRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: Option<&str>) -> Self {
        self.insert(field, value.map(str::to_string));
        self
    }

    pub fn insert(&mut self, field: &str, value: Option<String>) {
        self.fields.insert(field.to_string(), value);
    }

    /// Value of `field`, treating empty and whitespace-only strings as absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One labeled row of the output corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedSentence {
    pub text: String,
    pub hop: HopClass,
    pub source_id: String,
    /// Always true: the generator only emits positive factual statements.
    pub label: bool,
}

impl SynthesizedSentence {
    pub fn new(text: String, hop: HopClass, source_id: &str) -> Self {
        Self {
            text,
            hop,
            source_id: source_id.to_string(),
            label: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_class_round_trips_through_display() {
        for hop in HopClass::ALL {
            assert_eq!(hop.to_string().parse::<HopClass>().unwrap(), hop);
        }
        assert!("4-hop".parse::<HopClass>().is_err());
    }

    #[test]
    fn hop_table_serializes_with_output_labels() {
        let table = HopTable::new(5usize, 8, 3);
        let json = serde_json::to_value(table).unwrap();
        assert_eq!(json["1-hop"], 5);
        assert_eq!(json["2-hop"], 8);
        assert_eq!(json["3-hop"], 3);
        assert_eq!(table[HopClass::TwoHop], 8);
    }

    #[test]
    fn path_record_treats_blank_values_as_absent() {
        let record = PathRecord::new()
            .with(fields::DISEASE, Some("Cúm"))
            .with(fields::DRUG, Some("   "))
            .with(fields::SYMPTOM, None);
        assert_eq!(record.get(fields::DISEASE), Some("Cúm"));
        assert!(!record.contains(fields::DRUG));
        assert!(!record.contains(fields::SYMPTOM));
        assert!(!record.contains(fields::GROUP_NAME));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn sentence_is_always_positive() {
        let s = SynthesizedSentence::new("x".into(), HopClass::ThreeHop, "A00");
        assert!(s.label);
        assert_eq!(s.source_id, "A00");
    }
}
