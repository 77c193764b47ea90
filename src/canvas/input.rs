//! Canvas input collected from the user and the description derived from it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::fields::CanvasField;

/// The nine free-text canvas fields as entered by the user.
///
/// Every field defaults to the empty string; there is no required field.
/// Missing keys in JSON input deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasInput {
    pub value_proposition: String,
    pub customer_profile: String,
    pub distribution_channel: String,
    pub customer_relationship: String,
    pub revenue_streams: String,
    pub key_resources: String,
    pub key_activities: String,
    pub key_partners: String,
    pub cost_structure: String,
}

impl CanvasInput {
    /// Creates an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a canvas pre-filled with the example text of every field.
    pub fn with_examples() -> Self {
        let mut canvas = Self::new();
        for field in CanvasField::ALL {
            canvas.set(field, field.example());
        }
        canvas
    }

    /// Returns the value of a field.
    pub fn get(&self, field: CanvasField) -> &str {
        match field {
            CanvasField::ValueProposition => &self.value_proposition,
            CanvasField::CustomerProfile => &self.customer_profile,
            CanvasField::DistributionChannel => &self.distribution_channel,
            CanvasField::CustomerRelationship => &self.customer_relationship,
            CanvasField::RevenueStreams => &self.revenue_streams,
            CanvasField::KeyResources => &self.key_resources,
            CanvasField::KeyActivities => &self.key_activities,
            CanvasField::KeyPartners => &self.key_partners,
            CanvasField::CostStructure => &self.cost_structure,
        }
    }

    /// Replaces the value of a field.
    pub fn set(&mut self, field: CanvasField, value: impl Into<String>) {
        let slot = match field {
            CanvasField::ValueProposition => &mut self.value_proposition,
            CanvasField::CustomerProfile => &mut self.customer_profile,
            CanvasField::DistributionChannel => &mut self.distribution_channel,
            CanvasField::CustomerRelationship => &mut self.customer_relationship,
            CanvasField::RevenueStreams => &mut self.revenue_streams,
            CanvasField::KeyResources => &mut self.key_resources,
            CanvasField::KeyActivities => &mut self.key_activities,
            CanvasField::KeyPartners => &mut self.key_partners,
            CanvasField::CostStructure => &mut self.cost_structure,
        };
        *slot = value.into();
    }

    /// Builder-style variant of [`CanvasInput::set`].
    pub fn with(mut self, field: CanvasField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns true if every field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        CanvasField::ALL
            .iter()
            .all(|f| self.get(*f).trim().is_empty())
    }

    /// Number of fields holding non-whitespace text.
    pub fn filled_count(&self) -> usize {
        CanvasField::ALL
            .iter()
            .filter(|f| !self.get(**f).trim().is_empty())
            .count()
    }

    /// Assembles the labeled canvas description sent to the model.
    pub fn describe(&self) -> CanvasDescription {
        CanvasDescription::from_input(self)
    }

    /// Parses a canvas from a JSON object keyed by field identifiers.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a canvas from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read canvas file {}: {}", path.display(), e))?;
        let canvas = Self::from_json_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid canvas JSON in {}: {}", path.display(), e))?;
        Ok(canvas)
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Labeled text block built from a [`CanvasInput`].
///
/// Blocks are `"<Label>:\n<value>"` in canonical field order, separated by a
/// blank line. Empty fields keep their label with an empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasDescription(String);

impl CanvasDescription {
    fn from_input(input: &CanvasInput) -> Self {
        let blocks: Vec<String> = CanvasField::ALL
            .iter()
            .map(|field| format!("{}:\n{}", field.label(), input.get(*field)))
            .collect();
        Self(blocks.join("\n\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CanvasDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanvasDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
