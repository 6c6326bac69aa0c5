use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Value and standard error, serialized as `[value, uncertainty]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Estimate {
    pub value: f64,
    pub uncertainty: f64,
}
impl Estimate {
    pub fn new(value: f64, uncertainty: f64) -> Self {
        Self { value, uncertainty }
    }
}
impl From<[f64; 2]> for Estimate {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}
impl From<Estimate> for [f64; 2] {
    fn from(estimate: Estimate) -> Self {
        [estimate.value, estimate.uncertainty]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    /// Property of one species, or of the whole system
    Singular,
    /// Property of a species pair
    Distinct,
}

/// Outcome of one analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: String,
    pub method: String,
    pub kind: ResultKind,
    /// Species, `"A-B"` pair, or `"System"`
    pub label: String,
    pub estimate: Option<Estimate>,
    /// Window-averaged series (MSD, correlation function, g(r))
    pub series: Vec<f64>,
    pub windows: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodResults {
    #[serde(rename = "Singular", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub singular: BTreeMap<String, Estimate>,
    #[serde(rename = "Distinct", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub distinct: BTreeMap<String, Estimate>,
    #[serde(rename = "Series", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub series: BTreeMap<String, Vec<f64>>,
}

/// Stored results, keyed `category -> method`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsTable {
    tables: BTreeMap<String, BTreeMap<String, MethodResults>>,
}
impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result, replacing an earlier one for the same label
    pub fn insert(&mut self, result: &AnalysisResult) {
        let entry = self
            .tables
            .entry(result.category.clone())
            .or_default()
            .entry(result.method.clone())
            .or_default();
        if let Some(estimate) = result.estimate {
            let target = match result.kind {
                ResultKind::Singular => &mut entry.singular,
                ResultKind::Distinct => &mut entry.distinct,
            };
            target.insert(result.label.clone(), estimate);
        }
        if !result.series.is_empty() {
            entry
                .series
                .insert(result.label.clone(), result.series.clone());
        }
    }

    pub fn get(&self, category: &str, method: &str) -> Option<&MethodResults> {
        self.tables.get(category)?.get(method)
    }

    pub fn estimate(
        &self,
        category: &str,
        method: &str,
        kind: ResultKind,
        label: &str,
    ) -> Option<Estimate> {
        let results = self.get(category, method)?;
        match kind {
            ResultKind::Singular => results.singular.get(label).copied(),
            ResultKind::Distinct => results.distinct.get(label).copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
