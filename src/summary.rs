//! Human-readable report of a search result.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::geometry::RingLightDesign;
use crate::types::{ParamField, SearchResult};

#[derive(Debug, Clone, Serialize)]
pub struct DesignSummary {
    pub cost: f64,
    pub divisor: u32,
    pub outer_diameter: f64,
    pub values: Vec<(ParamField, f64)>,
    pub ring_counts: Vec<usize>,
    pub light_count: usize,
    pub strings: usize,
}

impl DesignSummary {
    pub fn new(result: &SearchResult) -> Result<Self> {
        let design = RingLightDesign::new(result.params.clone())?;
        let divisor = result.params.divisor.unwrap_or(1).max(1);
        let light_count = design.light_count();
        Ok(DesignSummary {
            cost: result.cost,
            divisor,
            outer_diameter: design.outer_diameter(),
            values: ParamField::ALL
                .iter()
                .map(|&f| (f, result.params.value(f)))
                .collect(),
            ring_counts: design.ring_counts().to_vec(),
            light_count,
            strings: light_count / divisor as usize,
        })
    }
}

impl fmt::Display for DesignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cost: {}", self.cost)?;
        writeln!(f)?;
        writeln!(f, "outer_diameter: {:.3}", self.outer_diameter)?;
        for (field, value) in &self.values {
            writeln!(f, "{}: {:.3}", field.name(), value)?;
        }
        writeln!(f, "divisor: {}", self.divisor)?;
        writeln!(f)?;
        let rings: Vec<String> = self.ring_counts.iter().map(|n| n.to_string()).collect();
        writeln!(f, "lights per ring: {}", rings.join(", "))?;
        writeln!(f, "number LED: {}", self.light_count)?;
        write!(f, "{} strings of {}", self.strings, self.divisor)
    }
}
