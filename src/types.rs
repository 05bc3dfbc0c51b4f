//! Data types for ring light designs and search requests.
//!
//! Every struct here derives Serialize + Deserialize so the winning
//! parameter set can be handed to placement tooling as JSON.

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};
use crate::geometry::MAX_LIGHTS;

// -- Parameters ----------------------------------------------------

/// Names of the fields of a [`ParameterSet`].
///
/// Serialized names match the struct field names, so an adjustment
/// reads `{"field": "radial_spacing", "width": 1.0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamField {
    InnerDiameter,
    InnerMargin,
    OuterMargin,
    NumberRows,
    PartWidth,
    PartHeight,
    RadialSpacing,
    CircumSpacing,
}

impl ParamField {
    pub const ALL: [ParamField; 8] = [
        ParamField::InnerDiameter,
        ParamField::InnerMargin,
        ParamField::OuterMargin,
        ParamField::NumberRows,
        ParamField::PartWidth,
        ParamField::PartHeight,
        ParamField::RadialSpacing,
        ParamField::CircumSpacing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::InnerDiameter => "inner_diameter",
            ParamField::InnerMargin => "inner_margin",
            ParamField::OuterMargin => "outer_margin",
            ParamField::NumberRows => "number_rows",
            ParamField::PartWidth => "part_width",
            ParamField::PartHeight => "part_height",
            ParamField::RadialSpacing => "radial_spacing",
            ParamField::CircumSpacing => "circum_spacing",
        }
    }

    /// Whether the field can take any real value in its domain.
    /// `number_rows` is a count and cannot be perturbed continuously.
    pub fn is_continuous(self) -> bool {
        self != ParamField::NumberRows
    }
}

/// Geometry of a ring light board, in board length units.
///
/// All fields are required; there are no partial defaults. `divisor` is
/// attached after a search so that downstream placement tooling knows the
/// string length the light count was chosen for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub inner_diameter: f64,
    pub inner_margin: f64,
    pub outer_margin: f64,
    pub number_rows: u32,
    pub part_width: f64,
    pub part_height: f64,
    pub radial_spacing: f64,
    pub circum_spacing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisor: Option<u32>,
}

impl ParameterSet {
    pub fn value(&self, field: ParamField) -> f64 {
        match field {
            ParamField::InnerDiameter => self.inner_diameter,
            ParamField::InnerMargin => self.inner_margin,
            ParamField::OuterMargin => self.outer_margin,
            ParamField::NumberRows => self.number_rows as f64,
            ParamField::PartWidth => self.part_width,
            ParamField::PartHeight => self.part_height,
            ParamField::RadialSpacing => self.radial_spacing,
            ParamField::CircumSpacing => self.circum_spacing,
        }
    }

    /// Copy of this set with one field replaced.
    pub fn with_value(&self, field: ParamField, value: f64) -> Result<ParameterSet> {
        if !field.is_continuous()
            && !(value.is_finite()
                && value >= 1.0
                && value <= u32::MAX as f64
                && value.fract() == 0.0)
        {
            return Err(DesignError::invalid(
                field,
                format!("must be a positive integer no larger than {}, got {value}", u32::MAX),
            ));
        }
        let mut out = self.clone();
        out.set_value(field, value);
        Ok(out)
    }

    /// Callers must pass an integral value in `u32` range for `number_rows`.
    pub(crate) fn set_value(&mut self, field: ParamField, value: f64) {
        match field {
            ParamField::InnerDiameter => self.inner_diameter = value,
            ParamField::InnerMargin => self.inner_margin = value,
            ParamField::OuterMargin => self.outer_margin = value,
            ParamField::NumberRows => self.number_rows = value as u32,
            ParamField::PartWidth => self.part_width = value,
            ParamField::PartHeight => self.part_height = value,
            ParamField::RadialSpacing => self.radial_spacing = value,
            ParamField::CircumSpacing => self.circum_spacing = value,
        }
    }

    /// Nominal footprint of one component along a ring.
    pub fn pitch(&self) -> f64 {
        self.circum_spacing + self.part_width
    }

    /// Reject out-of-domain geometry: zero rows, non-positive
    /// dimensions, negative margins or spacings, non-finite values.
    pub fn validate(&self) -> Result<()> {
        if self.number_rows < 1 {
            return Err(DesignError::invalid(
                ParamField::NumberRows,
                "at least one row is required",
            ));
        }
        // Every ring holds at least one light.
        if self.number_rows as usize > MAX_LIGHTS {
            return Err(DesignError::invalid(
                ParamField::NumberRows,
                format!("at most {MAX_LIGHTS} rows, got {}", self.number_rows),
            ));
        }
        for field in ParamField::ALL {
            let v = self.value(field);
            if !v.is_finite() {
                return Err(DesignError::invalid(field, format!("must be finite, got {v}")));
            }
        }
        for field in [
            ParamField::InnerDiameter,
            ParamField::PartWidth,
            ParamField::PartHeight,
        ] {
            let v = self.value(field);
            if v <= 0.0 {
                return Err(DesignError::invalid(field, format!("must be positive, got {v}")));
            }
        }
        for field in [
            ParamField::InnerMargin,
            ParamField::OuterMargin,
            ParamField::RadialSpacing,
            ParamField::CircumSpacing,
        ] {
            let v = self.value(field);
            if v < 0.0 {
                return Err(DesignError::invalid(field, format!("must not be negative, got {v}")));
            }
        }
        Ok(())
    }
}

// -- Placements ----------------------------------------------------

/// Position and orientation of one light in the engine frame (origin at
/// the ring center). `angle` is the polar angle of the position, radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub diameter: f64,
    pub placements: Vec<Placement>,
}

// -- Search I/O ----------------------------------------------------

/// One adjustable field and the full width of its search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub field: ParamField,
    pub width: f64,
}

fn default_samples_per_axis() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub divisor: u32,
    pub base: ParameterSet,
    pub adjust: Vec<Adjustment>,
    #[serde(default = "default_samples_per_axis")]
    pub samples_per_axis: usize,
}

impl SearchRequest {
    pub fn adjust_fields(&self) -> Vec<ParamField> {
        self.adjust.iter().map(|a| a.field).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub params: ParameterSet,
    pub cost: f64,
    pub light_count: usize,
    #[serde(default)]
    pub grid_size: usize,
    #[serde(default)]
    pub feasible_count: usize,
}

// -- Tests ---------------------------------------------------------
