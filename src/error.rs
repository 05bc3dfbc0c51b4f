//! Error types for the ring light engine and design search.

use thiserror::Error;

use crate::types::ParamField;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("ring of diameter {diameter:.3} cannot host a single component (pitch {pitch:.3})")]
    DegenerateRing { diameter: f64, pitch: f64 },

    #[error("design would hold {count:.0} lights, limit is {limit}")]
    TooManyLights { count: f64, limit: usize },

    #[error("divisor must be positive, got {0}")]
    InvalidDivisor(u32),

    #[error("no feasible design among {grid_size} candidates{}", divisor_note(.divisor))]
    NoFeasibleDesign {
        divisor: Option<u32>,
        grid_size: usize,
    },

    #[error("light {light} out of range (design has {count} lights)")]
    LightOutOfRange { light: usize, count: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DesignError {
    pub(crate) fn invalid(field: ParamField, reason: impl Into<String>) -> Self {
        DesignError::InvalidParameter {
            field: field.name().to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_named(field: &str, reason: impl Into<String>) -> Self {
        DesignError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

fn divisor_note(divisor: &Option<u32>) -> String {
    match divisor {
        Some(d) => format!(" (light count divisible by {d})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, DesignError>;
