//! Ring light design engine.
//!
//! Places fixed-size lights on concentric rings around a circular board
//! and searches a neighborhood of a base geometry for the design whose
//! light count splits evenly into strings of a given length.
//!
//! Exposes `search_json`, which accepts a JSON string (a search request)
//! and returns a JSON string (the search result).

pub mod board;
pub mod error;
pub mod geometry;
pub mod power;
pub mod search;
pub mod summary;
pub mod types;

pub use error::{DesignError, Result};
pub use geometry::RingLightDesign;
pub use search::find_min_divisible_design;
pub use types::{Adjustment, ParamField, ParameterSet, Placement, SearchRequest, SearchResult};

/// Run the design search on a JSON-encoded [`SearchRequest`] and return
/// the JSON-encoded [`SearchResult`].
pub fn search_json(request_json: &str) -> Result<String> {
    let request: SearchRequest = serde_json::from_str(request_json)?;
    let result = search::find_min_divisible_design(&request)?;
    Ok(serde_json::to_string(&result)?)
}
