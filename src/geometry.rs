//! Ring geometry: ring diameters, light placements and outlines.
//!
//! Lights sit on concentric rings. Each ring hosts as many lights as fit
//! at the nominal pitch (`circum_spacing + part_width`); the spacing is
//! then relaxed so that those lights are spread exactly evenly around the
//! full circumference.

use std::f64::consts::PI;

use crate::error::{DesignError, Result};
use crate::types::{ParameterSet, Placement, Ring};

/// Corners of a component body, counter-clockwise in the local frame.
pub type Corners = [(f64, f64); 4];

/// Most lights a single design may hold, summed over all rings.
pub const MAX_LIGHTS: usize = 1_000_000;

/// Diameter of every ring, innermost first.
pub fn ring_diameters(params: &ParameterSet) -> Result<Vec<f64>> {
    params.validate()?;
    Ok(diameters_unchecked(params))
}

fn diameters_unchecked(params: &ParameterSet) -> Vec<f64> {
    let first = params.inner_diameter + 2.0 * params.inner_margin;
    let row_step = params.part_height + params.radial_spacing;
    (0..params.number_rows)
        .map(|i| first + 2.0 * i as f64 * row_step)
        .collect()
}

/// Number of lights that fit on a ring of the given diameter.
pub fn lights_on_ring(params: &ParameterSet, diameter: f64) -> Result<usize> {
    let pitch = params.pitch();
    let n = (PI * diameter / pitch).floor();
    // NaN fails the comparison too.
    if !(n >= 1.0) {
        return Err(DesignError::DegenerateRing { diameter, pitch });
    }
    if n > MAX_LIGHTS as f64 {
        return Err(DesignError::TooManyLights {
            count: n,
            limit: MAX_LIGHTS,
        });
    }
    Ok(n as usize)
}

/// Light count of every ring, with the running total held to `MAX_LIGHTS`.
fn ring_light_counts(params: &ParameterSet, diameters: &[f64]) -> Result<Vec<usize>> {
    let mut total: usize = 0;
    let mut counts = Vec::with_capacity(diameters.len());
    for &d in diameters {
        let n = lights_on_ring(params, d)?;
        total = total
            .checked_add(n)
            .filter(|&t| t <= MAX_LIGHTS)
            .ok_or(DesignError::TooManyLights {
                count: total as f64 + n as f64,
                limit: MAX_LIGHTS,
            })?;
        counts.push(n);
    }
    Ok(counts)
}

/// Evenly spaced placements around one ring.
///
/// Placement `k` is centered half a step past `k` steps from angle zero,
/// so the first footprint straddles neither the +x axis nor the last one.
pub fn placements_for_ring(params: &ParameterSet, diameter: f64) -> Result<Vec<Placement>> {
    params.validate()?;
    ring_placements(params, diameter)
}

fn ring_placements(params: &ParameterSet, diameter: f64) -> Result<Vec<Placement>> {
    let n = lights_on_ring(params, diameter)?;
    let adjusted_spacing = PI * diameter / n as f64 - params.part_width;
    let radius = 0.5 * diameter;
    let placements = (0..n)
        .map(|k| {
            let angle = (adjusted_spacing + params.part_width) * (k as f64 + 0.5) / radius;
            Placement {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
                angle,
            }
        })
        .collect();
    Ok(placements)
}

/// Every placement, ring by ring from the innermost ring outward.
pub fn all_placements(params: &ParameterSet) -> Result<Vec<Placement>> {
    params.validate()?;
    let diameters = diameters_unchecked(params);
    let total = ring_light_counts(params, &diameters)?.iter().sum();
    let mut out = Vec::with_capacity(total);
    for d in diameters {
        out.extend(ring_placements(params, d)?);
    }
    Ok(out)
}

/// Total number of lights. Equal to `all_placements(params)?.len()`
/// without building the placements.
pub fn light_count(params: &ParameterSet) -> Result<usize> {
    params.validate()?;
    let counts = ring_light_counts(params, &diameters_unchecked(params))?;
    Ok(counts.iter().sum())
}

/// Minimum circumscribing diameter of the assembly: outermost ring plus
/// the outer margin on both sides and one component footprint.
pub fn outer_diameter(params: &ParameterSet) -> Result<f64> {
    let diameters = ring_diameters(params)?;
    Ok(max_diameter(&diameters) + 2.0 * params.outer_margin + params.part_height)
}

fn max_diameter(diameters: &[f64]) -> f64 {
    diameters.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Corners of a rectangle centered on `center` whose radial axis points
/// along `angle`. `half_r` is the half extent along the radius, `half_t`
/// the half extent along the tangent.
pub fn radial_rect(center: (f64, f64), half_r: f64, half_t: f64, angle: f64) -> Corners {
    let (sin_a, cos_a) = angle.sin_cos();
    let radial = (half_r * cos_a, half_r * sin_a);
    let tangent = (-half_t * sin_a, half_t * cos_a);
    let corner = |r: f64, t: f64| {
        (
            center.0 + r * radial.0 + t * tangent.0,
            center.1 + r * radial.1 + t * tangent.1,
        )
    };
    [
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
        corner(-1.0, 1.0),
    ]
}

// -- Design --------------------------------------------------------

/// A validated parameter set together with its ring diameters.
///
/// Construction fails if the parameters are out of domain or if any ring
/// is too small to host a light, so every accessor below is infallible
/// for the design's own rings.
#[derive(Debug, Clone)]
pub struct RingLightDesign {
    params: ParameterSet,
    diameters: Vec<f64>,
    ring_counts: Vec<usize>,
}

impl RingLightDesign {
    pub fn new(params: ParameterSet) -> Result<Self> {
        params.validate()?;
        let diameters = diameters_unchecked(&params);
        let ring_counts = ring_light_counts(&params, &diameters)?;
        Ok(RingLightDesign {
            params,
            diameters,
            ring_counts,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn into_params(self) -> ParameterSet {
        self.params
    }

    pub fn ring_diameters(&self) -> &[f64] {
        &self.diameters
    }

    /// Light count per ring, innermost first.
    pub fn ring_counts(&self) -> &[usize] {
        &self.ring_counts
    }

    /// Never above `MAX_LIGHTS`; checked in `new`.
    pub fn light_count(&self) -> usize {
        self.ring_counts.iter().sum()
    }

    pub fn outer_diameter(&self) -> f64 {
        max_diameter(&self.diameters) + 2.0 * self.params.outer_margin + self.params.part_height
    }

    /// Placements for an arbitrary ring diameter using this design's
    /// part width and spacing.
    pub fn placements_for_ring(&self, diameter: f64) -> Result<Vec<Placement>> {
        ring_placements(&self.params, diameter)
    }

    pub fn rings(&self) -> Vec<Ring> {
        self.diameters
            .iter()
            .map(|&diameter| Ring {
                diameter,
                placements: self.placements_on(diameter),
            })
            .collect()
    }

    pub fn all_placements(&self) -> Vec<Placement> {
        let mut out = Vec::with_capacity(self.light_count());
        for &d in &self.diameters {
            out.extend(self.placements_on(d));
        }
        out
    }

    /// Placement of light number `light` (1-based, in `all_placements`
    /// order), as handed to board placement tooling.
    pub fn placement(&self, light: usize) -> Result<Placement> {
        let count = self.light_count();
        if light == 0 || light > count {
            return Err(DesignError::LightOutOfRange { light, count });
        }
        let mut index = light - 1;
        for (&d, &n) in self.diameters.iter().zip(&self.ring_counts) {
            if index < n {
                return Ok(self.placements_on(d)[index]);
            }
            index -= n;
        }
        Err(DesignError::LightOutOfRange { light, count })
    }

    /// Body outline of the component at `placement`: `part_height` along
    /// the radius, `part_width` along the ring.
    pub fn outline(&self, placement: &Placement) -> Corners {
        radial_rect(
            (placement.x, placement.y),
            0.5 * self.params.part_height,
            0.5 * self.params.part_width,
            placement.angle,
        )
    }

    fn placements_on(&self, diameter: f64) -> Vec<Placement> {
        // Own rings were checked in `new`.
        ring_placements(&self.params, diameter).unwrap_or_default()
    }
}
