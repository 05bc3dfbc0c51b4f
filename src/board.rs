//! Board placement plan for a finished design.
//!
//! Translates engine-frame placements into board coordinates for the
//! LED footprints, one current-limiting resistor per LED string and a
//! ring of mounting holes. The frame offset and the orientation
//! convention belong to the board tool, so both come from [`BoardFrame`].

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};
use crate::geometry::{Corners, RingLightDesign};

fn default_center() -> f64 {
    100.0
}

fn default_angle_scale() -> f64 {
    -10.0
}

fn default_resistor_offset() -> f64 {
    5.0
}

fn default_mount_hole_radius() -> f64 {
    76.0
}

fn default_mount_hole_offset() -> f64 {
    0.5
}

/// Board coordinate frame and footprint conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardFrame {
    #[serde(default = "default_center")]
    pub center_x: f64,
    #[serde(default = "default_center")]
    pub center_y: f64,
    /// Orientation units per degree of placement angle. The default suits
    /// tools that take orientation in tenths of a degree, clockwise.
    #[serde(default = "default_angle_scale")]
    pub angle_scale: f64,
    /// Radial distance from a string's last LED to its resistor.
    #[serde(default = "default_resistor_offset")]
    pub resistor_offset: f64,
    #[serde(default = "default_mount_hole_radius")]
    pub mount_hole_radius: f64,
    /// Angular offset of the first hole, as a fraction of the hole spacing.
    #[serde(default = "default_mount_hole_offset")]
    pub mount_hole_offset: f64,
}

impl Default for BoardFrame {
    fn default() -> Self {
        Self {
            center_x: default_center(),
            center_y: default_center(),
            angle_scale: default_angle_scale(),
            resistor_offset: default_resistor_offset(),
            mount_hole_radius: default_mount_hole_radius(),
            mount_hole_offset: default_mount_hole_offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintPlacement {
    pub reference: String,
    pub x: f64,
    pub y: f64,
    pub orientation: f64,
    /// Body outline in board coordinates, for LEDs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Corners>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPlan {
    pub leds: Vec<FootprintPlacement>,
    pub resistors: Vec<FootprintPlacement>,
    pub mount_holes: Vec<FootprintPlacement>,
}

/// One LED footprint per light, `D1` through `D{count}`.
pub fn plan_leds(design: &RingLightDesign, frame: &BoardFrame) -> Vec<FootprintPlacement> {
    design
        .all_placements()
        .iter()
        .enumerate()
        .map(|(i, p)| FootprintPlacement {
            reference: format!("D{}", i + 1),
            x: p.x + frame.center_x,
            y: p.y + frame.center_y,
            orientation: frame.angle_scale * p.angle.to_degrees(),
            outline: Some(
                design
                    .outline(p)
                    .map(|(x, y)| (x + frame.center_x, y + frame.center_y)),
            ),
        })
        .collect()
}

/// One resistor per full string of `divisor` LEDs. Resistor `R{r}` sits
/// just outside LED `D{r * divisor}`, turned a quarter turn from it.
pub fn plan_resistors(
    design: &RingLightDesign,
    frame: &BoardFrame,
    divisor: u32,
) -> Result<Vec<FootprintPlacement>> {
    if divisor == 0 {
        return Err(DesignError::InvalidDivisor(divisor));
    }
    let strings = design.light_count() / divisor as usize;
    let mut out = Vec::with_capacity(strings);
    for r in 1..=strings {
        let led = design.placement(r * divisor as usize)?;
        let radius = led.x.hypot(led.y);
        let (ux, uy) = (led.x / radius, led.y / radius);
        out.push(FootprintPlacement {
            reference: format!("R{r}"),
            x: led.x + frame.center_x + frame.resistor_offset * ux,
            y: led.y + frame.center_y + frame.resistor_offset * uy,
            orientation: frame.angle_scale * (led.angle.to_degrees() - 90.0),
            outline: None,
        });
    }
    Ok(out)
}

/// `count` mounting holes evenly spaced on the frame's hole circle.
pub fn plan_mount_holes(frame: &BoardFrame, count: usize) -> Vec<FootprintPlacement> {
    if count == 0 {
        return Vec::new();
    }
    let step = TAU / count as f64;
    (1..=count)
        .map(|h| {
            let angle = (h - 1) as f64 * step + frame.mount_hole_offset * step;
            FootprintPlacement {
                reference: format!("M{h}"),
                x: frame.mount_hole_radius * angle.cos() + frame.center_x,
                y: frame.mount_hole_radius * angle.sin() + frame.center_y,
                orientation: 0.0,
                outline: None,
            }
        })
        .collect()
}

/// Full plan using the divisor recorded on the design's parameters.
pub fn plan_board(
    design: &RingLightDesign,
    frame: &BoardFrame,
    mount_holes: usize,
) -> Result<BoardPlan> {
    let divisor = design.params().divisor.unwrap_or(0);
    Ok(BoardPlan {
        leds: plan_leds(design, frame),
        resistors: plan_resistors(design, frame, divisor)?,
        mount_holes: plan_mount_holes(frame, mount_holes),
    })
}
