//! LED string power budget.
//!
//! Lights are wired in series strings behind one current-limiting
//! resistor each. The number of LEDs a supply can drive per string is the
//! natural divisor for the design search.

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};

fn default_supply_voltage() -> f64 {
    12.0
}

fn default_forward_voltage() -> f64 {
    1.6
}

fn default_forward_current() -> f64 {
    0.060
}

/// Supply and LED operating point. Volts and amperes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringSupply {
    #[serde(default = "default_supply_voltage")]
    pub supply_voltage: f64,
    #[serde(default = "default_forward_voltage")]
    pub forward_voltage: f64,
    #[serde(default = "default_forward_current")]
    pub forward_current: f64,
}

impl Default for StringSupply {
    fn default() -> Self {
        Self {
            supply_voltage: default_supply_voltage(),
            forward_voltage: default_forward_voltage(),
            forward_current: default_forward_current(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringBudget {
    pub leds_per_string: u32,
    pub operating_current: f64,
    pub forward_voltage: f64,
    pub resistor_voltage: f64,
    pub resistor_power: f64,
    pub resistor_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPower {
    pub strings: usize,
    pub total_current: f64,
    pub total_power: f64,
}

impl StringSupply {
    pub fn budget(&self) -> Result<StringBudget> {
        for (name, v) in [
            ("supply_voltage", self.supply_voltage),
            ("forward_voltage", self.forward_voltage),
            ("forward_current", self.forward_current),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(DesignError::invalid_named(name, format!("must be positive, got {v}")));
            }
        }
        let per_string = (self.supply_voltage / self.forward_voltage).floor();
        if per_string > u32::MAX as f64 {
            return Err(DesignError::invalid_named(
                "forward_voltage",
                format!(
                    "string of {per_string:.0} LEDs exceeds {} per string",
                    u32::MAX
                ),
            ));
        }
        let leds_per_string = per_string as u32;
        if leds_per_string == 0 {
            return Err(DesignError::invalid_named(
                "supply_voltage",
                "below the forward voltage of a single LED",
            ));
        }
        let resistor_voltage =
            self.supply_voltage - leds_per_string as f64 * self.forward_voltage;
        Ok(StringBudget {
            leds_per_string,
            operating_current: self.forward_current,
            forward_voltage: self.forward_voltage,
            resistor_voltage,
            resistor_power: self.forward_current * resistor_voltage,
            resistor_value: resistor_voltage / self.forward_current,
        })
    }

    /// Whole-board draw for `light_count` LEDs. Leftover LEDs that do not
    /// fill a string are not powered.
    pub fn board_power(&self, light_count: usize) -> Result<BoardPower> {
        let budget = self.budget()?;
        let strings = light_count / budget.leds_per_string as usize;
        let total_current = strings as f64 * self.forward_current;
        Ok(BoardPower {
            strings,
            total_current,
            total_power: total_current * self.supply_voltage,
        })
    }
}

impl StringBudget {
    /// Divisor to search for so every LED lands in a full string.
    pub fn divisor(&self) -> u32 {
        self.leds_per_string
    }
}
