//! PM2.5 concentration to AQI conversion
//!
//! Piecewise-linear interpolation over the national PM2.5 breakpoint table.
//! Both the input concentration and the interpolated index round half to even.

use crate::types::AqiCategory;

/// Index returned above the top breakpoint or when nothing matches
pub const AQI_CEILING: u32 = 500;

/// One row of the breakpoint table. `c_high == None` marks the open top range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: Option<f64>,
    pub i_low: u32,
    pub i_high: u32,
}

impl Breakpoint {
    const fn new(c_low: f64, c_high: Option<f64>, i_low: u32, i_high: u32) -> Self {
        Self {
            c_low,
            c_high,
            i_low,
            i_high,
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, c: f64) -> bool {
        c >= self.c_low && self.c_high.map_or(true, |high| c <= high)
    }

    fn interpolate(&self, c: f64) -> u32 {
        let Some(c_high) = self.c_high else {
            return AQI_CEILING;
        };
        let slope = f64::from(self.i_high - self.i_low) / (c_high - self.c_low);
        (slope * (c - self.c_low) + f64::from(self.i_low)).round_ties_even() as u32
    }
}

/// PM2.5 breakpoints in µg/m³, ordered; first match wins
pub const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint::new(0.0, Some(30.0), 0, 50),
    Breakpoint::new(31.0, Some(60.0), 51, 100),
    Breakpoint::new(61.0, Some(90.0), 101, 200),
    Breakpoint::new(91.0, Some(120.0), 201, 300),
    Breakpoint::new(121.0, Some(250.0), 301, 400),
    Breakpoint::new(251.0, None, 401, 500),
];

/// Convert a PM2.5 concentration into an AQI value
pub fn calculate_aqi(concentration: f64) -> u32 {
    let c = concentration.round_ties_even();
    PM25_BREAKPOINTS
        .iter()
        .find(|bp| bp.contains(c))
        .map_or(AQI_CEILING, |bp| bp.interpolate(c))
}

/// Map an AQI value onto its health category
pub fn categorize(aqi: u32) -> AqiCategory {
    match aqi {
        0..=50 => AqiCategory::Good,
        51..=100 => AqiCategory::Satisfactory,
        101..=200 => AqiCategory::Moderate,
        201..=300 => AqiCategory::Poor,
        301..=400 => AqiCategory::VeryPoor,
        _ => AqiCategory::Severe,
    }
}
