//! Scaling of raw 10-bit control readings (potentiometers on an ADC) into
//! engine parameters. Reading the hardware belongs to the caller.

use std::time::Duration;

use crate::config::GenerationCap;

/// Largest raw reading of a 10-bit converter.
pub const RAW_MAX: u16 = 1023;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnobScale {
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub min_generations: u64,
    pub max_generations: u64,
    pub min_brightness: u8,
    pub max_brightness: u8,
    /// Turning the generation knob fully up removes the cap.
    pub allow_unlimited: bool,
}

impl Default for KnobScale {
    fn default() -> Self {
        Self {
            min_delay_secs: 0.01,
            max_delay_secs: 1.00,
            min_generations: 5,
            max_generations: 500,
            min_brightness: 1,
            max_brightness: 15,
            allow_unlimited: true,
        }
    }
}

fn fraction(raw: u16) -> f64 {
    f64::from(raw.min(RAW_MAX)) / f64::from(RAW_MAX)
}

impl KnobScale {
    pub fn tick_delay(&self, raw: u16) -> Duration {
        let secs = self.min_delay_secs + fraction(raw) * (self.max_delay_secs - self.min_delay_secs);
        Duration::from_secs_f64(secs.max(0.0))
    }

    pub fn generation_cap(&self, raw: u16) -> GenerationCap {
        let span = self.max_generations.saturating_sub(self.min_generations) as f64;
        let cap = self.min_generations + (fraction(raw) * span) as u64;
        if self.allow_unlimited && cap >= self.max_generations {
            GenerationCap::Unlimited
        } else {
            GenerationCap::Limit(cap)
        }
    }

    pub fn brightness(&self, raw: u16) -> u8 {
        let span = f64::from(self.max_brightness.saturating_sub(self.min_brightness));
        self.min_brightness + (fraction(raw) * span).round() as u8
    }
}
