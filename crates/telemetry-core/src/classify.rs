//! Threshold classification
//!
//! Maps a metric value onto a [`Tier`] against an inclusive band. Values equal
//! to either boundary are `Nominal`.

use crate::config::BandConfig;
use crate::models::{Classifications, Reading, Recommendation, ThresholdBand, Tier};

/// Classify a value against its band
pub fn classify(value: f64, band: ThresholdBand) -> Tier {
    if value < band.low {
        Tier::Low
    } else if value > band.high {
        Tier::High
    } else {
        Tier::Nominal
    }
}

/// Whether a tier should raise an alert
pub fn is_alertable(tier: Tier) -> bool {
    matches!(tier, Tier::Low | Tier::High)
}

/// Classify current, temperature and CO2 of a reading
pub fn classify_reading(reading: &Reading, bands: &BandConfig) -> Classifications {
    Classifications {
        current: classify(reading.current, bands.current),
        temperature: classify(reading.temperature, bands.temperature),
        co2: classify(reading.co2, bands.co2),
    }
}

/// Derive live recommendations from classifications
///
/// Idle and heat recovery alerts can co-occur; both are returned.
pub fn recommendations(classifications: &Classifications) -> Vec<Recommendation> {
    let mut out = Vec::with_capacity(2);

    if classifications.current == Tier::Low {
        out.push(Recommendation::IdleDetected);
    }
    if classifications.temperature == Tier::High {
        out.push(Recommendation::HeatRecoveryAvailable);
    }
    if classifications.current == Tier::Nominal && classifications.temperature == Tier::Nominal {
        out.push(Recommendation::OptimalOperation);
    }

    out
}
