//! Simulated sensor endpoints
//!
//! The platform's sensor endpoints serve simulated readings. Simulators
//! live as explicit instances in application state; the vibration
//! simulator carries its drift state (`base_amplitude`, `counter`) behind
//! a lock instead of process-wide globals, so the state is owned and
//! testable.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;

/// Motion sensor reading
#[derive(Debug, Clone, Serialize)]
pub struct MotionReading {
    pub detected: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Vibration sensor reading
#[derive(Debug, Clone, Serialize)]
pub struct VibrationReading {
    /// Amplitude in mm/s
    pub amplitude: f64,
    /// Dominant frequency in Hz
    pub frequency_hz: f64,
    /// Samples produced since startup
    pub sample: u64,
    pub timestamp: DateTime<Utc>,
}

/// Fuel level reading
#[derive(Debug, Clone, Serialize)]
pub struct FuelReading {
    /// Fill level percentage (0-100)
    pub level_percent: f64,
    /// Consumption rate in liters/hour
    pub consumption_lph: f64,
    pub timestamp: DateTime<Utc>,
}

/// Car detection reading
#[derive(Debug, Clone, Serialize)]
pub struct CarDetectionReading {
    pub vehicle_present: bool,
    /// Vehicles counted in the last interval
    pub count: u32,
    pub timestamp: DateTime<Utc>,
}

/// Vibration simulator with drifting baseline
pub struct VibrationSimulator {
    base_amplitude: f64,
    counter: u64,
}

impl VibrationSimulator {
    pub fn new() -> Self {
        Self {
            base_amplitude: 2.5,
            counter: 0,
        }
    }

    /// Produce the next reading: a sine sweep around the baseline plus
    /// jitter, with the baseline itself drifting slowly.
    pub fn next_reading(&mut self) -> VibrationReading {
        let mut rng = rand::thread_rng();

        self.counter += 1;

        // Baseline drifts every 100 samples
        if self.counter % 100 == 0 {
            self.base_amplitude = (self.base_amplitude + rng.gen_range(-0.5..0.5)).clamp(1.0, 6.0);
        }

        let sweep = (self.counter as f64 / 10.0).sin() * 0.8;
        let jitter = rng.gen_range(-0.3..0.3);
        let amplitude = (self.base_amplitude + sweep + jitter).max(0.0);

        VibrationReading {
            amplitude,
            frequency_hz: rng.gen_range(20.0..120.0),
            sample: self.counter,
            timestamp: Utc::now(),
        }
    }

    /// Current baseline (tests)
    pub fn base_amplitude(&self) -> f64 {
        self.base_amplitude
    }
}

impl Default for VibrationSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// All sensor simulators, held in application state
pub struct SensorHub {
    vibration: Mutex<VibrationSimulator>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self {
            vibration: Mutex::new(VibrationSimulator::new()),
        }
    }

    /// Simulated motion detection
    pub fn motion(&self) -> MotionReading {
        let mut rng = rand::thread_rng();
        let detected = rng.gen_bool(0.3);
        MotionReading {
            detected,
            confidence: if detected {
                rng.gen_range(0.6..1.0)
            } else {
                rng.gen_range(0.0..0.4)
            },
            timestamp: Utc::now(),
        }
    }

    /// Next vibration sample from the shared simulator
    pub async fn vibration(&self) -> VibrationReading {
        self.vibration.lock().await.next_reading()
    }

    /// Simulated fuel level
    pub fn fuel(&self) -> FuelReading {
        let mut rng = rand::thread_rng();
        FuelReading {
            level_percent: rng.gen_range(5.0..100.0),
            consumption_lph: rng.gen_range(0.5..12.0),
            timestamp: Utc::now(),
        }
    }

    /// Simulated car detection
    pub fn car_detection(&self) -> CarDetectionReading {
        let mut rng = rand::thread_rng();
        let vehicle_present = rng.gen_bool(0.5);
        CarDetectionReading {
            vehicle_present,
            count: rng.gen_range(0..8),
            timestamp: Utc::now(),
        }
    }
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibration_counter_increments() {
        let mut simulator = VibrationSimulator::new();

        let first = simulator.next_reading();
        let second = simulator.next_reading();

        assert_eq!(first.sample, 1);
        assert_eq!(second.sample, 2);
    }

    #[test]
    fn test_vibration_amplitude_non_negative() {
        let mut simulator = VibrationSimulator::new();
        for _ in 0..500 {
            let reading = simulator.next_reading();
            assert!(reading.amplitude >= 0.0);
        }
    }

    #[test]
    fn test_vibration_baseline_stays_bounded() {
        let mut simulator = VibrationSimulator::new();
        for _ in 0..1000 {
            simulator.next_reading();
        }
        assert!(simulator.base_amplitude() >= 1.0);
        assert!(simulator.base_amplitude() <= 6.0);
    }

    #[tokio::test]
    async fn test_hub_vibration_shares_one_simulator() {
        let hub = SensorHub::new();

        let first = hub.vibration().await;
        let second = hub.vibration().await;

        assert_eq!(first.sample + 1, second.sample);
    }

    #[test]
    fn test_fuel_reading_in_range() {
        let hub = SensorHub::new();
        for _ in 0..100 {
            let reading = hub.fuel();
            assert!(reading.level_percent >= 0.0 && reading.level_percent <= 100.0);
            assert!(reading.consumption_lph > 0.0);
        }
    }

    #[test]
    fn test_motion_confidence_tracks_detection() {
        let hub = SensorHub::new();
        for _ in 0..100 {
            let reading = hub.motion();
            if reading.detected {
                assert!(reading.confidence >= 0.6);
            } else {
                assert!(reading.confidence < 0.4);
            }
        }
    }

    #[test]
    fn test_car_detection_count_bounded() {
        let hub = SensorHub::new();
        for _ in 0..100 {
            let reading = hub.car_detection();
            assert!(reading.count < 8);
        }
    }
}
