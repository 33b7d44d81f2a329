//! # Telemetry Module
//!
//! Sensors reported to the receiver in otherwise idle transmit slots.
//!
//! This module handles:
//! - The [`Sensor`] trait polled by the exchange
//! - Well-known FrSky sensor IDs
//! - Demo counter sensors for bench testing without real data sources

pub mod sensor_id;

pub use sensor_id::SensorId;

/// A value source reported as one S.Port sensor frame
pub trait Sensor {
    /// FrSky sensor ID
    fn id(&self) -> u16;

    /// Next value to report
    fn value(&mut self) -> u32;
}

/// Largest value the demo counters reach
pub const DEMO_COUNTER_MAX: u32 = 99_999;

/// Direction a [`CounterSensor`] moves in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDirection {
    Up,
    Down,
}

/// Sensor that cycles through `0..=max`
///
/// Displayed by the radio as a steadily changing number, which makes it easy
/// to confirm the link is alive.
#[derive(Debug, Clone)]
pub struct CounterSensor {
    id: u16,
    max: u32,
    direction: CountDirection,
    next: u32,
}

impl CounterSensor {
    /// Create a counter starting at 0 (counting up) or `max` (counting down)
    pub fn new(id: u16, max: u32, direction: CountDirection) -> Self {
        let next = match direction {
            CountDirection::Up => 0,
            CountDirection::Down => max,
        };
        Self {
            id,
            max,
            direction,
            next,
        }
    }
}

impl Sensor for CounterSensor {
    fn id(&self) -> u16 {
        self.id
    }

    fn value(&mut self) -> u32 {
        let value = self.next;
        self.next = match self.direction {
            CountDirection::Up if value >= self.max => 0,
            CountDirection::Up => value + 1,
            CountDirection::Down if value == 0 => self.max,
            CountDirection::Down => value - 1,
        };
        value
    }
}

/// The two demo sensors: Tmp1 counting up, Tmp2 counting down
///
/// Betaflight uses these IDs for internal state, so they are free on a
/// device that is not a flight controller.
pub fn demo_sensors() -> Vec<Box<dyn Sensor>> {
    vec![
        Box::new(CounterSensor::new(SensorId::T1_FIRST, DEMO_COUNTER_MAX, CountDirection::Up)),
        Box::new(CounterSensor::new(SensorId::T2_FIRST, DEMO_COUNTER_MAX, CountDirection::Down)),
    ]
}
