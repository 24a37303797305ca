//! # Telemetry Simulator
//!
//! Synthesizes plausible telemetry for bench testing without the vehicle.
//!
//! | Field | Shape | Range | Frequency |
//! |-------|-------|-------|-----------|
//! | RPM | sine | 0-1800 | 2 Hz |
//! | Throttle | cosine | 0-100 | 1 Hz |
//! | Speed | sine | 0-30 | 1 Hz |
//! | BV | triangle | 11.8-12.2 | 0.25 Hz |
//!
//! Simulated time advances one tick interval per packet, independent of
//! wall-clock jitter, so the waveforms are reproducible.

use std::f64::consts::PI;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::LineSource;
use crate::wire::encoder::encode_telemetry_line;

/// Sine wave offset to swing between 0 and `amplitude`
pub fn sine(t: f64, amplitude: f64, freq_hz: f64) -> f64 {
    0.5 * amplitude + 0.5 * amplitude * (freq_hz * 2.0 * PI * t).sin()
}

/// Cosine wave offset to swing between 0 and `amplitude`
pub fn cosine(t: f64, amplitude: f64, freq_hz: f64) -> f64 {
    0.5 * amplitude + 0.5 * amplitude * (freq_hz * 2.0 * PI * t).cos()
}

/// Triangle wave between 0 and `amplitude`
pub fn triangle(t: f64, amplitude: f64, freq_hz: f64) -> f64 {
    let period = 1.0 / freq_hz;
    let phase = (t / period) % 1.0;
    if phase < 0.5 {
        phase * 2.0 * amplitude
    } else {
        (1.0 - phase) * 2.0 * amplitude
    }
}

/// Field values at simulated time `t` seconds
pub fn fields_at(t: f64) -> [(&'static str, f64); 4] {
    [
        ("RPM", sine(t, 1800.0, 2.0)),
        ("Throttle", cosine(t, 100.0, 1.0)),
        ("Speed", sine(t, 30.0, 1.0)),
        ("BV", 11.8 + triangle(t, 0.4, 0.25)),
    ]
}

/// Line source producing synthetic telemetry at a fixed rate
#[derive(Debug)]
pub struct SimulatorSource {
    seq: u64,
    step: Duration,
    ticker: Interval,
}

impl SimulatorSource {
    pub fn new(step: Duration) -> Self {
        let mut ticker = interval(step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { seq: 0, step, ticker }
    }

    /// Encode the next packet without waiting for the tick
    pub fn next_packet(&mut self) -> String {
        self.seq += 1;
        let t = self.seq as f64 * self.step.as_secs_f64();
        encode_telemetry_line(self.seq, fields_at(t))
    }
}

#[async_trait]
impl LineSource for SimulatorSource {
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.ticker.tick().await;
        Ok(Some(self.next_packet().into_bytes()))
    }

    fn describe(&self) -> String {
        format!("simulator every {:?}", self.step)
    }
}
