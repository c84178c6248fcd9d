//! Bridge service — the cooperative event loop's per-tick logic.
//!
//! [`BridgeService`] owns all mutable loop state (input levels, analog
//! sampler, actuator handles) and runs one tick at a time against the
//! injected port implementations. The fixed intra-tick order is part of
//! the contract:
//!
//! 1. watchdog feed (liveness first),
//! 2. analog sampling when due,
//! 3. deferred edge processing (one indivisible latch test-and-clear),
//! 4. at most one accepted HTTP connection.
//!
//! No step blocks, so the loop always makes forward progress and the
//! watchdog is fed on schedule even under network pressure.

use std::collections::BTreeMap;

use log::info;

use crate::config::Config;
use crate::edge::EdgeLatch;
use crate::error::Result;
use crate::notify::NotificationDispatcher;
use crate::outputs::ActuatorBank;
use crate::pins;
use crate::sampler::AnalogSampler;
use crate::web;

use super::ports::{ConnectionListener, DatagramSink, HardwareIo};

pub struct BridgeService {
    config: Config,
    dispatcher: NotificationDispatcher,
    sampler: AnalogSampler,
    bank: ActuatorBank,
    /// Last-observed level per input name; starts at logical "inactive"
    /// (pull-up idle high) for every input.
    inputs: BTreeMap<String, bool>,
    latch: &'static EdgeLatch,
    tick_count: u64,
}

impl BridgeService {
    /// Build the service around a validated config and the latch the
    /// platform's edge ISRs target.
    pub fn new(config: Config, latch: &'static EdgeLatch) -> Self {
        let dispatcher =
            NotificationDispatcher::new(config.target.clone(), config.inputs.clone());
        let sampler = AnalogSampler::new(config.adc_count_interval, config.adc_min_delta);
        let bank = ActuatorBank::new(config.outputs.clone());
        let inputs = config
            .inputs
            .iter()
            .map(|i| (i.name.clone(), true))
            .collect();
        Self {
            config,
            dispatcher,
            sampler,
            bank,
            inputs,
            latch,
            tick_count: 0,
        }
    }

    /// Run one full loop iteration. Returns `Err` only for fatal
    /// consistency violations; all recoverable trouble (socket errors,
    /// malformed requests, dropped datagrams) is handled inside.
    pub fn tick(
        &mut self,
        hw: &mut impl HardwareIo,
        udp: &mut impl DatagramSink,
        listener: &mut impl ConnectionListener,
    ) -> Result<()> {
        self.tick_count += 1;

        // 1. Liveness before anything that could go wrong.
        hw.feed_watchdog();

        // 2. Time-sliced analog sampling.
        if let Some(report) = self
            .sampler
            .tick(|| i32::from(hw.read_analog(pins::SENSOR_ADC_CHANNEL)))
        {
            self.dispatcher.notify_analog(udp, report);
        }

        // 3. Deferred edge processing. The latch is cleared in the same
        // indivisible step that reads it, so an ISR firing mid-diff
        // re-arms it for the next tick instead of getting lost.
        if self.latch.take() {
            self.process_edges(hw, udp)?;
        }

        // 4. At most one control client per tick; a second pending
        // connection waits for the next iteration.
        if let Some(mut stream) = listener.poll_accept() {
            web::serve_connection(
                &mut stream,
                &self.config,
                &mut self.bank,
                hw,
                self.sampler.current(),
                &self.inputs,
            )?;
        }

        Ok(())
    }

    /// Re-read every configured input and notify the diffs. The latch
    /// says only "something happened"; which pins moved is re-derived
    /// from current levels, so bursts of edges collapse into at most one
    /// datagram per input per tick.
    fn process_edges(
        &mut self,
        hw: &mut impl HardwareIo,
        udp: &mut impl DatagramSink,
    ) -> Result<()> {
        for spec in &self.config.inputs {
            let level = hw.read_digital(spec.pin);
            let old = self.inputs.get(&spec.name).copied().unwrap_or(true);
            if old != level {
                info!(
                    "Input '{}' (pin {}): {} -> {}",
                    spec.name,
                    spec.pin,
                    u8::from(old),
                    u8::from(level)
                );
                self.dispatcher.notify_digital(udp, &spec.name, level)?;
            }
            self.inputs.insert(spec.name.clone(), level);
        }
        Ok(())
    }

    // ── Queries (diagnostics and tests) ───────────────────────

    /// Latest analog reading (-1 before the first sample).
    pub fn analog_value(&self) -> i32 {
        self.sampler.current()
    }

    /// Last-observed input levels, keyed by name.
    pub fn input_levels(&self) -> &BTreeMap<String, bool> {
        &self.inputs
    }

    /// Ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
