//! Periodic telemetry: battery level and position.
//!
//! A [`CyclicTask`] is a tokio task that posts one work item per tick to the
//! session's consumer. The work itself runs on the consumer like any handler,
//! so it may read the vehicle and send messages without locking.

use std::time::Duration;

use rccar_core::domain::location::LocationSharing;
use rccar_core::protocol::messages::{
    BatteryPowerMessage, CyclicUpdateFeatureType, Message,
};
use rccar_core::session::{HandlerContext, HandlerError, SessionHandle};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::application::host_logic::HostState;
use crate::application::vehicle::{VehicleError, BATTERY_NEAR_EMPTY_PERCENT};

/// One periodic telemetry stream.
pub struct CyclicTask {
    feature: CyclicUpdateFeatureType,
    interval: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl CyclicTask {
    pub fn new(feature: CyclicUpdateFeatureType) -> Self {
        Self {
            feature,
            interval: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Current interval, while running.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Starts ticking every `interval`, the first tick immediately. A running
    /// task is restarted with the new interval.
    pub fn start(&mut self, handle: SessionHandle<HostState>, interval: Duration) {
        self.stop();
        let feature = self.feature;
        info!(?feature, interval_ms = interval.as_millis() as u64, "cyclic update started");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let posted = match feature {
                    CyclicUpdateFeatureType::BatteryPower => handle.post(send_battery_power),
                    CyclicUpdateFeatureType::Location => handle.post(send_location),
                };
                if !posted {
                    debug!(?feature, "session gone, cyclic update ends");
                    break;
                }
            }
        }));
        self.interval = Some(interval);
    }

    /// Stops ticking. Harmless when not running.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(feature = ?self.feature, "cyclic update stopped");
        }
        self.interval = None;
    }
}

impl Drop for CyclicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reads the battery and reports it. A nearly empty battery ends the session.
pub fn send_battery_power(ctx: &mut HandlerContext<'_, HostState>) -> Result<(), HandlerError> {
    let level = ctx.app().vehicle_mut().battery_level()?;
    if level < BATTERY_NEAR_EMPTY_PERCENT {
        return Err(VehicleError::BatteryNearEmpty(level).into());
    }
    ctx.send(Message::BatteryPower(BatteryPowerMessage {
        charging_level: level,
    }));
    Ok(())
}

/// Reports the position if it changed since the last report.
pub fn send_location(ctx: &mut HandlerContext<'_, HostState>) -> Result<(), HandlerError> {
    let sharing: LocationSharing = ctx.app().settings().location_sharing();
    let Some(service) = ctx.location_service() else {
        return Ok(());
    };
    if !service.has_location_changed() {
        return Ok(());
    }
    if let Some(location) = service.current_location() {
        ctx.send(Message::Location(location.to_message(sharing)));
    }
    Ok(())
}
