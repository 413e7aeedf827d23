//! Host accept loop: one Client at a time, for as long as the process runs.

use std::net::SocketAddr;

use rccar_core::service::location::{
    FeedLocationService, LocationService, LocationServiceFactory,
};
use rccar_core::session::ConnectionLost;
use tracing::{info, warn};

use crate::application::camera::{CameraFactory, CameraStreaming};
use crate::application::host_logic::{start_host_session, HostDependencies, HostListener};
use crate::infrastructure::camera::ProcessCamera;
use crate::infrastructure::network::socket_connector::NetworkError;
use crate::infrastructure::network::SocketConnector;
use crate::infrastructure::storage::config::HostConfig;
use crate::infrastructure::vehicle::SimulatedVehicle;

/// Reports session events to the log.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl HostListener for LoggingListener {
    fn connection_established(&mut self) {
        info!("client authenticated, remote control active");
    }

    fn connection_lost(&mut self, lost: &ConnectionLost) {
        warn!(label = lost.label.unwrap_or("-"), "connection lost: {}", lost.cause);
    }

    fn session_closed(&mut self) {
        info!("session closed");
    }
}

/// Builds the collaborators of one session from the settings file.
pub fn host_dependencies(config: &HostConfig, listener: Box<dyn HostListener>) -> HostDependencies {
    let features = config.car_features();
    let vehicle = SimulatedVehicle::new(
        features,
        config.vehicle.battery_level,
        config.vehicle.battery_drain_per_minute,
    );

    let command = config.camera.command.clone();
    let parameter = config.camera_parameter();
    let camera_factory: CameraFactory = Box::new(move || -> Box<dyn CameraStreaming> {
        Box::new(ProcessCamera::new(command.clone(), parameter.clone()))
    });

    let fix = config.location();
    let location = config.share_any_location_feature().then(|| -> LocationServiceFactory {
        Box::new(move || -> Box<dyn LocationService> { Box::new(FeedLocationService::fixed(fix)) })
    });

    HostDependencies {
        settings: config.settings(),
        vehicle: Box::new(vehicle),
        camera_factory,
        location,
        listener,
    }
}

/// Accepts one Client on `connector` and runs its session to the end.
/// Returns the Client's address.
pub async fn serve_client(
    connector: SocketConnector,
    deps: HostDependencies,
) -> Result<SocketAddr, NetworkError> {
    let (stream, peer) = connector.accept().await?;
    let mut session = start_host_session(stream, deps).await;
    session.run().await;
    info!(%peer, "client session ended");
    Ok(peer)
}

/// Serves Clients one after another. Only returns on a bind or accept error.
pub async fn run_host(config: &HostConfig) -> Result<(), NetworkError> {
    loop {
        let connector =
            SocketConnector::bind(&config.network.bind_address, config.network.port).await?;
        let parameter = connector.connection_parameter(config.security.password.clone());
        info!(url = %parameter.to_connection_url(), "share this link with the client");

        let deps = host_dependencies(config, Box::new(LoggingListener));
        serve_client(connector, deps).await?;
    }
}
