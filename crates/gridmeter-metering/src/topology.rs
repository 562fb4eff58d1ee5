//! Topology bootstrap
//!
//! The one-time handshake wiring Server, Sensor(s), and Authority before
//! any task may be scheduled. Bootstrap state is explicit and owned here,
//! constructed from configuration rather than process-wide globals.
//!
//! Order dependency per sensor: server assignment → group assignment →
//! registration. The server must bind an authority before billing-relevant
//! tasks are accepted. Repeating a step with identical parameters is a
//! no-op; conflicting repeats are rejected.

use gridmeter_common::{Endpoint, GroupId, Result, SensorId, TopologyError};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
struct SensorLink {
    id: SensorId,
    server: Endpoint,
    group: Option<GroupId>,
    registered: bool,
}

#[derive(Default)]
struct TopologyState {
    sensors: HashMap<Endpoint, SensorLink>,
    authority: Option<(Endpoint, Endpoint)>,
}

/// Server/Sensor/Authority wiring state
#[derive(Default)]
pub struct TopologyBootstrap {
    state: RwLock<TopologyState>,
}

impl TopologyBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tell a sensor which server it reports to. First step for a sensor.
    #[instrument(skip(self))]
    pub fn register_sensor_with_server(
        &self,
        sensor_endpoint: Endpoint,
        server_endpoint: Endpoint,
    ) -> Result<SensorId> {
        let mut state = self.state.write();
        if let Some(link) = state.sensors.get(&sensor_endpoint) {
            if link.server == server_endpoint {
                return Ok(link.id);
            }
            return Err(TopologyError::Conflict(format!(
                "sensor {} already bound to server {}",
                sensor_endpoint, link.server
            ))
            .into());
        }

        let id = SensorId::new();
        state.sensors.insert(
            sensor_endpoint.clone(),
            SensorLink {
                id,
                server: server_endpoint,
                group: None,
                registered: false,
            },
        );
        info!(sensor = %sensor_endpoint, "sensor bound to server");
        Ok(id)
    }

    /// Assign a sensor to a group. Requires the sensor to know its server.
    #[instrument(skip(self))]
    pub fn assign_group(&self, sensor_endpoint: &Endpoint, group_id: GroupId) -> Result<()> {
        let mut state = self.state.write();
        let link = state.sensors.get_mut(sensor_endpoint).ok_or_else(|| {
            TopologyError::NotReady(format!("sensor {} has no server", sensor_endpoint))
        })?;

        match link.group {
            Some(existing) if existing == group_id => Ok(()),
            Some(existing) => Err(TopologyError::Conflict(format!(
                "sensor {} already in group {}",
                sensor_endpoint, existing
            ))
            .into()),
            None => {
                link.group = Some(group_id);
                info!(sensor = %sensor_endpoint, group = %group_id, "group assigned");
                Ok(())
            }
        }
    }

    /// Complete a sensor's registration. Requires a group assignment.
    #[instrument(skip(self))]
    pub fn register_sensor(&self, sensor_endpoint: &Endpoint) -> Result<SensorId> {
        let mut state = self.state.write();
        let link = state.sensors.get_mut(sensor_endpoint).ok_or_else(|| {
            TopologyError::NotReady(format!("sensor {} has no server", sensor_endpoint))
        })?;
        if link.group.is_none() {
            return Err(TopologyError::NotReady(format!(
                "sensor {} has no group assignment",
                sensor_endpoint
            ))
            .into());
        }

        if !link.registered {
            link.registered = true;
            info!(sensor = %sensor_endpoint, sensor_id = %link.id, "sensor registered");
        }
        Ok(link.id)
    }

    /// Bind the trust authority to the server
    #[instrument(skip(self))]
    pub fn bind_authority(
        &self,
        server_endpoint: Endpoint,
        authority_endpoint: Endpoint,
    ) -> Result<()> {
        let mut state = self.state.write();
        match &state.authority {
            Some((server, authority))
                if *server == server_endpoint && *authority == authority_endpoint =>
            {
                Ok(())
            }
            Some((_, authority)) => Err(TopologyError::Conflict(format!(
                "authority already bound: {}",
                authority
            ))
            .into()),
            None => {
                info!(server = %server_endpoint, authority = %authority_endpoint, "authority bound");
                state.authority = Some((server_endpoint, authority_endpoint));
                Ok(())
            }
        }
    }

    /// Task scheduling gate: at least one registered sensor and a bound
    /// authority
    pub fn ready_for_tasks(&self) -> bool {
        let state = self.state.read();
        state.authority.is_some() && state.sensors.values().any(|link| link.registered)
    }

    /// Registered sensor ids
    pub fn registered_sensors(&self) -> Vec<SensorId> {
        self.state
            .read()
            .sensors
            .values()
            .filter(|link| link.registered)
            .map(|link| link.id)
            .collect()
    }
}
