use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::domain::{SupervisedProcess, SupervisorState};
use crate::ports::{DaemonIdentity, ProcessDirectory};

use super::codec::{self, RpcError, Value};
use super::{transport, Endpoint, EndpointError};

/// XML-RPC client for the supervisord control API
pub struct SupervisorClient {
    endpoint: Endpoint,
    timeout: Duration,
}

impl SupervisorClient {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self, EndpointError> {
        Ok(Self::new(Endpoint::parse(url)?, timeout))
    }

    fn call(
        &self,
        method: &str,
        params: &[Value],
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        debug!(method, endpoint = %self.endpoint, "calling supervisor");
        let request = codec::encode_request(method, params);
        let response = transport::roundtrip(&self.endpoint, &request, self.timeout)?;
        Ok(codec::parse_response(&response)?)
    }
}

impl ProcessDirectory for SupervisorClient {
    fn identification(&self) -> Result<DaemonIdentity, Box<dyn std::error::Error + Send + Sync>> {
        let identifier = self
            .call("supervisor.getIdentification", &[])?
            .as_str()
            .ok_or_else(|| RpcError::Unexpected("getIdentification did not return a string".into()))?
            .to_string();
        let pid = self
            .call("supervisor.getPID", &[])?
            .as_i64()
            .ok_or_else(|| RpcError::Unexpected("getPID did not return an integer".into()))?;

        Ok(DaemonIdentity { identifier, pid })
    }

    fn list_processes(
        &self,
    ) -> Result<Vec<SupervisedProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let response = self.call("supervisor.getAllProcessInfo", &[])?;
        let entries = response
            .as_array()
            .ok_or_else(|| RpcError::Unexpected("getAllProcessInfo did not return an array".into()))?;

        let mut processes = Vec::with_capacity(entries.len());
        for entry in entries {
            let members = entry
                .as_struct()
                .ok_or_else(|| RpcError::Unexpected("process entry is not a struct".into()))?;
            processes.push(map_entry(members)?);
        }

        debug!(count = processes.len(), "listed supervised processes");
        Ok(processes)
    }
}

fn map_entry(members: &HashMap<String, Value>) -> Result<SupervisedProcess, RpcError> {
    let name = str_field(members, "name")?.to_string();
    let group = str_field(members, "group")?.to_string();
    let statename = str_field(members, "statename").unwrap_or("");
    let state_code = int_field(members, "state")?;
    // pid is 0 for processes that are not running
    let pid = int_field(members, "pid")?.max(0) as u32;

    Ok(SupervisedProcess::new(
        name,
        group,
        pid,
        SupervisorState::from_code(state_code, statename),
    ))
}

fn str_field<'a>(members: &'a HashMap<String, Value>, name: &str) -> Result<&'a str, RpcError> {
    members
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Unexpected(format!("process entry missing field {name:?}")))
}

fn int_field(members: &HashMap<String, Value>, name: &str) -> Result<i64, RpcError> {
    members
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::Unexpected(format!("process entry missing field {name:?}")))
}
