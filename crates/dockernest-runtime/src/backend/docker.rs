//! Docker Engine adapter built on `bollard`.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, ContainerStateStatusEnum, HostConfig, PortBinding};
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions, ListNetworksOptions};
use bollard::{API_DEFAULT_VERSION, Docker};
use dockernest_common::config::DockernestConfig;
use dockernest_common::constants::STOP_GRACE_SECS;
use dockernest_common::types::{RuntimeId, WorkloadStatus};
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::client::{
    HostBinding, NetworkSummary, RawInspection, RawPortMap, RawStatsSample, RuntimeClient,
    RuntimeHandle, WorkloadSpec,
};
use crate::error::{Result, RuntimeError};

/// Runtime client speaking to a single Docker daemon.
///
/// Every call is wrapped in the configured deadline; expiry is reported as
/// [`RuntimeError::Unavailable`].
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    timeout: Duration,
}

impl DockerRuntime {
    /// Connects to the daemon named by `config.docker_host`, or the local
    /// defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the endpoint cannot be configured.
    pub fn connect(config: &DockernestConfig) -> Result<Self> {
        let timeout = config.runtime_timeout();
        let docker = match config.docker_host.as_deref() {
            None => Docker::connect_with_local_defaults(),
            Some(host) if host.starts_with("unix://") => {
                Docker::connect_with_socket(host, timeout.as_secs(), API_DEFAULT_VERSION)
            }
            Some(host) => Docker::connect_with_http(host, timeout.as_secs(), API_DEFAULT_VERSION),
        }
        .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;

        info!(host = config.docker_host.as_deref().unwrap_or("local"), "docker client configured");
        Ok(Self::with_client(docker.with_timeout(timeout), timeout))
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(docker: Docker, timeout: Duration) -> Self {
        Self { docker, timeout }
    }

    /// Runs one daemon call under the deadline.
    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, DockerError>> + Send,
        T: Send,
    {
        self.timed(op, call).await?.map_err(classify)
    }

    /// Applies the deadline only, leaving the daemon error unclassified.
    async fn timed<T, F>(
        &self,
        op: &'static str,
        call: F,
    ) -> Result<std::result::Result<T, DockerError>>
    where
        F: Future<Output = std::result::Result<T, DockerError>> + Send,
        T: Send,
    {
        debug!(op, "docker call");
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result),
            Err(_) => {
                warn!(op, timeout_secs = self.timeout.as_secs(), "docker call timed out");
                Err(RuntimeError::Unavailable(format!(
                    "{op} timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }

    /// Pulls an image so a subsequent create can find it.
    async fn pull_image(&self, image: &str) -> Result<()> {
        let (repository, tag) = split_image_reference(image);
        info!(image, "pulling image");
        let options = CreateImageOptions {
            from_image: repository.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        };
        let pull = self
            .docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>();
        match self.bounded("pull", pull).await {
            Ok(_) => Ok(()),
            Err(RuntimeError::NotFound) => {
                Err(RuntimeError::Rejected(format!("image {image} not found")))
            }
            Err(e) => Err(e),
        }
    }

    async fn create_container(&self, name: &str, config: Config<String>) -> Result<RuntimeId> {
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let response = self
            .timed("create", self.docker.create_container(Some(options), config))
            .await?
            .map_err(classify_create)?;
        Ok(RuntimeId::new(response.id))
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn create(&self, spec: &WorkloadSpec) -> Result<RuntimeHandle> {
        let name = spec.runtime_name();
        let config = container_config(spec);

        let id = match self.create_container(&name, config.clone()).await {
            Err(RuntimeError::NotFound) => {
                self.pull_image(&spec.image).await?;
                match self.create_container(&name, config).await {
                    Err(RuntimeError::NotFound) => {
                        return Err(RuntimeError::Rejected(format!(
                            "image {} not found after pull",
                            spec.image
                        )));
                    }
                    other => other?,
                }
            }
            other => other?,
        };

        let started = self
            .bounded(
                "start",
                self.docker
                    .start_container(id.as_str(), None::<StartContainerOptions<String>>),
            )
            .await;
        if let Err(err) = started {
            warn!(runtime_id = %id, name = %name, error = %err, "start after create failed, removing");
            if let Err(cleanup) = self.remove(&id).await {
                warn!(runtime_id = %id, error = %cleanup, "could not remove unstarted workload");
            }
            return Err(err);
        }

        info!(runtime_id = %id, name = %name, image = %spec.image, "workload running");
        Ok(RuntimeHandle { id, name })
    }

    // bollard reports 304 (already in the requested state) as success for
    // start and stop.
    async fn start(&self, id: &RuntimeId) -> Result<()> {
        let call = self
            .docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>);
        self.bounded("start", call).await
    }

    async fn stop(&self, id: &RuntimeId) -> Result<()> {
        let options = StopContainerOptions { t: STOP_GRACE_SECS };
        let call = self.docker.stop_container(id.as_str(), Some(options));
        match self.bounded("stop", call).await {
            Err(RuntimeError::NotFound) => {
                debug!(runtime_id = %id, "stop target already gone");
                Ok(())
            }
            other => other,
        }
    }

    async fn restart(&self, id: &RuntimeId) -> Result<()> {
        self.bounded("restart", self.docker.restart_container(id.as_str(), None))
            .await
    }

    async fn remove(&self, id: &RuntimeId) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        let call = self.docker.remove_container(id.as_str(), Some(options));
        match self.bounded("remove", call).await {
            Err(RuntimeError::NotFound) => {
                debug!(runtime_id = %id, "remove target already gone");
                Ok(())
            }
            other => other,
        }
    }

    async fn inspect(&self, id: &RuntimeId) -> Result<RawInspection> {
        let call = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>);
        let info = self.bounded("inspect", call).await?;
        Ok(inspection_from(info))
    }

    async fn logs(&self, id: &RuntimeId, tail_lines: usize) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail_lines.to_string(),
            ..Default::default()
        };
        let call = self
            .docker
            .logs(id.as_str(), Some(options))
            .try_collect::<Vec<LogOutput>>();
        let chunks = self.bounded("logs", call).await?;

        let mut bytes = Vec::new();
        for chunk in chunks {
            bytes.extend_from_slice(&chunk.into_bytes());
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn stats(&self, id: &RuntimeId) -> Result<RawStatsSample> {
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };
        let mut samples = Box::pin(self.docker.stats(id.as_str(), Some(options)));
        let next = async move { samples.next().await.transpose() };
        let stats = self
            .bounded("stats", next)
            .await?
            .ok_or_else(|| RuntimeError::Rejected("daemon returned no stats sample".into()))?;

        Ok(RawStatsSample {
            cpu_total_usage: stats.cpu_stats.cpu_usage.total_usage,
            system_cpu_usage: stats.cpu_stats.system_cpu_usage,
            memory_usage: stats.memory_stats.usage,
            memory_limit: stats.memory_stats.limit,
        })
    }

    async fn create_network(&self, name: &str) -> Result<NetworkSummary> {
        let options = CreateNetworkOptions {
            name: name.to_string(),
            ..Default::default()
        };
        let _ = self
            .bounded("network create", self.docker.create_network(options))
            .await?;

        let created = self
            .bounded(
                "network inspect",
                self.docker
                    .inspect_network(name, None::<InspectNetworkOptions<String>>),
            )
            .await?;
        info!(network = name, "network created");
        Ok(NetworkSummary {
            name: created.name.unwrap_or_else(|| name.to_string()),
            id: created.id.unwrap_or_default(),
        })
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let networks = self
            .bounded(
                "network list",
                self.docker
                    .list_networks(None::<ListNetworksOptions<String>>),
            )
            .await?;
        Ok(networks
            .into_iter()
            .map(|n| NetworkSummary {
                name: n.name.unwrap_or_default(),
                id: n.id.unwrap_or_default(),
            })
            .collect())
    }
}

/// Maps a daemon error onto the adapter taxonomy.
fn classify(err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound,
        DockerError::DockerResponseServerError {
            status_code: 409, ..
        } => RuntimeError::Conflict,
        DockerError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Rejected(format!("{status_code}: {message}")),
        err @ (DockerError::IOError { .. }
        | DockerError::HttpClientError { .. }
        | DockerError::HyperResponseError { .. }
        | DockerError::HyperLegacyError { .. }
        | DockerError::RequestTimeoutError
        | DockerError::SocketNotFoundError(_)
        | DockerError::UnsupportedURISchemeError { .. }) => {
            RuntimeError::Unavailable(err.to_string())
        }
        other => RuntimeError::Rejected(other.to_string()),
    }
}

/// Classifies a create failure. Only a missing image is `NotFound`, which
/// triggers a pull; any other 404 (an unknown network, say) is rejected
/// with the daemon's message.
fn classify_create(err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404,
            message,
        } if !message.contains("No such image") => {
            RuntimeError::Rejected(format!("404: {message}"))
        }
        other => classify(other),
    }
}

/// Builds the daemon create request from a workload spec.
fn container_config(spec: &WorkloadSpec) -> Config<String> {
    let ports = spec.qualified_ports();
    let exposed_ports = ports
        .keys()
        .map(|port| (port.clone(), HashMap::new()))
        .collect();
    let port_bindings = ports
        .iter()
        .map(|(port, host)| {
            let binding = PortBinding {
                host_ip: None,
                host_port: Some(host.clone()),
            };
            (port.clone(), Some(vec![binding]))
        })
        .collect();

    Config {
        image: Some(spec.image.clone()),
        cmd: spec.command.clone(),
        env: Some(spec.env.iter().map(|(k, v)| format!("{k}={v}")).collect()),
        labels: Some(spec.all_labels().into_iter().collect()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(HostConfig {
            port_bindings: Some(port_bindings),
            network_mode: Some(spec.network.clone()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Extracts state, port bindings, and sorted network names.
fn inspection_from(info: ContainerInspectResponse) -> RawInspection {
    let status = info
        .state
        .and_then(|s| s.status)
        .map_or(WorkloadStatus::Created, status_from);

    let settings = info.network_settings.unwrap_or_default();
    let ports: RawPortMap = settings
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|(port, bindings)| {
            let bindings = bindings.map(|list| {
                list.into_iter()
                    .map(|b| HostBinding {
                        host_ip: b.host_ip,
                        host_port: b.host_port,
                    })
                    .collect()
            });
            (port, bindings)
        })
        .collect();
    let mut networks: Vec<String> = settings
        .networks
        .map(|n| n.into_keys().collect())
        .unwrap_or_default();
    networks.sort();

    RawInspection {
        status,
        ports,
        networks,
    }
}

const fn status_from(status: ContainerStateStatusEnum) -> WorkloadStatus {
    match status {
        ContainerStateStatusEnum::EMPTY | ContainerStateStatusEnum::CREATED => {
            WorkloadStatus::Created
        }
        ContainerStateStatusEnum::RUNNING => WorkloadStatus::Running,
        ContainerStateStatusEnum::PAUSED => WorkloadStatus::Paused,
        ContainerStateStatusEnum::RESTARTING => WorkloadStatus::Restarting,
        ContainerStateStatusEnum::REMOVING => WorkloadStatus::Removing,
        ContainerStateStatusEnum::EXITED => WorkloadStatus::Exited,
        ContainerStateStatusEnum::DEAD => WorkloadStatus::Dead,
    }
}

/// Splits an image reference into repository and tag, defaulting the tag
/// to `latest`. Digest references keep the digest in the repository part.
fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    match last_segment.rfind(':') {
        Some(pos) => {
            let split = image.len() - last_segment.len() + pos;
            (&image[..split], &image[split + 1..])
        }
        None => (image, "latest"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bollard::models::{ContainerState, EndpointSettings, NetworkSettings};
    use dockernest_common::types::UserId;

    use super::*;

    #[test]
    fn classify_maps_status_codes() {
        let not_found = DockerError::DockerResponseServerError {
            status_code: 404,
            message: "No such container".into(),
        };
        let conflict = DockerError::DockerResponseServerError {
            status_code: 409,
            message: "name in use".into(),
        };
        let server = DockerError::DockerResponseServerError {
            status_code: 500,
            message: "boom".into(),
        };
        assert_eq!(classify(not_found), RuntimeError::NotFound);
        assert_eq!(classify(conflict), RuntimeError::Conflict);
        assert_eq!(classify(server), RuntimeError::Rejected("500: boom".into()));
    }

    #[test]
    fn only_transport_failures_are_unavailable() {
        let timeout = classify(DockerError::RequestTimeoutError);
        let socket = classify(DockerError::SocketNotFoundError("/var/run/docker.sock".into()));
        let stream = classify(DockerError::DockerStreamError {
            error: "unexpected EOF in log frame".into(),
        });
        let wait = classify(DockerError::DockerContainerWaitError {
            error: "container exited".into(),
            code: 137,
        });
        assert!(matches!(timeout, RuntimeError::Unavailable(_)));
        assert!(matches!(socket, RuntimeError::Unavailable(_)));
        assert!(matches!(stream, RuntimeError::Rejected(_)));
        assert!(matches!(wait, RuntimeError::Rejected(_)));
    }

    #[test]
    fn create_pulls_only_for_missing_image() {
        let missing_image = DockerError::DockerResponseServerError {
            status_code: 404,
            message: "No such image: nginx:latest".into(),
        };
        let missing_network = DockerError::DockerResponseServerError {
            status_code: 404,
            message: "network dockernest-net not found".into(),
        };
        let name_taken = DockerError::DockerResponseServerError {
            status_code: 409,
            message: "name in use".into(),
        };
        assert_eq!(classify_create(missing_image), RuntimeError::NotFound);
        assert_eq!(
            classify_create(missing_network),
            RuntimeError::Rejected("404: network dockernest-net not found".into())
        );
        assert_eq!(classify_create(name_taken), RuntimeError::Conflict);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_call_is_unavailable() {
        let docker =
            Docker::connect_with_http("http://127.0.0.1:2375", 1, API_DEFAULT_VERSION).unwrap();
        let runtime = DockerRuntime::with_client(docker, Duration::from_secs(1));
        let never = std::future::pending::<std::result::Result<(), DockerError>>();

        let result = runtime.bounded("inspect", never).await;
        match result {
            Err(RuntimeError::Unavailable(message)) => assert!(message.contains("timed out")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn container_config_carries_owner_label_and_bindings() {
        let mut spec = WorkloadSpec::new(UserId::new(9), "web", "nginx", "dockernest-net");
        let _ = spec.ports.insert("80".into(), "8080".into());
        let _ = spec.env.insert("MODE".into(), "prod".into());

        let config = container_config(&spec);
        let labels = config.labels.unwrap();
        assert_eq!(labels.get("user_id").map(String::as_str), Some("9"));
        assert_eq!(config.env.unwrap(), vec!["MODE=prod".to_string()]);
        assert!(config.exposed_ports.unwrap().contains_key("80/tcp"));

        let host = config.host_config.unwrap();
        assert_eq!(host.network_mode.as_deref(), Some("dockernest-net"));
        let bindings = host.port_bindings.unwrap();
        let first = bindings["80/tcp"].as_ref().unwrap()[0].clone();
        assert_eq!(first.host_port.as_deref(), Some("8080"));
    }

    #[test]
    fn inspection_extracts_status_ports_and_sorted_networks() {
        let mut ports = HashMap::new();
        let _ = ports.insert(
            "80/tcp".to_string(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".into()),
                host_port: Some("8080".into()),
            }]),
        );
        let mut networks = HashMap::new();
        let _ = networks.insert("zeta".to_string(), EndpointSettings::default());
        let _ = networks.insert("alpha".to_string(), EndpointSettings::default());

        let info = ContainerInspectResponse {
            state: Some(ContainerState {
                status: Some(ContainerStateStatusEnum::RUNNING),
                ..Default::default()
            }),
            network_settings: Some(NetworkSettings {
                ports: Some(ports),
                networks: Some(networks),
                ..Default::default()
            }),
            ..Default::default()
        };

        let inspection = inspection_from(info);
        assert_eq!(inspection.status, WorkloadStatus::Running);
        assert_eq!(inspection.networks, vec!["alpha", "zeta"]);
        let expected: BTreeMap<_, _> = [(
            "80/tcp".to_string(),
            Some(vec![HostBinding {
                host_ip: Some("0.0.0.0".into()),
                host_port: Some("8080".into()),
            }]),
        )]
        .into_iter()
        .collect();
        assert_eq!(inspection.ports, expected);
    }

    #[test]
    fn inspection_without_settings_is_empty() {
        let inspection = inspection_from(ContainerInspectResponse::default());
        assert!(inspection.ports.is_empty());
        assert!(inspection.networks.is_empty());
    }

    #[test]
    fn image_reference_splitting() {
        assert_eq!(split_image_reference("nginx"), ("nginx", "latest"));
        assert_eq!(split_image_reference("nginx:1.25"), ("nginx", "1.25"));
        assert_eq!(
            split_image_reference("registry:5000/team/app"),
            ("registry:5000/team/app", "latest")
        );
        assert_eq!(
            split_image_reference("registry:5000/team/app:v2"),
            ("registry:5000/team/app", "v2")
        );
        assert_eq!(
            split_image_reference("alpine@sha256:abcd"),
            ("alpine@sha256:abcd", "")
        );
    }
}
