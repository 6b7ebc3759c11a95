//! Docker client: discovery of containers and access to their raw log
//! streams.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bollard::Docker;
use bollard::container::{ListContainersOptions, LogOutput, LogsOptions};
use bollard::models::EventMessageTypeEnum;
use bollard::system::EventsOptions;
use futures_util::StreamExt;
use lumber_core::{Error, Result};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";
const COMPOSE_NUMBER_LABEL: &str = "com.docker.compose.container-number";
const COMPOSE_WORKING_DIR_LABEL: &str = "com.docker.compose.project.working_dir";

/// Raw identifying metadata for a container reported by the Docker
/// daemon, before any display attributes are derived.
#[derive(Debug, Clone, Default)]
pub struct ContainerMeta {
    /// Container id.
    pub id: String,
    /// Container name, may be empty.
    pub name: String,
    /// Compose project label, empty when absent.
    pub compose_project: String,
    /// Compose service label, empty when absent.
    pub compose_service: String,
    /// Compose container number, 1 when absent or unparsable.
    pub instance_number: u32,
    /// Compose project working directory label, empty when absent.
    pub working_dir: String,
}

impl ContainerMeta {
    fn from_labels(id: String, name: String, labels: &HashMap<String, String>) -> Self {
        let instance_number = labels
            .get(COMPOSE_NUMBER_LABEL)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        Self {
            id,
            name,
            compose_project: labels.get(COMPOSE_PROJECT_LABEL).cloned().unwrap_or_default(),
            compose_service: labels.get(COMPOSE_SERVICE_LABEL).cloned().unwrap_or_default(),
            instance_number,
            working_dir: labels
                .get(COMPOSE_WORKING_DIR_LABEL)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Client for the Docker daemon.
#[derive(Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Connect using the local environment defaults.
    pub fn new() -> Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().map_err(|e| Error::Docker(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Connect to a custom socket path.
    pub fn with_socket(socket_path: &str) -> Result<Self> {
        let docker = Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| Error::Docker(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Check that the Docker daemon is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| Error::Docker(e.to_string()))?;
        Ok(())
    }

    /// List the currently running containers.
    pub async fn running_containers(&self) -> Result<Vec<ContainerMeta>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String>::default()))
            .await
            .map_err(|e| Error::Docker(e.to_string()))?;

        let empty = HashMap::new();
        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                let name = c
                    .names
                    .as_ref()
                    .and_then(|names| names.first())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default();
                Some(ContainerMeta::from_labels(
                    id,
                    name,
                    c.labels.as_ref().unwrap_or(&empty),
                ))
            })
            .collect())
    }

    /// Subscribe to container start events, forwarding the metadata of
    /// every started container into `tx` until the event stream ends.
    pub fn watch_start_events(&self, tx: mpsc::Sender<ContainerMeta>) {
        let docker = self.docker.clone();

        tokio::spawn(async move {
            let mut events = docker.events(None::<EventsOptions<String>>);

            while let Some(result) = events.next().await {
                match result {
                    Ok(event) => {
                        if event.typ != Some(EventMessageTypeEnum::CONTAINER)
                            || event.action.as_deref() != Some("start")
                        {
                            continue;
                        }
                        let Some(actor) = event.actor else { continue };
                        let Some(id) = actor.id else { continue };
                        let empty = HashMap::new();
                        let attributes = actor.attributes.as_ref().unwrap_or(&empty);
                        let name = attributes.get("name").cloned().unwrap_or_default();
                        let meta = ContainerMeta::from_labels(id, name, attributes);
                        if tx.send(meta).await.is_err() {
                            // Receiver dropped, stop watching
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("docker event stream error: {}", e);
                        break;
                    }
                }
            }
        });
    }

    /// Open the raw combined stdout/stderr log stream of a container,
    /// in follow mode starting from the current tail.
    ///
    /// Fails when the container cannot be attached to at all; errors on
    /// the stream after that surface as read errors on the returned
    /// reader.
    pub async fn raw_log_stream(&self, container_id: &str) -> Result<RawLogStream> {
        // Validate the attach target eagerly so a broken id is an open
        // failure, not a read error.
        self.docker
            .inspect_container(container_id, None)
            .await
            .map_err(|e| Error::Docker(format!("cannot attach to {container_id}: {e}")))?;

        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            tail: "0".to_string(),
            ..Default::default()
        };

        let (tx, rx) = mpsc::channel(256);
        let docker = self.docker.clone();
        let container_id = container_id.to_string();

        tokio::spawn(async move {
            let mut stream = docker.logs(&container_id, Some(options));

            while let Some(result) = stream.next().await {
                let item = match result {
                    Ok(frame) => Ok(encode_frame(&frame)),
                    Err(e) => Err(io::Error::other(e)),
                };
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(RawLogStream { rx, buf: Vec::new(), pos: 0 })
    }
}

/// Re-encode a decoded log frame into the wire form of the Docker
/// attach protocol: an 8-byte header (stream type, three zero bytes,
/// payload length big-endian) followed by the payload.
///
/// bollard undoes the stream multiplexing while parsing the response,
/// so the wire framing is restored here; downstream the byte pipeline
/// sees exactly what the daemon put on the socket.
fn encode_frame(frame: &LogOutput) -> Vec<u8> {
    let (stream_type, message) = match frame {
        LogOutput::StdIn { message } => (0u8, message),
        LogOutput::StdOut { message } | LogOutput::Console { message } => (1u8, message),
        LogOutput::StdErr { message } => (2u8, message),
    };
    let mut out = Vec::with_capacity(8 + message.len());
    out.extend_from_slice(&[stream_type, 0, 0, 0]);
    out.extend_from_slice(&u32::try_from(message.len()).unwrap_or(u32::MAX).to_be_bytes());
    out.extend_from_slice(message);
    out
}

/// A container's raw log byte stream in the multiplexed wire format.
///
/// Ends when the container stops; a broken stream surfaces as a read
/// error distinct from end-of-stream.
pub struct RawLogStream {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
    pos: usize,
}

impl AsyncRead for RawLogStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = &mut *self;
        loop {
            if me.pos < me.buf.len() {
                let n = buf.remaining().min(me.buf.len() - me.pos);
                buf.put_slice(&me.buf[me.pos..me.pos + n]);
                me.pos += n;
                return Poll::Ready(Ok(()));
            }
            match me.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    me.buf = bytes;
                    me.pos = 0;
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Err(e)),
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
