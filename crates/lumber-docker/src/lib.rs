//! Docker integration for lumber.
//!
//! This crate talks to the Docker daemon (container discovery, event
//! subscription, log attachment) and owns the byte pipeline that turns
//! a raw multiplexed log stream into clean, prefixed terminal lines.

mod client;
mod filter;
mod lines;
mod watch;

pub use client::{ContainerMeta, DockerClient, RawLogStream};
pub use filter::{LINE_HEADER_SIZE, LogFilter};
pub use lines::{LineReader, MAX_LINE_LEN};
pub use watch::follow_container;
