//! Registry of containers currently being followed.

use colored::Color;
use tokio::sync::Mutex;

use crate::{ContainerDescriptor, Error, Palette, Result};

/// The prefix to print before one log line, already padded to the
/// shared column width and carrying the container's color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledPrefix {
    /// Padded prefix text including the trailing colon.
    pub text: String,
    /// Color to apply to the prefix text.
    pub color: Color,
}

struct Inner {
    containers: Vec<ContainerDescriptor>,
    prefix_len: usize,
}

/// Concurrency-safe source of truth for which containers are being
/// followed, their assigned colors and their current log prefixes.
///
/// One coarse lock guards the container list together with the derived
/// column width; prefix recomputation is a whole-collection operation,
/// so finer locking would buy nothing.
pub struct WatchRegistry {
    palette: Palette,
    inner: Mutex<Inner>,
}

impl WatchRegistry {
    /// Create an empty registry with the default palette.
    pub fn new() -> Self {
        Self {
            palette: Palette::new(),
            inner: Mutex::new(Inner {
                containers: Vec::new(),
                prefix_len: 0,
            }),
        }
    }

    /// Register a container. Assigns it the least-used palette color,
    /// appends it, and recomputes every active prefix. Returns the
    /// descriptor as stored, with color and prefix filled in.
    pub async fn add(&self, mut descriptor: ContainerDescriptor) -> ContainerDescriptor {
        let mut inner = self.inner.lock().await;
        descriptor.color_name = self.palette.pick_least_used(&inner.containers).to_string();
        inner.containers.push(descriptor);
        update_prefixes(&mut inner);
        inner
            .containers
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Unregister a container by id and recompute the remaining
    /// prefixes. Returns the removed descriptor, or `None` when the id
    /// was not present (in which case the registry is left untouched).
    pub async fn remove(&self, id: &str) -> Option<ContainerDescriptor> {
        let mut inner = self.inner.lock().await;
        let idx = inner.containers.iter().position(|c| c.id == id)?;
        let removed = inner.containers.remove(idx);
        update_prefixes(&mut inner);
        Some(removed)
    }

    /// The prefix to print right now for the given container, padded to
    /// the current column width.
    ///
    /// Looked up per line rather than cached: other containers joining
    /// or leaving changes the alignment, and possibly the instance
    /// suffix, of containers that are already streaming.
    pub async fn styled_prefix(&self, id: &str) -> Result<StyledPrefix> {
        let inner = self.inner.lock().await;
        let container = inner
            .containers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotWatched(id.to_string()))?;
        let color = self
            .palette
            .color(&container.color_name)
            .ok_or_else(|| Error::UnknownColor(container.color_name.clone()))?;
        let text = format!("{:>width$}:", container.log_prefix, width = inner.prefix_len);
        Ok(StyledPrefix { text, color })
    }

    /// Current log prefix of the given container, unpadded.
    pub async fn log_prefix(&self, id: &str) -> Option<String> {
        let inner = self.inner.lock().await;
        inner
            .containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.log_prefix.clone())
    }

    /// Whether a container with the given id is being followed.
    pub async fn contains(&self, id: &str) -> bool {
        self.inner.lock().await.containers.iter().any(|c| c.id == id)
    }

    /// Consistent copy of the active containers.
    pub async fn snapshot(&self) -> Vec<ContainerDescriptor> {
        self.inner.lock().await.containers.clone()
    }

    /// Number of containers currently followed.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.containers.len()
    }

    /// Whether no containers are currently followed.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.containers.is_empty()
    }

    /// Current shared prefix column width.
    pub async fn prefix_len(&self) -> usize {
        self.inner.lock().await.prefix_len
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute every prefix and the shared column width.
///
/// A container shows its instance number when it has one above 1, or
/// when another active container belongs to the same project/service
/// pair. Quadratic over the active set, which stays small and changes
/// rarely.
fn update_prefixes(inner: &mut Inner) {
    let mut prefix_len = 0;
    for i in 0..inner.containers.len() {
        let mut use_instance_number = inner.containers[i].instance_number > 1;
        for j in 0..inner.containers.len() {
            if i == j {
                continue;
            }
            if inner.containers[i].compose_project == inner.containers[j].compose_project
                && inner.containers[i].compose_service == inner.containers[j].compose_service
            {
                use_instance_number = true;
            }
        }
        inner.containers[i].apply_log_prefix(use_instance_number);
        prefix_len = prefix_len.max(inner.containers[i].log_prefix.len());
    }
    inner.prefix_len = prefix_len;
}
