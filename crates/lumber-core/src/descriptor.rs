//! Per-container identity and display attributes.

/// A container currently being followed, together with the display
/// attributes derived for it by the [`WatchRegistry`](crate::WatchRegistry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDescriptor {
    /// Runtime-assigned container id, stable for the container's lifetime.
    pub id: String,
    /// Runtime-assigned display name, may be empty.
    pub name: String,
    /// Compose project the container belongs to, empty when unlabeled.
    pub compose_project: String,
    /// Compose service within the project, empty when unlabeled.
    pub compose_service: String,
    /// 1-based ordinal among instances of the same service.
    pub instance_number: u32,
    /// Prefix shown before every log line from this container.
    /// Recomputed by the registry whenever membership changes.
    pub log_prefix: String,
    /// Palette entry assigned at insertion time, fixed while active.
    pub color_name: String,
}

impl ContainerDescriptor {
    /// Create a descriptor from raw container metadata. The display
    /// fields stay empty until the registry assigns them.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        compose_project: impl Into<String>,
        compose_service: impl Into<String>,
        instance_number: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            compose_project: compose_project.into(),
            compose_service: compose_service.into(),
            instance_number,
            log_prefix: String::new(),
            color_name: String::new(),
        }
    }

    /// Derive the log prefix for this container.
    ///
    /// Precedence: service plus instance number (when instance numbers are
    /// in play), bare service name, container name, and finally the first
    /// 8 characters of the id, padded or truncated to exactly 8.
    pub(crate) fn apply_log_prefix(&mut self, use_instance_number: bool) {
        if !self.compose_service.is_empty() && use_instance_number && self.instance_number > 0 {
            self.log_prefix = format!("{}-{}", self.compose_service, self.instance_number);
        } else if !self.compose_service.is_empty() {
            self.log_prefix = self.compose_service.clone();
        } else if !self.name.is_empty() {
            self.log_prefix = self.name.clone();
        } else {
            self.log_prefix = format!("{:8.8}", self.id);
        }
    }
}
