//! Tunables for one game session.

/// Configuration consumed by [`crate::SessionBuilder`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Spawn the auto-start monitor when the session opens.
    pub auto_start: bool,
    /// Outbound command queue depth between dispatchers and the channel task.
    pub command_buffer: usize,
    /// Capacity of the presence broadcast channel.
    pub presence_capacity: usize,
}

impl SessionConfig {
    pub const fn new(auto_start: bool) -> Self {
        Self {
            auto_start,
            command_buffer: 32,
            presence_capacity: 64,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(true)
    }
}
