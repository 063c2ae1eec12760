use crate::constants::{MAX_DEPTH, SHARED_TABLE_CAPACITY};

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub max_depth: usize,
    pub shared_capacity: usize,
    pub retain_partial_containers: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_shared_capacity(mut self, shared_capacity: usize) -> Self {
        self.shared_capacity = shared_capacity.max(1);
        self
    }

    /// Keep a nested object or array that failed midway, with the entries it
    /// completed, instead of dropping it from its parent.
    pub fn with_retain_partial_containers(mut self, retain: bool) -> Self {
        self.retain_partial_containers = retain;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            shared_capacity: SHARED_TABLE_CAPACITY,
            retain_partial_containers: false,
        }
    }
}
