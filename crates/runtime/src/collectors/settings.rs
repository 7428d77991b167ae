use std::time::Duration;

use protocol_core::{BlockReason, SubjectId};

/// Per-collector options chosen by game logic when opening a prompt.
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    /// Time until the collector times out. `None` uses the runtime default.
    pub timeout: Option<Duration>,
    pub reaction_limit: u32,
    /// Empty means anyone may react.
    pub allowed_reactors: Vec<SubjectId>,
    pub main_replacement: bool,
    /// Blocks held for the collector's lifetime.
    pub blocks: Vec<(SubjectId, BlockReason)>,
    /// Refuse to open while any blocked subject is already busy.
    pub exclusive: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            reaction_limit: 1,
            allowed_reactors: Vec::new(),
            main_replacement: false,
            blocks: Vec::new(),
            exclusive: false,
        }
    }
}

impl CollectorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn reaction_limit(mut self, limit: u32) -> Self {
        self.reaction_limit = limit;
        self
    }

    pub fn allow(mut self, subject: impl Into<SubjectId>) -> Self {
        self.allowed_reactors.push(subject.into());
        self
    }

    pub fn main_replacement(mut self, replace: bool) -> Self {
        self.main_replacement = replace;
        self
    }

    pub fn block(mut self, subject: impl Into<SubjectId>, reason: BlockReason) -> Self {
        self.blocks.push((subject.into(), reason));
        self
    }

    /// Places the blocks only if none of their subjects holds a live block;
    /// checked and placed atomically.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}
