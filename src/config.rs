//! Runtime configuration.

/// Default marker class carried by every component root.
pub const COMPONENT_CLASS: &str = "__ojs-c-class__";

/// Configuration for a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Class added to component roots; used to find nested components.
    pub component_class: String,
    /// Record child removals from connected nodes for the disposal pass.
    pub observe_removals: bool,
    /// Queue a sweep for orphaned components after each reactive re-render.
    pub sweep_after_rerender: bool,
    /// Upper bound of drain rounds performed by one `tick`.
    pub max_tick_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component_class: COMPONENT_CLASS.to_owned(),
            observe_removals: true,
            sweep_after_rerender: true,
            max_tick_rounds: 64,
        }
    }
}

impl Config {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the component marker class (builder).
    pub fn with_component_class(mut self, class: impl Into<String>) -> Self {
        self.component_class = class.into();
        self
    }

    /// Enable or disable removal observation (builder).
    pub fn with_observe_removals(mut self, observe: bool) -> Self {
        self.observe_removals = observe;
        self
    }

    /// Enable or disable the post-rerender sweep (builder).
    pub fn with_sweep_after_rerender(mut self, sweep: bool) -> Self {
        self.sweep_after_rerender = sweep;
        self
    }

    /// Set the tick round limit (builder). Clamped to at least one round.
    pub fn with_max_tick_rounds(mut self, rounds: usize) -> Self {
        self.max_tick_rounds = rounds.max(1);
        self
    }
}
