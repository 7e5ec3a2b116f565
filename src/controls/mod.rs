//! Console control surface
//!
//! Maps typed commands to playback actions and keeps requested rates inside
//! the range the controls offer. The engine itself accepts any positive rate.

/// Fastest rate the controls allow
pub const MIN_RATE_MS: u64 = 500;
/// Slowest rate the controls allow
pub const MAX_RATE_MS: u64 = 3000;
/// Rate slider granularity
pub const RATE_STEP_MS: u64 = 100;

/// Command map for console input
pub struct CommandMap {
    bindings: Vec<Binding>,
}

#[derive(Clone)]
pub struct Binding {
    pub keys: Vec<&'static str>,
    pub action: ControlAction,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Play,
    Pause,
    TogglePlay,
    Reset,
    Faster,
    Slower,
    SetRate(u64),
    Status,
    Help,
    Quit,
}

impl Default for CommandMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandMap {
    pub fn new() -> Self {
        let mut map = Self { bindings: Vec::new() };
        map.register_defaults();
        map
    }

    fn register_defaults(&mut self) {
        self.register(&["play", "start"], ControlAction::Play, "Start / resume");
        self.register(&["pause", "s"], ControlAction::Pause, "Pause");
        self.register(&["p", " ", ""], ControlAction::TogglePlay, "Play/Pause");
        self.register(&["reset", "r"], ControlAction::Reset, "Reset to start");
        self.register(&["+", "faster"], ControlAction::Faster, "Speed up (-100 ms)");
        self.register(&["-", "slower"], ControlAction::Slower, "Slow down (+100 ms)");
        self.register(&["status", "i"], ControlAction::Status, "Show telemetry");
        self.register(&["help", "?", "h"], ControlAction::Help, "Show commands");
        self.register(&["quit", "q", "exit"], ControlAction::Quit, "Quit");
    }

    pub fn register(&mut self, keys: &[&'static str], action: ControlAction, description: &str) {
        self.bindings.push(Binding {
            keys: keys.to_vec(),
            action,
            description: description.to_string(),
        });
    }

    /// Resolve one line of input
    ///
    /// `rate <ms>` is handled here since it carries an argument.
    pub fn parse(&self, line: &str) -> Option<ControlAction> {
        // Bare enter/space toggles, so only trim the line ending first
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(binding) = self.bindings.iter().find(|b| b.keys.iter().any(|k| *k == line)) {
            return Some(binding.action);
        }

        let line = line.trim().to_lowercase();
        if let Some(binding) = self.bindings.iter().find(|b| b.keys.iter().any(|k| *k == line)) {
            return Some(binding.action);
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("rate"), Some(value), None) => value.parse().ok().map(ControlAction::SetRate),
            _ => None,
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Help text listing every command
    pub fn help_text(&self) -> String {
        let mut lines: Vec<String> = self
            .bindings
            .iter()
            .map(|b| {
                let keys: Vec<&str> = b.keys.iter().copied().filter(|k| !k.trim().is_empty()).collect();
                format!("  {:<20} {}", keys.join(", "), b.description)
            })
            .collect();
        lines.push(format!(
            "  {:<20} Set rate ({}-{} ms)",
            "rate <ms>", MIN_RATE_MS, MAX_RATE_MS
        ));
        lines.join("\n")
    }
}

/// Clamp a requested rate into the control range, snapped to the slider step
pub fn clamp_rate(rate_ms: u64) -> u64 {
    let snapped = rate_ms.saturating_add(RATE_STEP_MS / 2) / RATE_STEP_MS * RATE_STEP_MS;
    snapped.clamp(MIN_RATE_MS, MAX_RATE_MS)
}

/// Next rate one step faster (shorter interval)
pub fn faster(rate_ms: u64) -> u64 {
    clamp_rate(rate_ms.saturating_sub(RATE_STEP_MS))
}

/// Next rate one step slower (longer interval)
pub fn slower(rate_ms: u64) -> u64 {
    clamp_rate(rate_ms.saturating_add(RATE_STEP_MS))
}
