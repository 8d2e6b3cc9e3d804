use convene_common::Panel;

/// At most one side panel is open at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelVisibility {
    open: Option<Panel>,
}

impl PanelVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Panel> {
        self.open
    }

    pub fn is_open(&self, panel: Panel) -> bool {
        self.open == Some(panel)
    }

    /// Opens `panel`, replacing any other open panel. Returns whether state changed.
    pub fn open(&mut self, panel: Panel) -> bool {
        if self.is_open(panel) {
            return false;
        }
        self.open = Some(panel);
        true
    }

    /// Closes `panel` only if it is the open one. Returns whether state changed.
    pub fn close(&mut self, panel: Panel) -> bool {
        if !self.is_open(panel) {
            return false;
        }
        self.open = None;
        true
    }

    /// Closes `panel` if open, otherwise opens it. Always changes state.
    pub fn toggle(&mut self, panel: Panel) -> bool {
        if self.is_open(panel) {
            self.close(panel)
        } else {
            self.open(panel)
        }
    }
}
