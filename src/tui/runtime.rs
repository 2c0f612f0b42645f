//! Application state for the read-only depot dashboard.

use super::AppState;

/// Which panel is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Sizing,
    Layout,
    Events,
}

impl Panel {
    const ORDER: [Panel; 3] = [Panel::Sizing, Panel::Layout, Panel::Events];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).unwrap()
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::Sizing => "Fleet Sizing",
            Panel::Layout => "Depot Layout",
            Panel::Events => "Event Log",
        }
    }
}

/// Browsing state over one finished [`AppState`]. Unlike a live simulation
/// dashboard, nothing here advances on its own — every field changes only in
/// response to a key press.
pub struct App<'a> {
    pub state: &'a AppState,
    pub panel: Panel,
    pub scroll: usize,
    pub quit: bool,
}

impl<'a> App<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            panel: Panel::Sizing,
            scroll: 0,
            quit: false,
        }
    }

    fn row_count(&self) -> usize {
        match self.panel {
            Panel::Sizing => self.state.sizes.len(),
            Panel::Layout => self.state.layout.placements.len(),
            Panel::Events => self.state.bundle.events.len(),
        }
    }

    pub fn next_panel(&mut self) {
        self.panel = self.panel.next();
        self.scroll = 0;
    }

    pub fn prev_panel(&mut self) {
        self.panel = self.panel.prev();
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        let max = self.row_count().saturating_sub(1);
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}
