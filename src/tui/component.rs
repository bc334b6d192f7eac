use crate::tui::action::Action;
use color_eyre::Result;
use ratatui::{Frame, layout::Rect};

/// Base trait for all TUI components
///
/// Components own the view state they need to draw themselves; the app
/// feeds them fresh session data after every change.
pub trait Component {
    /// Handle an action
    ///
    /// Returns Ok(true) if the action was handled and consumed.
    /// Returns Ok(false) if the action was not handled and should propagate.
    fn handle_action(&mut self, action: Action) -> Result<bool>;

    /// Render the component within the given area
    fn render(&mut self, frame: &mut Frame, area: Rect);

    /// Actions this component reacts to, used for the key hint line
    fn supported_actions(&self) -> &[Action];

    /// Get component name for debugging/logging
    fn name(&self) -> &str;
}
