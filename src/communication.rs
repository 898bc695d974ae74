use crate::ticker::Target;

/// Everything the controller's event loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// a recurring refresh fired, `token` names the handle that scheduled it
    Tick { target: Target, token: u64 },
    /// a line of user input
    Input(String),
    /// the input side went away, time to shut down
    InputClosed,
}
