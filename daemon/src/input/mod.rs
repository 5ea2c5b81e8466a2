//! Push-to-talk activation sources.

#[cfg(target_os = "linux")]
pub mod mouse;

#[cfg(target_os = "linux")]
pub use mouse::MouseButton;

/// Instantaneous "is the button held" query.
///
/// Implementations must never block for long: the idle loop polls this every
/// poll interval and the recorder consults it between audio chunks. A missing
/// or unreadable device reads as not engaged.
pub trait Activation: Send {
    fn is_engaged(&mut self) -> bool;
}

impl<F> Activation for F
where
    F: FnMut() -> bool + Send,
{
    fn is_engaged(&mut self) -> bool {
        self()
    }
}

/// Activation source that is never engaged, used where no input device
/// backend exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverEngaged;

impl Activation for NeverEngaged {
    fn is_engaged(&mut self) -> bool {
        false
    }
}
