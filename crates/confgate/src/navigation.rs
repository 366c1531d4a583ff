//! The navigation collaborator.

/// Takes the user back to the application's pre-conference entry screen.
///
/// Any `FnMut()` closure is a navigator, which keeps wiring to a router
/// (or a test counter) a one-liner.
pub trait Navigator: Send + 'static {
    fn to_entry_point(&mut self);
}

impl<F> Navigator for F
where
    F: FnMut() + Send + 'static,
{
    fn to_entry_point(&mut self) {
        self()
    }
}
