#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    /// Skip the 59.73 Hz frame throttle.
    pub uncapped: bool,
}
