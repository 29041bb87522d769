/// Runtime response to a failed surface acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame should succeed.
    Reconfigured,
    /// Transient; drop this frame and keep going.
    SkipFrame,
    /// Out of memory. The runtime exits.
    Fatal,
}

impl SurfaceErrorAction {
    #[inline]
    pub fn is_fatal(self) -> bool {
        matches!(self, SurfaceErrorAction::Fatal)
    }
}
