/// Controls encoder behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// When true, shared and cyclic composites are written once and then
    /// referenced with `r<index>`. When false, no `r` tag is ever emitted and
    /// a cyclic graph recurses without bound.
    pub use_cache: bool,
}

/// Controls decoder behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    /// When true, class names the resolver does not know decode as
    /// [`DynamicClass`](crate::class::DynamicClass) instead of failing.
    pub dynamic_classes: bool,
}
