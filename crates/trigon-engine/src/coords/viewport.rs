/// Drawable area in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height, or `None` for an empty viewport.
    #[inline]
    pub fn aspect_ratio(self) -> Option<f32> {
        self.is_valid()
            .then(|| self.width as f32 / self.height as f32)
    }
}
