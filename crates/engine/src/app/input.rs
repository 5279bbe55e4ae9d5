use super::rendering::ScreenPoint;

/// Pointer state sampled once per simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pointer_px: Option<ScreenPoint>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pointer_px(mut self, pointer_px: Option<ScreenPoint>) -> Self {
        self.pointer_px = pointer_px;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn pointer_px(&self) -> Option<ScreenPoint> {
        self.pointer_px
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
