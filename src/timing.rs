/// Wall-clock timing shared by the per-frame consumers.
///
/// Times are seconds since the host clock started. Both fields start at
/// zero, so the first delta covers everything between startup and the first
/// frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    last_frame: f32,
    delta_time: f32,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to `current_frame` and returns the new delta.
    pub fn update(&mut self, current_frame: f32) -> f32 {
        self.delta_time = current_frame - self.last_frame;
        self.last_frame = current_frame;
        self.delta_time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn last_frame(&self) -> f32 {
        self.last_frame
    }
}
