use glam::{Mat4, Vec3};

const DEFAULT_SPEED: f32 = 2.5;

/// Discrete movement requested by the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// World axis the light travels along. The light carries no heading of
    /// its own, so forward is -Z (the camera's starting view direction).
    pub fn axis(self) -> Vec3 {
        match self {
            Direction::Forward => Vec3::NEG_Z,
            Direction::Backward => Vec3::Z,
            Direction::Left => Vec3::NEG_X,
            Direction::Right => Vec3::X,
        }
    }
}

/// Point light represented by a movable transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    position: Vec3,
    speed: f32,
}

impl Light {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            speed: DEFAULT_SPEED,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Model matrix placing the light in world space.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }

    pub fn process_keyboard(&mut self, direction: Direction, delta_time: f32) {
        let velocity = self.speed * delta_time;
        self.position += direction.axis() * velocity;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(1.2, 1.0, 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_forward_steps_accumulate() {
        let mut light = Light::new(Vec3::ZERO).with_speed(2.0);
        let dt = 0.25;
        for _ in 0..8 {
            light.process_keyboard(Direction::Forward, dt);
        }
        let expected = Vec3::NEG_Z * (8.0 * 2.0 * dt);
        assert!((light.position() - expected).length() < 1e-5);
    }

    #[test]
    fn opposite_directions_cancel() {
        let start = Vec3::new(1.0, 2.0, 3.0);
        let mut light = Light::new(start);
        light.process_keyboard(Direction::Left, 0.1);
        light.process_keyboard(Direction::Right, 0.1);
        light.process_keyboard(Direction::Forward, 0.3);
        light.process_keyboard(Direction::Backward, 0.3);
        assert!((light.position() - start).length() < 1e-5);
    }

    #[test]
    fn matrix_translates_to_position() {
        let light = Light::new(Vec3::new(4.0, -1.0, 0.5));
        let origin = light.matrix().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(4.0, -1.0, 0.5));
    }

    #[test]
    fn zero_delta_does_not_move() {
        let mut light = Light::default();
        light.process_keyboard(Direction::Right, 0.0);
        assert_eq!(light.position(), Vec3::new(1.2, 1.0, 2.0));
    }
}
