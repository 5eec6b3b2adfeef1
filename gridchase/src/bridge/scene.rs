use glam::Vec3;

/// The slice of a live scene the bridge reads and writes each frame.
pub trait ArenaScene {
    fn pursuer_position(&self) -> Vec3;
    fn target_position(&self) -> Vec3;
    fn set_pursuer_position(&mut self, position: Vec3);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetMotion {
    Still,
    /// Circles the arena origin at `radius`, `angular_speed` radians per second.
    Orbit { radius: f32, angular_speed: f32 },
}

/// Headless stand-in for the rendered scene.
#[derive(Debug, Clone)]
pub struct SimulatedArena {
    pursuer: Vec3,
    target: Vec3,
    motion: TargetMotion,
    elapsed: f32,
}

impl SimulatedArena {
    pub fn new(pursuer: Vec3, target: Vec3) -> Self {
        Self {
            pursuer,
            target,
            motion: TargetMotion::Still,
            elapsed: 0.0,
        }
    }

    pub fn with_motion(mut self, motion: TargetMotion) -> Self {
        self.motion = motion;
        self
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Horizontal distance between the two actors.
    pub fn separation(&self) -> f32 {
        let d = self.target - self.pursuer;
        (d.x * d.x + d.z * d.z).sqrt()
    }

    /// Moves the target along its path.
    pub fn advance(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        if let TargetMotion::Orbit { radius, angular_speed } = self.motion {
            let angle = self.elapsed * angular_speed;
            self.target = Vec3::new(radius * angle.cos(), self.target.y, radius * angle.sin());
        }
    }
}

impl ArenaScene for SimulatedArena {
    fn pursuer_position(&self) -> Vec3 {
        self.pursuer
    }

    fn target_position(&self) -> Vec3 {
        self.target
    }

    fn set_pursuer_position(&mut self, position: Vec3) {
        self.pursuer = position;
    }
}
