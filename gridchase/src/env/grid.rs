use super::EnvError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A cell on the training grid. Both axes live in `[0, grid_size - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves one cell in the action's direction, clamping at the walls (never wrapping).
    pub fn moved(self, action: Action, grid_size: i32) -> Self {
        let (dx, dy) = action.delta();
        Self {
            x: (self.x + dx).clamp(0, grid_size - 1),
            y: (self.y + dy).clamp(0, grid_size - 1),
        }
    }

    pub fn in_bounds(self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.x) && (0..grid_size).contains(&self.y)
    }
}

/// Discrete moves. The integer encoding is persisted with trained policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
#[repr(u8)]
pub enum Action {
    Stay = 0,
    /// +Y on the grid, +Z in the arena.
    Up = 1,
    /// -Y on the grid, -Z in the arena.
    Down = 2,
    Left = 3,
    Right = 4,
}

impl Action {
    pub const COUNT: usize = 5;
    pub const ALL: [Action; Action::COUNT] = [
        Action::Stay,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
    ];
    /// Names written into policy artifacts, in encoding order.
    pub const ENCODING: [&'static str; Action::COUNT] = ["stay", "up", "down", "left", "right"];

    pub fn from_index(index: i64) -> Option<Action> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Action::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Stay => (0, 0),
            Action::Up => (0, 1),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }

    /// Unit direction in the arena. Grid Y maps onto world Z; world Y is never touched.
    pub fn movement_vector(self) -> Vec3 {
        match self {
            Action::Stay => Vec3::ZERO,
            Action::Up => Vec3::Z,
            Action::Down => Vec3::NEG_Z,
            Action::Left => Vec3::NEG_X,
            Action::Right => Vec3::X,
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action as u8
    }
}

impl TryFrom<i64> for Action {
    type Error = EnvError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Action::from_index(value).ok_or(EnvError::InvalidAction(value))
    }
}

/// `[agent_x, agent_y, target_x, target_y]`. Order and scale are part of the trained contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f32; 4]);

impl Observation {
    pub const LEN: usize = 4;
    pub const WIRE_SIZE: usize = Self::LEN * 4;

    pub fn from_positions(agent: GridPosition, target: GridPosition) -> Self {
        Self([
            agent.x as f32,
            agent.y as f32,
            target.x as f32,
            target.y as f32,
        ])
    }

    pub fn as_array(&self) -> &[f32; 4] {
        &self.0
    }

    pub fn agent(&self) -> (f32, f32) {
        (self.0[0], self.0[1])
    }

    pub fn target(&self) -> (f32, f32) {
        (self.0[2], self.0[3])
    }

    /// Little-endian IEEE-754 singles, in observation order.
    pub fn to_le_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        for (chunk, value) in out.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8; Self::WIRE_SIZE]) -> Self {
        let mut values = [0f32; 4];
        for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(values)
    }
}

/// Everything one pursuit episode owns. Replaced wholesale on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeState {
    pub agent: GridPosition,
    pub target: GridPosition,
    pub steps_remaining: u32,
}

impl EpisodeState {
    pub fn observation(&self) -> Observation {
        Observation::from_positions(self.agent, self.target)
    }

    pub fn captured(&self) -> bool {
        self.agent == self.target
    }
}

/// The (empty) info record returned alongside observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {}
