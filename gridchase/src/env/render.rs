use super::grid::GridPosition;
use super::types::RenderFrame;
use crate::config::RenderMode;

/// Read-only snapshot handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct GridView {
    pub grid_size: i32,
    pub agent: GridPosition,
    pub target: GridPosition,
    pub steps_remaining: u32,
}

/// The visualization collaborator. The environment acquires one lazily on the
/// first render and calls [`Renderer::teardown`] exactly once when it closes.
pub trait Renderer: Send {
    fn draw(&mut self, view: &GridView) -> RenderFrame;
    fn teardown(&mut self);
}

pub(crate) fn renderer_for(mode: RenderMode) -> Option<Box<dyn Renderer>> {
    match mode {
        RenderMode::None => None,
        RenderMode::Ansi => Some(Box::new(TextRenderer::default())),
    }
}

/// Draws the grid as text, top row = highest Y. `A` is the agent, `P` the target.
#[derive(Debug, Default)]
pub struct TextRenderer {
    buffer: String,
    frames_drawn: u64,
}

impl TextRenderer {
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl Renderer for TextRenderer {
    fn draw(&mut self, view: &GridView) -> RenderFrame {
        self.buffer.clear();
        self.buffer
            .push_str(&format!("Steps: {}\n", view.steps_remaining));
        for y in (0..view.grid_size).rev() {
            for x in 0..view.grid_size {
                let cell = GridPosition::new(x, y);
                let glyph = if cell == view.agent {
                    'A'
                } else if cell == view.target {
                    'P'
                } else {
                    '.'
                };
                self.buffer.push(glyph);
            }
            self.buffer.push('\n');
        }
        self.frames_drawn += 1;
        RenderFrame::Text(self.buffer.clone())
    }

    fn teardown(&mut self) {
        self.buffer = String::new();
    }
}
