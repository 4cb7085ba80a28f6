//! Static level geometry shared by every race

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, origin at the top-left corner (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Race course: solid platforms, reset-on-touch hazards and one finish region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub platforms: Vec<Rect>,
    pub hazards: Vec<Rect>,
    pub finish_line: Rect,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            platforms: vec![
                Rect::new(0.0, 500.0, 800.0, 50.0), // ground
                Rect::new(200.0, 400.0, 100.0, 20.0),
                Rect::new(400.0, 350.0, 100.0, 20.0),
                Rect::new(600.0, 300.0, 100.0, 20.0),
                Rect::new(800.0, 250.0, 100.0, 20.0),
            ],
            hazards: vec![
                Rect::new(300.0, 480.0, 100.0, 20.0), // spike pits
                Rect::new(500.0, 480.0, 100.0, 20.0),
            ],
            finish_line: Rect::new(900.0, 0.0, 50.0, 500.0),
        }
    }
}
