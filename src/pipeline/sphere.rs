use image::{Rgba, RgbaImage};

use super::skeleton::{draw_circle, draw_ring};
use crate::types::{INDEX_FINGER_TIP, LandmarkFrame};

const COLLISION_MARGIN: f64 = 1.2;
const OUTLINE_COLOR: Rgba<u8> = Rgba([30, 30, 30, 255]);
const OUTLINE_THICKNESS: i32 = 2;

/// A ball that sticks to one tracked landmark while it is within reach.
#[derive(Clone, Debug)]
pub struct InteractiveSphere {
    position: (f64, f64),
    radius_px: i32,
    color_default: Rgba<u8>,
    color_collided: Rgba<u8>,
    tracked_landmark: usize,
    collided: bool,
}

impl InteractiveSphere {
    pub fn new(
        position: (f64, f64),
        radius_px: i32,
        color_default: Rgba<u8>,
        color_collided: Rgba<u8>,
        tracked_landmark: usize,
    ) -> Self {
        Self {
            position,
            radius_px,
            color_default,
            color_collided,
            tracked_landmark,
            collided: false,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn is_collided(&self) -> bool {
        self.collided
    }

    /// Tests the tracked landmark against the sphere on a `width` x `height`
    /// canvas. On contact the sphere jumps to the landmark.
    pub fn update(&mut self, frame: &LandmarkFrame, width: u32, height: u32) -> bool {
        self.collided = false;
        let Some(landmark) = frame.get(self.tracked_landmark) else {
            return false;
        };

        let (sx, sy) = self.pixel_center(width, height);
        let (lx, ly) = landmark.to_pixel(width, height);
        let dx = (sx - lx) as f64;
        let dy = (sy - ly) as f64;
        let dist_sq = dx * dx + dy * dy;
        let threshold = self.radius_px as f64 * COLLISION_MARGIN;

        if dist_sq < threshold * threshold {
            self.collided = true;
            self.position = (landmark.x, landmark.y);
        }
        self.collided
    }

    pub fn draw(&self, canvas: &mut RgbaImage) {
        let (width, height) = canvas.dimensions();
        let center = self.pixel_center(width, height);
        let color = if self.collided {
            self.color_collided
        } else {
            self.color_default
        };
        draw_circle(canvas, center, self.radius_px, color);
        draw_ring(canvas, center, self.radius_px, OUTLINE_THICKNESS, OUTLINE_COLOR);
    }

    fn pixel_center(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.position.0 * width as f64) as i32,
            (self.position.1 * height as f64) as i32,
        )
    }
}

impl Default for InteractiveSphere {
    /// Centre of the screen, grabbed with the index fingertip.
    fn default() -> Self {
        Self::new(
            (0.5, 0.5),
            30,
            Rgba([0, 0, 255, 255]),
            Rgba([255, 0, 0, 255]),
            INDEX_FINGER_TIP,
        )
    }
}
