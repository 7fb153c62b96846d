use image::{Rgba, RgbaImage};

use crate::types::{FINGERTIPS, LandmarkPoint, PALM_RING, THUMB_TIP, WRIST};

/// Bones of a single hand; five chains rooted at the wrist.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PALM_COLOR: Rgba<u8> = Rgba([80, 80, 80, 255]);
const BONE_COLOR: Rgba<u8> = Rgba([220, 220, 220, 255]);
const JOINT_COLOR: Rgba<u8> = Rgba([192, 192, 192, 255]);
const WRIST_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
const THUMB_TIP_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const FINGERTIP_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
const JOINT_BORDER_COLOR: Rgba<u8> = Rgba([50, 50, 50, 255]);

struct StyledJoint {
    px: (i32, i32),
    depth_scale: f64,
}

/// Renders one hand onto a fresh black canvas.
pub fn render(points: &[LandmarkPoint], width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
    draw_hand(&mut canvas, points);
    canvas
}

/// Draws palm, bones and joints into `canvas`. Indices missing from a short
/// slice are skipped.
pub fn draw_hand(canvas: &mut RgbaImage, points: &[LandmarkPoint]) {
    if points.is_empty() {
        return;
    }
    let (width, height) = canvas.dimensions();
    let joints = style_joints(points, width, height);

    let palm: Vec<(i32, i32)> = PALM_RING
        .iter()
        .filter_map(|&idx| joints.get(idx).map(|j| j.px))
        .collect();
    if palm.len() >= 3 {
        fill_polygon(canvas, &palm, PALM_COLOR);
    }

    for &(a, b) in CONNECTIONS {
        if let (Some(ja), Some(jb)) = (joints.get(a), joints.get(b)) {
            let thickness = bone_thickness((ja.depth_scale + jb.depth_scale) / 2.0);
            draw_line(canvas, ja.px, jb.px, BONE_COLOR, thickness);
        }
    }

    for (idx, joint) in joints.iter().enumerate() {
        let radius = joint_radius(joint.depth_scale);
        draw_circle(canvas, joint.px, radius, joint_color(idx));
        draw_ring(canvas, joint.px, radius, 1, JOINT_BORDER_COLOR);
    }
}

fn style_joints(points: &[LandmarkPoint], width: u32, height: u32) -> Vec<StyledJoint> {
    let (min_z, max_z) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        });
    let z_range = if max_z > min_z { max_z - min_z } else { 1.0 };

    points
        .iter()
        .map(|p| StyledJoint {
            px: p.to_pixel(width, height),
            depth_scale: if z_range != 0.0 {
                (max_z - p.z) / z_range
            } else {
                0.5
            },
        })
        .collect()
}

pub(crate) fn bone_thickness(avg_depth_scale: f64) -> i32 {
    1 + (5.0 * avg_depth_scale).round() as i32
}

pub(crate) fn joint_radius(depth_scale: f64) -> i32 {
    3 + (7.0 * depth_scale).round() as i32
}

fn joint_color(idx: usize) -> Rgba<u8> {
    if idx == WRIST {
        WRIST_COLOR
    } else if idx == THUMB_TIP {
        THUMB_TIP_COLOR
    } else if FINGERTIPS.contains(&idx) {
        FINGERTIP_COLOR
    } else {
        JOINT_COLOR
    }
}

/// Even-odd scanline fill sampled at pixel centres.
fn fill_polygon(canvas: &mut RgbaImage, vertices: &[(i32, i32)], color: Rgba<u8>) {
    let min_y = vertices.iter().map(|v| v.1).min().unwrap_or(0);
    let max_y = vertices.iter().map(|v| v.1).max().unwrap_or(-1);
    let mut crossings = Vec::with_capacity(vertices.len());

    for y in min_y..=max_y {
        let sample_y = y as f64 + 0.5;
        crossings.clear();
        for (i, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            let (y0f, y1f) = (y0 as f64, y1 as f64);
            if (y0f <= sample_y && sample_y < y1f) || (y1f <= sample_y && sample_y < y0f) {
                let t = (sample_y - y0f) / (y1f - y0f);
                crossings.push(x0 as f64 + t * (x1 - x0) as f64);
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let start = span[0].round() as i32;
            let end = span[1].round() as i32;
            for x in start..end {
                put_pixel_safe(canvas, x, y, color);
            }
        }
    }
}

pub(crate) fn draw_line(
    canvas: &mut RgbaImage,
    p0: (i32, i32),
    p1: (i32, i32),
    color: Rgba<u8>,
    thickness: i32,
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    // Odd brush widths only, never wider than `thickness`.
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        if radius > 0 {
            draw_circle(canvas, (x0, y0), radius, color);
        } else {
            put_pixel_safe(canvas, x0, y0, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub(crate) fn draw_circle(
    canvas: &mut RgbaImage,
    center: (i32, i32),
    radius: i32,
    color: Rgba<u8>,
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Outline of width `thickness` hugging the inside of a circle.
pub(crate) fn draw_ring(
    canvas: &mut RgbaImage,
    center: (i32, i32),
    radius: i32,
    thickness: i32,
    color: Rgba<u8>,
) {
    let (cx, cy) = center;
    let inner = (radius - thickness).max(0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 <= radius * radius && d2 > inner * inner {
                put_pixel_safe(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= canvas.width() || uy >= canvas.height() {
        return;
    }
    canvas.put_pixel(ux, uy, color);
}
