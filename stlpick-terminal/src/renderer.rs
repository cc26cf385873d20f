//! ASCII rasterizer for terminal rendering

use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;
use stlpick_core::faceid::to_rgb_bytes;
use stlpick_core::{Camera, MeshKey, Point, Scene, VertexBufferDraft, FLOATS_PER_VERTEX};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Floats in one triangle of a draft
const FLOATS_PER_TRIANGLE: usize = 3 * FLOATS_PER_VERTEX;

/// Depth bias keeping grid lines that touch the model behind it
const LINE_DEPTH_BIAS: f32 = 1e-4;

const GRID_CHAR: char = '·';
const SELECTION_CHAR: char = '#';

/// Screen position plus NDC depth
type ScreenPoint = (f32, f32, f32);

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: u32 = 2;

/// ASCII renderer that converts the scene drafts to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
    /// Face id colour of the nearest model face in every cell
    face_ids: Vec<[u8; 3]>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
            face_ids: vec![[0; 3]; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
        self.face_ids.fill([0; 3]);
    }

    /// Face id colour under a cell, background outside the screen
    pub fn face_at(&self, x: usize, y: usize) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0; 3];
        }
        self.face_ids[y * self.width + x]
    }

    /// Draw the drafts last filled by [`Scene::build_frame`]
    pub fn render_scene(&mut self, scene: &Scene) {
        let mvp = scene.camera.mvp_matrix();
        let context = &scene.context;

        self.render_model(scene, &mvp);

        if let Some(grid) = line_range(&context.wireframe, scene.grid.key()) {
            self.render_lines(grid, &mvp, GRID_CHAR, Color::DarkGrey, true);
        }
        if let Some(selection) = line_range(&context.wireframe, scene.model.key()) {
            self.render_lines(selection, &mvp, SELECTION_CHAR, Color::Green, false);
        }
    }

    fn render_model(&mut self, scene: &Scene, mvp: &Matrix4<f32>) {
        let key = scene.model.key();
        let (Some(positions), Some(normals)) = (
            scene.context.triangles.mesh_data(key),
            scene.context.normals.mesh_data(key),
        ) else {
            return;
        };
        let ids = &scene.model.id_projection;
        // Only the orbit rotates normals; the view looks straight down -Z
        let rotation = scene.camera.rotation.matrix();

        let triangles = positions
            .chunks_exact(FLOATS_PER_TRIANGLE)
            .zip(normals.chunks_exact(FLOATS_PER_TRIANGLE))
            .zip(ids.chunks_exact(FLOATS_PER_TRIANGLE));
        for ((corners, normal), id) in triangles {
            let normal = rotation.transform_vector(&Vector3::new(normal[0], normal[1], normal[2]));
            let brightness = normal.z.max(0.0);
            let id = to_rgb_bytes([id[0], id[1], id[2]]);
            self.render_triangle(corners, mvp, brightness, id);
        }
    }

    fn render_triangle(
        &mut self,
        corners: &[f32],
        mvp: &Matrix4<f32>,
        brightness: f32,
        id: [u8; 3],
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, corner) in screen_coords
            .iter_mut()
            .zip(corners.chunks_exact(FLOATS_PER_VERTEX))
        {
            match self.project(mvp, corner) {
                Some(point) => *slot = point,
                None => return, // Triangle is clipped
            }
        }

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        self.rasterize_triangle(&screen_coords, character, id);
    }

    fn project(&self, mvp: &Matrix4<f32>, xyz: &[f32]) -> Option<ScreenPoint> {
        Camera::project_to_screen(
            mvp,
            &Point::new(xyz[0], xyz[1], xyz[2]),
            self.width as u32,
            self.height as u32,
        )
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char, id: [u8; 3]) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        let color = shade_color(character);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    self.color_buffer[idx] = color;
                    self.face_ids[idx] = id;
                }
            }
        }
    }

    /// Draw a line list. Depth-tested lines hide behind the model; the
    /// others are drawn on top of everything.
    fn render_lines(
        &mut self,
        floats: &[f32],
        mvp: &Matrix4<f32>,
        character: char,
        color: Color,
        depth_tested: bool,
    ) {
        for segment in floats.chunks_exact(2 * FLOATS_PER_VERTEX) {
            let (a, b) = segment.split_at(FLOATS_PER_VERTEX);
            let (Some(a), Some(b)) = (self.project(mvp, a), self.project(mvp, b))
            else {
                continue;
            };
            self.rasterize_line(a, b, character, color, depth_tested);
        }
    }

    fn rasterize_line(
        &mut self,
        a: ScreenPoint,
        b: ScreenPoint,
        character: char,
        color: Color,
        depth_tested: bool,
    ) {
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            let depth = a.2 + (b.2 - a.2) * t;

            if x < 0.0 || y < 0.0 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            if x >= self.width || y >= self.height {
                continue;
            }

            let idx = y * self.width + x;
            if depth_tested && depth - LINE_DEPTH_BIAS > self.depth_buffer[idx] {
                continue;
            }
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = color;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }
}

/// Slice of a line-list draft written by `key`, `None` if empty or absent
fn line_range(draft: &VertexBufferDraft, key: MeshKey) -> Option<&[f32]> {
    draft.mesh_data(key).filter(|floats| !floats.is_empty())
}

fn shade_color(character: char) -> Color {
    match character {
        '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        _ => Color::Cyan,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
