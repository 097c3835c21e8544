//! Triangle tessellation of the surface verbs
//!
//! [`ShapeBatch`] implements [`Surface`] by turning every draw call into
//! pixel-space triangles; the GPU pipeline uploads them once per frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use std::f32::consts::TAU;

use super::surface::{Color, Surface};

/// 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: Color) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Pixel coordinates (top-left origin) to normalized device coordinates
    pub fn to_ndc(self, width: f32, height: f32) -> Self {
        let [x, y] = self.position;
        Self::new(2.0 * x / width - 1.0, 1.0 - 2.0 * y / height, self.color)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Segment count that keeps a circle of `radius` px looking round
pub fn circle_segments(radius: f32) -> u32 {
    ((radius * 0.5) as u32).clamp(12, 96)
}

/// Triangle fan for a filled circle
pub fn circle(center: Vec2, radius: f32, color: Color, segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);
    let point = |i: u32| {
        let theta = i as f32 / segments as f32 * TAU;
        center + Vec2::new(theta.cos(), theta.sin()) * radius
    };

    for i in 0..segments {
        let a = point(i);
        let b = point(i + 1);
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(a.x, a.y, color));
        vertices.push(Vertex::new(b.x, b.y, color));
    }

    vertices
}

/// Two triangles covering an axis-aligned rect
pub fn rect(min: Vec2, size: Vec2, color: Color) -> [Vertex; 6] {
    let max = min + size;
    [
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// A segment thickened into a quad; empty for zero-length segments
pub fn line(from: Vec2, to: Vec2, width: f32, color: Color) -> Vec<Vertex> {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec::new();
    }
    let offset = dir.perp() * (width / 2.0);
    let corners = [from + offset, from - offset, to + offset, to - offset];
    [0, 1, 2, 2, 1, 3]
        .into_iter()
        .map(|i| Vertex::new(corners[i].x, corners[i].y, color))
        .collect()
}

/// Text queued for the host to draw (GPU pass does not rasterize glyphs)
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// A frame's worth of tessellated draw calls
#[derive(Debug, Clone)]
pub struct ShapeBatch {
    width: f32,
    height: f32,
    background: Color,
    line_width: f32,
    vertices: Vec<Vertex>,
    labels: Vec<TextLabel>,
}

impl ShapeBatch {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: [0.0, 0.0, 0.0, 1.0],
            line_width: 1.0,
            vertices: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }
}

impl Surface for ShapeBatch {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear_and_fill_background(&mut self, color: Color) {
        self.background = color;
        self.vertices.clear();
        self.labels.clear();
    }

    fn draw_filled_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.vertices
            .extend(circle(Vec2::new(x, y), radius, color, circle_segments(radius)));
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
        self.vertices.extend(line(
            Vec2::new(x0, y0),
            Vec2::new(x1, y1),
            self.line_width,
            color,
        ));
    }

    fn draw_filled_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.vertices
            .extend(rect(Vec2::new(x, y), Vec2::new(width, height), color));
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        self.labels.push(TextLabel {
            text: text.to_string(),
            x,
            y,
        });
    }
}
