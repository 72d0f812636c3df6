//! Shape primitives - triangle-list vertices for rects, circles and lines
//!
//! All builders take clip-space coordinates.

pub type Rgba = [f32; 4];

/// Vertex structure for rendering colored shapes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: Rgba,
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x4
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Axis-aligned rectangle from two opposite corners
pub fn push_rect(out: &mut Vec<Vertex>, (x1, y1): (f32, f32), (x2, y2): (f32, f32), color: Rgba) {
    let v = |x, y| Vertex { position: [x, y], color };
    out.extend_from_slice(&[
        v(x1, y1),
        v(x2, y1),
        v(x2, y2),
        v(x1, y1),
        v(x2, y2),
        v(x1, y2),
    ]);
}

/// Filled circle as a triangle fan unrolled into a list.
/// `radius` is per axis so circles stay round on non-square targets.
pub fn push_circle(
    out: &mut Vec<Vertex>,
    (cx, cy): (f32, f32),
    (rx, ry): (f32, f32),
    color: Rgba,
    segments: u32,
) {
    let segments = segments.max(3);
    let point = |i: u32| {
        let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
        Vertex {
            position: [cx + rx * angle.cos(), cy + ry * angle.sin()],
            color,
        }
    };
    out.reserve(segments as usize * 3);
    for i in 0..segments {
        out.push(Vertex { position: [cx, cy], color });
        out.push(point(i));
        out.push(point(i + 1));
    }
}

/// Line segment as a thin quad; zero-length segments emit nothing
pub fn push_line(
    out: &mut Vec<Vertex>,
    (x1, y1): (f32, f32),
    (x2, y2): (f32, f32),
    half_width: f32,
    color: Rgba,
) {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 0.001 {
        return;
    }

    // Perpendicular offset for thickness
    let px = -dy / len * half_width;
    let py = dx / len * half_width;
    let v = |x, y| Vertex { position: [x, y], color };

    out.extend_from_slice(&[
        v(x1 - px, y1 - py),
        v(x1 + px, y1 + py),
        v(x2 + px, y2 + py),
        v(x1 - px, y1 - py),
        v(x2 + px, y2 + py),
        v(x2 - px, y2 - py),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [1.0; 4];

    #[test]
    fn test_vertex_counts() {
        let mut out = Vec::new();
        push_rect(&mut out, (0.0, 0.0), (1.0, 1.0), WHITE);
        assert_eq!(out.len(), 6);
        push_circle(&mut out, (0.0, 0.0), (0.1, 0.1), WHITE, 12);
        assert_eq!(out.len(), 6 + 36);
        push_line(&mut out, (0.0, 0.0), (0.0, 0.0), 0.01, WHITE);
        assert_eq!(out.len(), 42);
        push_line(&mut out, (0.0, 0.0), (0.5, 0.0), 0.01, WHITE);
        assert_eq!(out.len(), 48);
    }

    #[test]
    fn test_line_thickness_is_perpendicular() {
        let mut out = Vec::new();
        push_line(&mut out, (0.0, 0.0), (1.0, 0.0), 0.1, WHITE);
        let ys: Vec<f32> = out.iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| (y.abs() - 0.1).abs() < 1e-6));
    }
}
