//! Affine transforms, for positioning shapes (rotate, translate, scale, skew)

use serde_derive::{Deserialize, Serialize};

use crate::CDR_EPSILON;

/// 2×3 affine transform `[v0 v1 x0; v3 v4 y0]`, applied as
/// `x' = v0·x + v1·y + x0`, `y' = v3·x + v4·y + y0`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub v0: f64,
    pub v1: f64,
    pub x0: f64,
    pub v3: f64,
    pub v4: f64,
    pub y0: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }
}

impl Transform {
    pub fn new(v0: f64, v1: f64, x0: f64, v3: f64, v4: f64, y0: f64) -> Self {
        Transform { v0, v1, x0, v3, v4, y0 }
    }

    pub fn apply_to_point(&self, x: &mut f64, y: &mut f64) {
        let tmp_x = self.v0 * *x + self.v1 * *y + self.x0;
        *y = self.v3 * *x + self.v4 * *y + self.y0;
        *x = tmp_x;
    }

    /// Applies the transform to an SVG-style elliptical arc segment,
    /// re-deriving radii and rotation from the implicit conic form of the
    /// mapped ellipse and flipping the sweep once per negative axis scale.
    pub fn apply_to_arc(
        &self,
        rx: &mut f64,
        ry: &mut f64,
        rotation: &mut f64,
        sweep: &mut bool,
        x: &mut f64,
        y: &mut f64,
    ) {
        // First transform the end-point, which is the easiest
        self.apply_to_point(x, y);

        // represent ellipse as a transformed unit circle
        let v0 = self.v0 * *rx * rotation.cos() - self.v1 * *rx * rotation.sin();
        let v1 = self.v1 * *ry * rotation.cos() + self.v0 * *ry * rotation.sin();
        let v3 = self.v3 * *rx * rotation.cos() - self.v4 * *rx * rotation.sin();
        let v4 = self.v4 * *ry * rotation.cos() + self.v3 * *ry * rotation.sin();

        // centered implicit equation
        let a = v0 * v0 + v1 * v1;
        let c = v3 * v3 + v4 * v4;
        let b = 2.0 * (v0 * v3 + v1 * v4);

        // convert implicit equation to angle and half-axes
        let mut r1;
        let mut r2;
        if b.abs() <= CDR_EPSILON {
            *rotation = 0.0;
            r1 = a;
            r2 = c;
        } else if (a - c).abs() <= CDR_EPSILON {
            r1 = a + b / 2.0;
            r2 = a - b / 2.0;
            *rotation = std::f64::consts::FRAC_PI_4;
        } else {
            let radical = (1.0 + b * b / ((a - c) * (a - c))).max(0.0).sqrt();
            r1 = (a + c + radical * (a - c)) / 2.0;
            r2 = (a + c - radical * (a - c)) / 2.0;
            *rotation = b.atan2(a - c) / 2.0;
        }

        // Prevent sqrt of a negative number, however small it might be.
        r1 = r1.max(0.0).sqrt();
        r2 = r2.max(0.0).sqrt();

        // now r1 and r2 are half-axes
        if a - c <= 0.0 {
            *ry = r1;
            *rx = r2;
        } else {
            *ry = r2;
            *rx = r1;
        }

        // sweep is inverted each time the arc is flipped
        if v0 < 0.0 {
            *sweep = !*sweep;
        }
        if v4 < 0.0 {
            *sweep = !*sweep;
        }
    }

    fn scale_x_signed(&self) -> f64 {
        let (mut x0, mut y0) = (0.0, 0.0);
        let (mut x1, mut y1) = (1.0, 0.0);
        self.apply_to_point(&mut x0, &mut y0);
        self.apply_to_point(&mut x1, &mut y1);
        x1 - x0
    }

    fn scale_y_signed(&self) -> f64 {
        let (mut x0, mut y0) = (0.0, 0.0);
        let (mut x1, mut y1) = (0.0, 1.0);
        self.apply_to_point(&mut x0, &mut y0);
        self.apply_to_point(&mut x1, &mut y1);
        y1 - y0
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x_signed().abs()
    }

    pub fn flip_x(&self) -> bool {
        self.scale_x_signed() < 0.0
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y_signed().abs()
    }

    pub fn flip_y(&self) -> bool {
        self.scale_y_signed() < 0.0
    }

    /// Rotation of the mapped x-axis, normalized into `[0, 2π)`.
    pub fn rotation(&self) -> f64 {
        let (mut x0, mut y0) = (0.0, 0.0);
        let (mut x1, mut y1) = (1.0, 0.0);
        self.apply_to_point(&mut x0, &mut y0);
        self.apply_to_point(&mut x1, &mut y1);
        let mut angle = (y1 - y0).atan2(x1 - x0);
        if angle < 0.0 {
            angle += 2.0 * std::f64::consts::PI;
        }
        angle
    }

    pub fn translate_x(&self) -> f64 {
        let (mut x, mut y) = (0.0, 0.0);
        self.apply_to_point(&mut x, &mut y);
        x
    }

    pub fn translate_y(&self) -> f64 {
        let (mut x, mut y) = (0.0, 0.0);
        self.apply_to_point(&mut x, &mut y);
        y
    }
}

/// An ordered list of transforms, applied first-to-last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transforms {
    trafos: Vec<Transform>,
}

impl Transforms {
    pub fn new() -> Self {
        Transforms::default()
    }

    pub fn append(&mut self, trafo: Transform) {
        self.trafos.push(trafo);
    }

    pub fn clear(&mut self) {
        self.trafos.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.trafos.is_empty()
    }

    pub fn apply_to_point(&self, x: &mut f64, y: &mut f64) {
        for trafo in &self.trafos {
            trafo.apply_to_point(x, y);
        }
    }

    pub fn apply_to_arc(
        &self,
        rx: &mut f64,
        ry: &mut f64,
        rotation: &mut f64,
        sweep: &mut bool,
        x: &mut f64,
        y: &mut f64,
    ) {
        for trafo in &self.trafos {
            trafo.apply_to_arc(rx, ry, rotation, sweep, x, y);
        }
    }

    fn scale_x_signed(&self) -> f64 {
        let (mut x0, mut y0) = (0.0, 0.0);
        let (mut x1, mut y1) = (1.0, 0.0);
        self.apply_to_point(&mut x0, &mut y0);
        self.apply_to_point(&mut x1, &mut y1);
        x1 - x0
    }

    fn scale_y_signed(&self) -> f64 {
        let (mut x0, mut y0) = (0.0, 0.0);
        let (mut x1, mut y1) = (0.0, 1.0);
        self.apply_to_point(&mut x0, &mut y0);
        self.apply_to_point(&mut x1, &mut y1);
        y1 - y0
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x_signed().abs()
    }

    pub fn flip_x(&self) -> bool {
        self.scale_x_signed() < 0.0
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y_signed().abs()
    }

    pub fn flip_y(&self) -> bool {
        self.scale_y_signed() < 0.0
    }

    pub fn translate_x(&self) -> f64 {
        let (mut x, mut y) = (0.0, 0.0);
        self.apply_to_point(&mut x, &mut y);
        x
    }

    pub fn translate_y(&self) -> f64 {
        let (mut x, mut y) = (0.0, 0.0);
        self.apply_to_point(&mut x, &mut y);
        y
    }
}

#[test]
fn test_apply_to_point() {
    let trafo = Transform::new(2.0, 0.0, 10.0, 0.0, 3.0, -5.0);
    let (mut x, mut y) = (1.0, 1.0);
    trafo.apply_to_point(&mut x, &mut y);
    assert_eq!((x, y), (12.0, -2.0));

    assert_eq!(trafo.scale_x(), 2.0);
    assert_eq!(trafo.scale_y(), 3.0);
    assert!(!trafo.flip_x());
    assert_eq!(trafo.translate_x(), 10.0);
    assert_eq!(trafo.translate_y(), -5.0);
}

#[test]
fn test_identity_preserves_arc() {
    let identity = Transform::default();
    let (mut rx, mut ry, mut rot, mut sweep) = (3.0, 2.0, 0.0, true);
    let (mut x, mut y) = (1.0, 1.0);
    identity.apply_to_arc(&mut rx, &mut ry, &mut rot, &mut sweep, &mut x, &mut y);
    assert!((rx - 3.0).abs() < 1e-9);
    assert!((ry - 2.0).abs() < 1e-9);
    assert!(sweep);
    assert_eq!((x, y), (1.0, 1.0));
}

#[test]
fn test_flip_inverts_sweep() {
    let flip = Transform::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
    let (mut rx, mut ry, mut rot, mut sweep) = (1.0, 1.0, 0.0, true);
    let (mut x, mut y) = (1.0, 0.0);
    flip.apply_to_arc(&mut rx, &mut ry, &mut rot, &mut sweep, &mut x, &mut y);
    assert!(!sweep);
    assert_eq!(x, -1.0);
    assert!(flip.flip_x());
    assert!(!flip.flip_y());
}

#[test]
fn test_transforms_compose_in_order() {
    let mut trafos = Transforms::new();
    trafos.append(Transform::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0));
    trafos.append(Transform::new(1.0, 0.0, 1.0, 0.0, 1.0, 1.0));
    let (mut x, mut y) = (1.0, 1.0);
    trafos.apply_to_point(&mut x, &mut y);
    // scale first, then translate
    assert_eq!((x, y), (3.0, 3.0));
}
