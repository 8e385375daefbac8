//! Path model: incremental accumulation, transformation, serialization.

use smallvec::SmallVec;

use crate::props::{PropertyList, PropertyValue};
use crate::transform::{Transform, Transforms};

const SPLINE_DEGREE: usize = 3;

/// One drawable path segment. End points and control points are absolute.
#[derive(Debug, Clone, PartialEq)]
pub enum PathElement {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CubicBezierTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    QuadraticBezierTo {
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    ArcTo {
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    /// Uniform cubic B-spline through the given control points; lowered to
    /// cubic Béziers at write-out time.
    SplineTo { points: Vec<(f64, f64)> },
}

impl PathElement {
    fn transform(&mut self, trafo: &Transform) {
        match self {
            PathElement::MoveTo { x, y } | PathElement::LineTo { x, y } => {
                trafo.apply_to_point(x, y);
            }
            PathElement::CubicBezierTo { x1, y1, x2, y2, x, y } => {
                trafo.apply_to_point(x1, y1);
                trafo.apply_to_point(x2, y2);
                trafo.apply_to_point(x, y);
            }
            PathElement::QuadraticBezierTo { x1, y1, x, y } => {
                trafo.apply_to_point(x1, y1);
                trafo.apply_to_point(x, y);
            }
            PathElement::ArcTo { rx, ry, rotation, sweep, x, y, .. } => {
                trafo.apply_to_arc(rx, ry, rotation, sweep, x, y);
            }
            PathElement::SplineTo { points } => {
                for (x, y) in points.iter_mut() {
                    trafo.apply_to_point(x, y);
                }
            }
        }
    }

    fn transform_stack(&mut self, trafos: &Transforms) {
        match self {
            PathElement::MoveTo { x, y } | PathElement::LineTo { x, y } => {
                trafos.apply_to_point(x, y);
            }
            PathElement::CubicBezierTo { x1, y1, x2, y2, x, y } => {
                trafos.apply_to_point(x1, y1);
                trafos.apply_to_point(x2, y2);
                trafos.apply_to_point(x, y);
            }
            PathElement::QuadraticBezierTo { x1, y1, x, y } => {
                trafos.apply_to_point(x1, y1);
                trafos.apply_to_point(x, y);
            }
            PathElement::ArcTo { rx, ry, rotation, sweep, x, y, .. } => {
                trafos.apply_to_arc(rx, ry, rotation, sweep, x, y);
            }
            PathElement::SplineTo { points } => {
                for (x, y) in points.iter_mut() {
                    trafos.apply_to_point(x, y);
                }
            }
        }
    }

    fn write_out(&self, vec: &mut Vec<PropertyList>) {
        match *self {
            PathElement::MoveTo { x, y } => {
                let mut node = PropertyList::new();
                node.insert("libwpg:path-action", PropertyValue::from("M"));
                node.insert("svg:x", PropertyValue::Double(x));
                node.insert("svg:y", PropertyValue::Double(y));
                vec.push(node);
            }
            PathElement::LineTo { x, y } => {
                let mut node = PropertyList::new();
                node.insert("libwpg:path-action", PropertyValue::from("L"));
                node.insert("svg:x", PropertyValue::Double(x));
                node.insert("svg:y", PropertyValue::Double(y));
                vec.push(node);
            }
            PathElement::CubicBezierTo { x1, y1, x2, y2, x, y } => {
                let mut node = PropertyList::new();
                node.insert("libwpg:path-action", PropertyValue::from("C"));
                node.insert("svg:x1", PropertyValue::Double(x1));
                node.insert("svg:y1", PropertyValue::Double(y1));
                node.insert("svg:x2", PropertyValue::Double(x2));
                node.insert("svg:y2", PropertyValue::Double(y2));
                node.insert("svg:x", PropertyValue::Double(x));
                node.insert("svg:y", PropertyValue::Double(y));
                vec.push(node);
            }
            PathElement::QuadraticBezierTo { x1, y1, x, y } => {
                let mut node = PropertyList::new();
                node.insert("libwpg:path-action", PropertyValue::from("Q"));
                node.insert("svg:x1", PropertyValue::Double(x1));
                node.insert("svg:y1", PropertyValue::Double(y1));
                node.insert("svg:x", PropertyValue::Double(x));
                node.insert("svg:y", PropertyValue::Double(y));
                vec.push(node);
            }
            PathElement::ArcTo { rx, ry, rotation, large_arc, sweep, x, y } => {
                let mut node = PropertyList::new();
                node.insert("libwpg:path-action", PropertyValue::from("A"));
                node.insert("svg:rx", PropertyValue::Double(rx));
                node.insert("svg:ry", PropertyValue::Double(ry));
                node.insert(
                    "libwpg:rotate",
                    PropertyValue::Generic(rotation * 180.0 / std::f64::consts::PI),
                );
                node.insert("libwpg:large-arc", PropertyValue::Bool(large_arc));
                node.insert("libwpg:sweep", PropertyValue::Bool(sweep));
                node.insert("svg:x", PropertyValue::Double(x));
                node.insert("svg:y", PropertyValue::Double(y));
                vec.push(node);
            }
            PathElement::SplineTo { ref points } => write_out_spline(points, vec),
        }
    }
}

/// Emulates the knot vector of a uniform B-spline of degree 3.
fn knot(i: usize, num_points: usize) -> usize {
    if i < SPLINE_DEGREE {
        return 0;
    }
    if i > num_points {
        return num_points - SPLINE_DEGREE;
    }
    i - SPLINE_DEGREE
}

/// Decomposition of a spline of 3rd degree into Bézier segments, adapted
/// from the algorithm DecomposeCurve (Les Piegl, Wayne Tiller: The NURBS
/// Book, 2nd Edition, 1997).
fn write_out_spline(points: &[(f64, f64)], vec: &mut Vec<PropertyList>) {
    if points.len() <= SPLINE_DEGREE {
        return;
    }
    let mut node = PropertyList::new();
    node.insert("libwpg:path-action", PropertyValue::from("M"));
    node.insert("svg:x", PropertyValue::Double(points[0].0));
    node.insert("svg:y", PropertyValue::Double(points[0].1));
    vec.push(node);

    let n = points.len();
    let m = n + SPLINE_DEGREE + 1;
    let mut a = SPLINE_DEGREE;
    let mut b = SPLINE_DEGREE + 1;
    let mut qw: SmallVec<[(f64, f64); 4]> = SmallVec::from_slice(&points[..=SPLINE_DEGREE]);
    let mut next_qw: SmallVec<[(f64, f64); 4]> = SmallVec::from_elem((0.0, 0.0), SPLINE_DEGREE + 1);

    while b < m {
        let i = b;
        while b < m && knot(b + 1, n) == knot(b, n) {
            b += 1;
        }
        let mult = b - i + 1;
        if mult < SPLINE_DEGREE {
            let numer = (knot(b, n) - knot(a, n)) as f64;
            let mut alphas = [0.0f64; SPLINE_DEGREE];
            for j in (mult + 1..=SPLINE_DEGREE).rev() {
                alphas[j - mult - 1] = numer / (knot(a + j, n) - knot(a, n)) as f64;
            }
            let r = SPLINE_DEGREE - mult;
            for j in 1..=r {
                let save = r - j;
                let s = mult + j;
                for k in (s..=SPLINE_DEGREE).rev() {
                    let alpha = alphas[k - s];
                    qw[k].0 = alpha * qw[k].0 + (1.0 - alpha) * qw[k - 1].0;
                    qw[k].1 = alpha * qw[k].1 + (1.0 - alpha) * qw[k - 1].1;
                }
                if b < m {
                    next_qw[save] = qw[SPLINE_DEGREE];
                }
            }
        }
        // Pass the segment to the path
        let mut node = PropertyList::new();
        node.insert("libwpg:path-action", PropertyValue::from("C"));
        node.insert("svg:x1", PropertyValue::Double(qw[1].0));
        node.insert("svg:y1", PropertyValue::Double(qw[1].1));
        node.insert("svg:x2", PropertyValue::Double(qw[2].0));
        node.insert("svg:y2", PropertyValue::Double(qw[2].1));
        node.insert("svg:x", PropertyValue::Double(qw[3].0));
        node.insert("svg:y", PropertyValue::Double(qw[3].1));
        vec.push(node);

        std::mem::swap(&mut qw, &mut next_qw);

        if b < m {
            for i in SPLINE_DEGREE.saturating_sub(mult)..=SPLINE_DEGREE {
                if b - SPLINE_DEGREE + i < n {
                    qw[i] = points[b - SPLINE_DEGREE + i];
                }
            }
            a = b;
            b += 1;
        }
    }
}

/// Ordered sequence of path elements plus a closed flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathElement>,
    closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    pub fn append_move_to(&mut self, x: f64, y: f64) {
        self.elements.push(PathElement::MoveTo { x, y });
    }

    pub fn append_line_to(&mut self, x: f64, y: f64) {
        self.elements.push(PathElement::LineTo { x, y });
    }

    pub fn append_cubic_bezier_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.elements.push(PathElement::CubicBezierTo { x1, y1, x2, y2, x, y });
    }

    pub fn append_quadratic_bezier_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.elements.push(PathElement::QuadraticBezierTo { x1, y1, x, y });
    }

    pub fn append_arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) {
        self.elements.push(PathElement::ArcTo { rx, ry, rotation, large_arc, sweep, x, y });
    }

    pub fn append_spline_to(&mut self, points: Vec<(f64, f64)>) {
        self.elements.push(PathElement::SplineTo { points });
    }

    pub fn append_close_path(&mut self) {
        self.closed = true;
    }

    pub fn append_path(&mut self, path: &Path) {
        self.elements.extend(path.elements.iter().cloned());
    }

    pub fn write_out(&self, vec: &mut Vec<PropertyList>) {
        for element in &self.elements {
            element.write_out(vec);
        }
    }

    pub fn transform(&mut self, trafo: &Transform) {
        for element in &mut self.elements {
            element.transform(trafo);
        }
    }

    pub fn transform_stack(&mut self, trafos: &Transforms) {
        for element in &mut self.elements {
            element.transform_stack(trafos);
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.closed = false;
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(vec: &[PropertyList]) -> Vec<String> {
        vec.iter()
            .filter_map(|node| node.get("libwpg:path-action").map(|v| v.to_propstring()))
            .collect()
    }

    #[test]
    fn test_write_out_preserves_order() {
        let mut path = Path::new();
        path.append_move_to(0.0, 0.0);
        path.append_line_to(1.0, 0.0);
        path.append_cubic_bezier_to(1.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        let mut vec = Vec::new();
        path.write_out(&mut vec);
        assert_eq!(actions(&vec), ["M", "L", "C"]);
    }

    #[test]
    fn test_identity_transform_keeps_points() {
        let mut path = Path::new();
        path.append_cubic_bezier_to(0.25, 0.5, 0.75, 0.5, 1.0, 0.0);
        let reference = path.clone();
        path.transform(&Transform::default());
        assert_eq!(path, reference);
    }

    #[test]
    fn test_spline_lowering_counts() {
        // 4 control points: single Bézier segment after the initial move
        let mut vec = Vec::new();
        write_out_spline(&[(0.0, 0.0), (1.0, 2.0), (2.0, 2.0), (3.0, 0.0)], &mut vec);
        assert_eq!(actions(&vec), ["M", "C"]);

        // 7 control points: one segment per interior knot span
        let mut vec = Vec::new();
        write_out_spline(
            &[
                (0.0, 0.0),
                (1.0, 2.0),
                (2.0, 2.0),
                (3.0, 0.0),
                (4.0, -2.0),
                (5.0, -2.0),
                (6.0, 0.0),
            ],
            &mut vec,
        );
        let acts = actions(&vec);
        assert_eq!(acts[0], "M");
        assert!(acts[1..].iter().all(|a| a == "C"));
        assert!(acts.len() > 2);
    }

    #[test]
    fn test_spline_first_point_is_move() {
        let mut vec = Vec::new();
        write_out_spline(&[(5.0, 7.0), (6.0, 8.0), (7.0, 8.0), (8.0, 7.0)], &mut vec);
        assert_eq!(vec[0].get("svg:x").unwrap().as_double(), 5.0);
        assert_eq!(vec[0].get("svg:y").unwrap().as_double(), 7.0);
    }
}
