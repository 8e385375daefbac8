//! Reads shared by the two format parsers: precision-gated coordinates and
//! angles, and the poly-curve flag-byte lowering.

use crate::collector::Collector;
use crate::errors::{Error, Result};
use crate::stream::InternalStream;

/// Coordinate width of the active document. CDR is always 32-bit; CMX
/// declares its precision in the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Unknown,
    Bits16,
    Bits32,
}

/// 16-bit: stored value / 1000; 32-bit: stored value / 254000 (inches).
pub fn read_coordinate(
    input: &mut InternalStream,
    big_endian: bool,
    precision: Precision,
) -> Result<f64> {
    match precision {
        Precision::Unknown => Err(Error::UnknownPrecision),
        Precision::Bits16 => Ok(input.read_s16(big_endian)? as f64 / 1000.0),
        Precision::Bits32 => Ok(input.read_s32(big_endian)? as f64 / 254000.0),
    }
}

pub fn read_unsigned(
    input: &mut InternalStream,
    big_endian: bool,
    precision: Precision,
) -> Result<u32> {
    match precision {
        Precision::Unknown => Err(Error::UnknownPrecision),
        Precision::Bits16 => Ok(input.read_u16(big_endian)? as u32),
        Precision::Bits32 => input.read_u32(big_endian),
    }
}

pub fn read_unsigned_short(
    input: &mut InternalStream,
    big_endian: bool,
    precision: Precision,
) -> Result<u16> {
    match precision {
        Precision::Unknown => Err(Error::UnknownPrecision),
        Precision::Bits16 => Ok(input.read_u8()? as u16),
        Precision::Bits32 => input.read_u16(big_endian),
    }
}

pub fn read_integer(
    input: &mut InternalStream,
    big_endian: bool,
    precision: Precision,
) -> Result<i32> {
    match precision {
        Precision::Unknown => Err(Error::UnknownPrecision),
        Precision::Bits16 => Ok(input.read_s16(big_endian)? as i32),
        Precision::Bits32 => input.read_s32(big_endian),
    }
}

/// 16-bit: tenths of a degree; 32-bit: millionths of a degree. Radians out.
pub fn read_angle(
    input: &mut InternalStream,
    big_endian: bool,
    precision: Precision,
) -> Result<f64> {
    match precision {
        Precision::Unknown => Err(Error::UnknownPrecision),
        Precision::Bits16 => {
            Ok(std::f64::consts::PI * input.read_s16(big_endian)? as f64 / 1800.0)
        }
        Precision::Bits32 => {
            Ok(std::f64::consts::PI * input.read_s32(big_endian)? as f64 / 180_000_000.0)
        }
    }
}

/// Lowers a poly-curve point list onto the collector. Per flag byte: bit
/// 0x08 closes the subpath, bits 0x40|0x80 select the segment type (move,
/// line, control point, on-curve cubic end); bits 0x10/0x20 only annotate
/// continuity.
pub fn output_path(collector: &mut dyn Collector, points: &[(f64, f64)], types: &[u8]) {
    let mut tmp_points: Vec<(f64, f64)> = Vec::new();
    for (k, point) in points.iter().enumerate() {
        let Some(&point_type) = types.get(k) else {
            break;
        };
        let is_closed_path = point_type & 0x08 != 0;
        match (point_type & 0x40 != 0, point_type & 0x80 != 0) {
            (false, false) => {
                tmp_points.clear();
                collector.collect_move_to(point.0, point.1);
            }
            (true, false) => {
                tmp_points.clear();
                collector.collect_line_to(point.0, point.1);
                if is_closed_path {
                    collector.collect_close_path();
                }
            }
            (false, true) => {
                if tmp_points.len() >= 2 {
                    collector.collect_cubic_bezier(
                        tmp_points[0].0,
                        tmp_points[0].1,
                        tmp_points[1].0,
                        tmp_points[1].1,
                        point.0,
                        point.1,
                    );
                } else {
                    collector.collect_line_to(point.0, point.1);
                }
                if is_closed_path {
                    collector.collect_close_path();
                }
                tmp_points.clear();
            }
            (true, true) => {
                tmp_points.push(*point);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::InternalStream;

    #[test]
    fn test_coordinate_precision() {
        let mut input = InternalStream::from_slice(&1000i16.to_le_bytes());
        assert_eq!(read_coordinate(&mut input, false, Precision::Bits16).unwrap(), 1.0);

        let mut input = InternalStream::from_slice(&254000i32.to_le_bytes());
        assert_eq!(read_coordinate(&mut input, false, Precision::Bits32).unwrap(), 1.0);

        let mut input = InternalStream::from_slice(&[0, 0]);
        assert!(matches!(
            read_coordinate(&mut input, false, Precision::Unknown),
            Err(Error::UnknownPrecision)
        ));
    }

    #[test]
    fn test_angle_precision() {
        let mut input = InternalStream::from_slice(&900i16.to_le_bytes());
        let angle = read_angle(&mut input, false, Precision::Bits16).unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let mut input = InternalStream::from_slice(&90_000_000i32.to_le_bytes());
        let angle = read_angle(&mut input, false, Precision::Bits32).unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    struct PathRecorder {
        events: Vec<String>,
    }

    impl Collector for PathRecorder {
        fn collect_move_to(&mut self, x: f64, y: f64) {
            self.events.push(format!("M {} {}", x, y));
        }
        fn collect_line_to(&mut self, x: f64, y: f64) {
            self.events.push(format!("L {} {}", x, y));
        }
        fn collect_cubic_bezier(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
            self.events
                .push(format!("C {} {} {} {} {} {}", x1, y1, x2, y2, x, y));
        }
        fn collect_close_path(&mut self) {
            self.events.push("Z".to_string());
        }
    }

    #[test]
    fn test_flag_bytes_lower_to_segments() {
        let mut recorder = PathRecorder { events: Vec::new() };
        let points = [
            (0.0, 0.0), // move
            (1.0, 0.0), // line
            (1.5, 0.5), // control
            (1.5, 1.5), // control
            (1.0, 2.0), // cubic end, closes
        ];
        let types = [0x00, 0x40, 0xc0, 0xc0, 0x88];
        output_path(&mut recorder, &points, &types);
        assert_eq!(
            recorder.events,
            ["M 0 0", "L 1 0", "C 1.5 0.5 1.5 1.5 1 2", "Z"]
        );
    }

    #[test]
    fn test_lone_on_curve_degrades_to_line() {
        let mut recorder = PathRecorder { events: Vec::new() };
        output_path(&mut recorder, &[(0.0, 0.0), (2.0, 2.0)], &[0x00, 0x80]);
        assert_eq!(recorder.events, ["M 0 0", "L 2 2"]);
    }

    #[test]
    fn test_continuity_bits_do_not_change_geometry() {
        let mut plain = PathRecorder { events: Vec::new() };
        output_path(&mut plain, &[(0.0, 0.0), (1.0, 1.0)], &[0x00, 0x40]);
        let mut smooth = PathRecorder { events: Vec::new() };
        output_path(&mut smooth, &[(0.0, 0.0), (1.0, 1.0)], &[0x10, 0x60]);
        assert_eq!(plain.events, smooth.events);
    }
}
