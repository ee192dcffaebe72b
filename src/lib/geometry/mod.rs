use std::f64::consts::{PI, TAU};

use nalgebra::geometry::Point2;

use crate::isel::ArcDirection;

/// Largest X/Y miss, in mm, tolerated before a corrective chord is added
/// to land exactly on the programmed end point.
const END_TOLERANCE: f64 = 0.001;

/// One circular move, fully resolved in the XY plane.
///
/// The dialect rounds start and end coordinates independently, so the
/// radius implied by the end point only approximately matches the one
/// implied by the start point. The start-to-center radius is authoritative
/// throughout.
#[derive(Debug, Clone)]
pub struct ArcSpec {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub center: Point2<f64>,
    pub dir: ArcDirection,
}

impl ArcSpec {
    /// Build an arc from the dialect's representation: absolute start and
    /// end, center as an I/J offset from the start.
    pub fn from_center_offset(
        start: Point2<f64>,
        end: Point2<f64>,
        i: f64,
        j: f64,
        dir: ArcDirection,
    ) -> Self {
        let center = Point2::new(start.x + i, start.y + j);
        ArcSpec {
            start,
            end,
            center,
            dir,
        }
    }

    /// Authoritative radius: start-to-center distance.
    pub fn radius(&self) -> f64 {
        (self.start - self.center).norm()
    }

    /// Signed angular span from start to end about the center: negative for
    /// clockwise arcs, positive for counter-clockwise. When the raw atan2
    /// values disagree with the direction, one full turn is applied, so a
    /// coincident start and end sweeps a full circle.
    pub fn sweep(&self) -> f64 {
        let a0 = self.start_angle();
        let mut a1 = (self.end.y - self.center.y).atan2(self.end.x - self.center.x);
        match self.dir {
            ArcDirection::Cw => {
                if a1 >= a0 {
                    a1 -= TAU;
                }
            }
            ArcDirection::Ccw => {
                if a1 <= a0 {
                    a1 += TAU;
                }
            }
        }
        a1 - a0
    }

    pub fn arc_length(&self) -> f64 {
        self.sweep().abs() * self.radius()
    }

    /// Chord targets approximating the arc, for controllers fed with G1
    /// moves only. The start point is not included. The number of chords is
    /// the arc length divided by `resolution`, at least one. The last
    /// computed chord sits on the authoritative-radius circle; if it misses
    /// the programmed end point by more than a thousandth of a millimetre
    /// in X or Y, one corrective target is appended so the toolpath lands
    /// exactly where the dialect said it should.
    pub fn chords(&self, resolution: f64) -> Vec<Point2<f64>> {
        let r = self.radius();
        let sweep = self.sweep();
        let a0 = self.start_angle();
        let steps = ((sweep.abs() * r / resolution).floor() as usize).max(1);
        let step = sweep / steps as f64;

        let mut points = Vec::with_capacity(steps + 1);
        for k in 1..=steps {
            let a = a0 + step * k as f64;
            points.push(Point2::new(
                self.center.x + r * a.cos(),
                self.center.y + r * a.sin(),
            ));
        }
        let last = points[steps - 1];
        if (last.x - self.end.x).abs() > END_TOLERANCE || (last.y - self.end.y).abs() > END_TOLERANCE
        {
            points.push(self.end);
        }
        points
    }

    /// Radius word for a single radius-form directive: positive for a minor
    /// arc, negative for a major one. An exact semicircle takes the
    /// positive form.
    pub fn signed_radius(&self) -> f64 {
        if self.sweep().abs() <= PI {
            self.radius()
        } else {
            -self.radius()
        }
    }

    fn start_angle(&self) -> f64 {
        (self.start.y - self.center.y).atan2(self.start.x - self.center.x)
    }
}
