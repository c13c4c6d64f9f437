//! Contour points.

use kurbo::Vec2;

/// A single outline point.
///
/// Points are lightweight views into the coordinate and flag buffers owned by a
/// [`Glyph`](crate::Glyph): they cache the position and curve flag, and record
/// where in the glyph they came from. Editing goes through the glyph, which
/// invalidates every point handed out before the edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
    /// Index of the contour this point belongs to.
    pub contour: usize,
    /// Index into the owning glyph's flat point list.
    pub index: usize,
}

impl Point {
    pub fn new(x: f64, y: f64, on_curve: bool) -> Self {
        Self { x, y, on_curve, contour: 0, index: 0 }
    }

    /// Attach contour and flat-list indices.
    pub fn at(mut self, contour: usize, index: usize) -> Self {
        self.contour = contour;
        self.index = index;
        self
    }

    pub fn is_off_curve(&self) -> bool {
        !self.on_curve
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub fn offset(self, delta: Vec2) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y, ..self }
    }
}

impl From<Point> for kurbo::Point {
    fn from(point: Point) -> Self {
        point.to_kurbo()
    }
}

/// Whether a point lies on the outline or is a quadratic control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointType {
    OnCurve,
    OffCurve,
}

impl PointType {
    pub fn of(point: &Point) -> Self {
        if point.on_curve { Self::OnCurve } else { Self::OffCurve }
    }
}

impl std::fmt::Display for PointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnCurve => f.write_str("on-curve"),
            Self::OffCurve => f.write_str("off-curve"),
        }
    }
}
