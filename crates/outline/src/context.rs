//! Seven-point windows around contour points.
//!
//! A [`PointContext`] holds the three points before a contour point, the point
//! itself and the three points after it (wrapping around the contour), and
//! answers purely local geometric questions: is the outline vertical here, is
//! this the rounded extreme of a stroke, does another context run parallel, and
//! where does a point project onto the local line.

use std::{cmp::Ordering, sync::OnceLock};

use kurbo::Line;

use crate::point::Point;

/// Number of points in every context window.
pub const WINDOW_SIZE: usize = 7;

/// Offset of the center point within the window.
const CENTER: isize = 3;

/// Slack used when testing whether a projection falls inside a segment's box.
const PROJECTION_EPSILON: f64 = 1e-9;

/// Window of seven points centered on one contour point.
#[derive(Debug, Clone)]
pub struct PointContext {
    points: [Point; WINDOW_SIZE],
    index: usize,
    contour: usize,
    glyph_name: Option<String>,
    angle: OnceLock<f64>,
}

impl PointContext {
    /// Build a context from an explicit window (p-3 ..= p3).
    pub fn new(points: [Point; WINDOW_SIZE]) -> Self {
        let center = points[CENTER as usize];
        Self {
            points,
            index: center.index,
            contour: center.contour,
            glyph_name: None,
            angle: OnceLock::new(),
        }
    }

    /// Build a context from a slice that must hold exactly seven points.
    ///
    /// # Panics
    ///
    /// Panics if `window` does not hold exactly [`WINDOW_SIZE`] points.
    pub fn from_window(window: &[Point]) -> Self {
        let points: [Point; WINDOW_SIZE] = window.try_into().unwrap_or_else(|_| {
            panic!("point context needs exactly {WINDOW_SIZE} points, got {}", window.len())
        });
        Self::new(points)
    }

    /// Build the context for `contour[position]`, wrapping around the contour.
    ///
    /// Contours shorter than seven points repeat their points cyclically so the
    /// window is always full and the center stays at `position`. This differs
    /// from padding with copies of the first and last point: every slot still
    /// holds a real neighbour along the closed contour.
    ///
    /// # Panics
    ///
    /// Panics if the contour is empty or `position` is out of range.
    pub fn from_contour(contour: &[Point], position: usize) -> Self {
        assert!(
            position < contour.len(),
            "context position {position} out of range for contour of {} points",
            contour.len()
        );
        let len = contour.len() as isize;
        let points = std::array::from_fn(|slot| {
            let offset = slot as isize - CENTER;
            contour[(position as isize + offset).rem_euclid(len) as usize]
        });
        Self::new(points)
    }

    pub fn with_glyph_name(mut self, name: impl Into<String>) -> Self {
        self.glyph_name = Some(name.into());
        self
    }

    /// Always [`WINDOW_SIZE`].
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn points(&self) -> &[Point; WINDOW_SIZE] {
        &self.points
    }

    /// Point at `offset` from the center, in `-3..=3`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is outside `-3..=3`.
    pub fn point(&self, offset: isize) -> &Point {
        assert!((-CENTER..=CENTER).contains(&offset), "context offset {offset} outside -3..=3");
        &self.points[(offset + CENTER) as usize]
    }

    /// The center point.
    pub fn p(&self) -> &Point {
        self.point(0)
    }

    pub fn prev(&self) -> &Point {
        self.point(-1)
    }

    pub fn next(&self) -> &Point {
        self.point(1)
    }

    /// Flat index of the center point in its glyph.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn contour(&self) -> usize {
        self.contour
    }

    pub fn glyph_name(&self) -> Option<&str> {
        self.glyph_name.as_deref()
    }

    /// Drop cached derived values.
    pub fn reset_cache(&mut self) {
        self.angle = OnceLock::new();
    }

    /// Signed angle in degrees from the center point to its successor.
    pub fn angle(&self) -> f64 {
        *self.angle.get_or_init(|| {
            let (p, next) = (self.p(), self.next());
            let (dx, dy) = (next.x - p.x, next.y - p.y);
            if dx == 0.0 && dy == 0.0 { 0.0 } else { dy.atan2(dx).to_degrees() }
        })
    }

    /// [`angle`](Self::angle) folded into `0.0..180.0`.
    pub fn normalized_angle(&self) -> f64 {
        let angle = self.angle().rem_euclid(180.0);
        if angle >= 180.0 { 0.0 } else { angle }
    }

    pub fn is_on_curve(&self, offset: isize) -> bool {
        self.point(offset).on_curve
    }

    pub fn is_off_curve(&self, offset: isize) -> bool {
        !self.point(offset).on_curve
    }

    pub fn is_next_vertical(&self, tolerance: f64) -> bool {
        (self.next().x - self.p().x).abs() <= tolerance
    }

    pub fn is_prev_vertical(&self, tolerance: f64) -> bool {
        (self.prev().x - self.p().x).abs() <= tolerance
    }

    pub fn is_next_horizontal(&self, tolerance: f64) -> bool {
        (self.next().y - self.p().y).abs() <= tolerance
    }

    pub fn is_prev_horizontal(&self, tolerance: f64) -> bool {
        (self.prev().y - self.p().y).abs() <= tolerance
    }

    /// Smooth left/right extreme on a curve: both neighbors are off-curve and
    /// the tangent is vertical on both sides.
    pub fn is_horizontal_extreme(&self, tolerance: f64) -> bool {
        self.is_off_curve(-1)
            && self.is_off_curve(1)
            && self.is_next_vertical(tolerance)
            && self.is_prev_vertical(tolerance)
    }

    /// Smooth top/bottom extreme on a curve.
    pub fn is_vertical_extreme(&self, tolerance: f64) -> bool {
        self.is_off_curve(-1)
            && self.is_off_curve(1)
            && self.is_next_horizontal(tolerance)
            && self.is_prev_horizontal(tolerance)
    }

    /// First on-curve point among p1, p2, p3.
    pub fn next_on_curve_point(&self) -> Option<&Point> {
        (1..=CENTER).map(|offset| self.point(offset)).find(|p| p.on_curve)
    }

    /// First on-curve point among p-1, p-2, p-3.
    pub fn prev_on_curve_point(&self) -> Option<&Point> {
        (1..=CENTER).map(|offset| self.point(-offset)).find(|p| p.on_curve)
    }

    fn beyond_on_curve_neighbors(&self, beyond: impl Fn(&Point, &Point) -> bool) -> bool {
        match (self.prev_on_curve_point(), self.next_on_curve_point()) {
            (Some(prev), Some(next)) => beyond(self.p(), prev) && beyond(self.p(), next),
            _ => false,
        }
    }

    pub fn is_left_round_extreme(&self, tolerance: f64) -> bool {
        self.beyond_on_curve_neighbors(|p, other| p.x + tolerance < other.x)
    }

    pub fn is_right_round_extreme(&self, tolerance: f64) -> bool {
        self.beyond_on_curve_neighbors(|p, other| p.x - tolerance > other.x)
    }

    pub fn is_top_round_extreme(&self, tolerance: f64) -> bool {
        self.beyond_on_curve_neighbors(|p, other| p.y - tolerance > other.y)
    }

    pub fn is_bottom_round_extreme(&self, tolerance: f64) -> bool {
        self.beyond_on_curve_neighbors(|p, other| p.y + tolerance < other.y)
    }

    pub fn is_horizontal_round_extreme(&self, tolerance: f64) -> bool {
        self.is_left_round_extreme(tolerance) || self.is_right_round_extreme(tolerance)
    }

    pub fn is_vertical_round_extreme(&self, tolerance: f64) -> bool {
        self.is_top_round_extreme(tolerance) || self.is_bottom_round_extreme(tolerance)
    }

    /// Rounded left or right side of a vertical stroke.
    pub fn is_round_stem_extreme(&self, tolerance: f64) -> bool {
        self.is_horizontal_extreme(tolerance) && self.is_horizontal_round_extreme(tolerance)
    }

    /// Rounded top or bottom side of a horizontal stroke.
    pub fn is_round_bar_extreme(&self, tolerance: f64) -> bool {
        self.is_vertical_extreme(tolerance) && self.is_vertical_round_extreme(tolerance)
    }

    /// The outline changes its turning direction at the center point.
    pub fn is_inflection(&self) -> bool {
        let turn = |a: &Point, b: &Point, c: &Point| {
            (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
        };
        let before = turn(self.point(-1), self.p(), self.point(1));
        let after = turn(self.p(), self.point(1), self.point(2));
        before * after < 0.0
    }

    /// Both contexts' local lines run in the same direction, within `tolerance` degrees.
    pub fn is_parallel(&self, other: &PointContext, tolerance: f64) -> bool {
        let diff = (self.normalized_angle() - other.normalized_angle()).abs();
        diff.min(180.0 - diff) <= tolerance
    }

    /// Range of y covered by p-1, p and p1.
    pub fn vertical_window(&self) -> (f64, f64) {
        span([self.prev().y, self.p().y, self.next().y])
    }

    /// Range of x covered by p-1, p and p1.
    pub fn horizontal_window(&self) -> (f64, f64) {
        span([self.prev().x, self.p().x, self.next().x])
    }

    /// The two contexts share some height, so they can face each other across a stem.
    pub fn in_vertical_window(&self, other: &PointContext) -> bool {
        overlaps(self.vertical_window(), other.vertical_window())
    }

    /// The two contexts share some width, so they can face each other across a bar.
    pub fn in_horizontal_window(&self, other: &PointContext) -> bool {
        overlaps(self.horizontal_window(), other.horizontal_window())
    }

    /// Segment from the center point to its successor.
    pub fn line(&self) -> Line {
        Line::new(self.p().to_kurbo(), self.next().to_kurbo())
    }

    /// Perpendicular projection of `point` onto the local line, if it lands
    /// within the segment's bounding box.
    pub fn get_projected_point(&self, point: kurbo::Point) -> Option<kurbo::Point> {
        project_onto(self.line(), point)
    }

    /// A point of one context together with its perpendicular projection onto
    /// the other context's line.
    ///
    /// Candidates are tried in order: `other`'s center and successor projected
    /// onto `self`, then `self`'s center and successor projected onto `other`.
    pub fn get_projected_window_line(&self, other: &PointContext) -> Option<Line> {
        let own = self.line();
        let theirs = other.line();
        [(theirs.p0, own), (theirs.p1, own), (own.p0, theirs), (own.p1, theirs)]
            .into_iter()
            .find_map(|(point, target)| project_onto(target, point).map(|p| Line::new(point, p)))
    }

    /// Perpendicular distance between the two contexts' lines.
    pub fn distance_to(&self, other: &PointContext) -> Option<f64> {
        self.get_projected_window_line(other).map(|line| line.p0.distance(line.p1))
    }

    /// The straight vertical edge through the center point, if any.
    pub fn straight_vertical_edge(&self, tolerance: f64) -> Option<Line> {
        if !self.p().on_curve {
            return None;
        }
        if self.next().on_curve && self.is_next_vertical(tolerance) && self.next().y != self.p().y
        {
            return Some(Line::new(self.p().to_kurbo(), self.next().to_kurbo()));
        }
        if self.prev().on_curve && self.is_prev_vertical(tolerance) && self.prev().y != self.p().y
        {
            return Some(Line::new(self.prev().to_kurbo(), self.p().to_kurbo()));
        }
        None
    }

    /// The straight horizontal edge through the center point, if any.
    pub fn straight_horizontal_edge(&self, tolerance: f64) -> Option<Line> {
        if !self.p().on_curve {
            return None;
        }
        if self.next().on_curve
            && self.is_next_horizontal(tolerance)
            && self.next().x != self.p().x
        {
            return Some(Line::new(self.p().to_kurbo(), self.next().to_kurbo()));
        }
        if self.prev().on_curve
            && self.is_prev_horizontal(tolerance)
            && self.prev().x != self.p().x
        {
            return Some(Line::new(self.prev().to_kurbo(), self.p().to_kurbo()));
        }
        None
    }

    /// The side of a vertical stroke at this point: a straight vertical edge, or
    /// the tangent handles of a round stem extreme.
    pub fn stem_edge(&self, tolerance: f64) -> Option<Line> {
        self.straight_vertical_edge(tolerance).or_else(|| {
            self.is_round_stem_extreme(tolerance)
                .then(|| Line::new(self.prev().to_kurbo(), self.next().to_kurbo()))
        })
    }

    /// The side of a horizontal stroke at this point.
    pub fn bar_edge(&self, tolerance: f64) -> Option<Line> {
        self.straight_horizontal_edge(tolerance).or_else(|| {
            self.is_round_bar_extreme(tolerance)
                .then(|| Line::new(self.prev().to_kurbo(), self.next().to_kurbo()))
        })
    }

    fn center_key(&self) -> (f64, f64) {
        (self.p().x, self.p().y)
    }
}

fn span(values: [f64; 3]) -> (f64, f64) {
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn overlaps(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0.max(b.0) < a.1.min(b.1)
}

fn project_onto(line: Line, point: kurbo::Point) -> Option<kurbo::Point> {
    let direction = line.p1 - line.p0;
    let length_sq = direction.hypot2();
    if length_sq == 0.0 {
        return None;
    }
    let t = (point - line.p0).dot(direction) / length_sq;
    let projected = line.p0 + direction * t;
    let (min_x, max_x) = (line.p0.x.min(line.p1.x), line.p0.x.max(line.p1.x));
    let (min_y, max_y) = (line.p0.y.min(line.p1.y), line.p0.y.max(line.p1.y));
    let inside = projected.x >= min_x - PROJECTION_EPSILON
        && projected.x <= max_x + PROJECTION_EPSILON
        && projected.y >= min_y - PROJECTION_EPSILON
        && projected.y <= max_y + PROJECTION_EPSILON;
    inside.then_some(projected)
}

impl PartialEq for PointContext {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PointContext {}

impl PartialOrd for PointContext {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PointContext {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ax, ay) = self.center_key();
        let (bx, by) = other.center_key();
        ax.total_cmp(&bx).then(ay.total_cmp(&by))
    }
}
