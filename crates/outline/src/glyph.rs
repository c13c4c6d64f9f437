//! Glyph outlines: raw point buffers plus lazily derived contours, cubic path
//! commands, bounds and point contexts.

use std::{fmt, sync::OnceLock};

use kurbo::{BezPath, Rect, Vec2};

use crate::{
    context::PointContext,
    error::{Error, Result},
    point::Point,
};

/// Number of synthetic metric points appended after the outline points.
pub const PHANTOM_POINTS: usize = 4;

/// A reference to another glyph placed at an offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Name of the referenced glyph.
    pub base: String,
    pub offset: Vec2,
}

impl Component {
    pub fn new(base: impl Into<String>, offset: Vec2) -> Self {
        Self { base: base.into(), offset }
    }
}

/// Cubic-only outline command.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(kurbo::Point),
    LineTo(kurbo::Point),
    CurveTo(kurbo::Point, kurbo::Point, kurbo::Point),
    ClosePath,
    /// Another glyph's outline placed at `offset`; resolved by the consumer.
    Component { base: String, offset: Vec2 },
}

/// Winding direction of a contour in y-up font space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clockwise => f.write_str("clockwise"),
            Self::CounterClockwise => f.write_str("counter-clockwise"),
        }
    }
}

/// One closed contour of a glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub index: usize,
    pub points: Vec<Point>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace sum over all points, positive for counter-clockwise contours.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let (a, b) = (&self.points[i], &self.points[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    pub fn direction(&self) -> Direction {
        if self.signed_area() < 0.0 { Direction::Clockwise } else { Direction::CounterClockwise }
    }
}

/// Everything derived from the raw buffers in one pass. Rebuilt as a unit.
#[derive(Debug, Clone)]
struct Derived {
    points: Vec<Point>,
    phantom: [Point; PHANTOM_POINTS],
    contours: Vec<Contour>,
    commands: Vec<PathCommand>,
    bounds: Option<Rect>,
    contexts: Vec<PointContext>,
}

/// A glyph outline.
///
/// The glyph owns the coordinate, flag and contour-end buffers; everything else
/// is derived from them on first access and thrown away together on edit.
#[derive(Debug, Clone)]
pub struct Glyph {
    name: String,
    coordinates: Vec<kurbo::Point>,
    on_curve: Vec<bool>,
    end_points: Vec<usize>,
    components: Vec<Component>,
    advance_width: f64,
    left_side_bearing: f64,
    derived: OnceLock<Derived>,
}

impl Glyph {
    /// An empty glyph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates: Vec::new(),
            on_curve: Vec::new(),
            end_points: Vec::new(),
            components: Vec::new(),
            advance_width: 0.0,
            left_side_bearing: 0.0,
            derived: OnceLock::new(),
        }
    }

    /// Build a glyph from flat coordinate/flag buffers and contour end indices.
    pub fn from_raw(
        name: impl Into<String>,
        coordinates: Vec<kurbo::Point>,
        on_curve: Vec<bool>,
        end_points: Vec<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if coordinates.len() != on_curve.len() {
            return Err(Error::InvalidContours {
                glyph: name,
                message: format!(
                    "{} coordinates but {} flags",
                    coordinates.len(),
                    on_curve.len()
                ),
            });
        }
        let mut expected_start = 0;
        for &end in &end_points {
            if end < expected_start || end >= coordinates.len() {
                return Err(Error::InvalidContours {
                    glyph: name,
                    message: format!("end point {end} out of order or range"),
                });
            }
            expected_start = end + 1;
        }
        if expected_start != coordinates.len() {
            return Err(Error::InvalidContours {
                glyph: name,
                message: format!(
                    "contours cover {expected_start} of {} points",
                    coordinates.len()
                ),
            });
        }
        Ok(Self { coordinates, on_curve, end_points, ..Self::new(name) })
    }

    /// Build a glyph from per-contour `(x, y, on_curve)` lists.
    pub fn from_contours<C>(name: impl Into<String>, contours: impl IntoIterator<Item = C>) -> Self
    where
        C: IntoIterator<Item = (f64, f64, bool)>,
    {
        let mut glyph = Self::new(name);
        for contour in contours {
            let before = glyph.coordinates.len();
            for (x, y, on) in contour {
                glyph.coordinates.push(kurbo::Point::new(x, y));
                glyph.on_curve.push(on);
            }
            if glyph.coordinates.len() > before {
                glyph.end_points.push(glyph.coordinates.len() - 1);
            }
        }
        glyph
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self.mark_dirty();
        self
    }

    pub fn with_advance_width(mut self, advance_width: f64) -> Self {
        self.advance_width = advance_width;
        self.mark_dirty();
        self
    }

    pub fn with_left_side_bearing(mut self, left_side_bearing: f64) -> Self {
        self.left_side_bearing = left_side_bearing;
        self.mark_dirty();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn advance_width(&self) -> f64 {
        self.advance_width
    }

    pub fn left_side_bearing(&self) -> f64 {
        self.left_side_bearing
    }

    pub fn coordinates(&self) -> &[kurbo::Point] {
        &self.coordinates
    }

    pub fn on_curve_flags(&self) -> &[bool] {
        &self.on_curve
    }

    pub fn end_points(&self) -> &[usize] {
        &self.end_points
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn num_points(&self) -> usize {
        self.coordinates.len()
    }

    pub fn contour_count(&self) -> usize {
        self.end_points.len()
    }

    pub fn is_composite(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty() && self.components.is_empty()
    }

    /// Whether the derived state is currently cached.
    pub fn is_derived(&self) -> bool {
        self.derived.get().is_some()
    }

    /// Throw away all derived state; it is rebuilt on next access.
    pub fn mark_dirty(&mut self) {
        self.derived = OnceLock::new();
    }

    fn derived(&self) -> &Derived {
        self.derived.get_or_init(|| self.derive())
    }

    pub fn points(&self) -> &[Point] {
        &self.derived().points
    }

    /// Outline points followed by the four phantom points.
    pub fn points_with_phantom(&self) -> Vec<Point> {
        let derived = self.derived();
        derived.points.iter().chain(derived.phantom.iter()).copied().collect()
    }

    pub fn phantom_points(&self) -> &[Point; PHANTOM_POINTS] {
        &self.derived().phantom
    }

    pub fn contours(&self) -> &[Contour] {
        &self.derived().contours
    }

    /// Cubic-only commands; quadratic segments are elevated and components are
    /// listed after the contours.
    pub fn commands(&self) -> &[PathCommand] {
        &self.derived().commands
    }

    /// Bounds of this glyph's own points, excluding components.
    pub fn bounds(&self) -> Option<Rect> {
        self.derived().bounds
    }

    /// One context per contour point, in flat point order.
    pub fn contexts(&self) -> &[PointContext] {
        &self.derived().contexts
    }

    pub fn set_point(&mut self, index: usize, position: kurbo::Point) -> Result<()> {
        self.check_index(index)?;
        self.coordinates[index] = position;
        self.mark_dirty();
        Ok(())
    }

    pub fn set_on_curve(&mut self, index: usize, on_curve: bool) -> Result<()> {
        self.check_index(index)?;
        self.on_curve[index] = on_curve;
        self.mark_dirty();
        Ok(())
    }

    /// Move every outline point through `f`.
    pub fn map_points(&mut self, mut f: impl FnMut(kurbo::Point) -> kurbo::Point) {
        for coordinate in &mut self.coordinates {
            *coordinate = f(*coordinate);
        }
        self.mark_dirty();
    }

    /// Move every component offset through `f`.
    pub fn map_component_offsets(&mut self, mut f: impl FnMut(Vec2) -> Vec2) {
        for component in &mut self.components {
            component.offset = f(component.offset);
        }
        self.mark_dirty();
    }

    pub fn set_advance_width(&mut self, advance_width: f64) {
        self.advance_width = advance_width;
        self.mark_dirty();
    }

    pub fn set_left_side_bearing(&mut self, left_side_bearing: f64) {
        self.left_side_bearing = left_side_bearing;
        self.mark_dirty();
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.coordinates.len() {
            return Err(Error::PointOutOfRange {
                glyph: self.name.clone(),
                index,
                len: self.coordinates.len(),
            });
        }
        Ok(())
    }

    /// Own contours as a kurbo path; components are not expanded.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path, Vec2::ZERO);
        path
    }

    /// Append own contours, shifted by `offset`, to `path`.
    pub fn append_to(&self, path: &mut BezPath, offset: Vec2) {
        for command in self.commands() {
            match command {
                PathCommand::MoveTo(p) => path.move_to(*p + offset),
                PathCommand::LineTo(p) => path.line_to(*p + offset),
                PathCommand::CurveTo(a, b, c) => path.curve_to(*a + offset, *b + offset, *c + offset),
                PathCommand::ClosePath => path.close_path(),
                PathCommand::Component { .. } => {}
            }
        }
    }

    fn derive(&self) -> Derived {
        let mut points = Vec::with_capacity(self.coordinates.len());
        let mut contours = Vec::with_capacity(self.end_points.len());
        let mut bounds: Option<Rect> = None;

        let mut start = 0;
        for (contour, &end) in self.end_points.iter().enumerate() {
            let contour_points: Vec<Point> = (start..=end)
                .map(|index| {
                    let position = self.coordinates[index];
                    bounds = Some(match bounds {
                        Some(rect) => rect.union_pt(position),
                        None => Rect::from_points(position, position),
                    });
                    Point::new(position.x, position.y, self.on_curve[index]).at(contour, index)
                })
                .collect();
            points.extend_from_slice(&contour_points);
            contours.push(Contour { index: contour, points: contour_points });
            start = end + 1;
        }

        let mut commands = Vec::new();
        for contour in &contours {
            contour_commands(&contour.points, &mut commands);
        }
        commands.extend(self.components.iter().map(|component| PathCommand::Component {
            base: component.base.clone(),
            offset: component.offset,
        }));

        let contexts = contours
            .iter()
            .flat_map(|contour| {
                (0..contour.len()).map(|position| {
                    PointContext::from_contour(&contour.points, position)
                        .with_glyph_name(self.name.as_str())
                })
            })
            .collect();

        let phantom = self.phantom(bounds, points.len());

        Derived { points, phantom, contours, commands, bounds, contexts }
    }

    /// Horizontal origin and advance, then vertical origin and advance
    /// (the latter two collapse onto the baseline: no vertical metrics are kept).
    fn phantom(&self, bounds: Option<Rect>, first_index: usize) -> [Point; PHANTOM_POINTS] {
        let x_min = bounds.map(|rect| rect.x0).unwrap_or(0.0);
        let origin = x_min - self.left_side_bearing;
        let positions = [(origin, 0.0), (origin + self.advance_width, 0.0), (0.0, 0.0), (0.0, 0.0)];
        // Phantom points sit past the last contour so they never join a context window.
        let contour = self.end_points.len();
        std::array::from_fn(|i| {
            let (x, y) = positions[i];
            Point::new(x, y, true).at(contour, first_index + i)
        })
    }
}

/// Elevate a quadratic segment to a cubic with the 2/3 rule.
pub fn quad_to_cubic(p0: kurbo::Point, p1: kurbo::Point, p2: kurbo::Point) -> PathCommand {
    const TWO_THIRDS: f64 = 2.0 / 3.0;
    PathCommand::CurveTo(p0 + (p1 - p0) * TWO_THIRDS, p2 + (p1 - p2) * TWO_THIRDS, p2)
}

/// Decode one TrueType contour into cubic commands.
///
/// Runs of consecutive off-curve points imply on-curve points at their
/// midpoints. A contour without any on-curve point starts at the implied point
/// between its last and first control points.
fn contour_commands(points: &[Point], out: &mut Vec<PathCommand>) {
    let Some(last) = points.last() else {
        return;
    };

    let (start, sequence): (kurbo::Point, Vec<&Point>) =
        match points.iter().position(|p| p.on_curve) {
            Some(first_on) => (
                points[first_on].to_kurbo(),
                points[first_on + 1..].iter().chain(&points[..first_on]).collect(),
            ),
            None => (last.to_kurbo().midpoint(points[0].to_kurbo()), points.iter().collect()),
        };

    out.push(PathCommand::MoveTo(start));

    let mut current = start;
    let mut pending: Vec<kurbo::Point> = Vec::new();
    for point in sequence {
        if point.on_curve {
            emit_segment(current, &pending, point.to_kurbo(), out);
            pending.clear();
            current = point.to_kurbo();
        } else {
            pending.push(point.to_kurbo());
        }
    }
    // The closing straight segment is implied by ClosePath.
    if !pending.is_empty() {
        emit_segment(current, &pending, start, out);
    }
    out.push(PathCommand::ClosePath);
}

fn emit_segment(
    from: kurbo::Point,
    controls: &[kurbo::Point],
    to: kurbo::Point,
    out: &mut Vec<PathCommand>,
) {
    if controls.is_empty() {
        out.push(PathCommand::LineTo(to));
        return;
    }
    let mut segment_start = from;
    for (i, &control) in controls.iter().enumerate() {
        let segment_end = match controls.get(i + 1) {
            Some(&next) => control.midpoint(next),
            None => to,
        };
        out.push(quad_to_cubic(segment_start, control, segment_end));
        segment_start = segment_end;
    }
}
