use geoview_types::cartesian::Point2d;
use geoview_types::{ClosedContour, Contour, Geom, GeometryType, Polygon};
use serde_json::{Map, Value};

use super::{Key, MapInputEvent, MouseButton, ViewportControl};

const DEFAULT_ZOOM_FACTOR: f64 = 1.2;

/// Kinds of the map tools.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum MapToolKind {
    /// Drag the map with the primary button.
    #[default]
    Pan,
    /// Zoom in around the clicked point.
    ZoomIn,
    /// Zoom out around the clicked point.
    ZoomOut,
    /// Report the world position of the clicked point.
    Identify,
    /// Digitize points.
    AddPoint,
    /// Digitize line strings.
    AddLine,
    /// Digitize polygons.
    AddPolygon,
}

/// Mouse cursor the UI should show for a tool.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorHint {
    /// Move (hand) cursor.
    Move,
    /// Magnifier with a plus.
    ZoomIn,
    /// Magnifier with a minus.
    ZoomOut,
    /// Crosshair.
    Crosshair,
}

/// Geometry digitized by a map tool.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnGeometry {
    /// `Point`, `LineString` or `Polygon`.
    pub kind: GeometryType,
    /// Vertices in world coordinates. Polygon rings are closed: the first vertex is repeated at
    /// the end.
    pub coordinates: Vec<Point2d>,
    /// Attributes of the geometry.
    pub properties: Map<String, Value>,
}

impl DrawnGeometry {
    fn new(kind: GeometryType, coordinates: Vec<Point2d>) -> Self {
        Self {
            kind,
            coordinates,
            properties: Map::new(),
        }
    }

    /// Converts into a geometry. Returns `None` if there are not enough vertices for the kind.
    pub fn to_geom(&self) -> Option<Geom<Point2d>> {
        match self.kind {
            GeometryType::Point => self.coordinates.first().map(|p| Geom::Point(*p)),
            GeometryType::LineString if self.coordinates.len() >= 2 => {
                Some(Contour::open(self.coordinates.clone()).into())
            }
            GeometryType::Polygon => {
                let ring = ClosedContour::new(self.coordinates.clone());
                (ring.len() >= 3).then(|| Polygon::from(ring).into())
            }
            _ => None,
        }
    }
}

/// Result of handling an input event by a map tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The event is not relevant for the tool.
    Ignored,
    /// The tool state changed, but nothing else happened.
    Consumed,
    /// The viewport was changed.
    ViewChanged,
    /// A geometry was digitized.
    GeometryAdded(DrawnGeometry),
    /// A world position was identified.
    Identified(Point2d),
}

/// Active interaction mode of the map.
///
/// Tools that digitize line strings and polygons keep their vertices until the geometry is
/// finished (secondary button or `Enter`) or cancelled (`Escape`). The buffer is also cleared
/// when the tool is activated or deactivated.
#[derive(Debug, Clone, PartialEq)]
pub enum MapTool {
    /// See [`MapToolKind::Pan`].
    Pan {
        /// Last pointer position while dragging.
        anchor: Option<Point2d>,
    },
    /// See [`MapToolKind::ZoomIn`].
    ZoomIn {
        /// Zoom step.
        factor: f64,
    },
    /// See [`MapToolKind::ZoomOut`].
    ZoomOut {
        /// Zoom step.
        factor: f64,
    },
    /// See [`MapToolKind::Identify`].
    Identify,
    /// See [`MapToolKind::AddPoint`].
    AddPoint {
        /// Number of points added so far.
        added: u64,
    },
    /// See [`MapToolKind::AddLine`].
    AddLine {
        /// Vertices of the line in progress.
        vertices: Vec<Point2d>,
    },
    /// See [`MapToolKind::AddPolygon`].
    AddPolygon {
        /// Vertices of the ring in progress.
        vertices: Vec<Point2d>,
    },
}

impl Default for MapTool {
    fn default() -> Self {
        Self::new(MapToolKind::Pan)
    }
}

impl MapTool {
    /// Creates a tool in its initial state.
    pub fn new(kind: MapToolKind) -> Self {
        match kind {
            MapToolKind::Pan => Self::Pan { anchor: None },
            MapToolKind::ZoomIn => Self::ZoomIn {
                factor: DEFAULT_ZOOM_FACTOR,
            },
            MapToolKind::ZoomOut => Self::ZoomOut {
                factor: DEFAULT_ZOOM_FACTOR,
            },
            MapToolKind::Identify => Self::Identify,
            MapToolKind::AddPoint => Self::AddPoint { added: 0 },
            MapToolKind::AddLine => Self::AddLine { vertices: vec![] },
            MapToolKind::AddPolygon => Self::AddPolygon { vertices: vec![] },
        }
    }

    /// Sets the zoom step of the zoom tools. Other tools are not affected.
    pub fn with_zoom_factor(mut self, zoom_factor: f64) -> Self {
        if let Self::ZoomIn { factor } | Self::ZoomOut { factor } = &mut self {
            *factor = zoom_factor;
        }
        self
    }

    /// Kind of the tool.
    pub fn kind(&self) -> MapToolKind {
        match self {
            Self::Pan { .. } => MapToolKind::Pan,
            Self::ZoomIn { .. } => MapToolKind::ZoomIn,
            Self::ZoomOut { .. } => MapToolKind::ZoomOut,
            Self::Identify => MapToolKind::Identify,
            Self::AddPoint { .. } => MapToolKind::AddPoint,
            Self::AddLine { .. } => MapToolKind::AddLine,
            Self::AddPolygon { .. } => MapToolKind::AddPolygon,
        }
    }

    /// Cursor to show while the tool is active.
    pub fn cursor(&self) -> CursorHint {
        match self {
            Self::Pan { .. } => CursorHint::Move,
            Self::ZoomIn { .. } => CursorHint::ZoomIn,
            Self::ZoomOut { .. } => CursorHint::ZoomOut,
            _ => CursorHint::Crosshair,
        }
    }

    /// Vertices of the geometry being digitized.
    pub fn vertices(&self) -> &[Point2d] {
        match self {
            Self::AddLine { vertices } | Self::AddPolygon { vertices } => vertices,
            _ => &[],
        }
    }

    /// True if the sketch of the tool should be drawn as a closed ring.
    pub fn is_closed_sketch(&self) -> bool {
        matches!(self, Self::AddPolygon { .. })
    }

    /// Called when the tool becomes active.
    pub fn activate(&mut self) {
        log::debug!("Map tool {:?} activated", self.kind());
        self.reset();
    }

    /// Called when another tool replaces this one.
    pub fn deactivate(&mut self) {
        log::debug!("Map tool {:?} deactivated", self.kind());
        self.reset();
    }

    fn reset(&mut self) {
        match self {
            Self::Pan { anchor } => *anchor = None,
            Self::AddLine { vertices } | Self::AddPolygon { vertices } => vertices.clear(),
            _ => {}
        }
    }

    /// Interprets the input event.
    pub fn handle_event(
        &mut self,
        event: &MapInputEvent,
        viewport: &mut impl ViewportControl,
    ) -> ToolOutcome {
        match self {
            Self::Pan { anchor } => handle_pan(anchor, event, viewport),
            Self::ZoomIn { factor } => {
                let factor = 1.0 / *factor;
                handle_zoom(factor, event, viewport)
            }
            Self::ZoomOut { factor } => handle_zoom(*factor, event, viewport),
            Self::Identify => match primary_press(event, viewport) {
                Some(position) => ToolOutcome::Identified(position),
                None => ToolOutcome::Ignored,
            },
            Self::AddPoint { added } => match primary_press(event, viewport) {
                Some(position) => {
                    *added += 1;
                    let mut geometry = DrawnGeometry::new(GeometryType::Point, vec![position]);
                    geometry.properties.insert("id".into(), Value::from(*added));
                    ToolOutcome::GeometryAdded(geometry)
                }
                None => ToolOutcome::Ignored,
            },
            Self::AddLine { vertices } => handle_sketch(vertices, 2, false, event, viewport),
            Self::AddPolygon { vertices } => handle_sketch(vertices, 3, true, event, viewport),
        }
    }
}

fn primary_press(event: &MapInputEvent, viewport: &impl ViewportControl) -> Option<Point2d> {
    match event {
        MapInputEvent::ButtonPressed {
            button: MouseButton::Left,
            position,
        } => viewport.pixel_to_world(position.x, position.y),
        _ => None,
    }
}

fn handle_pan(
    anchor: &mut Option<Point2d>,
    event: &MapInputEvent,
    viewport: &mut impl ViewportControl,
) -> ToolOutcome {
    match event {
        MapInputEvent::ButtonPressed {
            button: MouseButton::Left,
            position,
        } => {
            *anchor = Some(*position);
            ToolOutcome::Consumed
        }
        MapInputEvent::PointerMoved { position } => match anchor {
            Some(last) => {
                let delta = *position - *last;
                *last = *position;
                if viewport.pan(delta.x, delta.y) {
                    ToolOutcome::ViewChanged
                } else {
                    ToolOutcome::Consumed
                }
            }
            None => ToolOutcome::Ignored,
        },
        MapInputEvent::ButtonReleased {
            button: MouseButton::Left,
            ..
        } if anchor.is_some() => {
            *anchor = None;
            ToolOutcome::Consumed
        }
        _ => ToolOutcome::Ignored,
    }
}

fn handle_zoom(
    factor: f64,
    event: &MapInputEvent,
    viewport: &mut impl ViewportControl,
) -> ToolOutcome {
    match primary_press(event, viewport) {
        Some(center) if viewport.zoom(factor, Some(center)) => ToolOutcome::ViewChanged,
        _ => ToolOutcome::Ignored,
    }
}

fn handle_sketch(
    vertices: &mut Vec<Point2d>,
    min_vertices: usize,
    polygon: bool,
    event: &MapInputEvent,
    viewport: &mut impl ViewportControl,
) -> ToolOutcome {
    let finish = match event {
        MapInputEvent::ButtonPressed {
            button: MouseButton::Left,
            position,
        } => {
            return match viewport.pixel_to_world(position.x, position.y) {
                Some(world) => {
                    vertices.push(world);
                    ToolOutcome::Consumed
                }
                None => ToolOutcome::Ignored,
            };
        }
        MapInputEvent::ButtonPressed {
            button: MouseButton::Right,
            ..
        }
        | MapInputEvent::KeyPressed(Key::Enter) => true,
        MapInputEvent::KeyPressed(Key::Escape) => {
            vertices.clear();
            return ToolOutcome::Consumed;
        }
        _ => false,
    };

    if !finish || vertices.len() < min_vertices {
        return ToolOutcome::Ignored;
    }

    let mut coordinates = std::mem::take(vertices);
    let kind = if polygon {
        if let (Some(&first), Some(&last)) = (coordinates.first(), coordinates.last()) {
            if first != last {
                coordinates.push(first);
            }
        }
        GeometryType::Polygon
    } else {
        GeometryType::LineString
    };

    ToolOutcome::GeometryAdded(DrawnGeometry::new(kind, coordinates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{MapView, ViewConfig};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use geoview_types::cartesian::{Rect, Size};

    fn view() -> MapView {
        MapView::new(Size::new(100, 100), ViewConfig::default())
            .with_extent(Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    fn press(button: MouseButton, x: f64, y: f64) -> MapInputEvent {
        MapInputEvent::ButtonPressed {
            button,
            position: Point2d::new(x, y),
        }
    }

    #[test]
    fn pan_drag_moves_view() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::Pan);

        let moved = MapInputEvent::PointerMoved {
            position: Point2d::new(30.0, 10.0),
        };
        assert_eq!(tool.handle_event(&moved, &mut view), ToolOutcome::Ignored);

        assert_eq!(
            tool.handle_event(&press(MouseButton::Left, 10.0, 10.0), &mut view),
            ToolOutcome::Consumed
        );
        assert_eq!(tool.handle_event(&moved, &mut view), ToolOutcome::ViewChanged);
        assert_eq!(view.extent().unwrap(), Rect::new(-20.0, 0.0, 80.0, 100.0));

        let released = MapInputEvent::ButtonReleased {
            button: MouseButton::Left,
            position: Point2d::new(30.0, 10.0),
        };
        assert_eq!(tool.handle_event(&released, &mut view), ToolOutcome::Consumed);
        assert_eq!(tool, MapTool::Pan { anchor: None });
    }

    #[test]
    fn zoom_tools_zoom_around_click() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::ZoomIn).with_zoom_factor(2.0);
        assert_eq!(
            tool.handle_event(&press(MouseButton::Left, 25.0, 75.0), &mut view),
            ToolOutcome::ViewChanged
        );
        assert_abs_diff_eq!(
            view.extent().unwrap(),
            Rect::new(0.0, 0.0, 50.0, 50.0),
            epsilon = 1e-9
        );

        let mut tool = MapTool::new(MapToolKind::ZoomOut);
        tool.handle_event(&press(MouseButton::Left, 50.0, 50.0), &mut view);
        assert_abs_diff_eq!(view.extent().unwrap().width(), 60.0, epsilon = 1e-9);

        assert_eq!(
            tool.handle_event(&press(MouseButton::Right, 50.0, 50.0), &mut view),
            ToolOutcome::Ignored
        );
    }

    #[test]
    fn identify_reports_world_position() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::Identify);
        let outcome = tool.handle_event(&press(MouseButton::Left, 10.0, 20.0), &mut view);
        assert_matches!(outcome, ToolOutcome::Identified(p) if p == Point2d::new(10.0, 80.0));
    }

    #[test]
    fn add_point_counts_points() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::AddPoint);

        tool.handle_event(&press(MouseButton::Left, 10.0, 10.0), &mut view);
        let outcome = tool.handle_event(&press(MouseButton::Left, 20.0, 20.0), &mut view);
        let ToolOutcome::GeometryAdded(geometry) = outcome else {
            panic!("expected a geometry, got {outcome:?}");
        };
        assert_eq!(geometry.kind, GeometryType::Point);
        assert_eq!(geometry.coordinates, vec![Point2d::new(20.0, 80.0)]);
        assert_eq!(geometry.properties.get("id"), Some(&Value::from(2)));
        assert_eq!(
            geometry.to_geom(),
            Some(Geom::Point(Point2d::new(20.0, 80.0)))
        );
    }

    #[test]
    fn line_needs_two_vertices() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::AddLine);
        tool.activate();

        tool.handle_event(&press(MouseButton::Left, 0.0, 0.0), &mut view);
        assert_eq!(
            tool.handle_event(&press(MouseButton::Right, 0.0, 0.0), &mut view),
            ToolOutcome::Ignored
        );
        assert_eq!(tool.vertices().len(), 1);

        tool.handle_event(&press(MouseButton::Left, 10.0, 0.0), &mut view);
        let outcome = tool.handle_event(&MapInputEvent::KeyPressed(Key::Enter), &mut view);
        assert_matches!(outcome, ToolOutcome::GeometryAdded(g) => {
            assert_eq!(g.kind, GeometryType::LineString);
            assert_eq!(g.coordinates, vec![Point2d::new(0.0, 100.0), Point2d::new(10.0, 100.0)]);
            assert_matches!(g.to_geom(), Some(Geom::Contour(_)));
        });
        assert!(tool.vertices().is_empty());
    }

    #[test]
    fn polygon_is_closed_on_finish() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::AddPolygon);

        for (x, y) in [(0.0, 0.0), (10.0, 0.0)] {
            tool.handle_event(&press(MouseButton::Left, x, y), &mut view);
        }
        assert_eq!(
            tool.handle_event(&press(MouseButton::Right, 0.0, 0.0), &mut view),
            ToolOutcome::Ignored
        );

        tool.handle_event(&press(MouseButton::Left, 10.0, 10.0), &mut view);
        let outcome = tool.handle_event(&press(MouseButton::Right, 0.0, 0.0), &mut view);
        assert_matches!(outcome, ToolOutcome::GeometryAdded(g) => {
            assert_eq!(g.kind, GeometryType::Polygon);
            assert_eq!(g.coordinates.len(), 4);
            assert_eq!(g.coordinates.first(), g.coordinates.last());
            assert_matches!(g.to_geom(), Some(Geom::Polygon(p)) if p.outer_contour.len() == 3);
        });
    }

    #[test]
    fn closed_ring_is_not_closed_again() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::AddPolygon);

        for (x, y) in [(0.0, 100.0), (10.0, 100.0), (10.0, 90.0), (0.0, 100.0)] {
            tool.handle_event(&press(MouseButton::Left, x, y), &mut view);
        }
        let outcome = tool.handle_event(&MapInputEvent::KeyPressed(Key::Enter), &mut view);
        assert_matches!(outcome, ToolOutcome::GeometryAdded(g) => {
            assert_eq!(g.coordinates.len(), 4);
            assert_eq!(g.coordinates.first(), g.coordinates.last());
        });
    }

    #[test]
    fn escape_and_activation_clear_sketch() {
        let mut view = view();
        let mut tool = MapTool::new(MapToolKind::AddPolygon);
        tool.handle_event(&press(MouseButton::Left, 0.0, 0.0), &mut view);
        assert_eq!(
            tool.handle_event(&MapInputEvent::KeyPressed(Key::Escape), &mut view),
            ToolOutcome::Consumed
        );
        assert!(tool.vertices().is_empty());

        tool.handle_event(&press(MouseButton::Left, 0.0, 0.0), &mut view);
        tool.deactivate();
        assert!(tool.vertices().is_empty());
    }

    #[test]
    fn cursor_hints() {
        assert_eq!(MapTool::new(MapToolKind::Pan).cursor(), CursorHint::Move);
        assert_eq!(MapTool::new(MapToolKind::ZoomIn).cursor(), CursorHint::ZoomIn);
        assert_eq!(MapTool::new(MapToolKind::ZoomOut).cursor(), CursorHint::ZoomOut);
        assert_eq!(MapTool::new(MapToolKind::AddLine).cursor(), CursorHint::Crosshair);
        assert_eq!(MapTool::default().kind(), MapToolKind::Pan);
    }

    #[test]
    fn tools_ignore_events_without_extent() {
        let mut view = MapView::default();
        let mut tool = MapTool::new(MapToolKind::AddLine);
        assert_eq!(
            tool.handle_event(&press(MouseButton::Left, 0.0, 0.0), &mut view),
            ToolOutcome::Ignored
        );
        assert!(tool.vertices().is_empty());
    }
}
