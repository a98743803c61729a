// src/focus/geometry.rs
//! Screen geometry used by directional focus search.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Point on the edge facing `dir`: the side focus leaves through.
    pub fn anchor(&self, dir: Direction) -> Point {
        let c = self.center();
        match dir {
            Direction::Left => Point::new(self.x, c.y),
            Direction::Right => Point::new(self.right(), c.y),
            Direction::Up => Point::new(c.x, self.y),
            Direction::Down => Point::new(c.x, self.bottom()),
        }
    }

    /// Edge facing back toward a source that moved in `dir`.
    pub fn near_edge(&self, dir: Direction) -> (Point, Point) {
        match dir {
            Direction::Left => (
                Point::new(self.right(), self.y),
                Point::new(self.right(), self.bottom()),
            ),
            Direction::Right => (Point::new(self.x, self.y), Point::new(self.x, self.bottom())),
            Direction::Up => (
                Point::new(self.x, self.bottom()),
                Point::new(self.right(), self.bottom()),
            ),
            Direction::Down => (Point::new(self.x, self.y), Point::new(self.right(), self.y)),
        }
    }

    /// Whether the two boxes overlap on the axis perpendicular to `dir`.
    pub fn aligned_with(&self, other: &Rect, dir: Direction) -> bool {
        if dir.is_vertical() {
            self.x < other.right() && other.x < self.right()
        } else {
            self.y < other.bottom() && other.y < self.bottom()
        }
    }

    /// Whether this box lies strictly on the `dir` side of `anchor`.
    pub fn beyond(&self, anchor: Point, dir: Direction) -> bool {
        let c = self.center();
        match dir {
            Direction::Left => c.x < anchor.x,
            Direction::Right => c.x > anchor.x,
            Direction::Up => c.y < anchor.y,
            Direction::Down => c.y > anchor.y,
        }
    }
}

pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    };
    let (qx, qy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - qx).powi(2) + (p.y - qy).powi(2)).sqrt()
}

/// Geometric nearest-neighbour pick among `candidates` for a move from
/// `source` toward `dir`.
///
/// Candidates overlapping the source on the perpendicular axis win over
/// closer diagonal ones.
pub fn pick_nearest<K: Copy>(
    source: &Rect,
    dir: Direction,
    candidates: impl IntoIterator<Item = (K, Rect)>,
) -> Option<K> {
    let anchor = source.anchor(dir);
    let mut nearest: Option<(K, f32)> = None;
    let mut aligned: Option<(K, f32)> = None;

    for (key, rect) in candidates {
        if !rect.beyond(anchor, dir) {
            continue;
        }
        let (a, b) = rect.near_edge(dir);
        let dist = point_segment_distance(anchor, a, b);

        if nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((key, dist));
        }
        if source.aligned_with(&rect, dir) && aligned.map_or(true, |(_, best)| dist < best) {
            aligned = Some((key, dist));
        }
    }

    aligned.or(nearest).map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(point_segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(point_segment_distance(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(point_segment_distance(Point::new(-3.0, 0.0), a, a), 3.0);
    }

    #[test]
    fn aligned_candidate_beats_closer_diagonal() {
        let source = Rect::new(100.0, 0.0, 50.0, 50.0);
        let below = Rect::new(100.0, 200.0, 50.0, 50.0);
        let below_left = Rect::new(30.0, 60.0, 50.0, 50.0);
        let below_right = Rect::new(170.0, 60.0, 50.0, 50.0);

        let picked = pick_nearest(
            &source,
            Direction::Down,
            [("left", below_left), ("below", below), ("right", below_right)],
        );
        assert_eq!(picked, Some("below"));
    }

    #[test]
    fn falls_back_to_nearest_when_nothing_aligned() {
        let source = Rect::new(100.0, 0.0, 50.0, 50.0);
        let far = Rect::new(300.0, 300.0, 50.0, 50.0);
        let close = Rect::new(30.0, 60.0, 50.0, 50.0);
        let picked = pick_nearest(&source, Direction::Down, [(1, far), (2, close)]);
        assert_eq!(picked, Some(2));
    }

    #[test]
    fn wrong_side_candidates_are_ignored() {
        let source = Rect::new(100.0, 100.0, 50.0, 50.0);
        let right = Rect::new(200.0, 100.0, 50.0, 50.0);
        assert_eq!(pick_nearest(&source, Direction::Left, [(1, right)]), None);
        assert_eq!(pick_nearest(&source, Direction::Right, [(1, right)]), Some(1));
    }
}
