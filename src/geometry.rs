use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Side length of one coarse grid cell in world units.
pub const DEFAULT_CELL_SIZE: f64 = 32.0;

/// A 2D world coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        self.squared_distance_to(other).sqrt()
    }

    pub fn squared_distance_to(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;

        dx * dx + dy * dy
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Grid cell containing this point.
    pub fn to_cell(&self, cell_size: f64) -> Cell {
        Cell::new((self.x / cell_size).floor() as i32, (self.y / cell_size).floor() as i32)
    }

    /// Point moved `distance` toward `target`, stopping at the target.
    pub fn towards(&self, target: Point, distance: f64) -> Point {
        let delta = target - *self;
        let length = delta.length();

        if length <= distance || length == 0.0 {
            target
        } else {
            *self + delta * (distance / length)
        }
    }

    /// Arithmetic mean of a set of points. Returns `None` for an empty set.
    pub fn mean<I: IntoIterator<Item = Point>>(points: I) -> Option<Point> {
        let (sum, count) = points
            .into_iter()
            .fold((Point::default(), 0usize), |(sum, count), p| (sum + p, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, other: Point) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, divisor: f64) -> Point {
        Point::new(self.x / divisor, self.y / divisor)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Coarse grid cell index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Cell {
        Cell { x, y }
    }

    /// World coordinate of the cell's centre.
    pub fn center(&self, cell_size: f64) -> Point {
        Point::new(
            self.x as f64 * cell_size + cell_size / 2.0,
            self.y as f64 * cell_size + cell_size / 2.0,
        )
    }
}

/// Axis-aligned rectangle, used for selection frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect { left, top, right, bottom }
    }

    /// Square of half-size `half_extent` centred on `center`.
    pub fn around(center: Point, half_extent: f64) -> Rect {
        Rect::new(
            center.x - half_extent,
            center.y - half_extent,
            center.x + half_extent,
            center.y + half_extent,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(a.squared_distance_to(b), 25.0);
    }

    #[test]
    fn cell_conversion_floors_and_centres() {
        let p = Point::new(65.0, 31.9);
        assert_eq!(p.to_cell(DEFAULT_CELL_SIZE), Cell::new(2, 0));
        assert_eq!(Cell::new(2, 0).center(DEFAULT_CELL_SIZE), Point::new(80.0, 16.0));

        let negative = Point::new(-1.0, -33.0);
        assert_eq!(negative.to_cell(DEFAULT_CELL_SIZE), Cell::new(-1, -2));
    }

    #[test]
    fn mean_of_empty_set_is_none() {
        assert_eq!(Point::mean(Vec::new()), None);
        assert_eq!(
            Point::mean(vec![Point::new(0.0, 0.0), Point::new(2.0, 4.0)]),
            Some(Point::new(1.0, 2.0))
        );
    }

    #[test]
    fn towards_stops_at_target() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(10.0, 0.0);
        assert_eq!(from.towards(to, 4.0), Point::new(4.0, 0.0));
        assert_eq!(from.towards(to, 40.0), to);
    }

    #[test]
    fn rect_around_contains_center() {
        let rect = Rect::around(Point::new(100.0, 100.0), 10.0);
        assert!(rect.contains(Point::new(100.0, 100.0)));
        assert!(rect.contains(Point::new(110.0, 90.0)));
        assert!(!rect.contains(Point::new(111.0, 100.0)));
        assert_eq!(rect.center(), Point::new(100.0, 100.0));
    }
}
