use serde::{Deserialize, Serialize};

/// A continuous position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance to `other` in the horizontal (XZ) plane only. Vertical
    /// separation is ignored everywhere the bridge measures progress.
    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.z - self.z)
    }
}

/// A block-aligned target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Center of the block in the horizontal plane; `y` stays on the block.
    pub fn center(&self) -> Position {
        Position::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }

    /// Stable fingerprint used to pair a target with its tracking state.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.x, self.y, self.z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance_ignores_y() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 100.0, 4.0);
        assert!((a.horizontal_distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_block_center() {
        let p = BlockPos::new(10, 64, -3).center();
        assert_eq!(p.x, 10.5);
        assert_eq!(p.y, 64.0);
        assert_eq!(p.z, -2.5);
    }

    #[test]
    fn test_key_and_display() {
        let b = BlockPos::new(1, -2, 3);
        assert_eq!(b.key(), "1:-2:3");
        assert_eq!(b.to_string(), "1, -2, 3");
    }
}
