// wayfinder_core/src/callouts/directions.rs

//! Relative direction sectors around a reference heading.

use crate::rulers::normalize_heading;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Behind,
    BehindLeft,
    Left,
    AheadLeft,
    Ahead,
    AheadRight,
    Right,
    BehindRight,
}

impl Direction {
    pub fn is_left(self) -> bool {
        matches!(self, Self::BehindLeft | Self::Left | Self::AheadLeft)
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::BehindRight | Self::Right | Self::AheadRight)
    }

    /// Offset from the reference heading that a sound in this direction is rendered at.
    pub fn presentation_offset(self) -> f64 {
        if self.is_left() {
            -90.0
        } else if self.is_right() {
            90.0
        } else {
            0.0
        }
    }
}

/// An arc of headings, clockwise from `left` up to but excluding `right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub left: f64,
    pub right: f64,
}

impl Segment {
    /// The arc `width` degrees wide centred on `heading`.
    pub fn new(heading: f64, width: f64) -> Self {
        Self {
            left: normalize_heading(heading - width / 2.0),
            right: normalize_heading(heading + width / 2.0),
        }
    }

    pub fn contains(&self, heading: f64) -> bool {
        let heading = normalize_heading(heading);
        if self.left <= self.right {
            heading >= self.left && heading < self.right
        } else {
            // The arc wraps through north.
            heading >= self.left || heading < self.right
        }
    }
}

/// Ways of dividing the circle into named directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDirections {
    /// Eight sectors: 60° for the cardinal directions, 30° for the diagonals.
    #[default]
    Combined,
    /// Four 90° quadrants.
    Individual,
    /// 150° ahead and behind, 30° to either side.
    AheadBehind,
    /// 60° ahead and behind, 120° to either side.
    LeftRight,
}

impl RelativeDirections {
    /// The sectors of this scheme around `heading`. Together they cover the circle
    /// exactly once.
    pub fn segments(self, heading: f64) -> Vec<(Direction, Segment)> {
        use Direction::*;
        let sector = |direction, offset: f64, width| (direction, Segment::new(heading + offset, width));
        match self {
            Self::Combined => vec![
                sector(Behind, 180.0, 60.0),
                sector(BehindLeft, 225.0, 30.0),
                sector(Left, 270.0, 60.0),
                sector(AheadLeft, 315.0, 30.0),
                sector(Ahead, 0.0, 60.0),
                sector(AheadRight, 45.0, 30.0),
                sector(Right, 90.0, 60.0),
                sector(BehindRight, 135.0, 30.0),
            ],
            Self::Individual => vec![
                sector(Behind, 180.0, 90.0),
                sector(Left, 270.0, 90.0),
                sector(Ahead, 0.0, 90.0),
                sector(Right, 90.0, 90.0),
            ],
            Self::AheadBehind => vec![
                sector(Behind, 180.0, 150.0),
                sector(Left, 270.0, 30.0),
                sector(Ahead, 0.0, 150.0),
                sector(Right, 90.0, 30.0),
            ],
            Self::LeftRight => vec![
                sector(Behind, 180.0, 60.0),
                sector(Left, 270.0, 120.0),
                sector(Ahead, 0.0, 60.0),
                sector(Right, 90.0, 120.0),
            ],
        }
    }

    /// Where `target` lies when facing `reference`.
    pub fn direction_of(self, reference: f64, target: f64) -> Option<Direction> {
        self.segments(reference)
            .into_iter()
            .find(|(_, segment)| segment.contains(target))
            .map(|(direction, _)| direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_wraps_through_north() {
        let segment = Segment::new(0.0, 60.0);
        assert_eq!(segment.left, 330.0);
        assert_eq!(segment.right, 30.0);
        assert!(segment.contains(350.0));
        assert!(segment.contains(0.0));
        assert!(segment.contains(29.9));
        assert!(!segment.contains(30.0));
        assert!(!segment.contains(180.0));
    }

    #[test]
    fn test_combined_sectors() {
        let scheme = RelativeDirections::Combined;
        assert_eq!(scheme.direction_of(0.0, 10.0), Some(Direction::Ahead));
        assert_eq!(scheme.direction_of(0.0, 45.0), Some(Direction::AheadRight));
        assert_eq!(scheme.direction_of(0.0, 90.0), Some(Direction::Right));
        assert_eq!(scheme.direction_of(0.0, 185.0), Some(Direction::Behind));
        assert_eq!(scheme.direction_of(90.0, 0.0), Some(Direction::Left));
        assert_eq!(scheme.direction_of(350.0, 15.0), Some(Direction::Ahead));
    }

    #[test]
    fn test_every_scheme_covers_the_circle() {
        for scheme in [
            RelativeDirections::Combined,
            RelativeDirections::Individual,
            RelativeDirections::AheadBehind,
            RelativeDirections::LeftRight,
        ] {
            for heading in (0..360).map(|h| h as f64 + 0.5) {
                let hits = scheme
                    .segments(37.0)
                    .iter()
                    .filter(|(_, segment)| segment.contains(heading))
                    .count();
                assert_eq!(hits, 1, "{scheme:?} at {heading}");
            }
        }
    }

    #[test]
    fn test_schemes_differ_at_the_diagonal() {
        assert_eq!(
            RelativeDirections::AheadBehind.direction_of(0.0, 60.0),
            Some(Direction::Ahead)
        );
        assert_eq!(
            RelativeDirections::LeftRight.direction_of(0.0, 60.0),
            Some(Direction::Right)
        );
        assert_eq!(
            RelativeDirections::Individual.direction_of(0.0, 300.0),
            Some(Direction::Left)
        );
    }
}
