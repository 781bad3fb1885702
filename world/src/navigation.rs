//! Lane geometry and the buildable grid.

use std::collections::BTreeSet;

use glam::Vec2;
use quiz_defence_core::CellCoord;
use thiserror::Error;

/// Fraction of a cell between two samples when reserving lane cells.
const RESERVATION_STEP: f32 = 0.25;

/// Reasons a lane polyline is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LaneError {
    /// A lane needs a start and an end.
    #[error("a lane needs at least two waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },
    /// All waypoints coincide, so enemies would leak instantly.
    #[error("lane has zero length")]
    ZeroLength,
    /// A waypoint holds a NaN or infinite coordinate.
    #[error("lane waypoint {index} is not finite")]
    NonFinite {
        /// Index of the offending waypoint.
        index: usize,
    },
}

/// Reasons a map is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MapError {
    /// The grid has no cells.
    #[error("map grid must have at least one column and one row")]
    EmptyGrid,
    /// Cells must have a positive size.
    #[error("cell size must be positive")]
    NonPositiveCellSize,
    /// Enemies need somewhere to walk.
    #[error("map has no lanes")]
    NoLanes,
    /// One lane failed validation.
    #[error("lane {index} is invalid: {source}")]
    Lane {
        /// Index of the offending lane.
        index: usize,
        /// Validation failure of the lane.
        source: LaneError,
    },
}

/// Precomputed polyline that enemies walk along.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
    length: f32,
}

impl Lane {
    /// Builds a lane and precomputes the distance to every waypoint.
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, LaneError> {
        if waypoints.len() < 2 {
            return Err(LaneError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }
        if let Some(index) = waypoints.iter().position(|point| !point.is_finite()) {
            return Err(LaneError::NonFinite { index });
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut length = 0.0;
        cumulative.push(length);
        for pair in waypoints.windows(2) {
            length += pair[0].distance(pair[1]);
            cumulative.push(length);
        }

        if length <= 0.0 {
            return Err(LaneError::ZeroLength);
        }

        Ok(Self {
            waypoints,
            cumulative,
            length,
        })
    }

    /// Total length of the lane in world units.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Waypoints in walking order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Position reached after walking `distance` units from the start.
    ///
    /// Distances outside `0..=length` clamp to the lane ends.
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec2 {
        let distance = distance.clamp(0.0, self.length);
        let last_segment = self.waypoints.len() - 2;
        let segment = self
            .cumulative
            .partition_point(|&reached| reached <= distance)
            .saturating_sub(1)
            .min(last_segment);

        let start = self.waypoints[segment];
        let end = self.waypoints[segment + 1];
        let span = self.cumulative[segment + 1] - self.cumulative[segment];
        if span <= 0.0 {
            return start;
        }
        let t = (distance - self.cumulative[segment]) / span;
        start.lerp(end, t)
    }

    /// Fraction of the lane covered after walking `distance` units.
    #[must_use]
    pub fn progress(&self, distance: f32) -> f32 {
        (distance / self.length).clamp(0.0, 1.0)
    }
}

/// Buildable grid plus the lanes crossing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    columns: u32,
    rows: u32,
    cell_size: f32,
    lanes: Vec<Lane>,
    reserved: BTreeSet<CellCoord>,
}

impl Map {
    /// Creates a map and reserves every cell a lane passes through.
    pub fn new(columns: u32, rows: u32, cell_size: f32, lanes: Vec<Lane>) -> Result<Self, MapError> {
        if columns == 0 || rows == 0 {
            return Err(MapError::EmptyGrid);
        }
        if cell_size <= 0.0 || !cell_size.is_finite() {
            return Err(MapError::NonPositiveCellSize);
        }
        if lanes.is_empty() {
            return Err(MapError::NoLanes);
        }

        let mut map = Self {
            columns,
            rows,
            cell_size,
            lanes,
            reserved: BTreeSet::new(),
        };
        map.reserve_lane_cells();
        Ok(map)
    }

    /// Builds a map from raw waypoint lists, validating every lane.
    pub fn from_waypoints(
        columns: u32,
        rows: u32,
        cell_size: f32,
        lanes: Vec<Vec<Vec2>>,
    ) -> Result<Self, MapError> {
        let lanes = lanes
            .into_iter()
            .enumerate()
            .map(|(index, waypoints)| {
                Lane::new(waypoints).map_err(|source| MapError::Lane { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns, rows, cell_size, lanes)
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// All lanes in index order.
    #[must_use]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Lane with the provided index.
    #[must_use]
    pub fn lane(&self, index: u32) -> Option<&Lane> {
        self.lanes.get(usize::try_from(index).ok()?)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether a lane crosses the cell.
    #[must_use]
    pub fn is_reserved(&self, cell: CellCoord) -> bool {
        self.reserved.contains(&cell)
    }

    /// Cells crossed by lanes, in sorted order.
    pub fn reserved_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.reserved.iter().copied()
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        cell.center(self.cell_size)
    }

    fn reserve_lane_cells(&mut self) {
        let step = self.cell_size * RESERVATION_STEP;
        let mut reserved = BTreeSet::new();
        for lane in &self.lanes {
            for pair in lane.waypoints().windows(2) {
                let span = pair[0].distance(pair[1]);
                let samples = (span / step).ceil().max(1.0) as u32;
                for sample in 0..=samples {
                    let point = pair[0].lerp(pair[1], sample as f32 / samples as f32);
                    if let Some(cell) = self.cell_at(point) {
                        let _ = reserved.insert(cell);
                    }
                }
            }
        }
        self.reserved = reserved;
    }

    fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let cell = CellCoord::new(
            (point.x / self.cell_size).floor() as u32,
            (point.y / self.cell_size).floor() as u32,
        );
        self.contains(cell).then_some(cell)
    }
}
