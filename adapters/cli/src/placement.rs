use std::{fmt, str::FromStr};

use quiz_defence_core::{CellCoord, TowerKind};
use thiserror::Error;

/// Delimiter between the tower kind and its cell.
const KIND_DELIMITER: char = '@';
/// Delimiter between the column and the row.
const AXIS_DELIMITER: char = ',';

/// Tower requested on the command line as `kind@column,row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerPlacement {
    /// Kind of tower to build.
    pub(crate) kind: TowerKind,
    /// Cell the tower occupies.
    pub(crate) cell: CellCoord,
}

/// Errors that can occur while parsing a tower placement.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PlacementParseError {
    /// The `@` separating kind and cell is missing.
    #[error("expected `kind@column,row`")]
    MissingCell,
    /// The kind is not a known tower.
    #[error("unknown tower kind `{0}`")]
    UnknownKind(String),
    /// The cell is not two comma separated integers.
    #[error("invalid cell `{0}`, expected `column,row`")]
    InvalidCell(String),
}

impl FromStr for TowerPlacement {
    type Err = PlacementParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, cell) = value
            .trim()
            .split_once(KIND_DELIMITER)
            .ok_or(PlacementParseError::MissingCell)?;
        let kind = TowerKind::from_name(kind)
            .ok_or_else(|| PlacementParseError::UnknownKind(kind.to_owned()))?;
        let cell = parse_cell(cell)?;
        Ok(Self { kind, cell })
    }
}

impl fmt::Display for TowerPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}{AXIS_DELIMITER}{}",
            self.kind,
            self.cell.column(),
            self.cell.row()
        )
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, PlacementParseError> {
    let invalid = || PlacementParseError::InvalidCell(value.to_owned());
    let (column, row) = value.split_once(AXIS_DELIMITER).ok_or_else(invalid)?;
    let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}
