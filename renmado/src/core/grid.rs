use renmado_ipc::CellSize;

use super::{Monitor, Point, Rect};
use crate::error::Error;

/// Smallest extent a computed window dimension is clamped to.
const MIN_EXTENT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRequest {
    pub main_pid: i32,
    pub child_pids: Vec<i32>,
    pub columns: u32,
    pub cell_size: CellSize,
    pub spacing: u32,
    pub monitor_index: i32,
}

impl LayoutRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.columns == 0 {
            return Err(Error::InvalidArgument("columns must be at least 1".into()));
        }
        let limit = i64::from(i32::MAX);
        for (name, value) in [
            ("columns", self.columns),
            ("spacing", self.spacing),
            ("width", self.cell_size.width),
            ("height", self.cell_size.height),
        ] {
            if i64::from(value) > limit {
                return Err(Error::InvalidArgument(format!("{} {} is too large", name, value)));
            }
        }
        let spacing = i64::from(self.spacing);
        let gutters = [
            i64::from(self.columns) + 1,
            i64::from(self.rows()) + 1,
        ];
        if gutters.iter().any(|&count| spacing * count > limit) {
            return Err(Error::InvalidArgument(format!(
                "spacing {} does not fit a {}x{} grid",
                self.spacing,
                self.columns,
                self.rows()
            )));
        }
        Ok(())
    }

    pub fn total_cells(&self) -> u32 {
        self.child_pids.len() as u32 + 1
    }

    pub fn rows(&self) -> u32 {
        self.total_cells().div_ceil(self.columns.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Main,
    Child(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub slot: Slot,
    pub pid: i32,
    pub row: u32,
    pub col: u32,
    /// Top-left of the grid cell, gutters already applied.
    pub origin: Point,
    /// Rectangle the owning window is placed at.
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    pub cell_width: i32,
    pub cell_height: i32,
    pub spacing: i32,
    pub cells: Vec<Cell>,
}

impl GridLayout {
    pub fn cell_for(&self, slot: Slot) -> Option<&Cell> {
        self.cells.iter().find(|c| c.slot == slot)
    }

    /// Where an extension window of size `popup` is pinned inside `cell`:
    /// against the cell's right edge (minus one gutter), top-aligned.
    pub fn pin_satellite(&self, cell: &Cell, popup: &Rect) -> Point {
        let x = i64::from(cell.origin.x) + i64::from(self.cell_width)
            - i64::from(popup.width)
            - i64::from(self.spacing);
        Point::new(
            x.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            cell.origin.y,
        )
    }
}

/// Compute one cell per window, main first then children in request order.
pub fn compute_layout(request: &LayoutRequest, monitor: &Monitor) -> Result<GridLayout, Error> {
    request.validate()?;

    let columns = i64::from(request.columns);
    let rows = i64::from(request.rows());
    let spacing = i64::from(request.spacing);
    let frame = monitor.frame;

    let cell_width = if request.cell_size.width > 0 {
        i64::from(request.cell_size.width)
    } else {
        (i64::from(frame.width) - spacing * (columns + 1)) / columns
    };
    let cell_height = if request.cell_size.height > 0 {
        i64::from(request.cell_size.height)
    } else {
        (i64::from(frame.height) - spacing * (rows + 1)) / rows
    };

    let pids = std::iter::once(request.main_pid).chain(request.child_pids.iter().copied());
    let cells = pids
        .enumerate()
        .map(|(i, pid)| {
            let i = i as i64;
            let row = i / columns;
            let col = i % columns;
            let origin = Point::new(
                coordinate(i64::from(frame.x) + col * cell_width + spacing * (col + 1))?,
                coordinate(i64::from(frame.y) + row * cell_height + spacing * (row + 1))?,
            );
            let (slot, inset) = if i == 0 {
                (Slot::Main, spacing * 2)
            } else {
                (Slot::Child(i as usize - 1), spacing)
            };
            Ok(Cell {
                slot,
                pid,
                row: row as u32,
                col: col as u32,
                origin,
                rect: Rect::new(
                    origin.x,
                    origin.y,
                    extent(cell_width - inset),
                    extent(cell_height - inset),
                ),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(GridLayout {
        rows: rows as u32,
        columns: request.columns,
        cell_width: coordinate(cell_width)?,
        cell_height: coordinate(cell_height)?,
        spacing: coordinate(spacing)?,
        cells,
    })
}

fn coordinate(value: i64) -> Result<i32, Error> {
    i32::try_from(value)
        .map_err(|_| Error::InvalidArgument(format!("layout coordinate {} out of range", value)))
}

fn extent(value: i64) -> u32 {
    value.clamp(MIN_EXTENT, i64::from(i32::MAX)) as u32
}
