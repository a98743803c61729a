// src/focus/adjacency.rs
//! Adjacency rules for list- and grid-shaped focus managers.
//!
//! Both the focus tree (for List/Grid manager nodes) and the browser views (for
//! their selection cursor) walk items with these helpers.

use super::geometry::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Item { enabled: bool },
    Header,
}

impl Cell {
    pub const fn selectable(self) -> bool {
        matches!(self, Self::Item { enabled: true })
    }
}

pub fn first_selectable(cells: &[Cell]) -> Option<usize> {
    cells.iter().position(|c| c.selectable())
}

/// Linear list: UP/DOWN walk to the previous/next enabled item.
pub fn list_step(cells: &[Cell], current: Option<usize>, dir: Direction) -> Option<usize> {
    let Some(cur) = current else {
        return if dir.is_vertical() {
            first_selectable(cells)
        } else {
            None
        };
    };
    match dir {
        Direction::Down => (cur + 1..cells.len()).find(|&i| cells[i].selectable()),
        Direction::Up => (0..cur).rev().find(|&i| cells[i].selectable()),
        Direction::Left | Direction::Right => None,
    }
}

/// Split `cells` into grid rows. A header always occupies a row of its own.
pub fn grid_rows(cells: &[Cell], columns: usize) -> Vec<Vec<usize>> {
    let columns = columns.max(1);
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut row: Vec<usize> = Vec::new();
    for (idx, cell) in cells.iter().enumerate() {
        match cell {
            Cell::Header => {
                if !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                }
                rows.push(vec![idx]);
            }
            Cell::Item { .. } => {
                row.push(idx);
                if row.len() == columns {
                    rows.push(std::mem::take(&mut row));
                }
            }
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Row/column navigation over a grid with header rows.
///
/// Vertical moves land on the same column of the next row holding an enabled
/// item; when that row has no enabled item in the column, the enabled item
/// closest to it (the row's boundary for short rows) is used.
pub fn grid_step(
    cells: &[Cell],
    columns: usize,
    current: Option<usize>,
    dir: Direction,
) -> Option<usize> {
    let Some(cur) = current else {
        return first_selectable(cells);
    };
    let rows = grid_rows(cells, columns);
    let (r, c) = rows.iter().enumerate().find_map(|(r, row)| {
        row.iter().position(|&i| i == cur).map(|c| (r, c))
    })?;

    match dir {
        Direction::Left => rows[r][..c]
            .iter()
            .rev()
            .copied()
            .find(|&i| cells[i].selectable()),
        Direction::Right => rows[r][c + 1..]
            .iter()
            .copied()
            .find(|&i| cells[i].selectable()),
        Direction::Up | Direction::Down => {
            let candidates: Box<dyn Iterator<Item = usize>> = if dir == Direction::Down {
                Box::new(r + 1..rows.len())
            } else {
                Box::new((0..r).rev())
            };
            for rr in candidates {
                let row = &rows[rr];
                if row.iter().all(|&i| !cells[i].selectable()) {
                    continue;
                }
                if let Some(&exact) = row.get(c) {
                    if cells[exact].selectable() {
                        return Some(exact);
                    }
                }
                return row
                    .iter()
                    .enumerate()
                    .filter(|&(_, &i)| cells[i].selectable())
                    .min_by_key(|(col, _)| col.abs_diff(c))
                    .map(|(_, &i)| i);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ON: Cell = Cell::Item { enabled: true };
    const OFF: Cell = Cell::Item { enabled: false };
    const HDR: Cell = Cell::Header;

    #[test]
    fn list_skips_disabled_and_headers() {
        let cells = [ON, HDR, OFF, ON, ON];
        assert_eq!(list_step(&cells, Some(0), Direction::Down), Some(3));
        assert_eq!(list_step(&cells, Some(3), Direction::Up), Some(0));
        assert_eq!(list_step(&cells, Some(4), Direction::Down), None);
        assert_eq!(list_step(&cells, Some(3), Direction::Left), None);
        assert_eq!(list_step(&cells, None, Direction::Down), Some(0));
    }

    #[test]
    fn grid_rows_break_on_headers() {
        let cells = [HDR, ON, ON, ON, ON, HDR, ON];
        assert_eq!(
            grid_rows(&cells, 3),
            vec![vec![0], vec![1, 2, 3], vec![4], vec![5], vec![6]]
        );
    }

    #[test]
    fn grid_moves_keep_column() {
        let cells = [ON, ON, ON, ON, ON, ON];
        assert_eq!(grid_step(&cells, 3, Some(1), Direction::Down), Some(4));
        assert_eq!(grid_step(&cells, 3, Some(4), Direction::Up), Some(1));
        assert_eq!(grid_step(&cells, 3, Some(4), Direction::Right), Some(5));
        assert_eq!(grid_step(&cells, 3, Some(3), Direction::Left), None);
        assert_eq!(grid_step(&cells, 3, Some(5), Direction::Down), None);
    }

    #[test]
    fn grid_skips_header_rows_and_falls_back_to_row_boundary() {
        // row0: 0 1 2 | row1: header | row2: 4
        let cells = [ON, ON, ON, HDR, ON];
        assert_eq!(grid_step(&cells, 3, Some(2), Direction::Down), Some(4));
        assert_eq!(grid_step(&cells, 3, Some(4), Direction::Up), Some(0));
    }

    #[test]
    fn grid_skips_rows_without_enabled_items() {
        let cells = [ON, ON, OFF, OFF, ON, ON];
        assert_eq!(grid_step(&cells, 2, Some(1), Direction::Down), Some(5));
    }
}
