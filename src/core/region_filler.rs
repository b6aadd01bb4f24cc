//! Merged-region propagation
//!
//! A merged rectangle only stores its value in the top-left (anchor) cell.
//! Filling copies that value into every cell the rectangle covers so later
//! stages can read any header cell without knowing about merges.

use crate::types::{Grid, MergedRegion};
use tracing::{debug, warn};

/// Clip regions to a `rows` × `cols` extent.
///
/// Inverted regions and regions whose anchor lies outside the extent are
/// discarded; regions that only trail past the extent are clipped to it.
pub fn clip_regions(regions: &[MergedRegion], rows: usize, cols: usize) -> Vec<MergedRegion> {
    let mut kept = Vec::with_capacity(regions.len());
    for region in regions {
        if region.is_inverted() {
            warn!(?region, "discarding merged region with inverted bounds");
            continue;
        }
        if region.row_min >= rows || region.col_min >= cols {
            debug!(?region, rows, cols, "discarding merged region outside data extent");
            continue;
        }
        let clipped = MergedRegion {
            col_max: region.col_max.min(cols - 1),
            row_max: region.row_max.min(rows - 1),
            ..*region
        };
        if clipped != *region {
            debug!(?region, ?clipped, "clipped merged region to data extent");
        }
        kept.push(clipped);
    }
    kept
}

/// Copy each region's anchor value across the whole rectangle.
///
/// Regions are clipped to the grid first, so this never writes outside it.
/// Returns the number of regions applied.
pub fn fill_regions(grid: &mut Grid, regions: &[MergedRegion]) -> usize {
    let regions = clip_regions(regions, grid.row_count(), grid.col_count());
    for region in &regions {
        let (anchor_row, anchor_col) = region.anchor();
        let value = grid
            .get(anchor_row, anchor_col)
            .cloned()
            .unwrap_or_default();
        for row in region.row_min..=region.row_max {
            for col in region.col_min..=region.col_max {
                grid.set(row, col, value.clone());
            }
        }
    }
    regions.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;

    fn header_grid() -> Grid {
        Grid::from_rows(vec![
            vec!["Fund".into(), CellValue::Empty, "Member".into(), CellValue::Empty],
            vec!["Name".into(), "ABN".into(), "Name".into(), "Count".into()],
            vec![CellValue::Empty; 4],
        ])
    }

    #[test]
    fn test_fill_horizontal_merge() {
        let mut grid = header_grid();
        let applied = fill_regions(
            &mut grid,
            &[MergedRegion::new(0, 0, 1, 0), MergedRegion::new(2, 0, 3, 0)],
        );
        assert_eq!(applied, 2);
        assert_eq!(grid.get(0, 1), Some(&CellValue::from("Fund")));
        assert_eq!(grid.get(0, 3), Some(&CellValue::from("Member")));
        assert_eq!(grid.get(1, 1), Some(&CellValue::from("ABN")));
    }

    #[test]
    fn test_fill_vertical_merge() {
        let mut grid = Grid::from_rows(vec![
            vec!["Year".into(), "Assets".into()],
            vec![CellValue::Empty, "Total".into()],
            vec![CellValue::Number(2020.0), CellValue::Number(5.0)],
        ]);
        fill_regions(&mut grid, &[MergedRegion::new(0, 0, 0, 1)]);
        assert_eq!(grid.get(1, 0), Some(&CellValue::from("Year")));
        assert_eq!(grid.get(2, 0), Some(&CellValue::Number(2020.0)));
    }

    #[test]
    fn test_fill_is_idempotent() {
        let regions = [MergedRegion::new(0, 0, 1, 0), MergedRegion::new(2, 0, 3, 0)];
        let mut once = header_grid();
        fill_regions(&mut once, &regions);
        let mut twice = once.clone();
        fill_regions(&mut twice, &regions);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clip_regions() {
        let regions = [
            MergedRegion::new(2, 0, 9, 0),  // trails past the last column
            MergedRegion::new(5, 0, 6, 0),  // starts past the last column
            MergedRegion::new(1, 2, 0, 2),  // inverted
            MergedRegion::new(0, 1, 0, 10), // trails past the last row
        ];
        let clipped = clip_regions(&regions, 3, 4);
        assert_eq!(
            clipped,
            vec![MergedRegion::new(2, 0, 3, 0), MergedRegion::new(0, 1, 0, 2)]
        );
    }

    #[test]
    fn test_fill_on_empty_grid_is_noop() {
        let mut grid = Grid::default();
        assert_eq!(fill_regions(&mut grid, &[MergedRegion::new(0, 0, 1, 1)]), 0);
    }
}
