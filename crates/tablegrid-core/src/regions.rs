//! Reading cells back out of the grid graph.

use crate::cell::Cell;
use crate::geometry::BBox;
use crate::graph::{EdgeId, NodeId, Side, Table};

impl Table {
    fn is_enabled(&self, edge: Option<EdgeId>) -> bool {
        edge.and_then(|e| self.edge(e).ok())
            .is_some_and(|e| !e.is_disabled())
    }

    /// Pixel box of the cell whose top-left corner is `node`.
    ///
    /// A node is a top-left corner when its right and bottom edges are both
    /// enabled. The cell extends right to the first node with an enabled
    /// bottom edge and down to the first node with an enabled right edge, so
    /// merged regions come back as one box.
    pub fn cell_at(&self, node: NodeId) -> Option<BBox> {
        let corner = self.node(node).ok()?;
        if !self.is_enabled(corner.right_edge()) || !self.is_enabled(corner.bottom_edge()) {
            return None;
        }

        let mut right = self.neighbor(node, Side::Right)?;
        while !self.is_enabled(self.node(right).ok()?.bottom_edge()) {
            right = self.neighbor(right, Side::Right)?;
        }
        let mut down = self.neighbor(node, Side::Bottom)?;
        while !self.is_enabled(self.node(down).ok()?.right_edge()) {
            down = self.neighbor(down, Side::Bottom)?;
        }

        Some(BBox::new(
            corner.x(),
            corner.y(),
            self.position(right).ok()?.x,
            self.position(down).ok()?.y,
        ))
    }

    /// Every cell of the table in row-major order.
    ///
    /// Row and column indices refer to the sorted distinct node coordinates,
    /// and ids are assigned sequentially in output order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut xs: Vec<i32> = self.nodes().map(|(_, n)| n.x()).collect();
        xs.sort_unstable();
        xs.dedup();
        let mut ys: Vec<i32> = self.nodes().map(|(_, n)| n.y()).collect();
        ys.sort_unstable();
        ys.dedup();

        let mut regions: Vec<BBox> = self.nodes().filter_map(|(id, _)| self.cell_at(id)).collect();
        regions.sort_by_key(|b| (b.top, b.x0));

        regions
            .into_iter()
            .filter_map(|b| {
                let row = ys.binary_search(&b.top).ok()?;
                let last_row = ys.binary_search(&b.bottom).ok()?;
                let column = xs.binary_search(&b.x0).ok()?;
                let last_column = xs.binary_search(&b.x1).ok()?;
                Some((b, row, last_row - row, column, last_column - column))
            })
            .enumerate()
            .map(|(i, (b, row, rows, column, columns))| Cell {
                id: i as i64,
                row,
                column,
                rows,
                columns,
                x: b.x0,
                y: b.top,
                width: b.width(),
                height: b.height(),
                is_new_cell: false,
                is_submerged: false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::{BBox, Point};
    use crate::graph::{GridSettings, Table};

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_cells_of_uniform_grid() {
        let table = Table::grid(GridSettings::default(), 0, 0, 2, 3, 10).unwrap();
        let cells = table.cells();
        assert_eq!(cells.len(), 6);
        assert_eq!((cells[4].row, cells[4].column), (1, 1));
        assert_eq!(cells[4].bbox(), BBox::new(10, 10, 20, 20));
        assert!(cells.iter().all(|c| c.rows == 1 && c.columns == 1));
        let ids: Vec<i64> = cells.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_cell_at_merged_region() {
        let mut table = Table::grid(GridSettings::default(), 0, 0, 2, 2, 10).unwrap();
        let v = table.find_edge(p(10, 0), p(10, 10)).unwrap();
        table.disable(v, true).unwrap();
        let tl = table.find_node(p(0, 0)).unwrap();
        assert_eq!(table.cell_at(tl), Some(BBox::new(0, 0, 20, 10)));
        let top_mid = table.find_node(p(10, 0)).unwrap();
        assert_eq!(table.cell_at(top_mid), None);

        let cells = table.cells();
        assert_eq!(cells.len(), 3);
        assert_eq!((cells[0].rows, cells[0].columns), (1, 2));
    }

    #[test]
    fn test_cell_at_requires_enabled_corner() {
        let table = Table::grid(GridSettings::default(), 0, 0, 1, 1, 10).unwrap();
        let br = table.find_node(p(10, 10)).unwrap();
        assert_eq!(table.cell_at(br), None);
    }
}
