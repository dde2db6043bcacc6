use crate::grid::{CellType, Grid};

fn open_grid(nrows: usize, ncols: usize) -> Grid {
    let mut grid = Grid::new(nrows, ncols, 10.0);
    for row in 0..nrows {
        for col in 0..ncols {
            grid.mask[row][col] = CellType::Overland;
        }
    }
    grid
}

#[test]
fn test_neighbour_directions() {
    let grid = open_grid(3, 3);
    //from the centre cell: 1=N, 3=E, 5=S, 7=W
    assert_eq!(grid.neighbour(1, 1, 1), Some((0, 1)));
    assert_eq!(grid.neighbour(1, 1, 3), Some((1, 2)));
    assert_eq!(grid.neighbour(1, 1, 5), Some((2, 1)));
    assert_eq!(grid.neighbour(1, 1, 7), Some((1, 0)));
    //diagonals: 2=NE, 4=SE, 6=SW, 8=NW
    assert_eq!(grid.neighbour(1, 1, 2), Some((0, 2)));
    assert_eq!(grid.neighbour(1, 1, 4), Some((2, 2)));
    assert_eq!(grid.neighbour(1, 1, 6), Some((2, 0)));
    assert_eq!(grid.neighbour(1, 1, 8), Some((0, 0)));
}

#[test]
fn test_neighbour_off_raster() {
    let grid = open_grid(2, 2);
    assert_eq!(grid.neighbour(0, 0, 1), None);
    assert_eq!(grid.neighbour(0, 0, 7), None);
    assert_eq!(grid.neighbour(1, 1, 5), None);
}

#[test]
fn test_neighbour_outside_domain() {
    let mut grid = open_grid(1, 3);
    grid.mask[0][1] = CellType::Outside;
    assert_eq!(grid.neighbour(0, 0, 3), None);
    assert_eq!(grid.neighbour(0, 2, 7), None);
}

#[test]
fn test_opposite_directions_are_mutual() {
    for dir in 1..=8usize {
        assert_eq!(Grid::opposite(Grid::opposite(dir)), dir);
    }
    assert_eq!(Grid::opposite(1), 5);
    assert_eq!(Grid::opposite(3), 7);
    assert_eq!(Grid::opposite(2), 6);
}

#[test]
fn test_direction_between_adjacent_cells() {
    assert_eq!(Grid::direction_between(1, 1, 0, 1), Some(1));
    assert_eq!(Grid::direction_between(1, 1, 1, 2), Some(3));
    assert_eq!(Grid::direction_between(1, 1, 2, 0), Some(6));
    //not adjacent
    assert_eq!(Grid::direction_between(0, 0, 0, 2), None);
    assert_eq!(Grid::direction_between(0, 0, 0, 0), None);
}

#[test]
fn test_validate_rejects_bad_manning() {
    let mut grid = open_grid(1, 1);
    grid.n_manning[0][0] = 0.0;
    assert!(grid.validate().is_err());
}
