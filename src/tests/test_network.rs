use crate::errors::ErrorKind;
use crate::grid::{CellType, Grid};
use crate::network::{ChannelNetwork, ChannelNode, Link, Outlet, BC_NORMAL_DEPTH};

fn channel_grid(nrows: usize, ncols: usize) -> Grid {
    let mut grid = Grid::new(nrows, ncols, 10.0);
    for row in 0..nrows {
        for col in 0..ncols {
            grid.mask[row][col] = CellType::Overland;
        }
    }
    grid
}

fn straight_link(cells: &[(usize, usize)]) -> Link {
    let mut link = Link::new();
    for (row, col) in cells {
        link.nodes.push(ChannelNode::new(*row, *col));
    }
    link
}

fn outlet_at(row: usize, col: usize) -> Outlet {
    Outlet {
        row,
        col,
        bc_opt: BC_NORMAL_DEPTH,
        hbc_function: None,
        bed_slope_ov: 0.0,
    }
}

#[test]
fn test_topology_single_link() {
    let mut grid = channel_grid(1, 4);
    let mut network = ChannelNetwork::new();
    let mut link = straight_link(&[(0, 0), (0, 1), (0, 2), (0, 3)]);
    link.outlet = Some(0);
    network.links.push(link);
    network.outlets.push(outlet_at(0, 3));

    network.derive_topology(&mut grid).unwrap();

    //in-link neighbours run east (3) and back west (7)
    assert_eq!(network.links[0].nodes[0].neighbour[3], Some((0, 1)));
    assert_eq!(network.links[0].nodes[1].neighbour[7], Some((0, 0)));
    assert_eq!(network.links[0].nodes[3].neighbour[7], Some((0, 2)));
    assert_eq!(network.links[0].n_down, 0);

    //link/node ids stamped into the grid
    assert_eq!(grid.link_id[0][2], 0);
    assert_eq!(grid.node_id[0][2], 2);
}

#[test]
fn test_topology_junction_is_mutual() {
    //link 0 runs east and joins link 1 running further east
    let mut grid = channel_grid(1, 5);
    let mut network = ChannelNetwork::new();
    network.links.push(straight_link(&[(0, 0), (0, 1)]));
    let mut downstream = straight_link(&[(0, 2), (0, 3), (0, 4)]);
    downstream.outlet = Some(0);
    network.links.push(downstream);
    network.outlets.push(outlet_at(0, 4));

    network.derive_topology(&mut grid).unwrap();

    assert_eq!(network.links[0].n_down, 1);
    assert_eq!(network.links[0].down_links[3], Some(1));
    assert_eq!(network.links[1].up_links[7], Some(0));
    //cross-junction node neighbours
    assert_eq!(network.links[0].nodes[1].neighbour[3], Some((1, 0)));
    assert_eq!(network.links[1].nodes[0].neighbour[7], Some((0, 1)));
}

#[test]
fn test_topology_diverging_branches() {
    //link 0 ends at (1,1); branches leave NE to link 1 and SE to link 2
    let mut grid = channel_grid(3, 4);
    let mut network = ChannelNetwork::new();
    network.links.push(straight_link(&[(1, 0), (1, 1)]));
    let mut branch_a = straight_link(&[(0, 2), (0, 3)]);
    branch_a.outlet = Some(0);
    network.links.push(branch_a);
    let mut branch_b = straight_link(&[(2, 2), (2, 3)]);
    branch_b.outlet = Some(1);
    network.links.push(branch_b);
    network.outlets.push(outlet_at(0, 3));
    network.outlets.push(outlet_at(2, 3));

    network.derive_topology(&mut grid).unwrap();

    assert_eq!(network.links[0].n_down, 2);
    assert_eq!(network.links[0].down_links[2], Some(1));
    assert_eq!(network.links[0].down_links[4], Some(2));
    assert_eq!(network.links[1].up_links[6], Some(0));
    assert_eq!(network.links[2].up_links[8], Some(0));
}

#[test]
fn test_topology_rejects_non_adjacent_nodes() {
    let mut grid = channel_grid(1, 4);
    let mut network = ChannelNetwork::new();
    let mut link = straight_link(&[(0, 0), (0, 2), (0, 3)]);
    link.outlet = Some(0);
    network.links.push(link);
    network.outlets.push(outlet_at(0, 3));

    let err = network.derive_topology(&mut grid).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TopologyInconsistency);
}

#[test]
fn test_topology_rejects_terminal_link_without_outlet() {
    let mut grid = channel_grid(1, 3);
    let mut network = ChannelNetwork::new();
    network.links.push(straight_link(&[(0, 0), (0, 1), (0, 2)]));

    let err = network.derive_topology(&mut grid).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TopologyInconsistency);
}

#[test]
fn test_validate_rejects_negative_geometry() {
    let mut network = ChannelNetwork::new();
    let mut link = straight_link(&[(0, 0)]);
    link.nodes[0].bottom_width = -1.0;
    link.nodes[0].length = 10.0;
    link.outlet = Some(0);
    network.links.push(link);

    let err = network.validate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConfigurationError);
}

#[test]
fn test_section_geometry() {
    let mut node = ChannelNode::new(0, 0);
    node.bottom_width = 2.0;
    node.bank_height = 1.0;
    node.side_slope = 1.0;
    node.length = 10.0;

    //top width at bank: bw + 2*z*hbank
    assert!((node.top_width() - 4.0).abs() < 1e-12);
    assert!((node.surface_area() - 40.0).abs() < 1e-12);
    assert!((node.bed_area() - 20.0).abs() < 1e-12);
    assert!((node.bank_volume() - 30.0).abs() < 1e-12);

    //below the bank the storage section is the trapezoid
    assert!((node.storage_cross_section(0.5) - 1.25).abs() < 1e-12);
    //above the bank a rectangular block of top width is added
    assert!((node.storage_cross_section(1.5) - (3.0 + 0.5 * 4.0)).abs() < 1e-12);

    //conveyance subtracts the dead storage from the flow depth
    let (area, wp) = node.conveyance_section(0.5, 0.1);
    assert!((area - (2.0 + 1.0 * 0.4) * 0.4).abs() < 1e-12);
    assert!((wp - (2.0 + 2.0 * 0.4 * 2.0_f64.sqrt())).abs() < 1e-12);
}
