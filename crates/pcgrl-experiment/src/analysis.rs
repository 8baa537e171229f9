//! Grid analysis shared by problems.
//!
//! All helpers work on a [`NameMap`] and treat cells as 4-connected.

use std::collections::{BTreeMap, VecDeque};

use ndarray::Array2;

use pcgrl_kernel::NameMap;

/// A cell position as `(x, y)`.
pub type Location = (usize, usize);

/// Group cell positions by tile name, one (possibly empty) entry per tile type.
pub fn tile_locations(map: &NameMap, tile_types: &[String]) -> BTreeMap<String, Vec<Location>> {
    let mut locations: BTreeMap<String, Vec<Location>> = tile_types
        .iter()
        .map(|t| (t.clone(), Vec::new()))
        .collect();
    for ((y, x), name) in map.indexed_iter() {
        if let Some(cells) = locations.get_mut(name) {
            cells.push((x, y));
        }
    }
    locations
}

/// Number of cells holding any of `tiles`.
pub fn count_tiles(locations: &BTreeMap<String, Vec<Location>>, tiles: &[&str]) -> usize {
    tiles
        .iter()
        .filter_map(|t| locations.get(*t))
        .map(Vec::len)
        .sum()
}

/// Number of connected regions made of `passable` tiles.
pub fn calc_num_regions(map: &NameMap, passable: &[&str]) -> usize {
    let mut visited = Array2::from_elem(map.dim(), false);
    let mut regions = 0;
    for ((y, x), name) in map.indexed_iter() {
        if visited[[y, x]] || !passable.contains(&name.as_str()) {
            continue;
        }
        regions += 1;
        for (cell, _) in bfs(map, (x, y), passable) {
            visited[[cell.1, cell.0]] = true;
        }
    }
    regions
}

/// Longest shortest path over all regions of `passable` tiles.
///
/// Per region: walk from any cell to the farthest one, then from there to
/// the farthest again. The second distance is the region's diameter estimate.
pub fn calc_longest_path(map: &NameMap, passable: &[&str]) -> usize {
    let mut visited = Array2::from_elem(map.dim(), false);
    let mut longest = 0;
    for ((y, x), name) in map.indexed_iter() {
        if visited[[y, x]] || !passable.contains(&name.as_str()) {
            continue;
        }
        let region = bfs(map, (x, y), passable);
        for (cell, _) in &region {
            visited[[cell.1, cell.0]] = true;
        }
        let Some(&(far, _)) = region.iter().max_by_key(|(_, d)| *d) else {
            continue;
        };
        let diameter = bfs(map, far, passable)
            .into_iter()
            .map(|(_, d)| d)
            .max()
            .unwrap_or(0);
        longest = longest.max(diameter);
    }
    longest
}

/// Reward for moving a metric from `old` to `new` relative to `[low, high]`.
///
/// Zero when both values are inside the range; otherwise the progress made
/// toward the range (negative when moving away from it).
pub fn get_range_reward(new: f64, old: f64, low: f64, high: f64) -> f64 {
    if (low..=high).contains(&new) && (low..=high).contains(&old) {
        0.0
    } else if new <= high && old <= high {
        new.min(low) - old.min(low)
    } else if new >= low && old >= low {
        old.max(high) - new.max(high)
    } else if new > high && old < low {
        high - new + old - low
    } else {
        // new < low && old > high
        high - old + new - low
    }
}

/// Breadth-first walk over `passable` cells from `start`, returning each
/// reached cell with its distance.
fn bfs(map: &NameMap, start: Location, passable: &[&str]) -> Vec<(Location, usize)> {
    let (height, width) = map.dim();
    let mut seen = Array2::from_elem((height, width), false);
    let mut queue = VecDeque::new();
    let mut reached = Vec::new();

    seen[[start.1, start.0]] = true;
    queue.push_back((start, 0));

    while let Some(((x, y), dist)) = queue.pop_front() {
        reached.push(((x, y), dist));
        for (nx, ny) in neighbors(x, y, width, height) {
            if !seen[[ny, nx]] && passable.contains(&map[[ny, nx]].as_str()) {
                seen[[ny, nx]] = true;
                queue.push_back(((nx, ny), dist + 1));
            }
        }
    }
    reached
}

fn neighbors(x: usize, y: usize, width: usize, height: usize) -> impl Iterator<Item = Location> {
    let left = x.checked_sub(1).map(|nx| (nx, y));
    let right = (x + 1 < width).then_some((x + 1, y));
    let up = y.checked_sub(1).map(|ny| (x, ny));
    let down = (y + 1 < height).then_some((x, y + 1));
    [left, right, up, down].into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a name map from rows where `.` is empty and `#` is solid.
    fn grid(rows: &[&str]) -> NameMap {
        let height = rows.len();
        let width = rows[0].len();
        Array2::from_shape_fn((height, width), |(y, x)| {
            match rows[y].as_bytes()[x] {
                b'.' => "empty".to_string(),
                _ => "solid".to_string(),
            }
        })
    }

    #[test]
    fn test_regions() {
        let map = grid(&["..#.", "..#.", "####", "#..#"]);
        assert_eq!(calc_num_regions(&map, &["empty"]), 3);
        assert_eq!(calc_num_regions(&map, &["solid"]), 1);
        assert_eq!(calc_num_regions(&grid(&["##", "##"]), &["empty"]), 0);
    }

    #[test]
    fn test_diagonal_cells_are_separate_regions() {
        let map = grid(&[".#", "#."]);
        assert_eq!(calc_num_regions(&map, &["empty"]), 2);
    }

    #[test]
    fn test_longest_path_follows_corridor() {
        // S-shaped corridor of 11 cells
        let map = grid(&["...", "##.", "...", ".##", "..."]);
        assert_eq!(calc_num_regions(&map, &["empty"]), 1);
        assert_eq!(calc_longest_path(&map, &["empty"]), 10);

        let open = grid(&["....", "....", "...."]);
        assert_eq!(calc_longest_path(&open, &["empty"]), 5);
    }

    #[test]
    fn test_longest_path_takes_best_region() {
        let map = grid(&["..#....", "#######"]);
        assert_eq!(calc_longest_path(&map, &["empty"]), 3);
        assert_eq!(calc_longest_path(&grid(&["#"]), &["empty"]), 0);
    }

    #[test]
    fn test_tile_locations_and_counts() {
        let map = grid(&[".#", "##"]);
        let tiles = vec!["empty".to_string(), "solid".to_string()];
        let locations = tile_locations(&map, &tiles);

        assert_eq!(locations["empty"], vec![(0, 0)]);
        assert_eq!(locations["solid"], vec![(1, 0), (0, 1), (1, 1)]);
        assert_eq!(count_tiles(&locations, &["solid"]), 3);
        assert_eq!(count_tiles(&locations, &["empty", "solid"]), 4);
        assert_eq!(count_tiles(&locations, &["lava"]), 0);
    }

    #[test]
    fn test_range_reward() {
        // inside the range: nothing to gain
        assert_eq!(get_range_reward(1.0, 1.0, 1.0, 1.0), 0.0);
        // approaching from below
        assert_eq!(get_range_reward(3.0, 1.0, 5.0, 8.0), 2.0);
        // approaching from above
        assert_eq!(get_range_reward(2.0, 4.0, 1.0, 1.0), 2.0);
        // leaving the range upward
        assert_eq!(get_range_reward(3.0, 1.0, 1.0, 1.0), -2.0);
        // jumping over the range
        assert_eq!(get_range_reward(10.0, 0.0, 2.0, 4.0), -8.0);
        assert_eq!(get_range_reward(0.0, 10.0, 2.0, 4.0), -8.0);
        // unbounded range rewards raw growth
        assert_eq!(get_range_reward(7.0, 4.0, f64::INFINITY, f64::INFINITY), 3.0);
        assert_eq!(get_range_reward(4.0, 7.0, f64::INFINITY, f64::INFINITY), -3.0);
    }
}
