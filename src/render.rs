//! ASCII rendering of a packed bin: one grid per distinct z-layer, each
//! showing the (x,y) footprint of every box present in that layer.

use crate::pack::PlacedBox;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// Renders every bin in `placements`, one ASCII grid per depth layer a box
/// occupies within it. `stock` is `(W, H, D)`.
pub fn render_bin(stock: (i32, i32, i32), placements: &[PlacedBox]) -> String {
    let (w, h, _d) = stock;
    let mut bins: Vec<usize> = placements.iter().map(|p| p.bno).collect();
    bins.sort_unstable();
    bins.dedup();

    let mut out = String::new();
    for bno in bins {
        let in_bin: Vec<&PlacedBox> = placements.iter().filter(|p| p.bno == bno).collect();
        out.push_str(&format!("bin {bno}\n"));

        let mut layers: Vec<i32> = in_bin.iter().map(|p| p.z).collect();
        layers.sort_unstable();
        layers.dedup();

        for z in layers {
            out.push_str(&format!("z={z}\n"));
            let here: Vec<&&PlacedBox> = in_bin.iter().filter(|p| p.z <= z && z < p.z + p.d).collect();
            out.push_str(&render_layer(w, h, &here));
        }
    }
    out
}

fn render_layer(w: i32, h: i32, placements: &[&&PlacedBox]) -> String {
    let scale = f64::min(MAX_WIDTH / w as f64, MAX_HEIGHT / h as f64).min(1.0);
    let grid_w = (w as f64 * scale).round() as usize;
    let grid_h = (h as f64 * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in placements {
        let sx = (p.x as f64 * scale).round() as usize;
        let sy = (p.y as f64 * scale).round() as usize;
        let sw = (p.w as f64 * scale).round() as usize;
        let sh = (p.h as f64 * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label = format!("{}x{}x{}", p.w, p.h, p.d);
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let half = label_chars.len() / 2;
            let start_x = cx.saturating_sub(half);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i < cols {
            if y < rows {
                grid[y][i] = if grid[y][i] == '|' || grid[y][i] == '+' { '+' } else { '-' };
            }
            if y + h < rows {
                grid[y + h][i] = if grid[y + h][i] == '|' || grid[y + h][i] == '+' { '+' } else { '-' };
            }
        }
    }

    for j in y..=y + h {
        if j < rows {
            if x < cols {
                grid[j][x] = if grid[j][x] == '-' || grid[j][x] == '+' { '+' } else { '|' };
            }
            if x + w < cols {
                grid[j][x + w] = if grid[j][x + w] == '-' || grid[j][x + w] == '+' { '+' } else { '|' };
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(no: usize, w: i32, h: i32, d: i32, x: i32, y: i32, z: i32, bno: usize) -> PlacedBox {
        PlacedBox { no, w, h, d, x, y, z, bno }
    }

    #[test]
    fn renders_a_single_box_with_its_dimension_label() {
        let placements = vec![placed(1, 100, 50, 20, 0, 0, 0, 1)];
        let output = render_bin((100, 50, 20), &placements);
        assert!(output.contains('+'));
        assert!(output.contains('-'));
        assert!(output.contains('|'));
        assert!(output.contains("100x50x20"));
        assert!(output.contains("bin 1"));
        assert!(output.contains("z=0"));
    }

    #[test]
    fn renders_one_grid_per_distinct_z_layer() {
        let placements = vec![
            placed(1, 10, 10, 5, 0, 0, 0, 1),
            placed(2, 10, 10, 5, 0, 0, 5, 1),
        ];
        let output = render_bin((10, 10, 10), &placements);
        assert!(output.contains("z=0"));
        assert!(output.contains("z=5"));
    }

    #[test]
    fn separates_output_by_bin_number() {
        let placements = vec![placed(1, 5, 5, 5, 0, 0, 0, 1), placed(2, 5, 5, 5, 0, 0, 0, 2)];
        let output = render_bin((5, 5, 5), &placements);
        assert!(output.contains("bin 1"));
        assert!(output.contains("bin 2"));
    }

    #[test]
    fn empty_placements_still_draws_the_bin_border() {
        let output = render_bin((10, 10, 10), &[]);
        assert!(output.is_empty());
    }
}
