//! ASCII residual plot for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - residual of an observation that carried weight: `o`
//! - residual of an observation excluded from the final solve (weight 0): `x`
//! - zero line: `-`

use crate::domain::ResidualRow;

/// Render residuals against row index.
pub fn render_residual_plot(rows: &[ResidualRow], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (r_min, r_max) = row_range(rows);
    let (y_min, y_max) = residual_range(rows).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Zero line first so points overlay it.
    let zero = map_y(0.0, y_min, y_max, height);
    draw_line(&mut grid, 0, zero, width - 1, zero, '-');

    for r in rows {
        let x = map_x(r.row as f64, r_min, r_max, width);
        let y = map_y(r.residual, y_min, y_max, height);
        grid[y][x] = if r.weight == 0.0 { 'x' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: row=[{r_min:.0}, {r_max:.0}] | residual=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn row_range(rows: &[ResidualRow]) -> (f64, f64) {
    let max = rows.iter().map(|r| r.row).max().unwrap_or(0);
    (0.0, max.max(1) as f64)
}

fn residual_range(rows: &[ResidualRow]) -> Option<(f64, f64)> {
    // The zero line is always in range.
    let mut min_y = 0.0f64;
    let mut max_y = 0.0f64;
    for r in rows {
        if r.residual.is_finite() {
            min_y = min_y.min(r.residual);
            max_y = max_y.max(r.residual);
        }
    }
    if max_y > min_y { Some((min_y, max_y)) } else { None }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
