use crate::framebuffer::{Canvas, Color};

/// Bresenham's line between two inclusive endpoints.
///
/// The loop always walks the major axis in increasing order, so drawing A→B
/// and B→A plots the same pixels.
pub fn draw_line<C: Canvas + ?Sized>(
    canvas: &mut C,
    mut x0: i32,
    mut y0: i32,
    mut x1: i32,
    mut y1: i32,
    color: Color,
) {
    let is_steep = (y1 - y0).abs() > (x1 - x0).abs();
    if is_steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }
    let delta_x = x1 - x0;
    let delta_y = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };
    let mut error = -(delta_x / 2);
    let mut y = y0;
    for x in x0..=x1 {
        if is_steep {
            canvas.plot_pixel(y, x, color);
        } else {
            canvas.plot_pixel(x, y, color);
        }
        error += delta_y;
        if error > 0 {
            y += y_step;
            error -= delta_x;
        }
    }
}

/// A solid disk: every pixel whose squared distance to the centre is at most
/// `radius²`, boundary included.
pub fn draw_filled_circle<C: Canvas + ?Sized>(
    canvas: &mut C,
    cx: i32,
    cy: i32,
    radius: i32,
    color: Color,
) {
    if radius < 0 {
        return;
    }
    let radius_sq = radius as i64 * radius as i64;
    let x_start = cx.saturating_sub(radius).max(0);
    let x_end = cx.saturating_add(radius).min(canvas.width() - 1);
    let y_start = cy.saturating_sub(radius).max(0);
    let y_end = cy.saturating_add(radius).min(canvas.height() - 1);
    for y in y_start..=y_end {
        let dy = (y - cy) as i64;
        for x in x_start..=x_end {
            let dx = (x - cx) as i64;
            if dx * dx + dy * dy <= radius_sq {
                canvas.plot_pixel(x, y, color);
            }
        }
    }
}

/// An aim arrow: a shaft of `length` pixels along the unit vector
/// `(dir_x, dir_y)` and two `head_length` strokes flaring back from the tip.
#[allow(clippy::too_many_arguments)]
pub fn draw_direction_arrow<C: Canvas + ?Sized>(
    canvas: &mut C,
    cx: i32,
    cy: i32,
    dir_x: f32,
    dir_y: f32,
    length: i32,
    head_length: i32,
    head_spread: f32,
    color: Color,
) {
    let tip_x = cx + (dir_x * length as f32) as i32;
    let tip_y = cy + (dir_y * length as f32) as i32;
    draw_line(canvas, cx, cy, tip_x, tip_y, color);

    let heading = dir_y.atan2(dir_x);
    for angle in [heading + head_spread, heading - head_spread] {
        let head_x = tip_x + (angle.cos() * head_length as f32) as i32;
        let head_y = tip_y + (angle.sin() * head_length as f32) as i32;
        draw_line(canvas, tip_x, tip_y, head_x, head_y, color);
    }
}
