//! Depth-interpolated lines
//!
//! Lines may carry two colors: the first half of the run uses the first
//! color and the second half the second, so a bond drawn between two atoms
//! changes color at its midpoint.
//!
//! Position, color, dash phase and z are all functions of the step index
//! measured along the major axis from the original start point. Clipping
//! only narrows the range of steps visited, so a clipped line lights exactly
//! the pixels of the unclipped one that fall inside the buffer.

use super::{Point3i, Visibility};
use crate::display::{PixelBuffer, Z_SHIFT};

const Z_ROUND: i64 = 1 << (Z_SHIFT - 1);

/// Solid line; `argb_b` colors the far half
pub fn draw_line(buf: &mut PixelBuffer, a: Point3i, b: Point3i, argb_a: u32, argb_b: u32) {
    let path = line_visibility(buf, a, b);
    rasterize(buf, a, b, argb_a, argb_b, None, path);
}

/// Dashed line: `run` pixels on, then `rise` pixels off
pub fn draw_dashed_line(
    buf: &mut PixelBuffer,
    run: i32,
    rise: i32,
    a: Point3i,
    b: Point3i,
    argb_a: u32,
    argb_b: u32,
) {
    if run <= 0 {
        return;
    }
    let path = line_visibility(buf, a, b);
    rasterize(buf, a, b, argb_a, argb_b, Some((run, rise.max(0))), path);
}

/// Alternating one-on one-off line
pub fn draw_dotted_line(buf: &mut PixelBuffer, a: Point3i, b: Point3i, argb: u32) {
    draw_dashed_line(buf, 1, 1, a, b, argb, argb);
}

fn line_visibility(buf: &PixelBuffer, a: Point3i, b: Point3i) -> Visibility {
    Visibility::of_box(
        a.x.min(b.x),
        a.y.min(b.y),
        a.x.max(b.x),
        a.y.max(b.y),
        buf.width(),
        buf.height(),
    )
}

fn rasterize(
    buf: &mut PixelBuffer,
    a: Point3i,
    b: Point3i,
    argb_a: u32,
    argb_b: u32,
    dash: Option<(i32, i32)>,
    path: Visibility,
) {
    let dx = i64::from(b.x) - i64::from(a.x);
    let dy = i64::from(b.y) - i64::from(a.y);
    let x_major = dx.abs() >= dy.abs();
    let n = dx.abs().max(dy.abs());
    let step_of = |x: i32, y: i32| {
        if x_major {
            (i64::from(x) - i64::from(a.x)).abs()
        } else {
            (i64::from(y) - i64::from(a.y)).abs()
        }
    };

    let (first, last) = match path {
        Visibility::Offscreen => return,
        Visibility::Unclipped => (0, n),
        Visibility::Clipped => {
            // A lit pixel's ideal point lies within half a pixel of the
            // buffer, so clipping to a one-pixel margin keeps every step
            // that can land inside. Intercepts truncate, hence one step of
            // slack; the margin itself is dropped by the bounds check.
            let window = (-1, -1, buf.width(), buf.height());
            let Some((x0, y0, x1, y1)) = clip_line(window, a.x, a.y, b.x, b.y) else {
                return;
            };
            let (t0, t1) = (step_of(x0, y0), step_of(x1, y1));
            ((t0.min(t1) - 1).max(0), (t0.max(t1) + 1).min(n))
        }
    };

    let half = n / 2;
    let zfp0 = (i64::from(a.z) << Z_SHIFT) + Z_ROUND;
    let dzfp = if n > 0 {
        ((i64::from(b.z) - i64::from(a.z)) << Z_SHIFT) / n
    } else {
        0
    };
    let period = dash.map(|(run, rise)| (i64::from(run), i64::from(run) + i64::from(rise)));
    let checked = path == Visibility::Clipped;

    for t in first..=last {
        if let Some((run, period)) = period {
            if t % period >= run {
                continue;
            }
        }
        let x = i64::from(a.x) + offset(t, dx, n);
        let y = i64::from(a.y) + offset(t, dy, n);
        let z = if t == n {
            b.z
        } else {
            ((zfp0 + dzfp * t) >> Z_SHIFT) as i32
        };
        let argb = if t > half { argb_b } else { argb_a };
        if checked {
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                continue;
            };
            buf.plot(x, y, z, argb);
        } else {
            buf.plot_in_bounds(x as i32, y as i32, z, argb);
        }
    }
}

/// Offset along an axis that moves `d` over the `n` steps of a line, at
/// step `t`: `t * d / n` rounded half away from the start point. For the
/// major axis this is exactly `t` (with sign).
fn offset(t: i64, d: i64, n: i64) -> i64 {
    if n == 0 {
        return 0;
    }
    let num = 2 * i128::from(t) * i128::from(d.abs()) + i128::from(n);
    let magnitude = (num / (2 * i128::from(n))) as i64;
    if d < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Cohen-Sutherland line clipping against the inclusive rectangle
/// `(x_min, y_min, x_max, y_max)`.
/// Returns the clipped endpoints, or `None` if nothing is visible.
pub(crate) fn clip_line(
    (x_min, y_min, x_max, y_max): (i32, i32, i32, i32),
    mut x0: i32,
    mut y0: i32,
    mut x1: i32,
    mut y1: i32,
) -> Option<(i32, i32, i32, i32)> {
    const INSIDE: u8 = 0;
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const BOTTOM: u8 = 4;
    const TOP: u8 = 8;
    // Converges in at most 4 iterations for valid input
    const MAX_ITERATIONS: u32 = 16;

    let outcode = |x: i32, y: i32| -> u8 {
        let mut code = INSIDE;
        if x < x_min {
            code |= LEFT;
        } else if x > x_max {
            code |= RIGHT;
        }
        if y < y_min {
            code |= TOP;
        } else if y > y_max {
            code |= BOTTOM;
        }
        code
    };

    let mut code0 = outcode(x0, y0);
    let mut code1 = outcode(x1, y1);

    for _ in 0..MAX_ITERATIONS {
        if (code0 | code1) == 0 {
            return Some((x0, y0, x1, y1));
        }
        if (code0 & code1) != 0 {
            return None;
        }

        let code_out = if code0 != 0 { code0 } else { code1 };
        let dx = i128::from(x1) - i128::from(x0);
        let dy = i128::from(y1) - i128::from(y0);
        // Far off-screen endpoints overflow i64 products; an intercept past
        // i32 is still outside the window after saturating
        let saturate = |v: i128| v.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32;
        let along_x =
            |edge: i32| saturate(i128::from(x0) + dx * (i128::from(edge) - i128::from(y0)) / dy);
        let along_y =
            |edge: i32| saturate(i128::from(y0) + dy * (i128::from(edge) - i128::from(x0)) / dx);

        let (x, y) = if (code_out & BOTTOM) != 0 {
            if dy == 0 {
                return None;
            }
            (along_x(y_max), y_max)
        } else if (code_out & TOP) != 0 {
            if dy == 0 {
                return None;
            }
            (along_x(y_min), y_min)
        } else if (code_out & RIGHT) != 0 {
            if dx == 0 {
                return None;
            }
            (x_max, along_y(x_max))
        } else {
            if dx == 0 {
                return None;
            }
            (x_min, along_y(x_min))
        };

        if code_out == code0 {
            x0 = x;
            y0 = y;
            code0 = outcode(x0, y0);
        } else {
            x1 = x;
            y1 = y;
            code1 = outcode(x1, y1);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BACKGROUND_DEPTH;

    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;

    fn lit(buf: &PixelBuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                if buf.depth_at(x, y) != Some(BACKGROUND_DEPTH) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_offset_steps() {
        // 7 by 3: the minor axis moves on steps 2, 4 and 6 (rounding 0.5 up)
        let ys: Vec<i64> = (0..=7).map(|t| offset(t, 3, 7)).collect();
        assert_eq!(ys, vec![0, 0, 1, 1, 2, 2, 3, 3]);
        let xs: Vec<i64> = (0..=9).map(|t| offset(t, -9, 9)).collect();
        assert_eq!(xs, (0..=9).map(|t| -t).collect::<Vec<_>>());
        assert_eq!(offset(0, 0, 0), 0);
    }

    #[test]
    fn test_horizontal_line() {
        let mut buf = PixelBuffer::with_size(20, 20);
        draw_line(&mut buf, Point3i::new(0, 0, 0), Point3i::new(10, 0, 0), RED, RED);
        let pixels = lit(&buf);
        assert_eq!(pixels.len(), 11);
        assert!(pixels.iter().all(|&(x, y)| y == 0 && x <= 10));
    }

    #[test]
    fn test_two_color_split_at_midpoint() {
        let mut buf = PixelBuffer::with_size(20, 4);
        draw_line(&mut buf, Point3i::new(0, 1, 0), Point3i::new(10, 1, 0), RED, BLUE);
        for x in 0..=5 {
            assert_eq!(buf.pixel_at(x, 1), Some(RED), "x = {}", x);
        }
        for x in 6..=10 {
            assert_eq!(buf.pixel_at(x, 1), Some(BLUE), "x = {}", x);
        }
    }

    #[test]
    fn test_z_interpolation_hits_endpoints() {
        let mut buf = PixelBuffer::with_size(16, 16);
        draw_line(&mut buf, Point3i::new(1, 1, 0), Point3i::new(4, 13, 10), RED, RED);
        assert_eq!(buf.depth_at(1, 1), Some(0));
        assert_eq!(buf.depth_at(4, 13), Some(10));
        let mut buf = PixelBuffer::with_size(16, 2);
        draw_line(&mut buf, Point3i::new(0, 0, 0), Point3i::new(10, 0, 100), RED, RED);
        assert_eq!(buf.depth_at(5, 0), Some(50));
    }

    #[test]
    fn test_dashed_duty_cycle() {
        let mut buf = PixelBuffer::with_size(20, 2);
        draw_dashed_line(
            &mut buf,
            3,
            2,
            Point3i::new(0, 0, 0),
            Point3i::new(14, 0, 0),
            RED,
            RED,
        );
        let xs: Vec<i32> = lit(&buf).into_iter().map(|(x, _)| x).collect();
        assert_eq!(xs, vec![0, 1, 2, 5, 6, 7, 10, 11, 12]);

        let mut buf = PixelBuffer::with_size(8, 2);
        draw_dotted_line(&mut buf, Point3i::new(0, 0, 0), Point3i::new(7, 0, 0), RED);
        assert_eq!(lit(&buf).len(), 4);
    }

    #[test]
    fn test_clipped_and_unclipped_paths_match_inside() {
        let cases = [
            (Point3i::new(1, 2, 5), Point3i::new(17, 9, 40)),
            (Point3i::new(18, 1, -3), Point3i::new(2, 18, 3)),
            (Point3i::new(5, 5, 0), Point3i::new(5, 15, 9)),
        ];
        for (a, b) in cases {
            let mut fast = PixelBuffer::with_size(20, 20);
            let mut slow = PixelBuffer::with_size(20, 20);
            rasterize(&mut fast, a, b, RED, BLUE, Some((4, 1)), Visibility::Unclipped);
            rasterize(&mut slow, a, b, RED, BLUE, Some((4, 1)), Visibility::Clipped);
            assert_eq!(fast.pixels(), slow.pixels());
            assert_eq!(fast.depths(), slow.depths());
        }
    }

    #[test]
    fn test_partially_offscreen_line() {
        let mut buf = PixelBuffer::with_size(10, 10);
        draw_line(&mut buf, Point3i::new(-20, 5, 0), Point3i::new(30, 5, 0), RED, BLUE);
        let pixels = lit(&buf);
        assert_eq!(pixels.len(), 10);
        // Midpoint of the full line is x = 5
        assert_eq!(buf.pixel_at(5, 5), Some(RED));
        assert_eq!(buf.pixel_at(6, 5), Some(BLUE));
    }

    #[test]
    fn test_offscreen_line_draws_nothing() {
        let mut buf = PixelBuffer::with_size(10, 10);
        draw_line(&mut buf, Point3i::new(-20, -5, 0), Point3i::new(-1, -50, 0), RED, RED);
        draw_line(&mut buf, Point3i::new(12, 0, 0), Point3i::new(40, 9, 0), RED, RED);
        assert!(!buf.has_content());
    }

    #[test]
    fn test_clip_line_keeps_inside_segment() {
        let window = (0, 0, 9, 9);
        assert_eq!(clip_line(window, 1, 2, 8, 9), Some((1, 2, 8, 9)));
        assert_eq!(clip_line(window, -5, -5, -1, 20), None);
        let (x0, y0, x1, y1) = clip_line(window, -100_000, 3, 100_000, 3).unwrap();
        assert_eq!((x0, y0, x1, y1), (0, 3, 9, 3));
        let far = 2_000_000_000;
        assert_eq!(clip_line((-1, -1, 10, 10), -far, -far, far, far), Some((-1, -1, 10, 10)));
    }

    /// Lit pixels of `a`-`b` in a `w` x `h` buffer, as colors per pixel
    fn render(w: i32, h: i32, a: Point3i, b: Point3i) -> Vec<Option<u32>> {
        let mut buf = PixelBuffer::with_size(w as u32, h as u32);
        draw_line(&mut buf, a, b, RED, BLUE);
        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                out.push(buf.pixel_at(x, y).filter(|_| buf.depth_at(x, y) != Some(BACKGROUND_DEPTH)));
            }
        }
        out
    }

    #[test]
    fn test_clipped_line_matches_same_line_in_larger_buffer() {
        let shift = Point3i::new(100, 100, 0);
        let moved = |p: Point3i| Point3i::new(p.x + shift.x, p.y + shift.y, p.z);
        let cases = [
            (Point3i::new(-7, 1, 0), Point3i::new(25, 12, 9)),
            (Point3i::new(3, -40, 0), Point3i::new(6, 30, 9)),
            (Point3i::new(-60, 8, 0), Point3i::new(70, 2, 9)),
            (Point3i::new(12, 11, 0), Point3i::new(-3, -9, 9)),
        ];
        for (a, b) in cases {
            let small = render(10, 10, a, b);
            let mut big = PixelBuffer::with_size(300, 300);
            draw_line(&mut big, moved(a), moved(b), RED, BLUE);
            let mut window = Vec::new();
            for y in 0..10 {
                for x in 0..10 {
                    let (bx, by) = (x + shift.x, y + shift.y);
                    let lit = big.depth_at(bx, by) != Some(BACKGROUND_DEPTH);
                    window.push(big.pixel_at(bx, by).filter(|_| lit));
                }
            }
            assert_eq!(small, window, "line {:?} -> {:?}", a, b);
        }
    }

    #[test]
    fn test_huge_endpoints_do_not_overflow() {
        let far = 2_000_000_000;
        let mut buf = PixelBuffer::with_size(10, 10);
        draw_line(&mut buf, Point3i::new(-far, 3, 0), Point3i::new(far, 3, 0), RED, BLUE);
        assert_eq!(lit(&buf).len(), 10);
        assert!(lit(&buf).iter().all(|&(_, y)| y == 3));

        let mut buf = PixelBuffer::with_size(10, 10);
        draw_line(&mut buf, Point3i::new(-far, -far, -far), Point3i::new(far, far, far), RED, RED);
        assert_eq!(lit(&buf).len(), 10);
        assert!(lit(&buf).iter().all(|&(x, y)| x == y));

        let mut buf = PixelBuffer::with_size(10, 10);
        draw_dashed_line(&mut buf, 2, 1, Point3i::new(5, far, 0), Point3i::new(5, -far, 0), RED, RED);
        assert!(buf.has_content());
    }
}
