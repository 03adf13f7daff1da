//! Flat circles at constant depth
//!
//! Circles are sized by diameter. For even diameters the center sits half a
//! pixel up and to the left of (cx, cy): the disc covers cx - r ..= cx + r - 1.

use super::Visibility;
use crate::display::PixelBuffer;

/// Visit one octant of the midpoint circle of `radius`.
/// Yields (x, y) with x >= y >= 0.
fn for_each_octant(radius: i32, mut f: impl FnMut(i32, i32)) {
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        f(x, y);
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Radius and even-diameter size correction
fn radius_of(diameter: i32) -> (i32, i32) {
    (diameter / 2, 1 - (diameter & 1))
}

fn circle_visibility(buf: &PixelBuffer, diameter: i32, cx: i32, cy: i32) -> Visibility {
    let (radius, sc) = radius_of(diameter);
    Visibility::of_box(
        cx.saturating_sub(radius),
        cy.saturating_sub(radius),
        cx.saturating_add(radius - sc),
        cy.saturating_add(radius - sc),
        buf.width(),
        buf.height(),
    )
}

/// One-pixel circle outline
pub fn draw_circle(buf: &mut PixelBuffer, diameter: i32, cx: i32, cy: i32, z: i32, argb: u32) {
    if diameter <= 0 {
        return;
    }
    let path = circle_visibility(buf, diameter, cx, cy);
    outline(buf, diameter, cx, cy, z, argb, path);
}

/// Filled disc. A screened disc lights only every other pixel in a
/// checkerboard, for translucent-looking fills.
pub fn fill_circle(
    buf: &mut PixelBuffer,
    diameter: i32,
    cx: i32,
    cy: i32,
    z: i32,
    argb: u32,
    screened: bool,
) {
    if diameter <= 0 {
        return;
    }
    let path = circle_visibility(buf, diameter, cx, cy);
    disc(buf, diameter, cx, cy, z, argb, screened, path);
}

fn outline(
    buf: &mut PixelBuffer,
    diameter: i32,
    cx: i32,
    cy: i32,
    z: i32,
    argb: u32,
    path: Visibility,
) {
    if path == Visibility::Offscreen {
        return;
    }
    let (radius, sc) = radius_of(diameter);
    for_each_octant(radius, |x, y| {
        let points = [
            (cx + x - sc, cy + y - sc),
            (cx + y - sc, cy + x - sc),
            (cx - y, cy + x - sc),
            (cx - x, cy + y - sc),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y - sc, cy - x),
            (cx + x - sc, cy - y),
        ];
        for (px, py) in points {
            if path == Visibility::Clipped {
                buf.plot(px, py, z, argb);
            } else {
                buf.plot_in_bounds(px, py, z, argb);
            }
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn disc(
    buf: &mut PixelBuffer,
    diameter: i32,
    cx: i32,
    cy: i32,
    z: i32,
    argb: u32,
    screened: bool,
    path: Visibility,
) {
    if path == Visibility::Offscreen {
        return;
    }
    let (radius, sc) = radius_of(diameter);
    let row = |buf: &mut PixelBuffer, y: i32, half: i32| {
        let left = cx - half;
        let right = cx + half - sc;
        if left > right {
            return;
        }
        if !screened {
            buf.span(y, left, z, right, z, argb);
            return;
        }
        let start = left + ((left + y) & 1);
        for x in (start..=right).step_by(2) {
            if path == Visibility::Clipped {
                buf.plot(x, y, z, argb);
            } else {
                buf.plot_in_bounds(x, y, z, argb);
            }
        }
    };
    for_each_octant(radius, |x, y| {
        row(buf, cy + y - sc, x);
        row(buf, cy - y, x);
        row(buf, cy + x - sc, y);
        row(buf, cy - x, y);
    });
}
