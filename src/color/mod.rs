//! Color handles
//!
//! A [`Colix`] is a small interned handle for an opaque ARGB color. The table
//! also caches each color's shade ramp, built on first use. A
//! [`ColorRef::Changeable`] reference goes through an id-indexed indirection
//! so the color behind it can be swapped without touching stored references.

mod named;

pub use named::{lookup_named, parse_color, NAMED_COLORS};

use std::sync::Arc;

use crate::shade::{ShadeModel, Shades};
use crate::util::{opaque, rgb_components};

/// Interned color handle. Handle 0 is reserved for "no color".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Colix(u16);

impl Colix {
    pub const NONE: Colix = Colix(0);
    pub const BLACK: Colix = Colix(1);
    pub const ORANGE: Colix = Colix(2);
    pub const PINK: Colix = Colix(3);
    pub const BLUE: Colix = Colix(4);
    pub const WHITE: Colix = Colix(5);
    pub const CYAN: Colix = Colix(6);
    pub const RED: Colix = Colix(7);
    pub const GREEN: Colix = Colix(8);
    pub const GRAY: Colix = Colix(9);
    pub const SILVER: Colix = Colix(10);
    pub const LIME: Colix = Colix(11);
    pub const MAROON: Colix = Colix(12);
    pub const NAVY: Colix = Colix(13);
    pub const OLIVE: Colix = Colix(14);
    pub const PURPLE: Colix = Colix(15);
    pub const TEAL: Colix = Colix(16);
    pub const MAGENTA: Colix = Colix(17);
    pub const YELLOW: Colix = Colix(18);
    pub const HOTPINK: Colix = Colix(19);
    pub const GOLD: Colix = Colix(20);

    /// Stand-in for a changeable id with nothing bound to it
    pub const UNBOUND: Colix = Colix::HOTPINK;

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Palette interned at construction, in handle order starting at 1
const PREDEFINED: [u32; 20] = [
    0xFF00_0000, // black
    0xFFFF_A500, // orange
    0xFFFF_C0CB, // pink
    0xFF00_00FF, // blue
    0xFFFF_FFFF, // white
    0xFF00_FFFF, // cyan
    0xFFFF_0000, // red
    0xFF00_8000, // green
    0xFF80_8080, // gray
    0xFFC0_C0C0, // silver
    0xFF00_FF00, // lime
    0xFF80_0000, // maroon
    0xFF00_0080, // navy
    0xFF80_8000, // olive
    0xFF80_0080, // purple
    0xFF00_8080, // teal
    0xFFFF_00FF, // magenta
    0xFFFF_FF00, // yellow
    0xFFFF_69B4, // hotpink
    0xFFFF_D700, // gold
];

/// A color as referenced by draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRef {
    /// A fixed interned color
    Direct(Colix),
    /// A reassignable color, looked up by client-chosen id at draw time.
    /// An id with nothing bound draws in hot pink.
    Changeable(u16),
}

impl From<Colix> for ColorRef {
    fn from(colix: Colix) -> Self {
        ColorRef::Direct(colix)
    }
}

impl Default for ColorRef {
    fn default() -> Self {
        ColorRef::Direct(Colix::NONE)
    }
}

/// Interning table of colors with lazily built shade ramps
#[derive(Debug)]
pub struct ColorTable {
    argbs: Vec<u32>,
    shades: Vec<Option<Arc<Shades>>>,
    changeable: Vec<Colix>,
}

impl ColorTable {
    pub fn new() -> Self {
        let mut table = Self {
            argbs: Vec::with_capacity(128),
            shades: Vec::with_capacity(128),
            changeable: Vec::new(),
        };
        // Slot 0: no color
        table.argbs.push(0);
        table.shades.push(None);
        for argb in PREDEFINED {
            table.push(argb);
        }
        table
    }

    fn push(&mut self, argb: u32) -> Colix {
        let colix = Colix(self.argbs.len() as u16);
        self.argbs.push(argb);
        self.shades.push(None);
        colix
    }

    /// Number of handles issued, including the reserved slot
    #[inline]
    pub fn len(&self) -> usize {
        self.argbs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.argbs.len() <= 1
    }

    /// Return the handle for an ARGB value, interning it if new.
    /// The alpha channel is forced opaque.
    pub fn intern(&mut self, argb: u32) -> Colix {
        let argb = opaque(argb);
        if let Some(i) = self.argbs.iter().skip(1).position(|&c| c == argb) {
            return Colix((i + 1) as u16);
        }
        if self.argbs.len() > usize::from(u16::MAX) {
            let nearest = self.nearest(argb);
            log::warn!(
                "color table full; substituting colix {} for {:08x}",
                nearest.0,
                argb
            );
            return nearest;
        }
        self.push(argb)
    }

    fn nearest(&self, argb: u32) -> Colix {
        let (r, g, b) = rgb_components(argb);
        let distance = |c: u32| {
            let (cr, cg, cb) = rgb_components(c);
            let dr = i32::from(cr) - i32::from(r);
            let dg = i32::from(cg) - i32::from(g);
            let db = i32::from(cb) - i32::from(b);
            dr * dr + dg * dg + db * db
        };
        self.argbs
            .iter()
            .enumerate()
            .skip(1)
            .min_by_key(|&(_, &c)| distance(c))
            .map_or(Colix::BLACK, |(i, _)| Colix(i as u16))
    }

    /// Bind a changeable color id, allocating its backing color on first use.
    /// Later calls for a bound id leave its color alone; use
    /// [`change_color`](Self::change_color) to reassign it.
    pub fn changeable(&mut self, id: u16, argb: u32) -> ColorRef {
        let slot = usize::from(id);
        if slot >= self.changeable.len() {
            self.changeable.resize(slot + 1, Colix::NONE);
        }
        if self.changeable[slot].is_none() {
            self.changeable[slot] = self.intern(argb);
        }
        ColorRef::Changeable(id)
    }

    /// Re-point a changeable id at a new color. Every stored
    /// `ColorRef::Changeable(id)` picks up the new color on its next draw.
    pub fn change_color(&mut self, id: u16, argb: u32) {
        let colix = self.intern(argb);
        let slot = usize::from(id);
        if slot >= self.changeable.len() {
            self.changeable.resize(slot + 1, Colix::NONE);
        }
        self.changeable[slot] = colix;
    }

    /// Resolve a reference to its current interned handle. A changeable id
    /// that was never bound resolves to [`Colix::UNBOUND`].
    pub fn resolve(&self, color: ColorRef) -> Colix {
        match color {
            ColorRef::Direct(colix) => colix,
            ColorRef::Changeable(id) => match self.changeable.get(usize::from(id)) {
                Some(&colix) if !colix.is_none() => colix,
                _ => {
                    log::warn!("changeable color {} is unbound; using hot pink", id);
                    Colix::UNBOUND
                },
            },
        }
    }

    /// ARGB of a handle. Asking for [`Colix::NONE`] is a caller error.
    pub fn argb(&self, colix: Colix) -> u32 {
        debug_assert!(!colix.is_none(), "argb requested for the no-color handle");
        self.argbs.get(colix.index()).copied().unwrap_or(0)
    }

    /// (r, g, b) of a handle, for UI swatches
    pub fn rgb(&self, colix: Colix) -> (u8, u8, u8) {
        rgb_components(self.argb(colix))
    }

    /// Shade ramp of a handle, built on first request
    pub fn shades(&mut self, colix: Colix, model: &ShadeModel) -> Arc<Shades> {
        debug_assert!(!colix.is_none(), "shades requested for the no-color handle");
        let index = if colix.index() < self.argbs.len() {
            colix.index()
        } else {
            Colix::BLACK.index()
        };
        if let Some(shades) = &self.shades[index] {
            return Arc::clone(shades);
        }
        let shades = Arc::new(model.shade_ramp(self.argbs[index]));
        self.shades[index] = Some(Arc::clone(&shades));
        shades
    }

    /// Drop every cached shade ramp (lighting changed)
    pub fn flush_shades(&mut self) {
        let built = self.shades.iter().filter(|s| s.is_some()).count();
        self.shades.iter_mut().for_each(|s| *s = None);
        log::debug!("flushed {} shade ramps", built);
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}
