//! Packed screen coordinates
//!
//! An [`Xyzd`] carries the x, y, z and diameter of a sphere or circle. It is a
//! plain struct everywhere inside the engine; [`Xyzd::pack`] and
//! [`Xyzd::unpack`] exist for callers that keep large atom lists as `u64`s.
//!
//! Layout (most significant first): x (18 bits), y (18 bits), z (18 bits),
//! diameter (10 bits). Coordinates are two's complement.

pub const COORD_BITS: u32 = 18;
pub const DIAMETER_BITS: u32 = 10;

pub const COORD_MIN: i32 = -(1 << (COORD_BITS - 1));
pub const COORD_MAX: i32 = (1 << (COORD_BITS - 1)) - 1;
pub const DIAMETER_MAX: i32 = (1 << DIAMETER_BITS) - 1;

const X_SHIFT: u32 = DIAMETER_BITS + 2 * COORD_BITS;
const Y_SHIFT: u32 = DIAMETER_BITS + COORD_BITS;
const Z_SHIFT: u32 = DIAMETER_BITS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Xyzd {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub diameter: i32,
}

impl Xyzd {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32, diameter: i32) -> Self {
        Self { x, y, z, diameter }
    }

    /// True if every field is representable without clamping
    pub fn fits(&self) -> bool {
        (COORD_MIN..=COORD_MAX).contains(&self.x)
            && (COORD_MIN..=COORD_MAX).contains(&self.y)
            && (COORD_MIN..=COORD_MAX).contains(&self.z)
            && (0..=DIAMETER_MAX).contains(&self.diameter)
    }

    /// Saturate every field into its packable range
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(COORD_MIN, COORD_MAX),
            y: self.y.clamp(COORD_MIN, COORD_MAX),
            z: self.z.clamp(COORD_MIN, COORD_MAX),
            diameter: self.diameter.clamp(0, DIAMETER_MAX),
        }
    }

    /// Pack into a single word, saturating out-of-range fields
    pub fn pack(self) -> u64 {
        let c = self.clamped();
        field(c.x, COORD_BITS) << X_SHIFT
            | field(c.y, COORD_BITS) << Y_SHIFT
            | field(c.z, COORD_BITS) << Z_SHIFT
            | field(c.diameter, DIAMETER_BITS)
    }

    /// Pack into a single word, or `None` if any field would overflow
    pub fn try_pack(self) -> Option<u64> {
        self.fits().then(|| self.pack())
    }

    pub fn unpack(word: u64) -> Self {
        Self {
            x: sign_extend(word >> X_SHIFT, COORD_BITS),
            y: sign_extend(word >> Y_SHIFT, COORD_BITS),
            z: sign_extend(word >> Z_SHIFT, COORD_BITS),
            diameter: (word & mask(DIAMETER_BITS)) as i32,
        }
    }
}

impl From<Xyzd> for u64 {
    fn from(xyzd: Xyzd) -> Self {
        xyzd.pack()
    }
}

impl From<u64> for Xyzd {
    fn from(word: u64) -> Self {
        Xyzd::unpack(word)
    }
}

#[inline]
const fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

#[inline]
fn field(value: i32, bits: u32) -> u64 {
    (value as i64 as u64) & mask(bits)
}

#[inline]
fn sign_extend(raw: u64, bits: u32) -> i32 {
    let shift = 64 - bits;
    (((raw & mask(bits)) << shift) as i64 >> shift) as i32
}
