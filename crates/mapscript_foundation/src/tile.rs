//! Tile numbers, elevations, and hex distances.

/// Width of the hex grid in tiles.
pub const HEX_GRID_WIDTH: i32 = 200;

/// Number of tiles on one elevation.
pub const HEX_GRID_SIZE: i32 = HEX_GRID_WIDTH * HEX_GRID_WIDTH;

/// Spatial triggers ignore tiles below this number.
pub const MIN_TRIGGER_TILE: i32 = 10;

/// Number of elevations in a map.
pub const ELEVATION_COUNT: i32 = 3;

const TILE_MASK: i32 = 0x03FF_FFFF;
const ELEVATION_SHIFT: u32 = 29;

/// A tile number and elevation packed into one word.
///
/// The tile occupies the low 26 bits and the elevation the top three.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltTile(i32);

impl BuiltTile {
    /// Packs a tile and elevation.
    #[must_use]
    pub const fn new(tile: i32, elevation: i32) -> Self {
        Self((tile & TILE_MASK) | (elevation << ELEVATION_SHIFT))
    }

    /// Wraps a packed value as stored on disk.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the packed value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the tile number.
    #[must_use]
    pub const fn tile(self) -> i32 {
        self.0 & TILE_MASK
    }

    /// Returns the elevation.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub const fn elevation(self) -> i32 {
        ((self.0 as u32) >> ELEVATION_SHIFT) as i32
    }
}

/// Returns true if `tile` lies on the grid.
#[must_use]
pub const fn is_valid_tile(tile: i32) -> bool {
    tile >= 0 && tile < HEX_GRID_SIZE
}

/// Hex distance between two tiles on the same elevation.
///
/// Columns are offset by half a hex on odd x. Invalid tiles are infinitely
/// far apart, reported as `i32::MAX`.
#[must_use]
pub fn hex_distance(from: i32, to: i32) -> i32 {
    if !is_valid_tile(from) || !is_valid_tile(to) {
        return i32::MAX;
    }
    let (q1, r1) = axial(from);
    let (q2, r2) = axial(to);
    let dq = q1 - q2;
    let dr = r1 - r2;
    (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
}

fn axial(tile: i32) -> (i32, i32) {
    let col = tile % HEX_GRID_WIDTH;
    let row = tile / HEX_GRID_WIDTH;
    (col, row - (col - (col & 1)) / 2)
}
