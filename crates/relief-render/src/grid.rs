//! The implicit heightfield grid.
//!
//! No vertex data is uploaded. Vertex `i` belongs to tile `i / 6`; tiles run
//! row-major over a `GRID_TILES x GRID_TILES` lattice and each contributes
//! two triangles. The shader rebuilds the grid cell from the index the same
//! way [`grid_vertex`] does here.

use crate::program::{GpuProgram, TEXTURE_GROUP};
use crate::texture::HeightTexture;

/// Tiles along each side of the grid.
pub const GRID_TILES: u32 = 1023;
pub const VERTICES_PER_TILE: u32 = 6;
/// Vertices drawn per frame: two triangles for each of the 1023 x 1023 tiles.
pub const GRID_VERTEX_COUNT: u32 = VERTICES_PER_TILE * GRID_TILES * GRID_TILES;

/// Corner offsets of a tile's two triangles, in vertex order.
pub const TILE_CORNERS: [(u32, u32); 6] = [(0, 0), (1, 0), (0, 1), (0, 1), (1, 0), (1, 1)];

/// Grid cell `(x, z)` addressed by a vertex index.
pub fn grid_vertex(index: u32) -> (u32, u32) {
    let tile = index / VERTICES_PER_TILE;
    let (dx, dz) = TILE_CORNERS[(index % VERTICES_PER_TILE) as usize];
    (tile % GRID_TILES + dx, tile / GRID_TILES + dz)
}

/// Record the heightfield draw into `pass`.
pub fn draw_heightfield(
    pass: &mut wgpu::RenderPass<'_>,
    program: &GpuProgram,
    texture: &HeightTexture,
) {
    program.bind(pass);
    pass.set_bind_group(TEXTURE_GROUP, &texture.bind_group, &[]);
    pass.draw(0..GRID_VERTEX_COUNT, 0..1);
}
