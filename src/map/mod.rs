//! The tile grid: run length coded floors and ores followed by the blocks,
//! where every non terrain block carries a framed entity.

mod block;
mod extra;

pub use self::block::{is_terrain, BlockDescriptor, BlockKind, BlockState, BlockTable, TileKind};
pub use self::extra::*;

use crate::{ByteCursor, ContentRegistry, Error, ErrorKind, Unsupported};
use serde::{Deserialize, Serialize};

/// Longest run a single record can express
const MAX_RUN: usize = 255;

/// A single cell of the map
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub floor_id: i16,
    pub ore_id: i16,
    pub block_id: i16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockState>,
}

impl Tile {
    /// A tile without an entity
    pub fn new(floor_id: i16, ore_id: i16, block_id: i16) -> Self {
        Tile {
            floor_id,
            ore_id,
            block_id,
            block: None,
        }
    }

    fn same_ground(&self, other: &Tile) -> bool {
        self.floor_id == other.floor_id && self.ore_id == other.ore_id
    }
}

/// Row major grid of tiles
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub width: u16,
    pub height: u16,
    pub tiles: Vec<Tile>,
}

/// Number of tiles after `index` that can join its run
fn run_length<F>(tiles: &[Tile], index: usize, joins: F) -> usize
where
    F: Fn(&Tile) -> bool,
{
    tiles[index + 1..]
        .iter()
        .take(MAX_RUN)
        .take_while(|x| joins(x))
        .count()
}

impl TileMap {
    /// A map of default tiles
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        TileMap {
            width,
            height,
            tiles: vec![Tile::default(); size],
        }
    }

    /// Number of tiles the dimensions call for
    pub fn size(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Tile> {
        if x >= self.width {
            return None;
        }

        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.tiles.get(idx)
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Tile> {
        if x >= self.width {
            return None;
        }

        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.tiles.get_mut(idx)
    }

    /// Decode the map section body. Block ids are resolved against the
    /// block category of the content header.
    pub fn read(cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<Self, Error> {
        let width = cursor.read_u16()?;
        let height = cursor.read_u16()?;
        let size = usize::from(width) * usize::from(height);
        log::debug!("decoding {}x{} map", width, height);

        // a floor record is five bytes and covers at most 256 tiles
        let mut tiles = Vec::with_capacity(size.min(cursor.remaining() / 5 * (MAX_RUN + 1)));
        while tiles.len() < size {
            let floor_id = cursor.read_i16()?;
            let ore_id = cursor.read_i16()?;
            let run = cursor.read_u8()?;
            let index = tiles.len();
            if index + usize::from(run) >= size {
                return Err(Error::new(ErrorKind::MapOverrun { index, run, size }));
            }

            let tile = Tile::new(floor_id, ore_id, 0);
            tiles.extend(std::iter::repeat(tile).take(usize::from(run) + 1));
        }

        let table = BlockTable::new(content);
        let mut index = 0;
        while index < size {
            let block_id = cursor.read_i16()?;
            match table.resolve(block_id)? {
                TileKind::Terrain => {
                    let run = cursor.read_u8()?;
                    if index + usize::from(run) >= size {
                        return Err(Error::new(ErrorKind::MapOverrun { index, run, size }));
                    }

                    let end = index + usize::from(run) + 1;
                    for tile in &mut tiles[index..end] {
                        tile.block_id = block_id;
                    }
                    index = end;
                }
                TileKind::Block(kind) => {
                    let tile = &mut tiles[index];
                    tile.block_id = block_id;
                    tile.block = Some(BlockState::read(cursor, kind, content)?);
                    index += 1;
                }
            }
        }

        Ok(TileMap {
            width,
            height,
            tiles,
        })
    }

    /// Encode the map section body
    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        let size = self.size();
        if self.tiles.len() != size {
            return Err(Error::new(ErrorKind::MapSize {
                expected: size,
                actual: self.tiles.len(),
            }));
        }

        cursor.write_u16(self.width)?;
        cursor.write_u16(self.height)?;

        let mut index = 0;
        while index < size {
            let tile = &self.tiles[index];
            cursor.write_i16(tile.floor_id)?;
            cursor.write_i16(tile.ore_id)?;
            let run = run_length(&self.tiles, index, |x| x.same_ground(tile));
            cursor.write_u8(run)?;
            index += run + 1;
        }

        let table = BlockTable::new(content);
        let mut index = 0;
        while index < size {
            let tile = &self.tiles[index];
            let kind = table.resolve(tile.block_id)?;
            cursor.write_i16(tile.block_id)?;
            match (kind, &tile.block) {
                (TileKind::Terrain, None) => {
                    let run = run_length(&self.tiles, index, |x| {
                        x.block_id == tile.block_id && x.block.is_none()
                    });
                    cursor.write_u8(run)?;
                    index += run + 1;
                }
                (TileKind::Terrain, Some(_)) => {
                    return Err(Error::unsupported(Unsupported::TerrainBlockState {
                        id: tile.block_id,
                    }));
                }
                (TileKind::Block(kind), Some(state)) => {
                    state.write(cursor, kind, content)?;
                    index += 1;
                }
                (TileKind::Block(kind), None) => {
                    return Err(Error::unsupported(Unsupported::MissingBlockState {
                        id: tile.block_id,
                        name: kind.name(),
                    }));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentType;

    fn content() -> ContentRegistry {
        let mut content = ContentRegistry::new();
        content.set(
            ContentType::Block,
            vec![
                "air".into(),
                "duo".into(),
                "rocks".into(),
                "copper-wall".into(),
                "sand".into(),
            ],
        );
        content
    }

    fn encode(map: &TileMap) -> Vec<u8> {
        let mut cursor = ByteCursor::new();
        map.write(&mut cursor, &content()).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_two_by_one() {
        let map = TileMap {
            width: 2,
            height: 1,
            tiles: vec![Tile::new(3, 0, 0), Tile::new(3, 0, 0)],
        };

        let data = encode(&map);
        assert_eq!(data, vec![0, 2, 0, 1, 0, 3, 0, 0, 1, 0, 0, 1]);

        let actual = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap();
        assert_eq!(actual, map);
    }

    #[test]
    fn test_runs_are_capped() {
        let map = TileMap {
            width: 300,
            height: 1,
            tiles: vec![Tile::new(1, 0, 0); 300],
        };

        let data = encode(&map);
        // floor records of 255 and 43 then block records of 255 and 43
        let expected = [
            0, 1, 0, 0, 255, //
            0, 1, 0, 0, 43, //
            0, 0, 255, //
            0, 0, 43,
        ];
        assert_eq!(&data[4..], &expected[..]);

        let actual = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap();
        assert_eq!(actual, map);
    }

    #[test]
    fn test_block_interrupts_terrain_run() {
        let mut map = TileMap::new(4, 1);
        map.tiles[2].block_id = 3;
        map.tiles[2].block = Some(BlockState::new(BlockKind::CopperWall));
        map.tiles[3].block_id = 2;

        let data = encode(&map);
        assert_eq!(
            &data[9..],
            &[
                0, 0, 1, // two air
                0, 3, 0, 5, 0, 0, 0, 0, 0, // copper wall
                0, 2, 0, // rocks
            ]
        );
        let actual = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap();
        assert_eq!(actual, map);
    }

    #[test]
    fn test_floor_overrun() {
        let data = vec![0, 2, 0, 1, 0, 3, 0, 0, 2];
        let err = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MapOverrun {
                index: 0,
                run: 2,
                size: 2
            }
        ));
    }

    #[test]
    fn test_block_overrun() {
        let data = vec![0, 2, 0, 1, 0, 3, 0, 0, 1, 0, 0, 5];
        let err = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MapOverrun { run: 5, .. }));
    }

    #[test]
    fn test_unmapped_block_name() {
        let data = vec![0, 1, 0, 1, 0, 3, 0, 0, 0, 0, 4];
        let err = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnknownBlock { id: 4, .. })
        ));
    }

    #[test]
    fn test_unresolved_block_id() {
        let data = vec![0, 1, 0, 1, 0, 3, 0, 0, 0, 0, 9];
        let err = TileMap::read(&mut ByteCursor::from_vec(data), &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent { id: 9, .. })
        ));
    }

    #[test]
    fn test_encode_checks_states() {
        let mut cursor = ByteCursor::new();
        let mut map = TileMap::new(1, 1);
        map.tiles[0].block_id = 1;
        let err = map.write(&mut cursor, &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::MissingBlockState { id: 1, name: "duo" })
        ));

        let mut map = TileMap::new(1, 1);
        map.tiles[0].block = Some(BlockState::default());
        let err = map.write(&mut ByteCursor::new(), &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::TerrainBlockState { id: 0 })
        ));
    }

    #[test]
    fn test_map_size() {
        let mut map = TileMap::new(2, 2);
        map.tiles.pop();
        let err = map.write(&mut ByteCursor::new(), &content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MapSize {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_coordinates() {
        let mut map = TileMap::new(3, 2);
        map.get_mut(2, 1).unwrap().floor_id = 9;
        assert_eq!(map.tiles[5].floor_id, 9);
        assert_eq!(map.get(2, 1).unwrap().floor_id, 9);
        assert!(map.get(3, 0).is_none());
        assert!(map.get(0, 2).is_none());
    }
}
