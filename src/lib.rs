/*!

A byte exact decoder and encoder for MSAV save files: the persisted world of a
tile based factory and tower defense game.

A save decodes into a [`SaveDocument`] that can be inspected, edited, and
encoded back. Re-encoding a document that was not modified reproduces the
original bytes exactly.

## Features

- ✔ Exact: Unmodified documents round trip byte for byte
- ✔ Checked: Values that do not fit their wire width are rejected before anything is written
- ✔ Closed: Every block with an entity is described by one table entry
- ✔ Serde: Every document type can be serialized, eg: into JSON

## Quick Start

```rust
use msav::{BlockKind, BlockState, ContentRegistry, ContentType, Meta, SaveDocument, TileMap};
use serde_json::json;

let mut meta = Meta::new();
for key in ["wave", "build", "width", "height", "saved", "playtime"] {
    meta.insert(key, msav::MetaValue::Integer(1));
}
meta.set_wavetime(120.0);
meta.insert("stats", msav::MetaValue::Object(json!({})));
meta.insert("rules", msav::MetaValue::Object(json!({"spawns": []})));

let mut content = ContentRegistry::new();
content.set(ContentType::Block, vec!["air".into(), "duo".into()]);

let mut map = TileMap::new(3, 1);
let tile = map.get_mut(1, 0).unwrap();
tile.block_id = 1;
tile.block = Some(BlockState::new(BlockKind::Duo));

let doc = SaveDocument {
    version: 2,
    meta,
    content,
    map,
    entities: Default::default(),
};

let data = doc.encode()?;
assert_eq!(&data[..4], b"MSAV");

let decoded = SaveDocument::decode(&data)?;
assert_eq!(decoded, doc);
assert_eq!(decoded.encode()?, data);
# Ok::<(), msav::Error>(())
```

## Lenient Decoding

Every section, block, and actor is framed by its length. A frame whose body
does not consume exactly the declared length is an error by default. The
decoder can be told to log the mismatch and continue after the declared end
instead:

```rust
use msav::{DecodeOptions, LengthMismatchStrategy};

let data = b"MSAV\x00\x00\x00\x01";
let result = DecodeOptions::new()
    .length_mismatch(LengthMismatchStrategy::Realign)
    .decode(&data[..]);
assert!(result.is_err());
```

## Compression

Saves on disk are zlib compressed. With the `compression` feature enabled,
[`SaveDocument::from_compressed`] and [`SaveDocument::to_compressed`] take
care of the wrapping.

*/

mod chunk;
mod content;
mod cursor;
mod document;
mod entity;
mod errors;
mod map;
mod meta;

#[cfg(feature = "compression")]
pub mod envelope;

pub use self::chunk::*;
pub use self::content::*;
pub use self::cursor::*;
pub use self::document::*;
pub use self::entity::*;
pub use self::errors::*;
pub use self::map::*;
pub use self::meta::{
    default_spawns, relaxed, Meta, MetaValue, INTEGER_KEYS, OBJECT_KEYS, WAVETIME_KEY,
};
