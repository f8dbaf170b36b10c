use msav::{
    Actor, ActorTrait, BlockExtra, BlockKind, BlockState, ContentRegistry, ContentType,
    DecodeOptions, Entities, ErrorKind, Fire, ItemStack, LengthMismatchStrategy, Meta, MetaValue,
    Player, SaveDocument, Tile, TileMap, Unsupported,
};
use serde_json::json;

fn meta() -> Meta {
    let mut meta = Meta::new();
    meta.insert("wave", MetaValue::Integer(7));
    meta.insert("build", MetaValue::Integer(126));
    meta.insert("width", MetaValue::Integer(2));
    meta.insert("height", MetaValue::Integer(1));
    meta.insert("saved", MetaValue::Integer(1_571_000_000_000));
    meta.insert("playtime", MetaValue::Integer(3600));
    meta.set_wavetime(1800.0);
    meta.insert("stats", MetaValue::Object(json!({"wavesLasted": 7})));
    meta.insert(
        "rules",
        MetaValue::Object(json!({"waves": true, "spawns": [{"type": "dagger", "end": 10}]})),
    );
    meta
}

fn scenario() -> SaveDocument {
    let mut content = ContentRegistry::new();
    content.set(
        ContentType::Block,
        vec!["air".into(), "rocks".into(), "copper-wall".into()],
    );

    let mut map = TileMap::new(2, 1);
    map.tiles[0] = Tile::new(2, 0, 0);
    map.tiles[1] = Tile {
        floor_id: 3,
        ore_id: 0,
        block_id: 2,
        block: Some(BlockState::new(BlockKind::CopperWall)),
    };

    SaveDocument {
        version: 1,
        meta: meta(),
        content,
        map,
        entities: Entities::default(),
    }
}

fn section(data: &[u8], index: usize) -> (usize, usize) {
    let mut start = 8;
    for i in 0..=index {
        let len = i32::from_be_bytes([data[start], data[start + 1], data[start + 2], data[start + 3]]);
        if i == index {
            return (start + 4, len as usize);
        }
        start += 4 + len as usize;
    }
    unreachable!()
}

#[test]
fn test_scenario_round_trip() {
    let doc = scenario();
    let data = doc.encode().unwrap();
    assert_eq!(&data[..8], b"MSAV\x00\x00\x00\x01");

    let decoded = SaveDocument::decode(&data).unwrap();
    assert_eq!(decoded, doc);
    assert_eq!(decoded.encode().unwrap(), data);
}

#[test]
fn test_sections_cover_the_document() {
    let data = scenario().encode().unwrap();
    let (start, len) = section(&data, 3);
    assert_eq!(start + len, data.len());

    // no actors: a single zero group count
    assert_eq!(&data[start..], &[0]);
}

#[test]
fn test_map_section_bytes() {
    let data = scenario().encode().unwrap();
    let (start, len) = section(&data, 2);
    let map = &data[start..start + len];

    // dimensions, then one floor record per tile
    assert_eq!(&map[..14], &[0, 2, 0, 1, 0, 2, 0, 0, 0, 0, 3, 0, 0, 0]);

    // a single air tile then the wall id and its framed state
    assert_eq!(&map[14..19], &[0, 0, 0, 0, 2]);
    let declared = u16::from_be_bytes([map[19], map[20]]);
    assert_eq!(usize::from(declared), len - 21);
}

#[test]
fn test_edited_document() {
    let mut doc = SaveDocument::decode(&scenario().encode().unwrap()).unwrap();
    doc.meta.set_wave(8);
    let wall = doc.map.get_mut(1, 0).unwrap().block.as_mut().unwrap();
    wall.record.health = 80;
    wall.record.team = 2;

    let decoded = SaveDocument::decode(&doc.encode().unwrap()).unwrap();
    assert_eq!(decoded.meta.wave(), Some(8));
    let wall = decoded.map.get(1, 0).unwrap().block.as_ref().unwrap();
    assert_eq!(wall.record.health, 80);
    assert_eq!(wall.record.team, 2);
    assert_eq!(wall.extra, BlockExtra::None);
}

#[test]
fn test_default_spawns() {
    let mut doc = scenario();
    doc.meta.insert("rules", MetaValue::Object(json!({"waves": true})));
    let data = doc.encode().unwrap();

    let decoded = SaveDocument::decode(&data).unwrap();
    assert!(decoded.meta.spawns_defaulted());
    let spawns = decoded.meta.rules().unwrap()["spawns"].as_array().unwrap();
    assert!(!spawns.is_empty());

    // untouched defaults are not written back
    assert_eq!(decoded.encode().unwrap(), data);
}

#[test]
fn test_bad_magic() {
    let mut data = scenario().encode().unwrap();
    data[3] = b'X';
    let err = SaveDocument::decode(&data).unwrap_err();
    match err.kind() {
        ErrorKind::BadMagic { found } => assert_eq!(found, b"MSAX"),
        x => panic!("unexpected error: {:?}", x),
    }
}

#[test]
fn test_unresolved_block_id() {
    let mut doc = scenario();
    doc.content
        .set(ContentType::Block, vec!["air".into(), "rocks".into()]);
    let err = doc.encode().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
            category: ContentType::Block,
            id: 2
        })
    ));
}

#[test]
fn test_unresolved_item_id() {
    let mut doc = scenario();
    doc.content.set(
        ContentType::Block,
        vec!["air".into(), "rocks".into(), "container".into()],
    );
    doc.content
        .set(ContentType::Item, vec!["copper".into(), "lead".into()]);
    let mut container = BlockState::new(BlockKind::Container);
    if let Some(items) = container.record.items.as_mut() {
        items.push(ItemStack {
            item_id: 1,
            item_amount: 50,
        });
    }
    doc.map.tiles[1].block = Some(container);
    let data = doc.encode().unwrap();
    assert_eq!(SaveDocument::decode(&data).unwrap(), doc);

    // a registry without the second item rejects the stack
    let mut unknown = doc.clone();
    unknown.content.set(ContentType::Item, vec!["copper".into()]);
    let err = unknown.encode().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
            category: ContentType::Item,
            id: 1
        })
    ));

    let stack = doc.map.tiles[1].block.as_mut().unwrap();
    stack.record.items.as_mut().unwrap()[0].item_id = 200;
    let err = doc.encode().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
            category: ContentType::Item,
            id: 200
        })
    ));
}

#[test]
fn test_block_state_framing_mismatch() {
    let mut data = scenario().encode().unwrap();

    // grow the declared length of the wall frame by one without adding a byte
    let (start, _) = section(&data, 2);
    let frame = start + 19;
    let declared = u16::from_be_bytes([data[frame], data[frame + 1]]);
    data[frame..frame + 2].copy_from_slice(&(declared + 1).to_be_bytes());

    let err = SaveDocument::decode(&data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ChunkLengthMismatch { .. }));
}

#[test]
fn test_realign_skips_stray_bytes() {
    let doc = scenario();
    let mut data = doc.encode().unwrap();

    // grow the content section by a stray trailing byte
    let (start, len) = section(&data, 1);
    data[start - 4..start].copy_from_slice(&(len as i32 + 1).to_be_bytes());
    data.insert(start + len, 0xee);

    assert!(SaveDocument::decode(&data).is_err());
    let decoded = DecodeOptions::new()
        .length_mismatch(LengthMismatchStrategy::Realign)
        .decode(&data)
        .unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_actors_round_trip() {
    let mut doc = scenario();
    doc.entities.groups = vec![
        vec![Actor {
            type_id: 15,
            version: 0,
            payload: ActorTrait::Fire(Fire {
                loaded_position: 1,
                lifetime: 240.0,
                time: 12.5,
            }),
        }],
        Vec::new(),
        vec![Actor {
            type_id: 17,
            version: 0,
            payload: ActorTrait::Player(Player::Remote),
        }],
    ];

    let data = doc.encode().unwrap();
    let decoded = SaveDocument::decode(&data).unwrap();
    assert_eq!(decoded.entities, doc.entities);
    assert_eq!(decoded.entities.of_type(15).count(), 1);
}

#[test]
fn test_json_output() {
    let value = serde_json::to_value(scenario()).unwrap();
    assert_eq!(value["version"], json!(1));
    assert_eq!(value["meta"]["wave"], json!(7));
    let blocks = usize::from(ContentType::Block.id());
    assert_eq!(value["content"][blocks][2], json!("copper-wall"));
    assert_eq!(value["map"]["tiles"][1]["blockId"], json!(2));
    assert_eq!(value["map"]["tiles"][1]["block"]["record"]["health"], json!(0));
}

#[cfg(feature = "compression")]
#[test]
fn test_compressed_round_trip() {
    let doc = scenario();
    let compressed = doc.to_compressed().unwrap();
    assert_eq!(SaveDocument::from_compressed(&compressed).unwrap(), doc);
    assert_eq!(
        msav::envelope::inflate(&compressed).unwrap(),
        doc.encode().unwrap()
    );
}
