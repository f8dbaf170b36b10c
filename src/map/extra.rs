use crate::{ByteCursor, ContentRegistry, ContentType, Error};
use serde::{Deserialize, Serialize};

/// The closed set of payload shapes that follow the entity record of a block
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ExtraShape {
    None,
    Construct,
    ForceProjector,
    ItemBridge,
    BufferedBridge,
    MassDriver,
    Junction,
    Sorter,
    Conveyor,
    Crafter,
    Cultivator,
    Generator,
    ImpactReactor,
    Turret,
    Mender,
    Unloader,
    MechPad,
    UnitFactory,
    Door,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    pub accumulator: f32,
    pub total: f32,
}

/// A block under construction or deconstruction
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construct {
    pub progress: f32,

    /// Block id being replaced, -1 when none
    pub previous: i16,

    /// Block id being built, -1 when none
    pub current: i16,

    /// Absent when the wire count is -1
    #[serde(default)]
    pub accumulator: Option<Vec<Accumulator>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceProjector {
    pub broken: bool,
    pub buildup: f32,
    pub radius_scale: f32,
    pub warmup: f32,
    pub phase_heat: f32,
}

/// Item and liquid bridges
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBridge {
    pub link: i32,
    pub uptime: f32,

    /// Positions of the bridges that feed into this one
    pub incoming: Vec<i32>,
}

/// A ring buffer of packed item entries
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBuffer {
    pub index: u8,
    pub items: Vec<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedBridge {
    pub bridge: ItemBridge,
    pub buffer: ItemBuffer,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassDriver {
    pub link: i32,
    pub rotation: f32,
    pub state: u8,
}

/// One buffer per direction
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub buffers: [ItemBuffer; 4],
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sorter {
    pub sort_item: i16,
}

/// Packed positions and ids of the items riding the belt
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conveyor {
    pub items: Vec<u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crafter {
    pub progress: f32,
    pub warmup: f32,
}

/// The game writes the warmup twice. Both copies are kept so that they
/// survive a round trip even when they differ.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cultivator {
    pub progress: f32,
    pub warmup: f32,
    pub warmup_repeat: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub production_efficiency: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReactor {
    pub production_efficiency: f32,
    pub warmup: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurretAmmo {
    pub item_id: u8,
    pub ammo: i16,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    pub ammo: Vec<TurretAmmo>,
}

/// Menders and overdrive projectors
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mender {
    pub heat: f32,
    pub phase_heat: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unloader {
    pub item_id: u8,
}

/// Mech and ship pads
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechPad {
    pub progress: f32,
    pub time: f32,
    pub heat: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFactory {
    pub build_time: f32,
    pub spawned: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub open: bool,
}

/// The block specific payload that follows the entity record
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockExtra {
    #[default]
    None,
    Construct(Construct),
    ForceProjector(ForceProjector),
    ItemBridge(ItemBridge),
    BufferedBridge(BufferedBridge),
    MassDriver(MassDriver),
    Junction(Junction),
    Sorter(Sorter),
    Conveyor(Conveyor),
    Crafter(Crafter),
    Cultivator(Cultivator),
    Generator(Generator),
    ImpactReactor(ImpactReactor),
    Turret(Turret),
    Mender(Mender),
    Unloader(Unloader),
    MechPad(MechPad),
    UnitFactory(UnitFactory),
    Door(Door),
}

fn read_bridge(cursor: &mut ByteCursor) -> Result<ItemBridge, Error> {
    let link = cursor.read_i32()?;
    let uptime = cursor.read_f32()?;
    let count = cursor.read_u8()?;
    let mut incoming = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        incoming.push(cursor.read_i32()?);
    }

    Ok(ItemBridge {
        link,
        uptime,
        incoming,
    })
}

fn write_bridge(cursor: &mut ByteCursor, bridge: &ItemBridge) -> Result<(), Error> {
    cursor.write_i32(bridge.link)?;
    cursor.write_f32(bridge.uptime);
    cursor.write_u8(bridge.incoming.len())?;
    for &x in &bridge.incoming {
        cursor.write_i32(x)?;
    }
    Ok(())
}

fn read_buffer(cursor: &mut ByteCursor) -> Result<ItemBuffer, Error> {
    let index = cursor.read_u8()?;
    let count = cursor.read_u8()?;
    let mut items = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        items.push(cursor.read_i64()?);
    }
    Ok(ItemBuffer { index, items })
}

fn write_buffer(cursor: &mut ByteCursor, buffer: &ItemBuffer) -> Result<(), Error> {
    cursor.write_u8(buffer.index)?;
    cursor.write_u8(buffer.items.len())?;
    for &x in &buffer.items {
        cursor.write_i64(x)?;
    }
    Ok(())
}

impl BlockExtra {
    /// The shape of the payload
    pub fn shape(&self) -> ExtraShape {
        match self {
            BlockExtra::None => ExtraShape::None,
            BlockExtra::Construct(_) => ExtraShape::Construct,
            BlockExtra::ForceProjector(_) => ExtraShape::ForceProjector,
            BlockExtra::ItemBridge(_) => ExtraShape::ItemBridge,
            BlockExtra::BufferedBridge(_) => ExtraShape::BufferedBridge,
            BlockExtra::MassDriver(_) => ExtraShape::MassDriver,
            BlockExtra::Junction(_) => ExtraShape::Junction,
            BlockExtra::Sorter(_) => ExtraShape::Sorter,
            BlockExtra::Conveyor(_) => ExtraShape::Conveyor,
            BlockExtra::Crafter(_) => ExtraShape::Crafter,
            BlockExtra::Cultivator(_) => ExtraShape::Cultivator,
            BlockExtra::Generator(_) => ExtraShape::Generator,
            BlockExtra::ImpactReactor(_) => ExtraShape::ImpactReactor,
            BlockExtra::Turret(_) => ExtraShape::Turret,
            BlockExtra::Mender(_) => ExtraShape::Mender,
            BlockExtra::Unloader(_) => ExtraShape::Unloader,
            BlockExtra::MechPad(_) => ExtraShape::MechPad,
            BlockExtra::UnitFactory(_) => ExtraShape::UnitFactory,
            BlockExtra::Door(_) => ExtraShape::Door,
        }
    }

    /// A zeroed payload of the given shape
    pub fn empty(shape: ExtraShape) -> Self {
        match shape {
            ExtraShape::None => BlockExtra::None,
            ExtraShape::Construct => BlockExtra::Construct(Construct {
                previous: -1,
                current: -1,
                ..Construct::default()
            }),
            ExtraShape::ForceProjector => BlockExtra::ForceProjector(ForceProjector::default()),
            ExtraShape::ItemBridge => BlockExtra::ItemBridge(ItemBridge::default()),
            ExtraShape::BufferedBridge => BlockExtra::BufferedBridge(BufferedBridge::default()),
            ExtraShape::MassDriver => BlockExtra::MassDriver(MassDriver::default()),
            ExtraShape::Junction => BlockExtra::Junction(Junction::default()),
            ExtraShape::Sorter => BlockExtra::Sorter(Sorter::default()),
            ExtraShape::Conveyor => BlockExtra::Conveyor(Conveyor::default()),
            ExtraShape::Crafter => BlockExtra::Crafter(Crafter::default()),
            ExtraShape::Cultivator => BlockExtra::Cultivator(Cultivator::default()),
            ExtraShape::Generator => BlockExtra::Generator(Generator::default()),
            ExtraShape::ImpactReactor => BlockExtra::ImpactReactor(ImpactReactor::default()),
            ExtraShape::Turret => BlockExtra::Turret(Turret::default()),
            ExtraShape::Mender => BlockExtra::Mender(Mender::default()),
            ExtraShape::Unloader => BlockExtra::Unloader(Unloader::default()),
            ExtraShape::MechPad => BlockExtra::MechPad(MechPad::default()),
            ExtraShape::UnitFactory => BlockExtra::UnitFactory(UnitFactory::default()),
            ExtraShape::Door => BlockExtra::Door(Door::default()),
        }
    }

    /// Decode a payload. Turret ammunition must name a known item. The
    /// sorter and unloader selections may be empty and are kept as is.
    pub fn read(
        cursor: &mut ByteCursor,
        shape: ExtraShape,
        content: &ContentRegistry,
    ) -> Result<Self, Error> {
        let result = match shape {
            ExtraShape::None => BlockExtra::None,
            ExtraShape::Construct => {
                let progress = cursor.read_f32()?;
                let previous = cursor.read_i16()?;
                let current = cursor.read_i16()?;
                let count = cursor.read_i8()?;
                let accumulator = match count {
                    -1 => None,
                    x if x < 0 => return Err(Error::out_of_range(x, "accumulator count")),
                    x => {
                        let mut result = Vec::with_capacity(x as usize);
                        for _ in 0..x {
                            let accumulator = cursor.read_f32()?;
                            let total = cursor.read_f32()?;
                            result.push(Accumulator { accumulator, total });
                        }
                        Some(result)
                    }
                };

                BlockExtra::Construct(Construct {
                    progress,
                    previous,
                    current,
                    accumulator,
                })
            }
            ExtraShape::ForceProjector => BlockExtra::ForceProjector(ForceProjector {
                broken: cursor.read_bool()?,
                buildup: cursor.read_f32()?,
                radius_scale: cursor.read_f32()?,
                warmup: cursor.read_f32()?,
                phase_heat: cursor.read_f32()?,
            }),
            ExtraShape::ItemBridge => BlockExtra::ItemBridge(read_bridge(cursor)?),
            ExtraShape::BufferedBridge => {
                let bridge = read_bridge(cursor)?;
                let buffer = read_buffer(cursor)?;
                BlockExtra::BufferedBridge(BufferedBridge { bridge, buffer })
            }
            ExtraShape::MassDriver => BlockExtra::MassDriver(MassDriver {
                link: cursor.read_i32()?,
                rotation: cursor.read_f32()?,
                state: cursor.read_u8()?,
            }),
            ExtraShape::Junction => BlockExtra::Junction(Junction {
                buffers: [
                    read_buffer(cursor)?,
                    read_buffer(cursor)?,
                    read_buffer(cursor)?,
                    read_buffer(cursor)?,
                ],
            }),
            ExtraShape::Sorter => BlockExtra::Sorter(Sorter {
                sort_item: cursor.read_i16()?,
            }),
            ExtraShape::Conveyor => {
                let count = cursor.read_i32()?;
                let count =
                    usize::try_from(count).map_err(|_| Error::out_of_range(count, "item count"))?;
                let mut items = Vec::with_capacity(count.min(cursor.remaining() / 4));
                for _ in 0..count {
                    items.push(cursor.read_u32()?);
                }
                BlockExtra::Conveyor(Conveyor { items })
            }
            ExtraShape::Crafter => BlockExtra::Crafter(Crafter {
                progress: cursor.read_f32()?,
                warmup: cursor.read_f32()?,
            }),
            ExtraShape::Cultivator => BlockExtra::Cultivator(Cultivator {
                progress: cursor.read_f32()?,
                warmup: cursor.read_f32()?,
                warmup_repeat: cursor.read_f32()?,
            }),
            ExtraShape::Generator => BlockExtra::Generator(Generator {
                production_efficiency: cursor.read_f32()?,
            }),
            ExtraShape::ImpactReactor => BlockExtra::ImpactReactor(ImpactReactor {
                production_efficiency: cursor.read_f32()?,
                warmup: cursor.read_f32()?,
            }),
            ExtraShape::Turret => {
                let count = cursor.read_u8()?;
                let mut ammo = Vec::with_capacity(usize::from(count));
                for _ in 0..count {
                    let item_id = cursor.read_u8()?;
                    content.check(ContentType::Item, item_id)?;
                    let amount = cursor.read_i16()?;
                    ammo.push(TurretAmmo {
                        item_id,
                        ammo: amount,
                    });
                }
                BlockExtra::Turret(Turret { ammo })
            }
            ExtraShape::Mender => BlockExtra::Mender(Mender {
                heat: cursor.read_f32()?,
                phase_heat: cursor.read_f32()?,
            }),
            ExtraShape::Unloader => BlockExtra::Unloader(Unloader {
                item_id: cursor.read_u8()?,
            }),
            ExtraShape::MechPad => BlockExtra::MechPad(MechPad {
                progress: cursor.read_f32()?,
                time: cursor.read_f32()?,
                heat: cursor.read_f32()?,
            }),
            ExtraShape::UnitFactory => BlockExtra::UnitFactory(UnitFactory {
                build_time: cursor.read_f32()?,
                spawned: cursor.read_i32()?,
            }),
            ExtraShape::Door => BlockExtra::Door(Door {
                open: cursor.read_bool()?,
            }),
        };

        Ok(result)
    }

    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        match self {
            BlockExtra::None => {}
            BlockExtra::Construct(x) => {
                cursor.write_f32(x.progress);
                cursor.write_i16(x.previous)?;
                cursor.write_i16(x.current)?;
                match &x.accumulator {
                    None => cursor.write_i8(-1)?,
                    Some(acc) => {
                        cursor.write_i8(acc.len())?;
                        for entry in acc {
                            cursor.write_f32(entry.accumulator);
                            cursor.write_f32(entry.total);
                        }
                    }
                }
            }
            BlockExtra::ForceProjector(x) => {
                cursor.write_bool(x.broken);
                cursor.write_f32(x.buildup);
                cursor.write_f32(x.radius_scale);
                cursor.write_f32(x.warmup);
                cursor.write_f32(x.phase_heat);
            }
            BlockExtra::ItemBridge(x) => write_bridge(cursor, x)?,
            BlockExtra::BufferedBridge(x) => {
                write_bridge(cursor, &x.bridge)?;
                write_buffer(cursor, &x.buffer)?;
            }
            BlockExtra::MassDriver(x) => {
                cursor.write_i32(x.link)?;
                cursor.write_f32(x.rotation);
                cursor.write_u8(x.state)?;
            }
            BlockExtra::Junction(x) => {
                for buffer in &x.buffers {
                    write_buffer(cursor, buffer)?;
                }
            }
            BlockExtra::Sorter(x) => cursor.write_i16(x.sort_item)?,
            BlockExtra::Conveyor(x) => {
                cursor.write_i32(x.items.len())?;
                for &item in &x.items {
                    cursor.write_u32(item)?;
                }
            }
            BlockExtra::Crafter(x) => {
                cursor.write_f32(x.progress);
                cursor.write_f32(x.warmup);
            }
            BlockExtra::Cultivator(x) => {
                cursor.write_f32(x.progress);
                cursor.write_f32(x.warmup);
                cursor.write_f32(x.warmup_repeat);
            }
            BlockExtra::Generator(x) => cursor.write_f32(x.production_efficiency),
            BlockExtra::ImpactReactor(x) => {
                cursor.write_f32(x.production_efficiency);
                cursor.write_f32(x.warmup);
            }
            BlockExtra::Turret(x) => {
                cursor.write_u8(x.ammo.len())?;
                for entry in &x.ammo {
                    content.check(ContentType::Item, entry.item_id)?;
                    cursor.write_u8(entry.item_id)?;
                    cursor.write_i16(entry.ammo)?;
                }
            }
            BlockExtra::Mender(x) => {
                cursor.write_f32(x.heat);
                cursor.write_f32(x.phase_heat);
            }
            BlockExtra::Unloader(x) => cursor.write_u8(x.item_id)?,
            BlockExtra::MechPad(x) => {
                cursor.write_f32(x.progress);
                cursor.write_f32(x.time);
                cursor.write_f32(x.heat);
            }
            BlockExtra::UnitFactory(x) => {
                cursor.write_f32(x.build_time);
                cursor.write_i32(x.spawned)?;
            }
            BlockExtra::Door(x) => cursor.write_bool(x.open),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::sample_content;
    use crate::{ErrorKind, Unsupported};
    use rstest::*;

    fn read(cursor: &mut ByteCursor, shape: ExtraShape) -> Result<BlockExtra, Error> {
        BlockExtra::read(cursor, shape, &sample_content())
    }

    fn round_trip(extra: &BlockExtra) -> BlockExtra {
        let mut cursor = ByteCursor::new();
        extra.write(&mut cursor, &sample_content()).unwrap();
        let actual = read(&mut cursor, extra.shape()).unwrap();
        assert_eq!(cursor.remaining(), 0);
        actual
    }

    #[test]
    fn test_construct_without_accumulator() {
        let mut cursor = ByteCursor::new();
        cursor.write_f32(0.25);
        cursor.write_i16(-1).unwrap();
        cursor.write_i16(7).unwrap();
        cursor.write_i8(-1).unwrap();

        let extra = read(&mut cursor, ExtraShape::Construct).unwrap();
        let expected = BlockExtra::Construct(Construct {
            progress: 0.25,
            previous: -1,
            current: 7,
            accumulator: None,
        });
        assert_eq!(extra, expected);
    }

    #[test]
    fn test_construct_accumulators() {
        let extra = BlockExtra::Construct(Construct {
            progress: 0.5,
            previous: 3,
            current: 4,
            accumulator: Some(vec![
                Accumulator {
                    accumulator: 1.0,
                    total: 2.0,
                },
                Accumulator {
                    accumulator: 3.0,
                    total: 4.0,
                },
            ]),
        });
        assert_eq!(round_trip(&extra), extra);
    }

    #[test]
    fn test_construct_bad_count() {
        let mut cursor = ByteCursor::new();
        cursor.write_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0xfe]);
        let err = read(&mut cursor, ExtraShape::Construct).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRange { .. }));
    }

    #[test]
    fn test_junction_layout() {
        let mut buffers: [ItemBuffer; 4] = Default::default();
        buffers[2] = ItemBuffer {
            index: 1,
            items: vec![-5],
        };
        let extra = BlockExtra::Junction(Junction { buffers });

        let mut cursor = ByteCursor::new();
        extra.write(&mut cursor, &sample_content()).unwrap();
        assert_eq!(cursor.len(), 2 + 2 + (2 + 8) + 2);
        assert_eq!(read(&mut cursor, ExtraShape::Junction).unwrap(), extra);
    }

    #[test]
    fn test_cultivator_keeps_both_warmups() {
        let extra = BlockExtra::Cultivator(Cultivator {
            progress: 0.1,
            warmup: 0.2,
            warmup_repeat: 0.3,
        });
        assert_eq!(round_trip(&extra), extra);
    }

    #[test]
    fn test_negative_conveyor_count() {
        let mut cursor = ByteCursor::from_vec(vec![0x80, 0, 0, 0]);
        let err = read(&mut cursor, ExtraShape::Conveyor).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRange { .. }));
    }

    #[rstest]
    #[case(ExtraShape::None, 0)]
    #[case(ExtraShape::Construct, 9)]
    #[case(ExtraShape::ForceProjector, 17)]
    #[case(ExtraShape::ItemBridge, 9)]
    #[case(ExtraShape::BufferedBridge, 11)]
    #[case(ExtraShape::MassDriver, 9)]
    #[case(ExtraShape::Junction, 8)]
    #[case(ExtraShape::Sorter, 2)]
    #[case(ExtraShape::Conveyor, 4)]
    #[case(ExtraShape::Crafter, 8)]
    #[case(ExtraShape::Cultivator, 12)]
    #[case(ExtraShape::Generator, 4)]
    #[case(ExtraShape::ImpactReactor, 8)]
    #[case(ExtraShape::Turret, 1)]
    #[case(ExtraShape::Mender, 8)]
    #[case(ExtraShape::Unloader, 1)]
    #[case(ExtraShape::MechPad, 12)]
    #[case(ExtraShape::UnitFactory, 8)]
    #[case(ExtraShape::Door, 1)]
    fn test_empty_payload_width(#[case] shape: ExtraShape, #[case] width: usize) {
        let extra = BlockExtra::empty(shape);
        assert_eq!(extra.shape(), shape);

        let mut cursor = ByteCursor::new();
        extra.write(&mut cursor, &sample_content()).unwrap();
        assert_eq!(cursor.len(), width);
        assert_eq!(read(&mut cursor, shape).unwrap(), extra);
    }

    #[test]
    fn test_turret_ammo_must_resolve() {
        let extra = BlockExtra::Turret(Turret {
            ammo: vec![TurretAmmo {
                item_id: 1,
                ammo: 12,
            }],
        });
        assert_eq!(round_trip(&extra), extra);

        let mut cursor = ByteCursor::new();
        extra.write(&mut cursor, &sample_content()).unwrap();
        let err = BlockExtra::read(&mut cursor, ExtraShape::Turret, &ContentRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
                category: ContentType::Item,
                id: 1
            })
        ));
    }

    #[test]
    fn test_selections_are_not_resolved() {
        let content = ContentRegistry::new();
        for extra in [
            BlockExtra::Sorter(Sorter { sort_item: -1 }),
            BlockExtra::Unloader(Unloader { item_id: 255 }),
        ] {
            let mut cursor = ByteCursor::new();
            extra.write(&mut cursor, &content).unwrap();
            assert_eq!(BlockExtra::read(&mut cursor, extra.shape(), &content).unwrap(), extra);
        }
    }
}
