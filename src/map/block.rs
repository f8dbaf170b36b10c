use super::extra::{BlockExtra, ExtraShape};
use crate::{
    ByteCursor, ContentRegistry, ContentType, EntityRecord, Error, LengthPrefix, RecordLayout,
    Unsupported,
};
use serde::{Deserialize, Serialize};

/// What the codec needs to know to read and write a block kind
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BlockDescriptor {
    /// Optional sub-records of the entity record
    pub layout: RecordLayout,

    /// Payload following the entity record
    pub extra: ExtraShape,

    /// Only the first revision of the block is understood
    pub revision_guard: bool,
}

macro_rules! layout {
    ($($flag:ident),*) => {{
        #[allow(unused_mut)]
        let mut layout = RecordLayout {
            consume: true,
            ..RecordLayout::default()
        };
        $(layout.$flag = true;)*
        layout
    }};
}

macro_rules! block_kinds {
    ($($variant:ident => $name:literal, [$($flag:ident),*], $shape:ident;)*) => {
        /// Every block that carries an entity
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
        pub enum BlockKind {
            $($variant,)*
        }

        impl BlockKind {
            /// All block kinds in table order
            pub const ALL: &'static [BlockKind] = &[$(BlockKind::$variant,)*];

            /// The content name of the block
            pub fn name(&self) -> &'static str {
                match self {
                    $(BlockKind::$variant => $name,)*
                }
            }

            /// Lookup a block kind from its content name
            pub fn from_name(name: &str) -> Option<BlockKind> {
                match name {
                    $($name => Some(BlockKind::$variant),)*
                    _ => None,
                }
            }

            pub fn descriptor(&self) -> BlockDescriptor {
                match self {
                    $(BlockKind::$variant => BlockDescriptor {
                        layout: layout!($($flag),*),
                        extra: ExtraShape::$shape,
                        revision_guard: matches!(self, BlockKind::Sorter | BlockKind::OverflowGate),
                    },)*
                }
            }
        }
    };
}

block_kinds! {
    Build1 => "build1", [], Construct;
    Build2 => "build2", [], Construct;
    Build3 => "build3", [], Construct;
    Container => "container", [items], None;
    Vault => "vault", [items], None;
    CommandCenter => "command-center", [items], None;
    CoreShard => "core-shard", [items], None;
    Battery => "battery", [power], None;
    SurgeTower => "surge-tower", [power], None;
    BatteryLarge => "battery-large", [power], None;
    Incinerator => "incinerator", [power, liquids], None;
    ForceProjector => "force-projector", [items, power, liquids], ForceProjector;
    PhaseConveyor => "phase-conveyor", [items, power], ItemBridge;
    MassDriver => "mass-driver", [items, power], MassDriver;
    Junction => "junction", [], Junction;
    OverflowGate => "overflow-gate", [items], None;
    Router => "router", [items], None;
    Distributor => "distributor", [items], None;
    Sorter => "sorter", [], Sorter;
    BridgeConveyor => "bridge-conveyor", [items], BufferedBridge;
    Conveyor => "conveyor", [items], Conveyor;
    TitaniumConveyor => "titanium-conveyor", [items], Conveyor;
    PhaseWeaver => "phase-weaver", [items, power], Crafter;
    MultiPress => "multi-press", [items, power, liquids], Crafter;
    Cryofluidmixer => "cryofluidmixer", [items, power, liquids], Crafter;
    CoalCentrifuge => "coal-centrifuge", [items, power, liquids], Crafter;
    SporePress => "spore-press", [items, power, liquids], Crafter;
    PlastaniumCompressor => "plastanium-compressor", [items, power, liquids], Crafter;
    GraphitePress => "graphite-press", [items], Crafter;
    AlloySmelter => "alloy-smelter", [items, power], Crafter;
    SiliconSmelter => "silicon-smelter", [items, power], Crafter;
    BlastMixer => "blast-mixer", [items, power], Crafter;
    PyratiteMixer => "pyratite-mixer", [items, power], Crafter;
    Kiln => "kiln", [items, power], Crafter;
    Cultivator => "cultivator", [items, power, liquids], Cultivator;
    Meltdown => "meltdown", [power, liquids], None;
    RtgGenerator => "rtg-generator", [items, power], Generator;
    TurbineGenerator => "turbine-generator", [items, power, liquids], Generator;
    DifferentialGenerator => "differential-generator", [items, power, liquids], Generator;
    SolarPanel => "solar-panel", [power], Generator;
    SolarPanelLarge => "solar-panel-large", [power], Generator;
    ThermalGenerator => "thermal-generator", [power], Generator;
    ImpactReactor => "impact-reactor", [items, power, liquids], ImpactReactor;
    PowerNode => "power-node", [power], None;
    PowerNodeLarge => "power-node-large", [power], None;
    Wave => "wave", [liquids], None;
    Arc => "arc", [power, liquids], None;
    Lancer => "lancer", [power, liquids], None;
    Salvo => "salvo", [items, liquids], Turret;
    Duo => "duo", [items, liquids], Turret;
    Spectre => "spectre", [items, liquids], Turret;
    Fuse => "fuse", [items, liquids], Turret;
    Ripple => "ripple", [items, liquids], Turret;
    Scorch => "scorch", [items, liquids], Turret;
    Cyclone => "cyclone", [items, liquids], Turret;
    Swarmer => "swarmer", [items, liquids], Turret;
    PhaseConduit => "phase-conduit", [power, liquids], ItemBridge;
    BridgeConduit => "bridge-conduit", [liquids], ItemBridge;
    LiquidTank => "liquid-tank", [liquids], None;
    LiquidJunction => "liquid-junction", [liquids], None;
    MechanicalPump => "mechanical-pump", [liquids], None;
    PulseConduit => "pulse-conduit", [liquids], None;
    LiquidRouter => "liquid-router", [liquids], None;
    OverdriveProjector => "overdrive-projector", [items, power], Mender;
    Mender => "mender", [items, power], Mender;
    MendProjector => "mend-projector", [items, power], Mender;
    Unloader => "unloader", [items], Unloader;
    TauMechPad => "tau-mech-pad", [power], MechPad;
    OmegaMechPad => "omega-mech-pad", [power], MechPad;
    DeltaMechPad => "delta-mech-pad", [power], MechPad;
    DartMechPad => "dart-mech-pad", [power], MechPad;
    GlaiveShipPad => "glaive-ship-pad", [power], MechPad;
    JavelinShipPad => "javelin-ship-pad", [power], MechPad;
    TridentShipPad => "trident-ship-pad", [power], MechPad;
    RevenantFactory => "revenant-factory", [items, power], UnitFactory;
    DraugFactory => "draug-factory", [items, power], UnitFactory;
    PhantomFactory => "phantom-factory", [items, power], UnitFactory;
    TitanFactory => "titan-factory", [items, power], UnitFactory;
    WraithFactory => "wraith-factory", [items, power], UnitFactory;
    CrawlerFactory => "crawler-factory", [items, power], UnitFactory;
    FortressFactory => "fortress-factory", [items, power], UnitFactory;
    SpiritFactory => "spirit-factory", [items, power], UnitFactory;
    ShockMine => "shock-mine", [], None;
    ScrapWall => "scrap-wall", [], None;
    ScrapWallLarge => "scrap-wall-large", [], None;
    ThoriumWall => "thorium-wall", [], None;
    ThoriumWallLarge => "thorium-wall-large", [], None;
    SurgeWall => "surge-wall", [], None;
    SurgeWallLarge => "surge-wall-large", [], None;
    TitaniumWall => "titanium-wall", [], None;
    TitaniumWallLarge => "titanium-wall-large", [], None;
    PhaseWall => "phase-wall", [], None;
    PhaseWallLarge => "phase-wall-large", [], None;
    CopperWall => "copper-wall", [], None;
    CopperWallLarge => "copper-wall-large", [], None;
    Door => "door", [], Door;
    PneumaticDrill => "pneumatic-drill", [items, liquids], None;
    MechanicalDrill => "mechanical-drill", [items, liquids], None;
    OilExtractor => "oil-extractor", [items, power, liquids], None;
    LaserDrill => "laser-drill", [items, power, liquids], None;
    BlastDrill => "blast-drill", [items, power, liquids], None;
    WaterExtractor => "water-extractor", [power, liquids], None;
    RotaryPump => "rotary-pump", [power, liquids], None;
    ThermalPump => "thermal-pump", [power, liquids], None;
    RepairPoint => "repair-point", [power], None;
}

const TERRAIN: [&str; 13] = [
    "air",
    "cliffs",
    "sand-boulder",
    "sandrocks",
    "snowrocks",
    "icerocks",
    "dunerocks",
    "rocks",
    "rock",
    "snowrock",
    "pine",
    "snow-pine",
    "shrubs",
];

/// Returns true if tiles with this block name never carry an entity. Besides
/// the fixed set of boulders and vegetation this covers the `part_<dx>_<dy>`
/// fragments of multi-tile blocks.
///
/// ```
/// use msav::is_terrain;
/// assert!(is_terrain("air"));
/// assert!(is_terrain("part_-1_2"));
/// assert!(!is_terrain("part_a_2"));
/// assert!(!is_terrain("duo"));
/// ```
pub fn is_terrain(name: &str) -> bool {
    if TERRAIN.contains(&name) {
        return true;
    }

    name.strip_prefix("part_")
        .and_then(|rest| rest.split_once('_'))
        .map_or(false, |(dx, dy)| {
            dx.parse::<i32>().is_ok() && dy.parse::<i32>().is_ok()
        })
}

/// How tiles with a given block id are coded
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TileKind {
    /// Run length coded with no entity
    Terrain,

    /// Framed entity record and payload
    Block(BlockKind),
}

/// Block ids of a document mapped to how their tiles are coded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTable<'a> {
    names: &'a [String],
    kinds: Vec<Option<TileKind>>,
}

impl<'a> BlockTable<'a> {
    /// Classify every name of the block category of the content header.
    /// Names that are not known are only reported once a tile uses them.
    pub fn new(content: &'a ContentRegistry) -> Self {
        let names = content.get(ContentType::Block).unwrap_or(&[]);
        let kinds = names
            .iter()
            .map(|name| {
                if is_terrain(name) {
                    Some(TileKind::Terrain)
                } else {
                    BlockKind::from_name(name).map(TileKind::Block)
                }
            })
            .collect();

        BlockTable { names, kinds }
    }

    /// The kind of tile behind a block id
    #[inline]
    pub fn resolve(&self, id: i16) -> Result<TileKind, Error> {
        let idx = usize::try_from(id).ok().filter(|&x| x < self.kinds.len());
        let Some(idx) = idx else {
            return Err(Error::unsupported(Unsupported::UnresolvedContent {
                category: ContentType::Block,
                id: i32::from(id),
            }));
        };

        self.kinds[idx].ok_or_else(|| {
            Error::unsupported(Unsupported::UnknownBlock {
                id,
                name: self.names[idx].clone(),
            })
        })
    }
}

/// The entity of a tile
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockState {
    pub record: EntityRecord,
    pub extra: BlockExtra,
}

impl BlockState {
    /// A zeroed state with the sub-records and payload the kind requires
    pub fn new(kind: BlockKind) -> Self {
        let descriptor = kind.descriptor();
        BlockState {
            record: EntityRecord::new(descriptor.layout),
            extra: BlockExtra::empty(descriptor.extra),
        }
    }

    /// Decode a framed block state
    pub fn read(
        cursor: &mut ByteCursor,
        kind: BlockKind,
        content: &ContentRegistry,
    ) -> Result<Self, Error> {
        let descriptor = kind.descriptor();
        cursor.read_chunk(LengthPrefix::Short, |c| {
            let record = EntityRecord::read(c, descriptor.layout, content)?;
            if descriptor.revision_guard && record.version != 0 {
                return Err(Error::unsupported(Unsupported::Revision {
                    block: kind.name(),
                    version: record.version,
                }));
            }

            let extra = BlockExtra::read(c, descriptor.extra, content)?;
            Ok(BlockState { record, extra })
        })
    }

    /// Encode a framed block state after checking it against the kind
    pub fn write(
        &self,
        cursor: &mut ByteCursor,
        kind: BlockKind,
        content: &ContentRegistry,
    ) -> Result<(), Error> {
        let descriptor = kind.descriptor();
        if self.record.layout() != descriptor.layout || self.extra.shape() != descriptor.extra {
            return Err(Error::unsupported(Unsupported::BlockShape {
                block: kind.name(),
            }));
        }

        if descriptor.revision_guard && self.record.version != 0 {
            return Err(Error::unsupported(Unsupported::Revision {
                block: kind.name(),
                version: self.record.version,
            }));
        }

        cursor.write_chunk(LengthPrefix::Short, |c| {
            self.record.write(c, content)?;
            self.extra.write(c, content)
        })
    }
}
