use super::UnitSave;
use crate::{ByteCursor, ContentRegistry, ContentType, Error, LengthPrefix, Unsupported};
use serde::{Deserialize, Serialize};

/// Actor type ids that carry a unit payload
pub const UNIT_TYPE_IDS: [u8; 5] = [0, 1, 2, 4, 10];
pub const FIRE_TYPE_ID: u8 = 15;
pub const PUDDLE_TYPE_ID: u8 = 16;
pub const PLAYER_TYPE_ID: u8 = 17;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitActor {
    pub info: UnitSave,
    #[serde(rename = "type")]
    pub kind: u8,
    pub spawner: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fire {
    pub loaded_position: i32,
    pub lifetime: f32,
    pub time: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puddle {
    pub loaded_position: i32,
    pub x: f32,
    pub y: f32,
    pub liquid_id: u8,
    pub amount: f32,
    pub generation: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPlayer {
    pub mech_id: u8,
    pub spawner: i32,
    pub info: UnitSave,
}

/// A player is only written out in full on the machine it is local to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Local(LocalPlayer),
    Remote,
}

/// The payload of an actor, selected by its type id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorTrait {
    Unit(UnitActor),
    Fire(Fire),
    Puddle(Puddle),
    Player(Player),
}

impl ActorTrait {
    /// Returns true if the payload is the one dictated by the type id
    pub fn accepts(&self, type_id: u8) -> bool {
        match self {
            ActorTrait::Unit(_) => UNIT_TYPE_IDS.contains(&type_id),
            ActorTrait::Fire(_) => type_id == FIRE_TYPE_ID,
            ActorTrait::Puddle(_) => type_id == PUDDLE_TYPE_ID,
            ActorTrait::Player(_) => type_id == PLAYER_TYPE_ID,
        }
    }
}

/// A free standing simulation actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub type_id: u8,
    pub version: u8,
    #[serde(rename = "trait")]
    pub payload: ActorTrait,
}

impl Actor {
    /// Decode an actor body (the part inside its length prefix). Unit types,
    /// mechs, liquids and the ids inside unit saves must resolve.
    pub fn read(cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<Self, Error> {
        let type_id = cursor.read_u8()?;
        let version = cursor.read_u8()?;
        let payload = match type_id {
            x if UNIT_TYPE_IDS.contains(&x) => {
                let info = UnitSave::read(cursor, content)?;
                let kind = cursor.read_u8()?;
                content.check(ContentType::Unit, kind)?;
                let spawner = cursor.read_i32()?;
                ActorTrait::Unit(UnitActor {
                    info,
                    kind,
                    spawner,
                })
            }
            FIRE_TYPE_ID => ActorTrait::Fire(Fire {
                loaded_position: cursor.read_i32()?,
                lifetime: cursor.read_f32()?,
                time: cursor.read_f32()?,
            }),
            PUDDLE_TYPE_ID => {
                let loaded_position = cursor.read_i32()?;
                let x = cursor.read_f32()?;
                let y = cursor.read_f32()?;
                let liquid_id = cursor.read_u8()?;
                content.check(ContentType::Liquid, liquid_id)?;
                ActorTrait::Puddle(Puddle {
                    loaded_position,
                    x,
                    y,
                    liquid_id,
                    amount: cursor.read_f32()?,
                    generation: cursor.read_u8()?,
                })
            }
            PLAYER_TYPE_ID => {
                if cursor.read_bool()? {
                    let mech_id = cursor.read_u8()?;
                    content.check(ContentType::Mech, mech_id)?;
                    let spawner = cursor.read_i32()?;
                    let info = UnitSave::read(cursor, content)?;
                    ActorTrait::Player(Player::Local(LocalPlayer {
                        mech_id,
                        spawner,
                        info,
                    }))
                } else {
                    ActorTrait::Player(Player::Remote)
                }
            }
            x => return Err(Error::unsupported(Unsupported::UnknownActor(x))),
        };

        Ok(Actor {
            type_id,
            version,
            payload,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        if !self.payload.accepts(self.type_id) {
            let known = UNIT_TYPE_IDS.contains(&self.type_id)
                || matches!(self.type_id, FIRE_TYPE_ID | PUDDLE_TYPE_ID | PLAYER_TYPE_ID);
            let reason = if known {
                Unsupported::ActorMismatch {
                    type_id: self.type_id,
                }
            } else {
                Unsupported::UnknownActor(self.type_id)
            };
            return Err(Error::unsupported(reason));
        }

        cursor.write_u8(self.type_id)?;
        cursor.write_u8(self.version)?;
        match &self.payload {
            ActorTrait::Unit(unit) => {
                content.check(ContentType::Unit, unit.kind)?;
                unit.info.write(cursor, content)?;
                cursor.write_u8(unit.kind)?;
                cursor.write_i32(unit.spawner)?;
            }
            ActorTrait::Fire(fire) => {
                cursor.write_i32(fire.loaded_position)?;
                cursor.write_f32(fire.lifetime);
                cursor.write_f32(fire.time);
            }
            ActorTrait::Puddle(puddle) => {
                content.check(ContentType::Liquid, puddle.liquid_id)?;
                cursor.write_i32(puddle.loaded_position)?;
                cursor.write_f32(puddle.x);
                cursor.write_f32(puddle.y);
                cursor.write_u8(puddle.liquid_id)?;
                cursor.write_f32(puddle.amount);
                cursor.write_u8(puddle.generation)?;
            }
            ActorTrait::Player(Player::Local(player)) => {
                content.check(ContentType::Mech, player.mech_id)?;
                cursor.write_bool(true);
                cursor.write_u8(player.mech_id)?;
                cursor.write_i32(player.spawner)?;
                player.info.write(cursor, content)?;
            }
            ActorTrait::Player(Player::Remote) => cursor.write_bool(false),
        }

        Ok(())
    }
}

/// The actors of a save in the groups they were stored in
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities {
    pub groups: Vec<Vec<Actor>>,
}

impl Entities {
    /// Iterate over every actor regardless of group
    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.groups.iter().flatten()
    }

    /// Iterate over the actors with the given type id
    ///
    /// ```
    /// use msav::{Actor, ActorTrait, Entities, Fire, Player};
    ///
    /// let fire = Actor {
    ///     type_id: 15,
    ///     version: 0,
    ///     payload: ActorTrait::Fire(Fire { loaded_position: 3, lifetime: 1.0, time: 0.5 }),
    /// };
    /// let player = Actor {
    ///     type_id: 17,
    ///     version: 0,
    ///     payload: ActorTrait::Player(Player::Remote),
    /// };
    ///
    /// let entities = Entities { groups: vec![vec![fire.clone()], vec![player, fire]] };
    /// assert_eq!(entities.of_type(15).count(), 2);
    /// assert_eq!(entities.of_type(16).count(), 0);
    /// ```
    pub fn of_type(&self, type_id: u8) -> impl Iterator<Item = &Actor> + '_ {
        self.iter().filter(move |x| x.type_id == type_id)
    }

    /// Decode the entities section body
    pub fn read(cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<Self, Error> {
        let count = cursor.read_u8()?;
        let mut groups = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let amount = cursor.read_i32()?;
            let amount =
                usize::try_from(amount).map_err(|_| Error::out_of_range(amount, "entity count"))?;

            // each actor occupies at least its prefix and two id bytes
            let mut group = Vec::with_capacity(amount.min(cursor.remaining() / 4));
            for _ in 0..amount {
                group.push(cursor.read_chunk(LengthPrefix::Short, |c| Actor::read(c, content))?);
            }
            groups.push(group);
        }

        log::debug!(
            "decoded {} actors in {} groups",
            groups.iter().map(Vec::len).sum::<usize>(),
            groups.len()
        );
        Ok(Entities { groups })
    }

    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        cursor.write_u8(self.groups.len())?;
        for group in &self.groups {
            cursor.write_i32(group.len())?;
            for actor in group {
                cursor.write_chunk(LengthPrefix::Short, |c| actor.write(c, content))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::sample_content;
    use crate::{ErrorKind, StatusEntry};
    use rstest::*;

    fn unit_save() -> UnitSave {
        UnitSave {
            team: 1,
            dead: false,
            x: 12.0,
            y: 40.0,
            xv: 0.25,
            yv: -1.0,
            rotation: 45.0,
            health: 200,
            item_id: 0,
            item_amount: 0,
            status: vec![StatusEntry { id: 2, time: 3.5 }],
        }
    }

    fn actor(type_id: u8, payload: ActorTrait) -> Actor {
        Actor {
            type_id,
            version: 0,
            payload,
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    #[case(10)]
    fn test_unit_actors(#[case] type_id: u8) {
        let unit = actor(
            type_id,
            ActorTrait::Unit(UnitActor {
                info: unit_save(),
                kind: 3,
                spawner: -1,
            }),
        );

        let mut cursor = ByteCursor::new();
        unit.write(&mut cursor, &sample_content()).unwrap();
        assert_eq!(Actor::read(&mut cursor, &sample_content()).unwrap(), unit);
    }

    #[test]
    fn test_remote_player() {
        let player = actor(PLAYER_TYPE_ID, ActorTrait::Player(Player::Remote));
        let mut cursor = ByteCursor::new();
        player.write(&mut cursor, &sample_content()).unwrap();
        assert_eq!(cursor.as_slice(), &[17, 0, 0]);
        assert_eq!(Actor::read(&mut cursor, &sample_content()).unwrap(), player);
    }

    #[test]
    fn test_unknown_actor() {
        let mut cursor = ByteCursor::from_vec(vec![3, 0]);
        let err = Actor::read(&mut cursor, &sample_content()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnknownActor(3))
        ));
    }

    #[rstest]
    #[case(FIRE_TYPE_ID, ErrorKind::UnsupportedVariant(Unsupported::ActorMismatch { type_id: 15 }))]
    #[case(9, ErrorKind::UnsupportedVariant(Unsupported::UnknownActor(9)))]
    fn test_trait_must_match_type(#[case] type_id: u8, #[case] expected: ErrorKind) {
        let puddle = actor(
            type_id,
            ActorTrait::Puddle(Puddle {
                loaded_position: 0,
                x: 0.0,
                y: 0.0,
                liquid_id: 0,
                amount: 1.0,
                generation: 0,
            }),
        );
        let err = puddle.write(&mut ByteCursor::new(), &sample_content()).unwrap_err();
        assert_eq!(format!("{:?}", err.kind()), format!("{:?}", expected));
    }

    #[test]
    fn test_groups_preserved() {
        let fire = actor(
            FIRE_TYPE_ID,
            ActorTrait::Fire(Fire {
                loaded_position: 70,
                lifetime: 10.0,
                time: 2.0,
            }),
        );
        let player = actor(
            PLAYER_TYPE_ID,
            ActorTrait::Player(Player::Local(LocalPlayer {
                mech_id: 1,
                spawner: 12,
                info: unit_save(),
            })),
        );

        let entities = Entities {
            groups: vec![vec![fire.clone(), fire.clone()], vec![], vec![player]],
        };

        let mut cursor = ByteCursor::new();
        entities.write(&mut cursor, &sample_content()).unwrap();
        assert_eq!(&cursor.as_slice()[..5], &[3, 0, 0, 0, 2]);
        assert_eq!(&cursor.as_slice()[5..7], &[0, 14]);

        let actual = Entities::read(&mut cursor, &sample_content()).unwrap();
        assert_eq!(actual, entities);
        assert_eq!(actual.of_type(FIRE_TYPE_ID).count(), 2);
        assert_eq!(actual.of_type(PLAYER_TYPE_ID).count(), 1);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_negative_group_count() {
        let mut cursor = ByteCursor::from_vec(vec![1, 0xff, 0xff, 0xff, 0xfe]);
        let err = Entities::read(&mut cursor, &sample_content()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRange { .. }));
    }

    #[test]
    fn test_puddle_liquid_must_resolve() {
        let puddle = actor(
            PUDDLE_TYPE_ID,
            ActorTrait::Puddle(Puddle {
                loaded_position: 4,
                x: 1.0,
                y: 2.0,
                liquid_id: 3,
                amount: 8.0,
                generation: 1,
            }),
        );

        let mut cursor = ByteCursor::new();
        puddle.write(&mut cursor, &sample_content()).unwrap();
        let err = Actor::read(&mut cursor, &ContentRegistry::new()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
                category: ContentType::Liquid,
                id: 3
            })
        ));
    }

    #[test]
    fn test_unit_type_must_resolve() {
        let unit = actor(
            0,
            ActorTrait::Unit(UnitActor {
                info: unit_save(),
                kind: 64,
                spawner: -1,
            }),
        );
        let err = unit
            .write(&mut ByteCursor::new(), &sample_content())
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent {
                category: ContentType::Unit,
                id: 64
            })
        ));
    }
}
