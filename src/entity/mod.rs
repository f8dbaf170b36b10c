//! The physical entity record shared by every block, and the records of the
//! free standing actors that roam the map.

mod actor;

pub use self::actor::{
    Actor, ActorTrait, Entities, Fire, LocalPlayer, Player, Puddle, UnitActor, FIRE_TYPE_ID,
    PLAYER_TYPE_ID, PUDDLE_TYPE_ID, UNIT_TYPE_IDS,
};

use crate::{ByteCursor, ContentRegistry, ContentType, Error};
use serde::{Deserialize, Serialize};

/// Which optional sub-records a block kind carries after the common header
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct RecordLayout {
    pub items: bool,
    pub power: bool,
    pub liquids: bool,
    pub consume: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub item_id: u8,
    pub item_amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidStack {
    pub liquid_id: u8,
    pub amount: f32,
}

/// Power graph membership of a block
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerModule {
    /// Positions of the linked power nodes
    pub links: Vec<i32>,

    /// Fraction of the demand that is met. Non finite values on the wire are
    /// read as zero.
    pub satisfaction: f32,
}

/// The record every block entity starts with
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub version: u8,
    pub health: u16,
    pub team: u8,
    pub rotation: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemStack>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<PowerModule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquids: Option<Vec<LiquidStack>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consume: Option<bool>,
}

impl EntityRecord {
    /// Create a record with empty sub-records for everything the layout
    /// declares
    pub fn new(layout: RecordLayout) -> Self {
        EntityRecord {
            items: layout.items.then(Vec::new),
            power: layout.power.then(PowerModule::default),
            liquids: layout.liquids.then(Vec::new),
            consume: layout.consume.then_some(false),
            ..EntityRecord::default()
        }
    }

    /// The layout implied by which sub-records are present
    pub fn layout(&self) -> RecordLayout {
        RecordLayout {
            items: self.items.is_some(),
            power: self.power.is_some(),
            liquids: self.liquids.is_some(),
            consume: self.consume.is_some(),
        }
    }

    /// Decode a record. Item and liquid ids must resolve against the
    /// content header.
    pub fn read(
        cursor: &mut ByteCursor,
        layout: RecordLayout,
        content: &ContentRegistry,
    ) -> Result<Self, Error> {
        let version = cursor.read_u8()?;
        let health = cursor.read_u16()?;
        let team_rotation = cursor.read_u8()?;

        let items = if layout.items {
            let count = cursor.read_u8()?;
            let mut items = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                let item_id = cursor.read_u8()?;
                content.check(ContentType::Item, item_id)?;
                let item_amount = cursor.read_i32()?;
                items.push(ItemStack {
                    item_id,
                    item_amount,
                });
            }
            Some(items)
        } else {
            None
        };

        let power = if layout.power {
            let count = cursor.read_u16()?;
            let mut links = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                links.push(cursor.read_i32()?);
            }

            let satisfaction = cursor.read_f32()?;
            let satisfaction = if satisfaction.is_finite() {
                satisfaction
            } else {
                0.0
            };

            Some(PowerModule {
                links,
                satisfaction,
            })
        } else {
            None
        };

        let liquids = if layout.liquids {
            let count = cursor.read_u8()?;
            let mut liquids = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                let liquid_id = cursor.read_u8()?;
                content.check(ContentType::Liquid, liquid_id)?;
                let amount = cursor.read_f32()?;
                liquids.push(LiquidStack { liquid_id, amount });
            }
            Some(liquids)
        } else {
            None
        };

        let consume = if layout.consume {
            Some(cursor.read_bool()?)
        } else {
            None
        };

        Ok(EntityRecord {
            version,
            health,
            team: team_rotation >> 4 & 0xf,
            rotation: team_rotation & 0xf,
            items,
            power,
            liquids,
            consume,
        })
    }

    /// Write the record with whichever sub-records are present
    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        if self.team > 0xf {
            return Err(Error::out_of_range(self.team, "uint4"));
        } else if self.rotation > 0xf {
            return Err(Error::out_of_range(self.rotation, "uint4"));
        }

        cursor.write_u8(self.version)?;
        cursor.write_u16(self.health)?;
        cursor.write_u8(self.team << 4 | self.rotation)?;

        if let Some(items) = &self.items {
            cursor.write_u8(items.len())?;
            for item in items {
                content.check(ContentType::Item, item.item_id)?;
                cursor.write_u8(item.item_id)?;
                cursor.write_i32(item.item_amount)?;
            }
        }

        if let Some(power) = &self.power {
            cursor.write_u16(power.links.len())?;
            for &link in &power.links {
                cursor.write_i32(link)?;
            }
            cursor.write_f32(power.satisfaction);
        }

        if let Some(liquids) = &self.liquids {
            cursor.write_u8(liquids.len())?;
            for liquid in liquids {
                content.check(ContentType::Liquid, liquid.liquid_id)?;
                cursor.write_u8(liquid.liquid_id)?;
                cursor.write_f32(liquid.amount);
            }
        }

        if let Some(consume) = self.consume {
            cursor.write_bool(consume);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub id: u8,
    pub time: f32,
}

/// Position, motion and cargo of a unit.
///
/// Velocities travel as eighths and rotation as halves, so only values on
/// that grid survive an encode unchanged.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSave {
    pub team: u8,
    pub dead: bool,
    pub x: f32,
    pub y: f32,
    pub xv: f32,
    pub yv: f32,
    pub rotation: f32,
    pub health: i16,
    pub item_id: u8,
    pub item_amount: i16,
    pub status: Vec<StatusEntry>,
}

fn scaled(value: f32, scale: f32, wire: &'static str, min: i16, max: i16) -> Result<i16, Error> {
    let x = (value * scale).round();
    if x.is_finite() && x >= f32::from(min) && x <= f32::from(max) {
        Ok(x as i16)
    } else {
        Err(Error::out_of_range(value, wire))
    }
}

impl UnitSave {
    /// Decode a unit. The carried item is only resolved when the stack is
    /// not empty.
    pub fn read(cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<Self, Error> {
        let team = cursor.read_u8()?;
        let dead = cursor.read_bool()?;
        let x = cursor.read_f32()?;
        let y = cursor.read_f32()?;
        let xv = f32::from(cursor.read_i8()?) / 8.0;
        let yv = f32::from(cursor.read_i8()?) / 8.0;
        let rotation = f32::from(cursor.read_i16()?) / 2.0;
        let health = cursor.read_i16()?;
        let item_id = cursor.read_u8()?;
        let item_amount = cursor.read_i16()?;
        if item_amount > 0 {
            content.check(ContentType::Item, item_id)?;
        }

        let count = cursor.read_u8()?;
        let mut status = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let id = cursor.read_u8()?;
            content.check(ContentType::Status, id)?;
            let time = cursor.read_f32()?;
            status.push(StatusEntry { id, time });
        }

        Ok(UnitSave {
            team,
            dead,
            x,
            y,
            xv,
            yv,
            rotation,
            health,
            item_id,
            item_amount,
            status,
        })
    }

    pub fn write(&self, cursor: &mut ByteCursor, content: &ContentRegistry) -> Result<(), Error> {
        if self.item_amount > 0 {
            content.check(ContentType::Item, self.item_id)?;
        }
        for entry in &self.status {
            content.check(ContentType::Status, entry.id)?;
        }

        let min = i16::from(i8::MIN);
        let max = i16::from(i8::MAX);
        let xv = scaled(self.xv, 8.0, "int8", min, max)?;
        let yv = scaled(self.yv, 8.0, "int8", min, max)?;
        let rotation = scaled(self.rotation, 2.0, "int16", i16::MIN, i16::MAX)?;

        cursor.write_u8(self.team)?;
        cursor.write_bool(self.dead);
        cursor.write_f32(self.x);
        cursor.write_f32(self.y);
        cursor.write_i8(xv)?;
        cursor.write_i8(yv)?;
        cursor.write_i16(rotation)?;
        cursor.write_i16(self.health)?;
        cursor.write_u8(self.item_id)?;
        cursor.write_i16(self.item_amount)?;
        cursor.write_u8(self.status.len())?;
        for entry in &self.status {
            cursor.write_u8(entry.id)?;
            cursor.write_f32(entry.time);
        }

        Ok(())
    }
}
