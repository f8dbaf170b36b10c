use crate::{ByteCursor, Error, Unsupported};
use serde::{Deserialize, Serialize};

/// The categories of the content header
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Item,
    Block,
    Mech,
    Bullet,
    Liquid,
    Status,
    Unit,
    Weather,
    Effect,
    Zone,
    Loadout,
    TypeId,
}

impl ContentType {
    /// Every category in wire id order
    pub const ALL: [ContentType; 12] = [
        ContentType::Item,
        ContentType::Block,
        ContentType::Mech,
        ContentType::Bullet,
        ContentType::Liquid,
        ContentType::Status,
        ContentType::Unit,
        ContentType::Weather,
        ContentType::Effect,
        ContentType::Zone,
        ContentType::Loadout,
        ContentType::TypeId,
    ];

    /// Lookup a category from its wire id
    pub fn from_id(id: u8) -> Option<ContentType> {
        ContentType::ALL.get(usize::from(id)).copied()
    }

    /// The wire id of the category
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentType::Item => "item",
            ContentType::Block => "block",
            ContentType::Mech => "mech",
            ContentType::Bullet => "bullet",
            ContentType::Liquid => "liquid",
            ContentType::Status => "status",
            ContentType::Unit => "unit",
            ContentType::Weather => "weather",
            ContentType::Effect => "effect",
            ContentType::Zone => "zone",
            ContentType::Loadout => "loadout",
            ContentType::TypeId => "typeid",
        }
    }
}

/// Ordered name tables per content category, as found in the content header
/// of a save.
///
/// A category is either absent from the header or holds an ordered list of
/// names (which may be empty). The position of a name within its list is the
/// integer id that the rest of the save refers to it by.
///
/// ```
/// use msav::{ContentRegistry, ContentType};
///
/// let mut content = ContentRegistry::new();
/// content.set(ContentType::Block, vec!["air".into(), "duo".into()]);
/// assert_eq!(content.resolve(ContentType::Block, 1)?, "duo");
/// assert_eq!(content.id_of(ContentType::Block, "air"), Some(0));
/// assert!(content.resolve(ContentType::Block, 2).is_err());
/// assert!(content.resolve(ContentType::Item, 0).is_err());
/// # Ok::<(), msav::Error>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRegistry {
    slots: [Option<Vec<String>>; 12],
}

impl ContentRegistry {
    pub fn new() -> Self {
        ContentRegistry::default()
    }

    /// The names of a category, if the category is present
    pub fn get(&self, category: ContentType) -> Option<&[String]> {
        self.slots[usize::from(category.id())].as_deref()
    }

    /// Replace the names of a category, returning the previous names
    pub fn set(&mut self, category: ContentType, names: Vec<String>) -> Option<Vec<String>> {
        self.slots[usize::from(category.id())].replace(names)
    }

    /// Remove a category from the header
    pub fn remove(&mut self, category: ContentType) -> Option<Vec<String>> {
        self.slots[usize::from(category.id())].take()
    }

    /// Iterate over the present categories in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (ContentType, &[String])> + '_ {
        ContentType::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(kind, names)| names.as_deref().map(|x| (*kind, x)))
    }

    /// Resolve an id within a category to its name
    #[inline]
    pub fn resolve(&self, category: ContentType, id: i32) -> Result<&str, Error> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.get(category)?.get(idx))
            .map(|x| x.as_str())
            .ok_or_else(|| Error::unsupported(Unsupported::UnresolvedContent { category, id }))
    }

    /// Fail with an unresolved content error unless the id names an entry of
    /// the category
    #[inline]
    pub fn check<T: Into<i32>>(&self, category: ContentType, id: T) -> Result<(), Error> {
        self.resolve(category, id.into()).map(|_| ())
    }

    /// The id of the first occurrence of a name within a category
    pub fn id_of(&self, category: ContentType, name: &str) -> Option<i32> {
        let position = self.get(category)?.iter().position(|x| x == name)?;
        i32::try_from(position).ok()
    }

    /// Decode the content header body
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, Error> {
        let mut result = ContentRegistry::new();
        let mapped = cursor.read_u8()?;
        for _ in 0..mapped {
            let id = cursor.read_u8()?;
            let category = ContentType::from_id(id)
                .ok_or_else(|| Error::unsupported(Unsupported::UnknownCategory(id)))?;
            let total = cursor.read_u16()?;
            let mut names = Vec::with_capacity(usize::from(total));
            for _ in 0..total {
                names.push(cursor.read_string()?);
            }

            if result.set(category, names).is_some() {
                log::warn!("content category {} appears twice", category.name());
            }
        }

        Ok(result)
    }

    /// Encode the content header body with categories in ascending id order
    pub fn write(&self, cursor: &mut ByteCursor) -> Result<(), Error> {
        cursor.write_u8(self.iter().count())?;
        for (category, names) in self.iter() {
            cursor.write_u8(category.id())?;
            cursor.write_u16(names.len())?;
            for name in names {
                cursor.write_string(name)?;
            }
        }

        Ok(())
    }
}

/// A registry with a handful of names in every category an entity can
/// reference
#[cfg(test)]
pub(crate) fn sample_content() -> ContentRegistry {
    let mut content = ContentRegistry::new();
    for category in [
        ContentType::Item,
        ContentType::Liquid,
        ContentType::Status,
        ContentType::Mech,
        ContentType::Unit,
    ] {
        let names = (0..32).map(|i| format!("{}-{}", category.name(), i));
        content.set(category, names.collect());
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rstest::*;

    #[rstest]
    #[case(0, ContentType::Item)]
    #[case(1, ContentType::Block)]
    #[case(4, ContentType::Liquid)]
    #[case(11, ContentType::TypeId)]
    fn test_category_ids(#[case] id: u8, #[case] expected: ContentType) {
        assert_eq!(ContentType::from_id(id), Some(expected));
        assert_eq!(expected.id(), id);
    }

    #[test]
    fn test_unknown_category_id() {
        assert_eq!(ContentType::from_id(12), None);
        let mut cursor = ByteCursor::from_vec(vec![1, 12, 0, 0]);
        let err = ContentRegistry::read(&mut cursor).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedVariant(Unsupported::UnknownCategory(12))
        ));
    }

    #[test]
    fn test_header_ascending_and_empty_slots() {
        let mut content = ContentRegistry::new();
        content.set(ContentType::Liquid, vec!["water".into()]);
        content.set(ContentType::Item, vec!["copper".into(), "lead".into()]);
        content.set(ContentType::Zone, vec![]);

        let mut cursor = ByteCursor::new();
        content.write(&mut cursor).unwrap();
        let expected: &[u8] = &[
            3, // categories
            0, 0, 2, 0, 6, b'c', b'o', b'p', b'p', b'e', b'r', 0, 4, b'l', b'e', b'a', b'd',
            4, 0, 1, 0, 5, b'w', b'a', b't', b'e', b'r',
            9, 0, 0,
        ];
        assert_eq!(cursor.as_slice(), expected);

        let actual = ContentRegistry::read(&mut cursor).unwrap();
        assert_eq!(actual, content);
        assert_eq!(actual.get(ContentType::Zone), Some(&[][..]));
        assert_eq!(actual.get(ContentType::Mech), None);
    }

    #[test]
    fn test_unresolved_negative_id() {
        let mut content = ContentRegistry::new();
        content.set(ContentType::Block, vec!["air".into()]);
        let err = content.resolve(ContentType::Block, -1).unwrap_err();
        match err.kind() {
            ErrorKind::UnsupportedVariant(Unsupported::UnresolvedContent { category, id }) => {
                assert_eq!(*category, ContentType::Block);
                assert_eq!(*id, -1);
            }
            x => panic!("unexpected error: {:?}", x),
        }
    }

    #[test]
    fn test_check() {
        let content = sample_content();
        assert!(content.check(ContentType::Item, 31u8).is_ok());
        assert!(content.check(ContentType::Liquid, 32u8).is_err());
        assert!(content.check(ContentType::Block, 0u8).is_err());
    }
}
