//! Item entity.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::query::{Entity, Property, Value};

/// A member of a bucket.
///
/// An item has no knowledge of the bucket that holds it; membership is
/// changed only through [`Bucket::add_item`](super::Bucket::add_item) and
/// [`Bucket::remove_item`](super::Bucket::remove_item). Its identity is fixed
/// at construction and is what the bucket uses to detect duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: Option<String>,
    description: Option<String>,
}

impl Item {
    pub const ID: Property<Item> =
        Property::comparable("Id", |i: &Item| Value::Uuid(i.id.as_uuid()));
    pub const NAME: Property<Item> =
        Property::comparable("Name", |i: &Item| Value::from(i.name.clone()));
    pub const DESCRIPTION: Property<Item> =
        Property::comparable("Description", |i: &Item| Value::from(i.description.clone()));

    /// Creates a new item with a fresh identity.
    pub fn new(name: Option<String>, description: Option<String>) -> Self {
        Self {
            id: ItemId::new(),
            name,
            description,
        }
    }

    /// Creates a new item with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()), None)
    }

    /// Rebuilds a persisted item.
    pub fn restore(id: ItemId, name: Option<String>, description: Option<String>) -> Self {
        Self {
            id,
            name,
            description,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn rename(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn describe(&mut self, description: Option<String>) {
        self.description = description;
    }
}

impl Entity for Item {
    const TYPE_NAME: &'static str = "Item";

    fn properties() -> Vec<Property<Self>> {
        vec![Self::ID, Self::NAME, Self::DESCRIPTION]
    }
}
