//! Bucket aggregate implementation.

use common::{BucketId, ItemId, Version};
use serde::{Deserialize, Serialize};

use crate::query::{Entity, Property, Value};

use super::{BucketError, Item};

/// Capacity given to buckets created without an explicit size.
pub const DEFAULT_SIZE: u32 = 5;

/// Bucket aggregate root.
///
/// A bounded container of [`Item`]s. Every mutation goes through this type,
/// which keeps `item_count() <= size()` and item identities unique. Failed
/// operations leave the bucket unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BucketRecord")]
pub struct Bucket {
    /// Assigned by the repository on first insert.
    id: Option<BucketId>,

    /// Current version for optimistic concurrency.
    version: Version,

    name: Option<String>,

    description: Option<String>,

    /// Maximum number of items.
    size: u32,

    /// Items in insertion order.
    items: Vec<Item>,
}

/// Wire form of a bucket. Decoding goes through `Bucket::checked`.
#[derive(Deserialize)]
struct BucketRecord {
    id: Option<BucketId>,
    #[serde(default)]
    version: Version,
    name: Option<String>,
    description: Option<String>,
    size: u32,
    items: Vec<Item>,
}

impl TryFrom<BucketRecord> for Bucket {
    type Error = BucketError;

    fn try_from(record: BucketRecord) -> Result<Self, Self::Error> {
        Bucket::checked(
            record.id,
            record.version,
            record.name,
            record.description,
            record.size,
            record.items,
        )
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            id: None,
            version: Version::initial(),
            name: None,
            description: None,
            size: DEFAULT_SIZE,
            items: Vec::new(),
        }
    }
}

// Properties
impl Bucket {
    pub const ID: Property<Bucket> = Property::comparable("Id", |b: &Bucket| {
        Value::from(b.id.map(|id| id.as_uuid()))
    });
    pub const NAME: Property<Bucket> =
        Property::comparable("Name", |b: &Bucket| Value::from(b.name.clone()));
    pub const DESCRIPTION: Property<Bucket> =
        Property::comparable("Description", |b: &Bucket| Value::from(b.description.clone()));
    pub const SIZE: Property<Bucket> =
        Property::comparable("Size", |b: &Bucket| Value::from(b.size));
    pub const ITEM_COUNT: Property<Bucket> =
        Property::comparable("ItemCount", |b: &Bucket| Value::from(b.items.len()));
    pub const AVAILABLE: Property<Bucket> =
        Property::comparable("Available", |b: &Bucket| Value::from(b.available()));
    pub const ITEMS: Property<Bucket> = Property::opaque("Items", |b: &Bucket| {
        Value::List(b.items.iter().map(|i| Value::Uuid(i.id().as_uuid())).collect())
    });
}

impl Entity for Bucket {
    const TYPE_NAME: &'static str = "Bucket";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Self::ID,
            Self::NAME,
            Self::DESCRIPTION,
            Self::SIZE,
            Self::ITEM_COUNT,
            Self::AVAILABLE,
            Self::ITEMS,
        ]
    }
}

// Construction
impl Bucket {
    /// Creates a transient bucket with the default size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transient, empty bucket with the given size.
    pub fn with_size(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rebuilds a persisted bucket, re-checking its invariants.
    pub fn restore(
        id: BucketId,
        version: Version,
        name: Option<String>,
        description: Option<String>,
        size: u32,
        items: Vec<Item>,
    ) -> Result<Self, BucketError> {
        Self::checked(Some(id), version, name, description, size, items)
    }

    fn checked(
        id: Option<BucketId>,
        version: Version,
        name: Option<String>,
        description: Option<String>,
        size: u32,
        items: Vec<Item>,
    ) -> Result<Self, BucketError> {
        if items.len() > size as usize {
            return Err(BucketError::invalid_size(i64::from(size), items.len()));
        }
        for (i, item) in items.iter().enumerate() {
            if items[..i].iter().any(|other| other.id() == item.id()) {
                return Err(BucketError::DuplicateItem(item.id()));
            }
        }

        Ok(Self {
            id,
            version,
            name,
            description,
            size,
            items,
        })
    }

    /// Gives a transient bucket its identity. Used by repositories on insert.
    pub fn assign_id(&mut self, id: BucketId) {
        self.id = Some(id);
    }

    /// Records the persisted version. Used by repositories.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Bucket {
    /// Returns the identity, or None while the bucket is transient.
    pub fn id(&self) -> Option<BucketId> {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the capacity.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns a read-only view of the items, in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns an item by ID.
    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.item(item_id).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of free slots.
    pub fn available(&self) -> u32 {
        // Every constructor keeps `items.len() <= size`, so `used` fits in a u32.
        let used = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.size.saturating_sub(used)
    }

    /// Returns true when no further item can be added.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// Command methods
impl Bucket {
    pub fn rename(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn describe(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Appends an item.
    ///
    /// Adding an item that is already present (same ID) succeeds without
    /// changing anything, even when the bucket is full.
    pub fn add_item(&mut self, item: Item) -> Result<(), BucketError> {
        if self.contains(item.id()) {
            return Ok(());
        }

        if self.is_full() {
            return Err(BucketError::BucketFull { size: self.size });
        }

        self.items.push(item);
        Ok(())
    }

    /// Removes an item, returning it. Removing an absent item is a no-op.
    pub fn remove_item(&mut self, item_id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id() == item_id)?;
        Some(self.items.remove(index))
    }

    /// Returns an item for editing its descriptive fields.
    ///
    /// Membership cannot change through the returned reference, since an
    /// item's identity is immutable.
    pub fn item_mut(&mut self, item_id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id() == item_id)
    }

    /// Changes the capacity.
    ///
    /// Fails when `new_size` is negative, too large for a `u32`, or smaller
    /// than the current number of items.
    pub fn set_size(&mut self, new_size: i64) -> Result<(), BucketError> {
        let occupancy = self.items.len();
        let size = u32::try_from(new_size)
            .ok()
            .filter(|s| *s as usize >= occupancy)
            .ok_or_else(|| BucketError::invalid_size(new_size, occupancy))?;

        self.size = size;
        Ok(())
    }
}
