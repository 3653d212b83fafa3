//! Recursion-safe flattening of records into plain JSON.
//!
//! Every record serializes its own columns and then each relationship it
//! declares, recursively. The relationship graph has cycles
//! (customer -> reviews -> customer -> ...), so the walk consults an
//! [`ExclusionSet`]: a set of `(via, suppressed)` relation pairs saying
//! "a record reached through `via` does not expand `suppressed`".
//!
//! The standard set mirrors the back-reference of every owning relation,
//! which makes every walk at most three records deep. Callers may add
//! exclusions but never remove the standard ones.

use crate::error::Result;
use crate::graph::Snapshot;
use crate::models::{Customer, Item, Review};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Customer,
    Item,
    Review,
}

/// A declared relationship, named after the side that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `Customer.reviews`, owning
    CustomerReviews,
    /// `Item.reviews`, owning
    ItemReviews,
    /// `Review.customer`, back-reference
    ReviewCustomer,
    /// `Review.item`, back-reference
    ReviewItem,
}

impl Relation {
    /// Key used for the relation in serialized output.
    pub fn key(self) -> &'static str {
        match self {
            Relation::CustomerReviews | Relation::ItemReviews => "reviews",
            Relation::ReviewCustomer => "customer",
            Relation::ReviewItem => "item",
        }
    }

    pub fn owner(self) -> RecordKind {
        match self {
            Relation::CustomerReviews => RecordKind::Customer,
            Relation::ItemReviews => RecordKind::Item,
            Relation::ReviewCustomer | Relation::ReviewItem => RecordKind::Review,
        }
    }

    /// Relations of a record kind, in declaration order.
    pub fn declared_by(kind: RecordKind) -> &'static [Relation] {
        match kind {
            RecordKind::Customer => &[Relation::CustomerReviews],
            RecordKind::Item => &[Relation::ItemReviews],
            RecordKind::Review => &[Relation::ReviewCustomer, Relation::ReviewItem],
        }
    }
}

/// Suppresses `suppressed` on any record reached through `via`.
/// A `via` of `None` applies to the top-level record only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub via: Option<Relation>,
    pub suppressed: Relation,
}

impl Exclusion {
    pub const fn new(via: Relation, suppressed: Relation) -> Self {
        Exclusion { via: Some(via), suppressed }
    }

    pub const fn top_level(suppressed: Relation) -> Self {
        Exclusion { via: None, suppressed }
    }
}

pub const STANDARD_EXCLUSIONS: [Exclusion; 4] = [
    // Customer: -reviews.customer
    Exclusion::new(Relation::CustomerReviews, Relation::ReviewCustomer),
    // Item: -reviews.item
    Exclusion::new(Relation::ItemReviews, Relation::ReviewItem),
    // Review: -customer.reviews, -item.reviews
    Exclusion::new(Relation::ReviewCustomer, Relation::CustomerReviews),
    Exclusion::new(Relation::ReviewItem, Relation::ItemReviews),
];

#[derive(Debug, Clone)]
pub struct ExclusionSet {
    rules: HashSet<Exclusion>,
}

impl ExclusionSet {
    pub fn standard() -> Self {
        ExclusionSet {
            rules: STANDARD_EXCLUSIONS.iter().copied().collect(),
        }
    }

    pub fn with(mut self, exclusion: Exclusion) -> Self {
        self.rules.insert(exclusion);
        self
    }

    pub fn suppresses(&self, via: Option<Relation>, relation: Relation) -> bool {
        self.rules.contains(&Exclusion { via, suppressed: relation })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        ExclusionSet::standard()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Customer(&'a Customer),
    Item(&'a Item),
    Review(&'a Review),
}

impl<'a> Record<'a> {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Customer(_) => RecordKind::Customer,
            Record::Item(_) => RecordKind::Item,
            Record::Review(_) => RecordKind::Review,
        }
    }

    fn columns(&self) -> Result<Map<String, Value>> {
        match self {
            Record::Customer(c) => columns_of(c),
            Record::Item(i) => columns_of(i),
            Record::Review(r) => columns_of(r),
        }
    }
}

fn columns_of<T: Serialize>(row: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map),
        other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "row serialized to a non-object: {}",
            other
        ))
        .into()),
    }
}

/// Walks records of one [`Snapshot`] into nested JSON.
pub struct Serializer<'a> {
    snapshot: &'a Snapshot,
    exclusions: ExclusionSet,
}

impl<'a> Serializer<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Serializer {
            snapshot,
            exclusions: ExclusionSet::standard(),
        }
    }

    /// Adds an exclusion on top of the standard ones.
    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions = self.exclusions.with(exclusion);
        self
    }

    pub fn serialize(&self, record: Record<'_>) -> Result<Value> {
        self.walk(record, None)
    }

    pub fn serialize_customer(&self, customer: &Customer) -> Result<Value> {
        self.serialize(Record::Customer(customer))
    }

    pub fn serialize_item(&self, item: &Item) -> Result<Value> {
        self.serialize(Record::Item(item))
    }

    pub fn serialize_review(&self, review: &Review) -> Result<Value> {
        self.serialize(Record::Review(review))
    }

    /// Serializes every record of `kind` in the snapshot, ordered by id.
    pub fn serialize_all(&self, kind: RecordKind) -> Result<Vec<Value>> {
        match kind {
            RecordKind::Customer => self
                .snapshot
                .customers()
                .map(|c| self.serialize_customer(c))
                .collect(),
            RecordKind::Item => self.snapshot.items().map(|i| self.serialize_item(i)).collect(),
            RecordKind::Review => self
                .snapshot
                .reviews()
                .map(|r| self.serialize_review(r))
                .collect(),
        }
    }

    fn walk(&self, record: Record<'_>, via: Option<Relation>) -> Result<Value> {
        let mut map = record.columns()?;

        for &relation in Relation::declared_by(record.kind()) {
            if self.exclusions.suppresses(via, relation) {
                trace!(?relation, ?via, "relation suppressed");
                continue;
            }
            let value = match (record, relation) {
                (Record::Customer(c), Relation::CustomerReviews) => {
                    self.many(self.snapshot.reviews_for_customer(c.id), relation)?
                }
                (Record::Item(i), Relation::ItemReviews) => {
                    self.many(self.snapshot.reviews_for_item(i.id), relation)?
                }
                (Record::Review(r), Relation::ReviewCustomer) => {
                    self.one(self.snapshot.customer_of(r).map(Record::Customer), relation)?
                }
                (Record::Review(r), Relation::ReviewItem) => {
                    self.one(self.snapshot.item_of(r).map(Record::Item), relation)?
                }
                _ => continue,
            };
            map.insert(relation.key().to_string(), value);
        }

        Ok(Value::Object(map))
    }

    fn many(&self, reviews: Vec<&Review>, via: Relation) -> Result<Value> {
        reviews
            .into_iter()
            .map(|r| self.walk(Record::Review(r), Some(via)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn one(&self, record: Option<Record<'_>>, via: Relation) -> Result<Value> {
        match record {
            Some(record) => self.walk(record, Some(via)),
            None => Ok(Value::Null),
        }
    }
}

/// Serializes one record against `snapshot` with the standard exclusions.
pub fn serialize(snapshot: &Snapshot, record: Record<'_>) -> Result<Value> {
    Serializer::new(snapshot).serialize(record)
}
