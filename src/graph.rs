//! Loaded rows and the relationship lookups over them.
//!
//! A [`Snapshot`] is what the serializer walks. Relationships are not stored
//! on the records; they are answered from foreign keys on demand, so the
//! derived views can never go stale.

use crate::models::{Customer, Item, Review};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    customers: BTreeMap<i64, Customer>,
    items: BTreeMap<i64, Item>,
    // keyed by id, which is also insertion order
    reviews: BTreeMap<i64, Review>,
}

/// A review whose foreign key points at a row that is not in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum DanglingReference {
    Customer { review_id: i64, customer_id: i64 },
    Item { review_id: i64, item_id: i64 },
}

impl Snapshot {
    pub fn new(
        customers: impl IntoIterator<Item = Customer>,
        items: impl IntoIterator<Item = Item>,
        reviews: impl IntoIterator<Item = Review>,
    ) -> Self {
        Snapshot {
            customers: customers.into_iter().map(|c| (c.id, c)).collect(),
            items: items.into_iter().map(|i| (i.id, i)).collect(),
            reviews: reviews.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn reviews(&self) -> impl Iterator<Item = &Review> {
        self.reviews.values()
    }

    pub fn customer(&self, id: i64) -> Option<&Customer> {
        self.customers.get(&id)
    }

    pub fn item(&self, id: i64) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn review(&self, id: i64) -> Option<&Review> {
        self.reviews.get(&id)
    }

    pub fn reviews_for_customer(&self, customer_id: i64) -> Vec<&Review> {
        self.reviews
            .values()
            .filter(|r| r.customer_id == Some(customer_id))
            .collect()
    }

    pub fn reviews_for_item(&self, item_id: i64) -> Vec<&Review> {
        self.reviews
            .values()
            .filter(|r| r.item_id == Some(item_id))
            .collect()
    }

    /// Back-reference from a review to its customer.
    pub fn customer_of(&self, review: &Review) -> Option<&Customer> {
        review.customer_id.and_then(|id| self.customer(id))
    }

    /// Back-reference from a review to its item.
    pub fn item_of(&self, review: &Review) -> Option<&Item> {
        review.item_id.and_then(|id| self.item(id))
    }

    /// Items reached through the customer's reviews, one entry per review.
    ///
    /// A review with no item contributes `None`, so the result always lines
    /// up with [`Snapshot::reviews_for_customer`].
    pub fn customer_items(&self, customer_id: i64) -> Vec<Option<&Item>> {
        self.reviews_for_customer(customer_id)
            .into_iter()
            .map(|r| self.item_of(r))
            .collect()
    }

    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for review in self.reviews.values() {
            if let Some(customer_id) = review.customer_id {
                if !self.customers.contains_key(&customer_id) {
                    dangling.push(DanglingReference::Customer { review_id: review.id, customer_id });
                }
            }
            if let Some(item_id) = review.item_id {
                if !self.items.contains_key(&item_id) {
                    dangling.push(DanglingReference::Item { review_id: review.id, item_id });
                }
            }
        }
        dangling
    }

    pub fn is_consistent(&self) -> bool {
        self.dangling_references().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: i64, customer_id: Option<i64>, item_id: Option<i64>) -> Review {
        Review { id, comment: format!("review {}", id), customer_id, item_id }
    }

    fn sample() -> Snapshot {
        Snapshot::new(
            vec![
                Customer { id: 1, name: Some("Ann".into()) },
                Customer { id: 2, name: None },
            ],
            vec![
                Item { id: 5, name: Some("Mug".into()), price: Some(9.99) },
                Item { id: 6, name: Some("Pen".into()), price: None },
            ],
            vec![
                review(3, Some(1), Some(6)),
                review(1, Some(1), Some(5)),
                review(2, Some(2), Some(5)),
                review(4, Some(1), None),
            ],
        )
    }

    #[test]
    fn test_reviews_follow_insertion_order() {
        let snapshot = sample();
        let ids: Vec<i64> = snapshot.reviews_for_customer(1).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        let ids: Vec<i64> = snapshot.reviews_for_item(5).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_customer_items_lines_up_with_reviews() {
        let snapshot = sample();
        let names: Vec<Option<&str>> = snapshot
            .customer_items(1)
            .into_iter()
            .map(|i| i.and_then(|i| i.name.as_deref()))
            .collect();
        assert_eq!(names, vec![Some("Mug"), Some("Pen"), None]);
        assert!(snapshot.customer_items(99).is_empty());
    }

    #[test]
    fn test_back_references() {
        let snapshot = sample();
        let r = snapshot.review(2).unwrap();
        assert_eq!(snapshot.customer_of(r).map(|c| c.id), Some(2));
        assert_eq!(snapshot.item_of(r).map(|i| i.id), Some(5));
        assert!(snapshot.item_of(snapshot.review(4).unwrap()).is_none());
    }

    #[test]
    fn test_dangling_references() {
        let snapshot = Snapshot::new(vec![], vec![], vec![review(1, Some(7), Some(8))]);
        assert_eq!(
            snapshot.dangling_references(),
            vec![
                DanglingReference::Customer { review_id: 1, customer_id: 7 },
                DanglingReference::Item { review_id: 1, item_id: 8 },
            ]
        );
        assert!(sample().is_consistent());
    }
}
