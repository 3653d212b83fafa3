// src/models/review.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,                  // Store-generated identifier
    pub comment: String,          // Review text, always present
    pub customer_id: Option<i64>, // Owning customer, if any
    pub item_id: Option<i64>,     // Reviewed item, if any
}

/// A review that has not been stored yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewReview {
    pub comment: String,
    pub customer_id: Option<i64>,
    pub item_id: Option<i64>,
}

impl NewReview {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            customer_id: None,
            item_id: None,
        }
    }

    pub fn by_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn for_item(mut self, item_id: i64) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub(crate) fn stored_as(self, id: i64) -> Review {
        Review {
            id,
            comment: self.comment,
            customer_id: self.customer_id,
            item_id: self.item_id,
        }
    }
}
