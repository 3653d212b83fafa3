pub mod customer;
pub mod item;
pub mod review;

pub use customer::Customer;
pub use item::Item;
pub use review::{NewReview, Review};
