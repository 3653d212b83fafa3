// src/models/customer.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,              // Store-generated identifier
    pub name: Option<String>, // Display name, may be unset
}
