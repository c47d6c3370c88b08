use serde::{Deserialize, Serialize};

/// One flashcard: prompt side and answer side.
/// Stored as a JSON document in Sled. The document id lives in the key,
/// not in the value, and is regenerated whenever a card is moved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub front: String,
    pub back: String,
}

/// One entry in a user's collection index document.
/// The index value is an ordered `Vec<CollectionEntry>`; order is creation
/// order and survives renames.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub sub: String, // user id from the identity provider
    pub exp: usize,
}
