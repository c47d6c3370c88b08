use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, IVec, Transactional};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Card, CollectionEntry};

/// Sled-backed store for per-user flashcard data.
///
/// Two trees:
/// - `index`: one document per user, a JSON `Vec<CollectionEntry>` listing
///   that user's collections in creation order.
/// - `cards`: one document per card, keyed `user \0 collection \0 card-id`.
///
/// Invariant: a card key's collection segment always matches an entry in the
/// owning user's index. Every operation that touches both (save, delete,
/// rename) commits through a single cross-tree transaction or batch so the
/// two can never diverge.
///
/// Card ids are not portable: a move or rename rewrites each card under a
/// fresh id at the destination, and any external reference to the old id is
/// dead afterwards.
#[allow(dead_code)] // db kept for flush/size_on_disk style ops
#[derive(Clone)]
pub struct Store {
    db: Db,
    index: sled::Tree,
    cards: sled::Tree,
}

const SEP: u8 = 0;

/// Prefix covering every card in one collection.
fn card_prefix(user: &str, collection: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user.len() + collection.len() + 2);
    key.extend_from_slice(user.as_bytes());
    key.push(SEP);
    key.extend_from_slice(collection.as_bytes());
    key.push(SEP);
    key
}

/// Full key for a new card document, fresh UUIDv4 id.
fn card_key(user: &str, collection: &str) -> Vec<u8> {
    let mut key = card_prefix(user, collection);
    key.extend_from_slice(Uuid::new_v4().to_string().as_bytes());
    key
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("name must not be empty".to_string()));
    }
    if name.bytes().any(|b| b == SEP) {
        return Err(Error::InvalidName(
            "name must not contain NUL bytes".to_string(),
        ));
    }
    Ok(())
}

fn decode_entries(raw: Option<&[u8]>) -> serde_json::Result<Vec<CollectionEntry>> {
    match raw {
        Some(bytes) => serde_json::from_slice(bytes),
        None => Ok(Vec::new()),
    }
}

fn encode_entries(entries: &[CollectionEntry]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(entries)
}

/// Unwrap a cross-tree transaction error into our taxonomy.
fn tx_err(e: TransactionError<Error>) -> Error {
    match e {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => Error::Store(e),
    }
}

fn abort(e: Error) -> ConflictableTransactionError<Error> {
    ConflictableTransactionError::Abort(e)
}

impl Store {
    /// Open or create the Sled database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let index = db.open_tree("index")?;
        let cards = db.open_tree("cards")?;
        Ok(Self { db, index, cards })
    }

    // --- Collection index ---

    /// The user's collection index, creation order. First access provisions
    /// an empty index document; calling this repeatedly is safe.
    pub fn collections(&self, user: &str) -> Result<Vec<CollectionEntry>> {
        match self.index.get(user.as_bytes())? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => {
                self.index.insert(user.as_bytes(), encode_entries(&[])?)?;
                Ok(Vec::new())
            }
        }
    }

    /// Append a collection entry. The duplicate check and the write happen
    /// inside one transaction, so concurrent adds serialize at the store.
    pub fn add_collection(&self, user: &str, name: &str) -> Result<()> {
        validate_name(name)?;
        self.index
            .transaction(|idx| {
                let raw = idx.get(user.as_bytes())?;
                let mut entries =
                    decode_entries(raw.as_deref()).map_err(|e| abort(Error::Corrupt(e)))?;
                if entries.iter().any(|e| e.name == name) {
                    return Err(abort(Error::DuplicateName(name.to_string())));
                }
                entries.push(CollectionEntry {
                    name: name.to_string(),
                });
                let encoded = encode_entries(&entries).map_err(|e| abort(Error::Corrupt(e)))?;
                idx.insert(user.as_bytes(), encoded)?;
                Ok(())
            })
            .map_err(tx_err)
    }

    /// Drop a collection: index entry plus every card under its key, one
    /// atomic commit. Removing an absent collection is not an error.
    pub fn remove_collection(&self, user: &str, name: &str) -> Result<()> {
        validate_name(name)?;
        let doomed: Vec<IVec> = self
            .cards
            .scan_prefix(card_prefix(user, name))
            .keys()
            .collect::<std::result::Result<_, _>>()?;
        (&self.index, &self.cards)
            .transaction(|(idx, cards)| {
                let raw = idx.get(user.as_bytes())?;
                let mut entries =
                    decode_entries(raw.as_deref()).map_err(|e| abort(Error::Corrupt(e)))?;
                entries.retain(|e| e.name != name);
                let encoded = encode_entries(&entries).map_err(|e| abort(Error::Corrupt(e)))?;
                idx.insert(user.as_bytes(), encoded)?;
                for key in &doomed {
                    cards.remove(key.clone())?;
                }
                Ok(())
            })
            .map_err(tx_err)
    }

    /// Rename a collection, relocating its cards.
    ///
    /// The index checks (`NotFound` on a missing source, `DuplicateName` on
    /// a taken target) re-run against fresh state inside the transaction, so
    /// a racing rename loses cleanly rather than clobbering. The card set is
    /// snapshotted before the transaction; a card inserted into the old key
    /// concurrently with the commit can be stranded there. Single writer per
    /// user is assumed.
    ///
    /// Renaming a collection to its own name is a no-op success.
    pub fn rename_collection(&self, user: &str, old: &str, new: &str) -> Result<()> {
        validate_name(old)?;
        validate_name(new)?;
        if old == new {
            return Ok(());
        }

        // Snapshot the cards to relocate. Destination ids are fresh.
        let mut moved: Vec<(IVec, Vec<u8>, IVec)> = Vec::new();
        for item in self.cards.scan_prefix(card_prefix(user, old)) {
            let (key, value) = item?;
            moved.push((key, card_key(user, new), value));
        }

        (&self.index, &self.cards)
            .transaction(|(idx, cards)| {
                let raw = idx.get(user.as_bytes())?;
                let mut entries =
                    decode_entries(raw.as_deref()).map_err(|e| abort(Error::Corrupt(e)))?;
                if entries.iter().any(|e| e.name == new) {
                    return Err(abort(Error::DuplicateName(new.to_string())));
                }
                let entry = entries
                    .iter_mut()
                    .find(|e| e.name == old)
                    .ok_or_else(|| abort(Error::NotFound(old.to_string())))?;
                // Rename in place: the entry keeps its position
                entry.name = new.to_string();
                let encoded = encode_entries(&entries).map_err(|e| abort(Error::Corrupt(e)))?;
                idx.insert(user.as_bytes(), encoded)?;
                for (old_key, new_key, value) in &moved {
                    cards.insert(new_key.as_slice(), value.clone())?;
                    cards.remove(old_key.clone())?;
                }
                Ok(())
            })
            .map_err(tx_err)
    }

    /// Save a freshly generated collection: index entry plus all its cards
    /// in one atomic commit. Fails `DuplicateName` if the name is taken.
    pub fn save_collection(&self, user: &str, name: &str, cards: &[Card]) -> Result<()> {
        validate_name(name)?;
        let mut staged: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(cards.len());
        for card in cards {
            staged.push((card_key(user, name), serde_json::to_vec(card)?));
        }
        (&self.index, &self.cards)
            .transaction(|(idx, tree)| {
                let raw = idx.get(user.as_bytes())?;
                let mut entries =
                    decode_entries(raw.as_deref()).map_err(|e| abort(Error::Corrupt(e)))?;
                if entries.iter().any(|e| e.name == name) {
                    return Err(abort(Error::DuplicateName(name.to_string())));
                }
                entries.push(CollectionEntry {
                    name: name.to_string(),
                });
                let encoded = encode_entries(&entries).map_err(|e| abort(Error::Corrupt(e)))?;
                idx.insert(user.as_bytes(), encoded)?;
                for (key, value) in &staged {
                    tree.insert(key.as_slice(), value.as_slice())?;
                }
                Ok(())
            })
            .map_err(tx_err)
    }

    // --- Card store ---

    /// All cards in one collection; empty vec when there are none.
    pub fn list_cards(&self, user: &str, collection: &str) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        for item in self.cards.scan_prefix(card_prefix(user, collection)) {
            let (_, value) = item?;
            cards.push(serde_json::from_slice(&value)?);
        }
        Ok(cards)
    }

    /// Append cards to a collection as one batch; each gets a fresh id.
    /// No partial commit: either all land or none do.
    pub fn insert_cards(&self, user: &str, collection: &str, cards: &[Card]) -> Result<()> {
        validate_name(collection)?;
        let mut batch = sled::Batch::default();
        for card in cards {
            batch.insert(card_key(user, collection), serde_json::to_vec(card)?);
        }
        self.cards.apply_batch(batch)?;
        Ok(())
    }

    /// Delete every card under the collection key, one batch. Idempotent.
    pub fn delete_cards(&self, user: &str, collection: &str) -> Result<()> {
        let mut batch = sled::Batch::default();
        for key in self.cards.scan_prefix(card_prefix(user, collection)).keys() {
            batch.remove(key?);
        }
        self.cards.apply_batch(batch)?;
        Ok(())
    }

    /// Copy every card to the new collection key (fresh ids) and delete the
    /// originals, one batch. Moving an empty collection is a legal no-op.
    pub fn move_cards(&self, user: &str, old: &str, new: &str) -> Result<()> {
        validate_name(old)?;
        validate_name(new)?;
        let mut batch = sled::Batch::default();
        for item in self.cards.scan_prefix(card_prefix(user, old)) {
            let (key, value) = item?;
            batch.insert(card_key(user, new), value);
            batch.remove(key);
        }
        self.cards.apply_batch(batch)?;
        Ok(())
    }
}
