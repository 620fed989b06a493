//! Lookup of previous transactions by id
//!
//! Verification asks a [`TxResolver`] for the transaction an input spends.
//! Failures surface as [`TxError::Resolution`] and are never treated as an
//! invalid input. Caching, where wanted, is an explicit [`CachingResolver`]
//! owned by the caller.

use crate::error::{Result, TxError};
use crate::transaction::Tx;
use crate::types::{Hash, Network};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Source of previous transactions
pub trait TxResolver {
    /// Fetch the transaction whose id (display byte order) is `txid`
    fn resolve(&self, txid: &Hash, network: Network) -> Result<Tx>;
}

impl<T: TxResolver + ?Sized> TxResolver for &T {
    fn resolve(&self, txid: &Hash, network: Network) -> Result<Tx> {
        (**self).resolve(txid, network)
    }
}

/// Resolver over a fixed set of transactions
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    txs: HashMap<Hash, Tx>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tx` under its computed id
    pub fn insert(&mut self, tx: Tx) {
        self.txs.insert(tx.hash(), tx);
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

impl FromIterator<Tx> for MemoryResolver {
    fn from_iter<I: IntoIterator<Item = Tx>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for tx in iter {
            resolver.insert(tx);
        }
        resolver
    }
}

impl TxResolver for MemoryResolver {
    fn resolve(&self, txid: &Hash, _network: Network) -> Result<Tx> {
        self.txs
            .get(txid)
            .cloned()
            .ok_or_else(|| {
                TxError::Resolution(format!("transaction {} not found", hex::encode(txid)))
            })
    }
}

/// Concurrent cache in front of another resolver
///
/// Entries are checked on insertion: a transaction whose computed id differs
/// from the requested id is rejected.
#[derive(Debug)]
pub struct CachingResolver<R> {
    inner: R,
    cache: DashMap<Hash, Tx>,
}

impl<R: TxResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, txid: &Hash) -> bool {
        self.cache.contains_key(txid)
    }

    /// Drop one cached entry; returns whether it was present
    pub fn invalidate(&self, txid: &Hash) -> bool {
        self.cache.remove(txid).is_some()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Load a JSON object mapping txid hex to raw transaction hex
    pub fn load_cache(&self, path: &Path, network: Network) -> Result<usize> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TxError::Serialization(format!("reading cache {}: {}", path.display(), e))
        })?;
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&json).map_err(|e| TxError::Serialization(e.to_string()))?;
        let mut loaded = 0;
        for (id, raw) in entries {
            let txid = parse_txid(&id)?;
            let tx = Tx::from_hex(&raw, network)?;
            check_id(&txid, &tx)?;
            self.cache.insert(txid, tx);
            loaded += 1;
        }
        debug!(loaded, path = %path.display(), "loaded transaction cache");
        Ok(loaded)
    }

    /// Write the cache in the format read by [`Self::load_cache`]
    pub fn dump_cache(&self, path: &Path) -> Result<()> {
        let entries: BTreeMap<String, String> = self
            .cache
            .iter()
            .map(|entry| (hex::encode(entry.key()), hex::encode(entry.value().serialize())))
            .collect();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| TxError::Serialization(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| {
            TxError::Serialization(format!("writing cache {}: {}", path.display(), e))
        })
    }
}

impl<R: TxResolver> TxResolver for CachingResolver<R> {
    fn resolve(&self, txid: &Hash, network: Network) -> Result<Tx> {
        if let Some(tx) = self.cache.get(txid) {
            debug!(txid = %hex::encode(txid), "cache hit");
            return Ok(tx.clone());
        }
        debug!(txid = %hex::encode(txid), "cache miss");
        let tx = self.inner.resolve(txid, network)?;
        check_id(txid, &tx)?;
        self.cache.insert(*txid, tx.clone());
        Ok(tx)
    }
}

fn check_id(txid: &Hash, tx: &Tx) -> Result<()> {
    if &tx.hash() != txid {
        return Err(TxError::Resolution(format!(
            "resolved transaction {} does not match requested id {}",
            tx.id(),
            hex::encode(txid)
        )));
    }
    Ok(())
}

/// Parse a 64-character txid in display byte order
pub fn parse_txid(id: &str) -> Result<Hash> {
    let bytes = hex::decode(id)
        .map_err(|e| TxError::MalformedEncoding(format!("txid {}: {}", id, e)))?;
    bytes
        .try_into()
        .map_err(|_| TxError::MalformedEncoding(format!("txid {} is not 32 bytes", id)))
}
