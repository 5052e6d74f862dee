//! # Response Cache
//!
//! Memoizes replies to read calls, keyed on the exact call.
//!
//! ## Invariants
//! - **Exact Keys**: A key is (service, method, canonical request bytes). Two requests
//!   share an entry only if all three are equal.
//! - **Last Write Wins**: Adding an existing key overwrites it.
//! - **All or Nothing Ingestion**: Server-supplied entries are resolved completely
//!   before any of them is stored.
//! - **Cacheable Only**: Server-supplied entries for calls the ledger does not mark
//!   cacheable are dropped, never stored.

use std::sync::Arc;

use dashmap::DashMap;
use edbrpc::EdbObj;
use edbrpc::MessageRegistry;
use tracing::debug;

use crate::error::Result;
use crate::rpc_info::RpcLedger;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    service: String,
    method: String,
    request: Vec<u8>,
}

impl CacheKey {
    fn new(service: &str, method: &str, request: &[u8]) -> Self {
        Self { service: service.to_string(), method: method.to_string(), request: request.to_vec() }
    }
}

/// A cached reply payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome(Arc<[u8]>);

impl CacheOutcome {
    pub fn result(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug)]
pub struct ResponseCache {
    responses: DashMap<CacheKey, CacheOutcome>,
    messages: Arc<MessageRegistry>,
    ledger: Arc<RpcLedger>,
}

impl ResponseCache {
    pub fn new(messages: Arc<MessageRegistry>, ledger: Arc<RpcLedger>) -> Self {
        Self { responses: DashMap::new(), messages, ledger }
    }

    pub fn get(&self, service: &str, method: &str, request: &[u8]) -> Option<CacheOutcome> {
        self.responses.get(&CacheKey::new(service, method, request)).map(|hit| hit.value().clone())
    }

    pub fn add(&self, service: &str, method: &str, request: &[u8], response: &[u8]) {
        self.responses
            .insert(CacheKey::new(service, method, request), CacheOutcome(Arc::from(response)));
    }

    /// Ingests the pre-answered requests a server attached to a handle, then
    /// clears them from the message. Returns how many entries were stored.
    /// Entries for calls that are not cacheable are skipped.
    ///
    /// Fails with an unknown message type error, leaving the cache untouched,
    /// if any entry names a type the registry does not know.
    pub fn add_from_cache_msg(&self, msg: &mut EdbObj) -> Result<usize> {
        let Some(cache) = msg.cache.as_ref() else { return Ok(0) };

        let mut resolved = Vec::with_capacity(cache.entries.len());
        for entry in &cache.entries {
            let request = self.messages.canonicalize(&entry.request)?;
            let response = self.messages.canonicalize(&entry.response)?;
            if !self.ledger.can_cache(&entry.service_name, &entry.rpc_method_name) {
                debug!(service = %entry.service_name, method = %entry.rpc_method_name, "skipping piggybacked entry for an uncacheable call");
                continue;
            }
            resolved.push((CacheKey { service: entry.service_name.clone(), method: entry.rpc_method_name.clone(), request }, response));
        }
        msg.cache = None;

        let count = resolved.len();
        for (key, response) in resolved {
            self.responses.insert(key, CacheOutcome(Arc::from(response)));
        }
        debug!(id = msg.id, count, "ingested piggybacked cache entries");
        Ok(count)
    }

    /// Drops every entry. Returns whether anything was dropped.
    pub fn invalidate(&self) -> bool {
        let had_entries = !self.responses.is_empty();
        self.responses.clear();
        had_entries
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use edbrpc::AnyMsg;
    use edbrpc::CacheEntry;
    use edbrpc::CacheMsg;
    use edbrpc::RpcError;
    use edbrpc::encode;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::error::Error;
    use crate::messages::StringMsg;
    use crate::messages::TypeMsg;
    use crate::rpc_info::RpcInfo;

    fn cache() -> ResponseCache {
        let messages = MessageRegistry::new().register::<EdbObj>().register::<TypeMsg>().register::<StringMsg>();
        let ledger = RpcLedger::new()
            .with("svc", "GetPrimitiveType", RpcInfo::READ)
            .with("svc", "SetName", RpcInfo::BUFFERED_WRITE);
        ResponseCache::new(Arc::new(messages), Arc::new(ledger))
    }

    fn random_triple(rng: &mut StdRng) -> (String, String, Vec<u8>) {
        let service = format!("svc{}", rng.gen_range(0..3));
        let method = format!("m{}", rng.gen_range(0..3));
        let request = encode(&EdbObj::new(rng.gen_range(1..4))).unwrap();
        (service, method, request)
    }

    #[test]
    fn test_hit_only_on_exact_triple() {
        let cache = cache();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let stored = random_triple(&mut rng);
            let lookup = random_triple(&mut rng);
            cache.invalidate();
            cache.add(&stored.0, &stored.1, &stored.2, b"reply");

            let hit = cache.get(&lookup.0, &lookup.1, &lookup.2);
            assert_eq!(hit.is_some(), stored == lookup, "stored {:?}, looked up {:?}", stored, lookup);
        }
    }

    #[test]
    fn test_last_write_wins() {
        let cache = cache();
        cache.add("svc", "GetName", b"req", b"old");
        cache.add("svc", "GetName", b"req", b"new");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("svc", "GetName", b"req").unwrap().result(), b"new");
    }

    #[test]
    fn test_invalidate_reports_whether_anything_was_dropped() {
        let cache = cache();
        assert!(!cache.invalidate());
        cache.add("svc", "GetName", b"req", b"reply");
        assert!(cache.invalidate());
        assert!(cache.is_empty());
    }

    fn type_entry(id: u64, tag: i32) -> CacheEntry {
        CacheEntry::new("svc", "GetPrimitiveType", &EdbObj::new(id), &TypeMsg { tag }).unwrap()
    }

    #[test]
    fn test_ingestion_is_idempotent() {
        let cache = cache();
        let mut msg = EdbObj::new(9).with_cache(CacheMsg { entries: vec![type_entry(9, 1)] });

        assert_eq!(cache.add_from_cache_msg(&mut msg).unwrap(), 1);
        assert!(msg.cache.is_none());
        assert_eq!(cache.add_from_cache_msg(&mut msg).unwrap(), 0);
        assert_eq!(cache.len(), 1);

        let request = encode(&EdbObj::new(9)).unwrap();
        let hit = cache.get("svc", "GetPrimitiveType", &request).unwrap();
        assert_eq!(edbrpc::decode::<TypeMsg>(hit.result()).unwrap(), TypeMsg { tag: 1 });
    }

    #[test]
    fn test_unknown_type_leaves_cache_untouched() {
        let cache = cache();
        let mut bogus = type_entry(2, 0);
        bogus.response = AnyMsg { type_name: "no.such.Message".into(), value: Vec::new() };
        let mut msg = EdbObj::new(1).with_cache(CacheMsg { entries: vec![type_entry(1, 0), bogus] });

        match cache.add_from_cache_msg(&mut msg) {
            Err(Error::Rpc(RpcError::UnknownMessageType(name))) => assert_eq!(name, "no.such.Message"),
            other => panic!("expected unknown message type, got {:?}", other),
        }
        assert!(cache.is_empty());
        assert!(msg.cache.is_some());
    }

    #[test]
    fn test_uncacheable_entries_are_skipped() {
        let cache = cache();
        let rename = CacheEntry::new("svc", "SetName", &StringMsg { value: "VCC".into() }, &StringMsg::default()).unwrap();
        let unknown = CacheEntry::new("svc", "GetComment", &EdbObj::new(3), &StringMsg::default()).unwrap();
        let mut msg = EdbObj::new(3).with_cache(CacheMsg { entries: vec![rename, type_entry(3, 2), unknown] });

        assert_eq!(cache.add_from_cache_msg(&mut msg).unwrap(), 1);
        assert_eq!(cache.len(), 1);
        assert!(msg.cache.is_none());

        let request = encode(&StringMsg { value: "VCC".into() }).unwrap();
        assert!(cache.get("svc", "SetName", &request).is_none());
    }
}
