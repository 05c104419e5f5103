// Property tests: the write buffer agrees with a sorted model.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use prefix_hash_get::get_context::{GetContext, GetState, LazyValue};
use prefix_hash_get::iterator::MemTableIterator;
use prefix_hash_get::memtable::PrefixHashBuffer;
use prefix_hash_get::options::HashSkipListOptions;
use prefix_hash_get::transform::FixedPrefixTransform;
use prefix_hash_get::types::{InternalKey, LookupKey, ValueType};
use proptest::prelude::*;

fn buffer(bucket_count: usize) -> PrefixHashBuffer {
    let opts = HashSkipListOptions::default().with_bucket_count(bucket_count);
    PrefixHashBuffer::new(opts, Arc::new(FixedPrefixTransform::new(2))).unwrap()
}

/// Short keys over a tiny alphabet so prefixes and user keys repeat.
fn user_keys() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(b'a'..=b'd', 1..5), 1..80)
}

proptest! {
    #[test]
    fn full_iterator_matches_sorted_model(keys in user_keys(), bucket_count in 1usize..16) {
        let buf = buffer(bucket_count);
        let mut model = Vec::new();
        // the insert index is the sequence, so every internal key is unique
        for (i, k) in keys.iter().enumerate() {
            let ik = InternalKey::new(k.clone(), i as u64 + 1, ValueType::Value);
            buf.insert(ik.clone(), Bytes::from(vec![i as u8]));
            model.push(ik);
        }
        model.sort();

        let mut iter = buf.get_iterator();
        iter.seek_to_first();
        let mut seen = Vec::new();
        while iter.is_valid() {
            seen.push(iter.key().clone());
            iter.next();
        }
        prop_assert_eq!(seen, model.clone());

        for ik in &model {
            prop_assert!(buf.contains(ik));
        }
    }

    #[test]
    fn point_lookup_sees_newest_visible_version(
        keys in user_keys(),
        bucket_count in 1usize..16,
        snapshot in 1u64..100,
    ) {
        let buf = buffer(bucket_count);
        let mut newest: BTreeMap<Vec<u8>, (u64, u8)> = BTreeMap::new();
        for (i, k) in keys.iter().enumerate() {
            let seq = i as u64 + 1;
            buf.insert(InternalKey::new(k.clone(), seq, ValueType::Value), Bytes::from(vec![i as u8]));
            if seq <= snapshot {
                newest.insert(k.clone(), (seq, i as u8));
            }
        }

        for k in &keys {
            let mut ctx = GetContext::new(k).track_sequence();
            buf.get(&LookupKey::new(k.clone(), snapshot), |ik, v| {
                ctx.consider_version(ik.as_parsed(), LazyValue::Plain(v.clone()))
            });
            match newest.get(k) {
                Some(&(seq, byte)) => {
                    prop_assert_eq!(ctx.state(), GetState::Found);
                    prop_assert_eq!(ctx.seq(), Some(seq));
                    prop_assert_eq!(ctx.resolve().unwrap(), Some(Bytes::from(vec![byte])));
                }
                None => {
                    prop_assert_eq!(ctx.state(), GetState::NotFound);
                }
            }
        }
    }
}
