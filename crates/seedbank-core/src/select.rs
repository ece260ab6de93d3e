//! Deterministic seeded selection over record pools.
//!
//! The PRNG is frozen to ChaCha8 seeded via `seed_from_u64`; collaborating
//! processes that share a pool must use the same algorithm to arrive at
//! identical partitions. Shuffling is Fisher-Yates as implemented by
//! `SliceRandom::shuffle`, sampling without replacement goes through
//! `rand::seq::index::sample`.

use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::error::Error;
use crate::record::{category_of, scalar_string};

/// Selection strategy requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    Select,
    Shuffle,
    Filter,
    Distribute,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        SelectionMethod::Select
    }
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Select => "select",
            SelectionMethod::Shuffle => "shuffle",
            SelectionMethod::Filter => "filter",
            SelectionMethod::Distribute => "distribute",
        }
    }
}

impl FromStr for SelectionMethod {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(SelectionMethod::Select),
            "shuffle" => Ok(SelectionMethod::Shuffle),
            "filter" => Ok(SelectionMethod::Filter),
            "distribute" => Ok(SelectionMethod::Distribute),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Pick `count` records from `pool` using `seed`.
///
/// Draws with replacement when `allow_duplicates` is set or `count`
/// reaches the pool size; otherwise samples `min(count, len)` distinct
/// records. An empty pool yields an empty selection.
pub fn select(pool: &[Value], seed: u64, count: usize, allow_duplicates: bool) -> Vec<Value> {
    if pool.is_empty() {
        return Vec::new();
    }
    let mut rng = seeded_rng(seed);
    if allow_duplicates || count >= pool.len() {
        (0..count)
            .map(|_| pool[rng.random_range(0..pool.len())].clone())
            .collect()
    } else {
        rand::seq::index::sample(&mut rng, pool.len(), count)
            .iter()
            .map(|index| pool[index].clone())
            .collect()
    }
}

/// Full seeded permutation of `pool`, truncated to `limit` when given.
pub fn shuffle(pool: &[Value], seed: u64, limit: Option<usize>) -> Vec<Value> {
    let mut items = pool.to_vec();
    let mut rng = seeded_rng(seed);
    items.shuffle(&mut rng);
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

fn value_matches(value: &Value, wanted: &[String]) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_string)
            .any(|item| wanted.iter().any(|w| *w == item)),
        other => scalar_string(other)
            .map(|text| wanted.iter().any(|w| *w == text))
            .unwrap_or(false),
    }
}

/// Restrict `pool` to records whose `filter_key` value is one of
/// `filter_values`, then select with the same seed. Array-valued fields
/// match when any element matches.
pub fn filter_and_select(
    pool: &[Value],
    seed: u64,
    count: usize,
    filter_key: &str,
    filter_values: &[String],
) -> Vec<Value> {
    let filtered: Vec<Value> = pool
        .iter()
        .filter(|record| {
            record
                .get(filter_key)
                .map(|value| value_matches(value, filter_values))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    select(&filtered, seed, count, false)
}

/// Stratified selection: bucket by `category_key`, allocate `total` across
/// buckets as evenly as possible, then shuffle the concatenation.
///
/// Buckets are visited in first-occurrence order; the first `total % K`
/// buckets absorb the remainder. Bucket `i` samples without replacement
/// with sub-seed `seed + i`, so adding a bucket never disturbs the draws
/// of the ones before it.
pub fn distribution(pool: &[Value], seed: u64, category_key: &str, total: usize) -> Vec<Value> {
    if pool.is_empty() || total == 0 {
        return Vec::new();
    }

    let mut buckets: Vec<(String, Vec<Value>)> = Vec::new();
    for record in pool {
        let category = category_of(record, category_key);
        match buckets.iter().position(|(name, _)| *name == category) {
            Some(index) => buckets[index].1.push(record.clone()),
            None => buckets.push((category, vec![record.clone()])),
        }
    }

    let bucket_count = buckets.len();
    let quota = total / bucket_count;
    let remainder = total % bucket_count;

    let mut picked = Vec::with_capacity(total);
    for (index, (_, members)) in buckets.iter().enumerate() {
        let wanted = quota + usize::from(index < remainder);
        let take = wanted.min(members.len());
        if take == 0 {
            continue;
        }
        let mut rng = seeded_rng(seed + index as u64);
        picked.extend(
            rand::seq::index::sample(&mut rng, members.len(), take)
                .iter()
                .map(|i| members[i].clone()),
        );
    }

    let mut rng = seeded_rng(seed);
    picked.shuffle(&mut rng);
    picked.truncate(total);
    picked
}
