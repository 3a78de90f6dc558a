// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Binary fuse construction by hypergraph peeling

use super::{
    layout::{tag, Layout},
    pool::Scratch,
};
use crate::{
    hash::{mix_split, splitmix64},
    Error,
};

/// Number of seeds tried before giving up
pub const MAX_ATTEMPTS: usize = 100;

/// Output of a successful build
pub struct Built {
    pub seed: u64,
    pub layout: Layout,
    pub fingerprints: Box<[u8]>,
    pub attempts: usize,
}

fn mod3(x: u8) -> u8 {
    if x > 2 {
        x - 3
    } else {
        x
    }
}

/// Builds the fingerprint array for `hashes`, which must be non-empty and
/// free of duplicates.
pub fn build(hashes: &[u64], initial_seed: u64, scratch: &mut Scratch) -> crate::Result<Built> {
    let size = u32::try_from(hashes.len()).map_err(|_| Error::Unsatisfiable { attempts: 0 })?;

    let layout = Layout::for_size(size);

    let mut block_bits = 1;
    while (1u32 << block_bits) < layout.segment_count {
        block_bits += 1;
    }

    scratch.prepare(
        hashes.len(),
        layout.array_length as usize,
        1usize << block_bits,
    );

    let mut rng_counter = initial_seed;

    for attempt in 1..=MAX_ATTEMPTS {
        let seed = splitmix64(&mut rng_counter);

        scratch.clear();

        if peel(hashes, seed, &layout, block_bits, scratch) {
            return Ok(Built {
                seed,
                layout,
                fingerprints: assign(hashes.len(), &layout, scratch),
                attempts: attempt,
            });
        }

        log::trace!("Peeling {size} keys with seed {seed:#018x} failed (attempt {attempt}), reseeding");
    }

    log::warn!("Could not build xor filter over {size} keys after {MAX_ATTEMPTS} attempts");

    Err(Error::Unsatisfiable {
        attempts: MAX_ATTEMPTS,
    })
}

/// Tries to peel every key off the hypergraph under `seed`.
///
/// On success, `reverse_order`/`reverse_h` hold the peel order.
// NOTE: All indexes are produced by `Layout::hash3` or bounded by the scratch sizes
#[expect(clippy::indexing_slicing)]
#[expect(
    clippy::cast_possible_truncation,
    reason = "slot and key counts fit into u32"
)]
fn peel(hashes: &[u64], seed: u64, layout: &Layout, block_bits: u32, scratch: &mut Scratch) -> bool {
    let size = hashes.len();

    let Scratch {
        reverse_order,
        reverse_h,
        alone,
        t2count,
        t2hash,
        start_pos,
    } = scratch;

    // Bucket the seeded hashes by their top bits, so neighbouring keys touch
    // neighbouring slots
    reverse_order[size] = 1;

    let block_mask = start_pos.len() - 1;
    for (block, pos) in start_pos.iter_mut().enumerate() {
        *pos = ((block as u64 * size as u64) >> block_bits) as u32;
    }

    for &key in hashes {
        let hash = mix_split(key, seed);
        let mut block = (hash >> (u64::BITS - block_bits)) as usize;

        while reverse_order[start_pos[block] as usize] != 0 {
            block = (block + 1) & block_mask;
        }

        reverse_order[start_pos[block] as usize] = hash;
        start_pos[block] += 1;
    }

    let mut overflow = false;

    for &hash in &reverse_order[..size] {
        for (discriminator, slot) in (0u8..).zip(layout.hash3(hash)) {
            t2count[slot] = t2count[slot].wrapping_add(4) ^ discriminator;
            t2hash[slot] ^= hash;

            // Degree counter wrapped around
            overflow |= t2count[slot] < 4;
        }
    }

    if overflow {
        return false;
    }

    let mut queue_len = 0;
    for (slot, &count) in t2count.iter().enumerate() {
        if count >> 2 == 1 {
            alone[queue_len] = slot as u32;
            queue_len += 1;
        }
    }

    let mut peeled = 0;

    while queue_len > 0 {
        queue_len -= 1;
        let slot = alone[queue_len] as usize;

        if t2count[slot] >> 2 != 1 {
            continue;
        }

        let hash = t2hash[slot];
        let found = t2count[slot] & 3;

        reverse_h[peeled] = found;
        reverse_order[peeled] = hash;
        peeled += 1;

        let [h0, h1, h2] = layout.hash3(hash);
        let h012 = [h0, h1, h2, h0, h1];

        for step in 1..=2u8 {
            let other = h012[usize::from(found + step)];

            if t2count[other] >> 2 == 2 {
                alone[queue_len] = other as u32;
                queue_len += 1;
            }

            t2count[other] = t2count[other].wrapping_sub(4) ^ mod3(found + step);
            t2hash[other] ^= hash;
        }
    }

    peeled == size
}

/// Assigns fingerprints in reverse peel order.
// NOTE: All indexes are produced by `Layout::hash3`
#[expect(clippy::indexing_slicing)]
fn assign(size: usize, layout: &Layout, scratch: &Scratch) -> Box<[u8]> {
    let mut fingerprints = vec![0u8; layout.array_length as usize];

    for (&hash, &found) in scratch.reverse_order[..size]
        .iter()
        .zip(&scratch.reverse_h[..size])
        .rev()
    {
        let [h0, h1, h2] = layout.hash3(hash);
        let h012 = [h0, h1, h2, h0, h1];
        let found = usize::from(found);

        fingerprints[h012[found]] =
            tag(hash) ^ fingerprints[h012[found + 1]] ^ fingerprints[h012[found + 2]];
    }

    fingerprints.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn builder_mod3() {
        assert_eq!(0, mod3(0));
        assert_eq!(2, mod3(2));
        assert_eq!(0, mod3(3));
        assert_eq!(1, mod3(4));
    }

    #[test]
    fn builder_every_key_satisfies_xor() -> crate::Result<()> {
        let hashes = (0..5_000u64).map(crate::hash::murmur64).collect::<Vec<_>>();

        let mut scratch = Scratch::default();
        let built = build(&hashes, 1, &mut scratch)?;

        assert!(built.attempts <= MAX_ATTEMPTS);
        assert_eq!(
            built.layout.array_length as usize,
            built.fingerprints.len(),
        );

        for &key in &hashes {
            let hash = mix_split(key, built.seed);

            let xor = built
                .layout
                .hash3(hash)
                .iter()
                .filter_map(|&slot| built.fingerprints.get(slot))
                .fold(tag(hash), |acc, fp| acc ^ fp);

            assert_eq!(0, xor);
        }

        Ok(())
    }
}
