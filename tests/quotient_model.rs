use amq_filters::{quotient::optimal_mqr, AmqFilter, Config, Error, QuotientFilter, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeSet;
use test_log::test;

#[test]
fn quotient_sizing_scenario() -> Result<()> {
    assert_eq!((2_304, 11, 6), optimal_mqr(1_000, 0.01, 0.5)?);

    let filter = QuotientFilter::new(&Config::new(1_000).false_positive_rate(0.01))?;
    assert_eq!(2_304, filter.capacity());
    assert_eq!(11, filter.quotient_bits());
    assert_eq!(6, filter.remainder_bits());
    assert_eq!(2_048, filter.max_items());

    Ok(())
}

// Hashes below 2^(q + r) are stored without loss, so the filter has to
// answer exactly like a set.
#[test]
fn quotient_behaves_like_a_set() -> Result<()> {
    let filter = QuotientFilter::new(&Config::new(1_000))?;
    let fingerprint_bits = filter.quotient_bits() + filter.remainder_bits();

    let mut rng = StdRng::seed_from_u64(42);

    let pool = (0..1_500)
        .map(|_| rng.random_range(0..(1u64 << fingerprint_bits)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut model = BTreeSet::new();

    for step in 0..20_000 {
        let hash = pool[rng.random_range(0..pool.len())];

        if rng.random_bool(0.6) {
            match filter.set_hash(hash) {
                Ok(()) => {
                    model.insert(hash);
                }
                // Cluster would run off the table end
                Err(Error::FilterOverflowed) => {}
                Err(e) => return Err(e),
            }
        } else {
            filter.unset_hash(hash)?;
            model.remove(&hash);
        }

        assert_eq!(model.len() as u64, filter.size(), "size diverged at step {step}");

        if step % 1_000 == 0 {
            for &probe in &pool {
                assert_eq!(
                    model.contains(&probe),
                    filter.contains_hash(probe),
                    "membership of {probe} diverged at step {step}",
                );
            }
        }
    }

    for &probe in &pool {
        assert_eq!(model.contains(&probe), filter.contains_hash(probe));
    }

    for &hash in &model {
        filter.unset_hash(hash)?;
    }
    assert_eq!(0, filter.size());

    Ok(())
}

#[test]
fn quotient_overflow_keeps_contents() -> Result<()> {
    let filter = QuotientFilter::new(&Config::new(8))?;
    let max_items = filter.max_items();

    let mut stored = vec![];

    for key in 0..10_000u64 {
        match filter.set(&key) {
            Ok(()) => stored.push(key),
            Err(Error::FilterOverflowed) => {}
            Err(e) => return Err(e),
        }
    }

    assert!(filter.size() <= max_items);

    for key in &stored {
        assert!(filter.contains(key));
    }

    Ok(())
}

#[test]
fn quotient_rejects_invalid_config() {
    assert!(matches!(
        QuotientFilter::new(&Config::new(1_000).load_factor(0.0)),
        Err(Error::InvalidLoadFactor(_)),
    ));
    assert!(matches!(
        QuotientFilter::new(&Config::new(1_000).false_positive_rate(1.5)),
        Err(Error::InvalidFalsePositiveRate(_)),
    ));
    assert!(matches!(
        QuotientFilter::new(&Config::new(1u64 << 40)),
        Err(Error::BucketOverflow { .. }),
    ));
}
