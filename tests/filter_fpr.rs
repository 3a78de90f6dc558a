use amq_filters::{AmqFilter, Config, CuckooFilter, QuotientFilter, Result, XorFilter};
use test_log::test;

fn keys(range: std::ops::Range<u128>) -> Vec<Vec<u8>> {
    range.map(|x| x.to_be_bytes().to_vec()).collect()
}

fn false_positive_rate<F: AmqFilter>(filter: &F, non_existent_keys: &[Vec<u8>]) -> f64 {
    let hits = non_existent_keys
        .iter()
        .filter(|key| filter.contains(key.as_slice()))
        .count();

    hits as f64 / non_existent_keys.len() as f64
}

// [Empirical] Cuckoo FPR at 76% load: ~2.4%
#[test]
fn cuckoo_fpr() -> Result<()> {
    let keys = keys(0..100_000);
    let non_existent_keys = self::keys(100_000..200_000);

    let filter = CuckooFilter::new(&Config::new(100_000).seed(1))?;

    for key in &keys {
        filter.set(key.as_slice())?;
    }

    for key in &keys {
        assert!(filter.contains(key.as_slice()));
    }

    let fpr = false_positive_rate(&filter, &non_existent_keys);
    println!(
        "[Load] {:.2}, [Empirical] Cuckoo FPR: {:.4}%",
        filter.load_factor(),
        fpr * 100.0,
    );
    assert!(fpr < 0.04);

    Ok(())
}

// [Theoretical] FPR: 1.0000%, [Empirical] Quotient FPR: ~0.5%
// [Theoretical] FPR: 0.1000%, [Empirical] Quotient FPR: ~0.06%
#[test]
fn quotient_fpr() -> Result<()> {
    let keys = keys(0..10_000);
    let non_existent_keys = self::keys(10_000..110_000);

    for fpp in [0.01, 0.001] {
        let filter = QuotientFilter::new(&Config::new(10_000).false_positive_rate(fpp))?;

        for key in &keys {
            filter.set(key.as_slice())?;
        }

        // Keys may collide on their full fingerprint
        assert!(filter.size() > 9_900);
        assert!(filter.size() <= 10_000);

        for key in &keys {
            assert!(filter.contains(key.as_slice()));
        }

        let fpr = false_positive_rate(&filter, &non_existent_keys);
        println!(
            "[Theoretical] FPR: {:.4}%, [Empirical] Quotient FPR: {:.4}%",
            fpp * 100.0,
            fpr * 100.0,
        );
        assert!(fpr < fpp);
    }

    Ok(())
}

// [Empirical] Xor FPR: ~0.39%
#[test]
fn xor_fpr() -> Result<()> {
    let keys = keys(0..100_000);
    let non_existent_keys = self::keys(100_000..200_000);

    let filter = XorFilter::build(keys.iter().map(Vec::as_slice))?;

    for key in &keys {
        assert!(filter.contains(key.as_slice()));
    }

    let fpr = false_positive_rate(&filter, &non_existent_keys);
    println!("[Empirical] Xor FPR: {:.4}%", fpr * 100.0);
    assert!(fpr < 0.006);

    Ok(())
}

#[test]
fn xor_three_keys_fpr() -> Result<()> {
    let filter = XorFilter::build(["apple", "banana", "cherry"])?;

    for key in ["apple", "banana", "cherry"] {
        assert!(filter.contains(key));
    }

    let false_positives = (0..10_000u32)
        .filter(|i| filter.contains(&format!("missing-{i}")))
        .count();

    // 10000 / 256 ~ 39
    assert!(
        (10..100).contains(&false_positives),
        "{false_positives} false positives",
    );

    Ok(())
}
