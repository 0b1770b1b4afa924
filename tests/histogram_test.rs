mod test_utils;

use simpledb::histogram::IntHistogram;
use simpledb::predicate::Op;

// spec scenario 5.
#[test]
fn integer_histogram_matches_expected_estimates() {
    let mut h = IntHistogram::new(10, 0, 99);
    for v in 0..100 {
        h.add_value(v);
    }

    let eq = h.estimate_selectivity(Op::Equals, 5);
    assert!((eq - 0.01).abs() < 0.01, "eq = {}", eq);

    let lt = h.estimate_selectivity(Op::LessThan, 50);
    assert!((lt - 0.50).abs() < 0.05, "lt = {}", lt);

    let ne = h.estimate_selectivity(Op::NotEquals, 200);
    assert_eq!(ne, 1.0);
}
