use docscan::{CentroidOrderer, CoordsOrderer};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn ordering_is_idempotent(quad in proptest_helpers::arb_quad()) {
        let ordered = CentroidOrderer.order(&quad.to_points());
        prop_assert_eq!(ordered, Some(quad));
        let again = CentroidOrderer.order(&quad.to_points());
        prop_assert_eq!(again, ordered);
        prop_assert!(quad.is_valid());
    }

    #[test]
    fn ordering_ignores_input_order(quad in proptest_helpers::arb_quad(), rot in 0usize..4) {
        let mut pts = quad.to_points();
        pts.rotate_left(rot);
        pts.swap(0, 3);
        prop_assert_eq!(CentroidOrderer.order(&pts), Some(quad));
    }

    #[test]
    fn repeated_point_never_orders(p in proptest_helpers::arb_point(5000.0)) {
        prop_assert_eq!(CentroidOrderer.order(&[p, p, p, p]), None);
    }

    #[test]
    fn ordering_is_total_and_a_permutation(
        a in proptest_helpers::arb_point(1000.0),
        b in proptest_helpers::arb_point(1000.0),
        c in proptest_helpers::arb_point(1000.0),
        d in proptest_helpers::arb_point(1000.0),
    ) {
        let input = [a, b, c, d];
        if let Some(shape) = CentroidOrderer.order(&input) {
            for p in shape.to_points() {
                prop_assert!(input.contains(&p));
            }
            prop_assert!(shape.top_left.x < shape.top_right.x);
            prop_assert!(shape.top_left.y < shape.bottom_left.y);
            prop_assert!(shape.is_valid());
        }
    }

    #[test]
    fn three_points_never_order(
        a in proptest_helpers::arb_point(1000.0),
        b in proptest_helpers::arb_point(1000.0),
        c in proptest_helpers::arb_point(1000.0),
    ) {
        prop_assert_eq!(CentroidOrderer.order(&[a, b, c]), None);
    }
}
