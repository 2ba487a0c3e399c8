use docscan::{to_bitmap, to_matrix, Mat};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn matrix_bitmap_round_trip((w, h, c, pixels) in proptest_helpers::arb_raster(24)) {
        let mat = Mat::from_raw(w, h, c, pixels).expect("valid raster");
        let bitmap = to_bitmap(&mat).expect("to bitmap");
        prop_assert_eq!(bitmap.width(), w);
        prop_assert_eq!(bitmap.height(), h);
        prop_assert_eq!(bitmap.color().channel_count() as usize, c);

        let back = to_matrix(&bitmap).expect("to matrix");
        prop_assert_eq!(back, mat);
    }

    #[test]
    fn bitmap_matrix_round_trip((w, h, c, pixels) in proptest_helpers::arb_raster(24)) {
        let bitmap = to_bitmap(&Mat::from_raw(w, h, c, pixels).expect("valid raster"))
            .expect("to bitmap");
        let again = to_bitmap(&to_matrix(&bitmap).expect("to matrix")).expect("to bitmap");
        prop_assert_eq!(again, bitmap);
    }
}
