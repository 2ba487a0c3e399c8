use std::io::Cursor;

use docscan::{
    CropCoords, CropTransformation, DocScanner, Effect, ImageRequest, Mat, Point2f,
    ResizeTransformation, Shape, Size, SizeF, Source, Transformation,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

fn document_photo(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            Rgb([45, 50, 60])
        } else {
            Rgb([235, 230, 225])
        }
    });
    DynamicImage::ImageRgb8(img)
}

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    buf.into_inner()
}

fn assert_near(p: Point2f, x: f32, y: f32, tol: f32) {
    assert!(
        (p.x - x).abs() <= tol && (p.y - y).abs() <= tol,
        "({}, {}) not within {tol} of ({x}, {y})",
        p.x,
        p.y
    );
}

#[test]
fn detects_and_rectifies_encoded_photo() {
    let photo = document_photo(600, 800, 100, 100, 500, 700);
    let mat = ImageRequest::builder()
        .source(Source::Bytes(png_bytes(&photo)))
        .build()
        .expect("request")
        .load()
        .expect("decode");
    assert_eq!(mat.size(), Size::new(600, 800));

    let scanner = DocScanner::default();
    let shape = scanner.detect(&mat).expect("detect");
    assert_near(shape.top_left, 100.0, 100.0, 5.0);
    assert_near(shape.top_right, 500.0, 100.0, 5.0);
    assert_near(shape.bottom_left, 100.0, 700.0, 5.0);
    assert_near(shape.bottom_right, 500.0, 700.0, 5.0);

    let page = scanner.scan(&mat, &shape).expect("scan");
    assert!((page.cols() as i32 - 400).abs() <= 10, "width {}", page.cols());
    assert!((page.rows() as i32 - 600).abs() <= 10, "height {}", page.rows());

    let bw = scanner.apply_effect(&page, Effect::Binary).expect("effect");
    assert_eq!(bw.channels(), 1);
}

#[test]
fn blank_photo_yields_image_bounds() {
    let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([128, 128, 128])));
    let mat = docscan::to_matrix(&blank).expect("matrix");
    let shape = DocScanner::default().detect(&mat).expect("detect");
    assert_eq!(shape, Shape::whole_image(320.0, 240.0));
}

#[test]
fn rectified_size_follows_edge_lengths() {
    let mat = Mat::zeros(400, 400, 3).expect("matrix");
    let shape = Shape::new(
        Point2f::new(50.0, 50.0),
        Point2f::new(150.0, 50.0),
        Point2f::new(50.0, 250.0),
        Point2f::new(150.0, 250.0),
    );
    let page = DocScanner::default().scan(&mat, &shape).expect("scan");
    assert!((page.cols() as i32 - 100).abs() <= 1);
    assert!((page.rows() as i32 - 200).abs() <= 1);
}

#[test]
fn crop_handles_scale_to_source_pixels() {
    let coords: CropCoords = Shape::new(
        Point2f::new(30.0, 40.0),
        Point2f::new(270.0, 40.0),
        Point2f::new(30.0, 360.0),
        Point2f::new(270.0, 360.0),
    );
    let crop = CropTransformation::new(coords, SizeF::new(300.0, 400.0));
    let shape = crop.source_coords(Size::new(1500, 2000)).expect("scale");
    assert_eq!(
        shape.to_points(),
        [
            Point2f::new(150.0, 200.0),
            Point2f::new(1350.0, 200.0),
            Point2f::new(150.0, 1800.0),
            Point2f::new(1350.0, 1800.0),
        ]
    );

    let page = crop
        .transform(Mat::zeros(2000, 1500, 3).expect("matrix"))
        .expect("crop");
    assert_eq!(page.size(), Size::new(1200, 1600));
}

#[test]
fn resize_fits_portrait_and_landscape() {
    let fit = ResizeTransformation::new(1080, 1920);
    assert_eq!(fit.target_size(Size::new(1000, 2000)).expect("fit"), Size::new(960, 1920));
    assert_eq!(fit.target_size(Size::new(2000, 1000)).expect("fit"), Size::new(1080, 540));
}
