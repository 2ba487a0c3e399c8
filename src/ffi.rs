// FFI bindings for C/C++/Kotlin (JNI shims)
use std::os::raw::{c_char, c_float, c_int};
use std::slice;

use crate::{DocScanner, Mat, Point2f, Shape};

/// Opaque handle to a DocScanner instance
pub struct DSHandle {
    inner: DocScanner,
}

/// Interleaved 8-bit image owned by the library
#[repr(C)]
pub struct CImage {
    pub data: *mut u8,
    pub len: usize,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

/// Corners in TL, TR, BL, BR order
#[repr(C)]
#[derive(Default)]
pub struct CShape {
    pub tl_x: c_float,
    pub tl_y: c_float,
    pub tr_x: c_float,
    pub tr_y: c_float,
    pub bl_x: c_float,
    pub bl_y: c_float,
    pub br_x: c_float,
    pub br_y: c_float,
}

impl From<Shape> for CShape {
    fn from(s: Shape) -> Self {
        Self {
            tl_x: s.top_left.x,
            tl_y: s.top_left.y,
            tr_x: s.top_right.x,
            tr_y: s.top_right.y,
            bl_x: s.bottom_left.x,
            bl_y: s.bottom_left.y,
            br_x: s.bottom_right.x,
            br_y: s.bottom_right.y,
        }
    }
}

impl From<&CShape> for Shape {
    fn from(c: &CShape) -> Self {
        Shape::new(
            Point2f::new(c.tl_x, c.tl_y),
            Point2f::new(c.tr_x, c.tr_y),
            Point2f::new(c.bl_x, c.bl_y),
            Point2f::new(c.br_x, c.br_y),
        )
    }
}

unsafe fn mat_from_raw(pixels: *const u8, width: u32, height: u32, channels: u32) -> Option<Mat> {
    if pixels.is_null() {
        return None;
    }
    let len = width as usize * height as usize * channels as usize;
    let buf = slice::from_raw_parts(pixels, len).to_vec();
    Mat::from_raw(width, height, channels as usize, buf).ok()
}

/// Create a scanner with default settings
#[no_mangle]
pub extern "C" fn docscan_new() -> *mut DSHandle {
    Box::into_raw(Box::new(DSHandle {
        inner: DocScanner::default(),
    }))
}

/// Detect the document outline in a raw pixel buffer
///
/// # Safety
/// - handle must be a valid pointer returned from docscan_new
/// - pixels must point to width * height * channels bytes
/// - shape_out must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn docscan_detect(
    handle: *mut DSHandle,
    pixels: *const u8,
    width: u32,
    height: u32,
    channels: u32,
    shape_out: *mut CShape,
) -> c_int {
    if handle.is_null() || shape_out.is_null() {
        return -1;
    }
    let Some(mat) = mat_from_raw(pixels, width, height, channels) else {
        return -2;
    };

    match (*handle).inner.detect(&mat) {
        Ok(shape) => {
            *shape_out = CShape::from(shape);
            0
        }
        Err(_) => -3,
    }
}

/// Warp the region outlined by shape onto an upright rectangle
///
/// # Safety
/// - handle must be a valid pointer returned from docscan_new
/// - pixels must point to width * height * channels bytes
/// - shape and image_out must be valid pointers
/// - image_out will be allocated and must be freed with docscan_free_image
#[no_mangle]
pub unsafe extern "C" fn docscan_scan(
    handle: *mut DSHandle,
    pixels: *const u8,
    width: u32,
    height: u32,
    channels: u32,
    shape: *const CShape,
    image_out: *mut CImage,
) -> c_int {
    if handle.is_null() || shape.is_null() || image_out.is_null() {
        return -1;
    }
    let Some(mat) = mat_from_raw(pixels, width, height, channels) else {
        return -2;
    };

    let page = match (*handle).inner.scan(&mat, &Shape::from(&*shape)) {
        Ok(p) => p,
        Err(_) => return -3,
    };

    let (w, h, c) = (page.cols() as u32, page.rows() as u32, page.channels() as u32);
    let data = page.to_vec().into_boxed_slice();
    let len = data.len();
    *image_out = CImage {
        data: Box::into_raw(data) as *mut u8,
        len,
        width: w,
        height: h,
        channels: c,
    };
    0
}

/// Free pixels returned from docscan_scan
///
/// # Safety
/// image must have been filled by docscan_scan and not freed before
#[no_mangle]
pub unsafe extern "C" fn docscan_free_image(image: *mut CImage) {
    if image.is_null() || (*image).data.is_null() {
        return;
    }
    let img = &mut *image;
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(img.data, img.len)));
    img.data = std::ptr::null_mut();
    img.len = 0;
}

/// Free a DocScanner instance
///
/// # Safety
/// handle must be a valid pointer returned from docscan_new
#[no_mangle]
pub unsafe extern "C" fn docscan_free(handle: *mut DSHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn docscan_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
