use pager::ImageError;

use crate::Pages;

/// DMA reads whole words, so the store has to start on a word boundary
#[repr(C, align(4))]
struct Aligned<T: ?Sized>(T);

// Generated by `png2array -f bin`
static PAGES: &Aligned<[u8]> = &Aligned(*include_bytes!("../../assets/pages.bin"));

pub fn image_store() -> Result<Pages, ImageError> {
    Pages::new(&PAGES.0)
}
