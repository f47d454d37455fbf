//! Image pagination policy.
//!
//! Three images per page. The first chunk shares the page with the host's
//! section banner and body; every further chunk starts a fresh page with a
//! "(continued)" banner. The per-page counter resets whenever a page
//! starts, including the forced page at the beginning of a host section.

use std::path::PathBuf;

pub const IMAGES_PER_PAGE: usize = 3;

/// One planned page of a host section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// A continuation page repeats the host banner before its images.
    pub continued: bool,
    pub images: Vec<PathBuf>,
}

/// Plan the pages for one host's image sequence.
///
/// Always yields at least one page: a host with zero images still gets its
/// section page and no image pages after it.
pub fn plan_host_pages(images: &[PathBuf]) -> Vec<PagePlan> {
    if images.is_empty() {
        return vec![PagePlan {
            continued: false,
            images: Vec::new(),
        }];
    }
    images
        .chunks(IMAGES_PER_PAGE)
        .enumerate()
        .map(|(index, chunk)| PagePlan {
            continued: index > 0,
            images: chunk.to_vec(),
        })
        .collect()
}
