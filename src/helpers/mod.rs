//! HTML helpers applied to rendered markdown
//!
//! The table of contents is built from the headings a markdown parse
//! collected; the typographic pass runs over the finished fragment.

mod toc;
pub mod typography;

pub use toc::render_toc;
pub use typography::postprocess;
