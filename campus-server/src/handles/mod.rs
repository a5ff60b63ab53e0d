mod doc_handle;
mod group_handle;

pub use doc_handle::*;
pub use group_handle::*;
