mod encode;
mod pagination;
mod parser;
mod request;

pub use encode::encode_path_segment;
pub(crate) use pagination::{collect_pages, walk_pages, PageSettings};
pub(crate) use request::{build_headers, check_status, remote_message};
