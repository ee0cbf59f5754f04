mod link_header;

pub(crate) use link_header::link_header;
