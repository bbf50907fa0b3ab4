pub mod book;
pub mod convert;
pub mod error;
pub mod feed;

pub use book::{BookOptions, write_book};
pub use convert::{FbNode, FbTag, Fragment, NodeId, convert_body, convert_html};
pub use error::{Error, Result};
pub use feed::{Author, Entry, Feed};
