//! Archive download
//!
//! [`Transport`] is the seam between the workflow and the network:
//! [`HttpTransport`] talks to real servers, tests plug in in-memory fakes.

mod download;
mod http;
mod traits;


pub use download::{DownloadTarget, download_to};
pub use http::HttpTransport;
pub use traits::{ByteStream, TransferResponse, Transport};
