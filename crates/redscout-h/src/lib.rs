//! Chromium implementation of the page automation port, over CDP.

pub mod backend;
pub mod cdp;
mod inject;
mod locate;

pub use backend::ChromiumBackend;
pub use cdp::CdpClient;
