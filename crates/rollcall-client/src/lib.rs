#[cfg(feature = "browser")]
pub mod browser_source;
pub mod file_source;
pub mod mirror;
pub mod parser;
pub mod source;

#[cfg(feature = "browser")]
pub use browser_source::BrowserSource;
pub use file_source::FileSource;
pub use mirror::Mirror;
pub use parser::parse_html;
pub use source::{CaptureSource, PageCapture};
