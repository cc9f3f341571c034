//! # mimedrop
//!
//! Filename extension correction from sniffed content, and file delivery with
//! download/inline semantics over an abstract response sink.
//!
//! ## Overview
//!
//! - **Registry**: a process-wide, immutable MIME type ↔ extension table
//! - **Detector**: sniffs the MIME type of a buffer or a file on disk
//! - **Resolver**: appends the canonical extension to a name when it is missing
//! - **Delivery**: writes the download headers and the body, then finishes the response
//!
//! ## Example
//!
//! ```no_run
//! use mimedrop::{BufferedResponse, ByteSource, ContentDeliveryService, Disposition};
//!
//! # async fn example() -> mimedrop::MimedropResult<()> {
//! let service = ContentDeliveryService::new();
//! let mut response = BufferedResponse::new();
//!
//! // Sniff, fix the name ("scan" -> "scan.pdf") and force a download.
//! let delivered = service
//!     .send(&mut response, "scan", ByteSource::file("/tmp/scan"), Disposition::Attachment)
//!     .await?;
//! println!("{} bytes sent", delivered.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod cancellable;
pub mod config;
pub mod delivery;
pub mod detector;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod response;

pub use cancellable::Cancellable;
pub use config::{DeliveryConfig, DetectorConfig};
pub use delivery::{
    deliver, quote_filename, ByteSource, ContentDeliveryService, Delivered, DeliveryRequest,
    Disposition,
};
pub use detector::{ContentDetector, SniffingDetector};
pub use error::{ErrorKind, MimedropError, MimedropResult};
pub use registry::{
    lookup_mime_or_extension, Lookup, MimeExtensionEntry, MimeExtensionRegistry,
};
pub use resolver::{fix_extension, fix_file_ext, fix_stream_ext, has_prefix, has_suffix};
pub use response::{BufferedResponse, HttpWriterSink, ResponseSink, ResponseState};

/// Corrects `name` for content sniffed as `detected_mime`.
pub fn resolve_extension(name: &str, detected_mime: &str) -> String {
    fix_extension(name, detected_mime)
}
