//! Classic, counting, and scalable Bloom filters over a shared hashing and
//! bit-addressing core.
//!
//! ```
//! use bloomtrio::ClassicBloom;
//!
//! let mut bf = ClassicBloom::new(1000, 0.01).unwrap();
//! bf.add(b"test");
//! assert!(bf.check(b"test"));
//! assert!(!bf.check(b"not_added"));
//! ```

mod bit_array;
mod classic;
mod counting;
pub mod envelope;
mod error;
mod hash;
mod params;
mod scalable;

pub use classic::ClassicBloom;
pub use counting::{bytes_to_int, int_to_bytes, CountingBloom};
pub use envelope::{PROGRAM, VERSION};
pub use error::{BloomError, Result};
pub use params::Params;
pub use scalable::{ScalableBloom, ScalableConfig};
