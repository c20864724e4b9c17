#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod downstream;
pub mod error;
pub mod key;
pub mod keygen;
pub mod time_bounds;

pub use downstream::Downstream;
pub use error::{ExecutionError, ExecutorError};
pub use key::CacheKey;
pub use keygen::KeyGenerator;
pub use time_bounds::TimeBounds;
