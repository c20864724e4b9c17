#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backend;
pub mod codec;
pub mod error;
pub(crate) mod metrics;

pub use backend::{CachePlugin, DynCachePlugin};
pub use codec::Codec;
pub use error::{CodecError, PluginError};
