#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use mp_codec as codec;
pub use mp_convert as convert;
pub use mp_utils as utils;

pub use mp_convert::{Serializer, SerializerOptions};
