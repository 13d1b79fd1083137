//! Property bags: the tagged value model, `defaults` inheritance and
//! conditional overlays.

pub mod defaults;
pub mod overlay;
pub mod value;

pub use value::{PropertyError, PropertyKind, PropertyMap, PropertyMapExt, PropertyValue};
