#![allow(clippy::enum_variant_names)]
#![allow(clippy::module_inception)]

pub mod application;
pub mod cache;
pub mod change;
pub mod cli;
pub mod handle;
pub mod path;
pub mod render;
pub mod seed;
pub mod snapshot;
pub mod storage;
pub mod sync;
