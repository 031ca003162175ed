pub(crate) mod common;

mod service;
mod store;
