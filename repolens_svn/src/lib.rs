//! Subversion backend for repolens, driven through the `svn` command-line
//! client.

mod client;

pub use client::CommandClient;
