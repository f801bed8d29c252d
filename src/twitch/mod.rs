//! Twitch chat protocol layer: transport, tag parsing and classification.

pub mod classifier;
pub mod connection;
pub mod emotes;
pub mod message;
pub mod tags;
