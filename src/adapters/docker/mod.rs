mod client;
mod stats;

pub use client::DockerAdapter;
