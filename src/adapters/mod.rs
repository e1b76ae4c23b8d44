pub mod api;
pub mod docker;
#[cfg(test)]
pub mod fixture;

pub use api::ApiFeed;
pub use docker::DockerAdapter;
