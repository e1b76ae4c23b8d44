mod feed;

pub use feed::ApiFeed;
