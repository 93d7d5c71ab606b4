pub mod error;
pub mod types;

pub use types::{
    CastMember, Favorite, FilterTuple, Genre, Movie, MovieDetails, Paged, Session, TimeWindow,
    UserProfile, Video,
};
