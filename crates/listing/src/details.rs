use moviex_core::{CastMember, MovieDetails};
use moviex_metadata::{MetadataError, MetadataSource, youtube_url};
use serde::Serialize;
use tracing::warn;

const TOP_CAST: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub movie: MovieDetails,
    pub cast: Vec<CastMember>,
    pub trailer_url: Option<String>,
}

/// Movie detail with its leading cast and YouTube trailer.
///
/// The detail record is required; missing credits or videos only leave
/// their part empty.
pub async fn load_details(
    source: &dyn MetadataSource,
    id: u64,
) -> Result<DetailView, MetadataError> {
    let (movie, credits, videos) =
        tokio::join!(source.movie(id), source.credits(id), source.videos(id));
    let movie = movie?;

    let cast = match credits {
        Ok(mut cast) => {
            cast.truncate(TOP_CAST);
            cast
        }
        Err(e) => {
            warn!(movie_id = id, error = %e, "failed to load credits");
            Vec::new()
        }
    };

    let trailer_url = match videos {
        Ok(videos) => videos
            .iter()
            .find(|v| v.kind == "Trailer" && v.site == "YouTube")
            .map(|v| youtube_url(&v.key)),
        Err(e) => {
            warn!(movie_id = id, error = %e, "failed to load videos");
            None
        }
    };

    Ok(DetailView {
        movie,
        cast,
        trailer_url,
    })
}
