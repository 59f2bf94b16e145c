//! GraphQL documents sent to the AniList API

const MEDIA_FIELDS: &str = r#"
      id
      idMal
      title {
        romaji
        english
        native
      }
      description(asHtml: false)
      format
      status
      episodes
      genres
      averageScore
      season
      seasonYear
      coverImage {
        extraLarge
        large
        medium
      }
      bannerImage
      studios {
        nodes {
          id
          name
          isMain
        }
      }
      isAdult
"#;

const PAGE_INFO: &str = r#"
    pageInfo {
      total
      currentPage
      lastPage
      hasNextPage
      perPage
    }
"#;

/// Paged search with optional filters
pub fn search_query() -> String {
    format!(
        r#"query ($search: String, $page: Int, $perPage: Int, $format: MediaFormat, $status: MediaStatus, $genres: [String], $seasonYear: Int, $isAdult: Boolean) {{
  Page(page: $page, perPage: $perPage) {{{}
    media(search: $search, type: ANIME, sort: SEARCH_MATCH, format: $format, status: $status, genre_in: $genres, seasonYear: $seasonYear, isAdult: $isAdult) {{{}
    }}
  }}
}}"#,
        PAGE_INFO, MEDIA_FIELDS
    )
}

/// Single media with the streaming episode list
pub fn media_detail_query() -> String {
    format!(
        r#"query ($id: Int) {{
  Media(id: $id, type: ANIME) {{{}
      streamingEpisodes {{
        title
        thumbnail
        url
        site
      }}
  }}
}}"#,
        MEDIA_FIELDS
    )
}

pub fn trending_query() -> String {
    format!(
        r#"query ($page: Int, $perPage: Int) {{
  Page(page: $page, perPage: $perPage) {{{}
    media(type: ANIME, sort: TRENDING_DESC, isAdult: false) {{{}
    }}
  }}
}}"#,
        PAGE_INFO, MEDIA_FIELDS
    )
}

pub fn genre_query() -> String {
    format!(
        r#"query ($genre: String, $page: Int, $perPage: Int) {{
  Page(page: $page, perPage: $perPage) {{{}
    media(genre: $genre, type: ANIME, sort: POPULARITY_DESC, isAdult: false) {{{}
    }}
  }}
}}"#,
        PAGE_INFO, MEDIA_FIELDS
    )
}

pub const GENRE_COLLECTION_QUERY: &str = "query { GenreCollection }";

/// Cheapest query that still exercises the API
pub const HEALTH_QUERY: &str = "query { Page(perPage: 1) { media(type: ANIME) { id } } }";
