#![allow(dead_code)]

use std::sync::Arc;

use movie_recommender::{
    api::{create_router, ApiSettings, AppState},
    catalog::{read_catalog, read_ratings, CatalogStore},
    models::RatingRecord,
    services::{FactorizationConfig, Recommender, Similarity},
};

/// Movies 1-3 are action, 4-6 romance
pub const CATALOG_CSV: &str = "\
movie_id,title,year,imdb_rating,genre,director,cast,plot,url,cover_url
1,Die Hard,1988,8.2,Action|Thriller,John McTiernan,Bruce Willis|Alan Rickman,An officer takes on thieves in a tower.,https://www.imdb.com/title/tt0095016/,
2,Mad Max: Fury Road,2015,8.1,Action|Adventure,George Miller,Tom Hardy|Charlize Theron,Escape across the wasteland.,https://www.imdb.com/title/tt1392190/,
3,The Matrix,1999,8.7,Action|Sci-Fi,Lana Wachowski|Lilly Wachowski,Keanu Reeves,A hacker learns the truth.,https://www.imdb.com/title/tt0133093/,
4,Titanic,1997,7.9,Drama|Romance,James Cameron,Leonardo DiCaprio|Kate Winslet,Love aboard a doomed ship.,https://www.imdb.com/title/tt0120338/,
5,The Notebook,2004,7.8,Drama|Romance,Nick Cassavetes,Rachel McAdams|Ryan Gosling,A summer romance.,not a link,
6,Pride & Prejudice,2005,7.8,Drama|Romance,Joe Wright,Keira Knightley,Elizabeth meets Mr. Darcy.,,
";

/// Two taste clusters; user 1 has only rated movies 1, 2, 4 and 5
pub fn ratings() -> Vec<RatingRecord> {
    let mut csv = String::from("user_id,movie_id,rating\n");
    for (movie, rating) in [(1, 5.0), (2, 5.0), (4, 1.0), (5, 1.0)] {
        csv.push_str(&format!("1,{},{}\n", movie, rating));
    }
    for user in 2..=4 {
        for movie in 1..=6 {
            let rating = if movie <= 3 { 5.0 } else { 1.0 };
            csv.push_str(&format!("{},{},{}\n", user, movie, rating));
        }
    }
    for user in 5..=8 {
        for movie in 1..=6 {
            let rating = if movie <= 3 { 1.0 } else { 5.0 };
            csv.push_str(&format!("{},{},{}\n", user, movie, rating));
        }
    }
    read_ratings(csv.as_bytes()).unwrap()
}

pub fn catalog() -> Arc<CatalogStore> {
    let movies = read_catalog(CATALOG_CSV.as_bytes()).unwrap();
    Arc::new(CatalogStore::new(movies).unwrap())
}

pub fn factorization_config() -> FactorizationConfig {
    FactorizationConfig {
        rank: 2,
        iterations: 1000,
        projection_iterations: 1000,
        seed: 7,
    }
}

pub fn recommender() -> Recommender {
    Recommender::build(catalog(), &ratings(), Similarity::Cosine, &factorization_config()).unwrap()
}

pub fn app_state() -> AppState {
    AppState::new(
        recommender(),
        ApiSettings {
            default_recommendations: 2,
            rate_pool_size: 4,
        },
    )
}

pub fn app() -> axum::Router {
    create_router(app_state())
}
