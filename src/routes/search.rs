use crate::{
    data::entity::{EntityKind, SearchHit},
    error::RosterResult,
    state::RosterState,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn get_search(
    State(state): State<RosterState>,
    Extension(kind): Extension<EntityKind>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> RosterResult<Json<Vec<SearchHit>>> {
    state.repository(kind).search(&q).await.map(Json)
}

#[cfg(test)]
mod tests {
    use crate::routes::tests::{body_json, make_request, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn empty_query_never_reaches_storage() {
        let (app, store) = test_app();

        for path in ["/students/search", "/students/search?q=", "/students/search?q=%20%20"] {
            let response = make_request(&app, Method::GET, path, String::new()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = body_json(response).await;
            assert_eq!(body, json!([]));
        }
        assert_eq!(store.accesses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn results_are_projected_and_sorted() {
        let (app, _store) = test_app();

        for (name, email) in [("John Doe", "a@x.com"), ("Amy", "jo123@y.com"), ("Bo", "bo@z.com")] {
            make_request(
                &app,
                Method::POST,
                "/students",
                json!({"name": name, "age": 30, "email": email}).to_string(),
            )
            .await;
        }

        let response = make_request(&app, Method::GET, "/students/search?q=jo", String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = body_json(response).await;
        assert_eq!(
            body,
            json!([
                {"name": "Amy", "age": 30, "email": "jo123@y.com"},
                {"name": "John Doe", "age": 30, "email": "a@x.com"},
            ])
        );

        let response =
            make_request(&app, Method::GET, "/instructors/search?q=jo", String::new()).await;
        let body: Value = body_json(response).await;
        assert_eq!(body, json!([]));
    }
}
