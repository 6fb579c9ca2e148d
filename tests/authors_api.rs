mod common;

use common::{ids, spawn_empty, spawn_seeded};
use serde_json::{json, Value};

#[tokio::test]
async fn author_lists_their_books_without_back_reference() {
    let server = spawn_seeded().await;

    let author = server.get_json("/api/authors/3").await;

    assert_eq!(author["firstName"], "Prénom 2");
    assert_eq!(author["lastName"], "Nom 2");
    assert_eq!(ids(&author["books"]), vec![3, 13]);
    assert!(author["books"][0].get("author").is_none());
}

#[tokio::test]
async fn list_includes_every_author() {
    let server = spawn_seeded().await;

    let authors = server.get_json("/api/authors").await;

    assert_eq!(ids(&authors), (1..=10).collect::<Vec<_>>());
    assert_eq!(ids(&authors[9]["books"]), vec![10, 20]);
}

#[tokio::test]
async fn unknown_author_is_404() {
    let server = spawn_seeded().await;

    assert_eq!(server.get("/api/authors/77").await.status(), 404);
}

#[tokio::test]
async fn create_author_then_attach_a_book() {
    let server = spawn_empty().await;

    let author_id = server.create_author("Ursula", "Le Guin").await;
    let resp = server
        .post_as(
            &server.admin_token,
            "/api/books",
            json!({ "title": "Les Dépossédés", "idAuthor": author_id }),
        )
        .await;
    assert_eq!(resp.status(), 201);

    let author = server.get_json(&format!("/api/authors/{author_id}")).await;
    assert_eq!(author["books"][0]["title"], "Les Dépossédés");
}

#[tokio::test]
async fn create_author_validates_names() {
    let server = spawn_empty().await;

    let resp = server
        .post_as(
            &server.admin_token,
            "/api/authors",
            json!({ "firstName": " ", "lastName": "Woolf" }),
        )
        .await;

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["details"][0]["field"], "firstName");
    assert_eq!(server.get_json("/api/authors").await, json!([]));
}

#[tokio::test]
async fn deleting_an_author_cascades_to_cached_books() {
    let server = spawn_seeded().await;
    // Warm every cached read that mentions author 1.
    assert_eq!(server.get_json("/api/books/1").await["author"]["id"], 1);
    assert_eq!(server.get_json("/api/books/11").await["author"]["id"], 1);
    assert_eq!(ids(&server.get_json("/api/books").await).len(), 20);

    let resp = server.delete_as(&server.admin_token, "/api/authors/1").await;
    assert_eq!(resp.status(), 204);

    assert_eq!(server.get("/api/books/1").await.status(), 404);
    assert_eq!(server.get("/api/books/11").await.status(), 404);
    let remaining = ids(&server.get_json("/api/books").await);
    assert_eq!(remaining.len(), 18);
    assert!(!remaining.contains(&1) && !remaining.contains(&11));
    assert_eq!(server.get("/api/authors/1").await.status(), 404);
}

#[tokio::test]
async fn author_writes_require_admin() {
    let server = spawn_seeded().await;

    let create = server
        .post_as(
            &server.user_token,
            "/api/authors",
            json!({ "firstName": "A", "lastName": "B" }),
        )
        .await;
    assert_eq!(create.status(), 403);

    let delete = server.delete_as(&server.user_token, "/api/authors/2").await;
    assert_eq!(delete.status(), 403);
    assert_eq!(server.get_json("/api/authors/2").await["id"], 2);
}
