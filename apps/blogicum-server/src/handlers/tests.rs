use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, PostDraft, User};
use blogicum_core::ports::{BaseRepository, CommentRepository, PasswordService, TokenService};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};
use blogicum_shared::ErrorResponse;
use blogicum_shared::dto::{
    AuthResponse, CategoryPostsResponse, PageResponse, PostDetailResponse, PostFormResponse,
    PostResponse, ProfileResponse,
};

use super::{configure_routes, not_found};
use crate::middleware::auth::AUTH_COOKIE;
use crate::middleware::csrf::CsrfProtection;
use crate::state::AppState;

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .wrap(CsrfProtection)
                .app_data(web::Data::new($fx.state.clone()))
                .configure(configure_routes)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

struct Fixture {
    store: InMemoryStore,
    tokens: Arc<JwtTokenService>,
    state: AppState,
    author: User,
    reader: User,
    category: Category,
    hidden: Category,
    location: Location,
}

impl Fixture {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret-key-for-testing-only".to_string(),
            ..JwtConfig::default()
        }));
        let state = AppState::in_memory(store.clone(), tokens.clone(), 10);

        let author = store
            .users()
            .save(User::new("chekhov".into(), String::new(), "hash".into()).unwrap())
            .await
            .unwrap();
        let reader = store
            .users()
            .save(User::new("reader".into(), String::new(), "hash".into()).unwrap())
            .await
            .unwrap();
        let category = store
            .categories()
            .save(Category::new("Stories".into(), "Short prose".into(), "stories".into()).unwrap())
            .await
            .unwrap();
        let mut hidden = Category::new("Drafts".into(), "Not yet".into(), "drafts".into()).unwrap();
        hidden.is_published = false;
        let hidden = store.categories().save(hidden).await.unwrap();
        let location = store
            .locations()
            .save(Location::new("Yalta".into()).unwrap())
            .await
            .unwrap();

        Self {
            store,
            tokens,
            state,
            author,
            reader,
            category,
            hidden,
            location,
        }
    }

    fn bearer(&self, user: &User) -> (header::HeaderName, String) {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    async fn post(
        &self,
        category: &Category,
        offset: Duration,
        published: bool,
        title: &str,
    ) -> Post {
        let draft = PostDraft {
            title: title.into(),
            text: "Text".into(),
            pub_date: Utc::now() + offset,
            image: None,
            location_id: None,
            category_id: category.id,
            is_published: published,
        };
        self.store
            .posts()
            .save(Post::new(self.author.id, draft).unwrap())
            .await
            .unwrap()
    }

    async fn comment(&self, post: &Post, text: &str) -> Comment {
        self.store
            .comments()
            .save(Comment::new(post.id, self.reader.id, text.into()).unwrap())
            .await
            .unwrap()
    }
}

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn titles(page: &PageResponse<PostResponse>) -> Vec<&str> {
    page.items.iter().map(|p| p.title.as_str()).collect()
}

#[actix_rt::test]
async fn test_timeline_shows_only_public_posts() {
    let fx = Fixture::new().await;
    fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    fx.post(&fx.category, -Duration::hours(1), false, "unpublished").await;
    fx.post(&fx.category, Duration::days(1), true, "scheduled").await;
    fx.post(&fx.hidden, -Duration::hours(1), true, "hidden category").await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(titles(&page), vec!["public"]);
    assert_eq!(page.total_items, 1);

    // Logged in authors do not see their drafts on the timeline.
    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&page), vec!["public"]);
}

#[actix_rt::test]
async fn test_timeline_is_newest_first_with_comment_counts() {
    let fx = Fixture::new().await;
    let older = fx.post(&fx.category, -Duration::hours(2), true, "older").await;
    fx.post(&fx.category, -Duration::hours(1), true, "newer").await;
    fx.comment(&older, "first").await;
    fx.comment(&older, "second").await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(titles(&page), vec!["newer", "older"]);
    assert_eq!(page.items[0].comment_count, 0);
    assert_eq!(page.items[1].comment_count, 2);
}

#[actix_rt::test]
async fn test_timeline_pagination() {
    let fx = Fixture::new().await;
    for i in 0..11 {
        fx.post(&fx.category, -Duration::minutes(i + 1), true, &format!("post {i}"))
            .await;
    }
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/?page=2").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.num_pages, 2);
    assert!(page.has_previous);
    assert!(!page.has_next);

    for uri in ["/?page=3", "/?page=0", "/?page=abc"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_empty_timeline_has_one_page() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert!(page.items.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.num_pages, 1);
}

#[actix_rt::test]
async fn test_profile_owner_sees_every_post() {
    let fx = Fixture::new().await;
    fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    fx.post(&fx.category, -Duration::hours(1), false, "unpublished").await;
    fx.post(&fx.category, Duration::days(1), true, "scheduled").await;
    fx.post(&fx.hidden, -Duration::hours(1), true, "hidden category").await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/profile/chekhov/")
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let profile: ProfileResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile.posts.total_items, 4);
    assert_eq!(profile.profile.username, "chekhov");
    assert!(profile.profile.email.is_some());

    let req = test::TestRequest::get()
        .uri("/profile/chekhov/")
        .insert_header(fx.bearer(&fx.reader))
        .to_request();
    let profile: ProfileResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&profile.posts), vec!["public"]);
    assert!(profile.profile.email.is_none());

    let req = test::TestRequest::get().uri("/profile/nobody/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_category_listing() {
    let fx = Fixture::new().await;
    fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    fx.post(&fx.category, Duration::days(1), true, "scheduled").await;
    fx.post(&fx.hidden, -Duration::hours(1), true, "hidden category").await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/category/stories/").to_request();
    let listing: CategoryPostsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.category.slug, "stories");
    assert_eq!(titles(&listing.posts), vec!["public"]);

    for uri in ["/category/drafts/", "/category/missing/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_scheduled_post_detail_is_for_author_only() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, Duration::days(1), true, "scheduled").await;
    let app = app!(fx);
    let uri = format!("/posts/{}/", post.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let detail: PostDetailResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail.post.id, post.id);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(fx.bearer(&fx.reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_detail_lists_comments_oldest_first() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    fx.comment(&post, "first").await;
    fx.comment(&post, "second").await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let detail: PostDetailResponse = test::call_and_read_body_json(&app, req).await;

    let texts: Vec<&str> = detail.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(detail.comments[0].author.username, "reader");
    assert_eq!(detail.post.comment_count, 2);
}

#[actix_rt::test]
async fn test_comment_is_attributed_to_requester_and_post() {
    let fx = Fixture::new().await;
    // Unpublished posts accept comments too.
    let post = fx.post(&fx.category, -Duration::hours(1), false, "draft").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({ "text": "Lovely" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let comments = fx.store.comments().find_by_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment.post_id, post.id);
    assert_eq!(comments[0].comment.author_id, fx.reader.id);
    assert_eq!(comments[0].comment.text, "Lovely");
}

#[actix_rt::test]
async fn test_comment_on_missing_post_is_not_found() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", Uuid::new_v4()))
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({ "text": "Hello?" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_anonymous_writes_redirect_to_login() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    let app = app!(fx);

    let req = test::TestRequest::get().uri("/posts/create/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .set_json(json!({ "text": "Anonymous" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert!(fx.store.comments().find_by_post(post.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_create_post_redirects_to_profile() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/posts/create/")
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let form: PostFormResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form.categories.len(), 2);
    assert_eq!(form.locations.len(), 1);

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(fx.bearer(&fx.author))
        .set_json(json!({
            "title": "Ward No. 6",
            "text": "In the hospital yard...",
            "category_id": fx.category.id,
            "location_id": fx.location.id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/chekhov/");

    let created: PostResponse = test::read_body_json(resp).await;
    assert_eq!(created.author.id, fx.author.id);
    assert_eq!(created.location.unwrap().name, "Yalta");
    assert!(created.is_published);
}

#[actix_rt::test]
async fn test_create_post_validation() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let bodies = [
        json!({ "title": "", "text": "Body", "category_id": fx.category.id }),
        json!({ "title": "Title", "text": "Body" }),
        json!({ "title": "Title", "text": "Body", "category_id": Uuid::new_v4() }),
    ];
    for body in bodies {
        let req = test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header(fx.bearer(&fx.author))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let req = test::TestRequest::post()
        .uri("/posts/create/")
        .insert_header(fx.bearer(&fx.author))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_non_owner_is_redirected_to_post() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "original").await;
    let app = app!(fx);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({ "title": "hijacked", "text": "x", "category_id": fx.category.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    for uri in [format!("/posts/{}/edit/", post.id), format!("/posts/{}/delete/", post.id)] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(fx.bearer(&fx.reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), detail);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header(fx.bearer(&fx.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let stored = fx.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "original");
}

#[actix_rt::test]
async fn test_owner_edits_post() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "original").await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let form: PostFormResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form.post.unwrap().title, "original");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(fx.bearer(&fx.author))
        .set_json(json!({
            "title": "revised",
            "text": "Text",
            "category_id": fx.category.id,
            "is_published": false,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = fx.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "revised");
    assert!(!stored.is_published);
    assert_eq!(stored.author_id, fx.author.id);
}

#[actix_rt::test]
async fn test_partial_edit_keeps_schedule_and_draft_state() {
    let fx = Fixture::new().await;
    let mut post = fx.post(&fx.category, Duration::days(7), false, "draft").await;
    post.location_id = Some(fx.location.id);
    let post = fx.store.posts().save(post).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(fx.bearer(&fx.author))
        .set_json(json!({
            "title": "draft v2",
            "text": "Text",
            "category_id": fx.category.id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let stored = fx.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "draft v2");
    assert!(!stored.is_published);
    assert_eq!(stored.pub_date, post.pub_date);
    assert_eq!(stored.location_id, Some(fx.location.id));

    let req = test::TestRequest::get().uri("/").to_request();
    let page: PageResponse<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert!(page.items.is_empty());

    // An explicit null detaches the location.
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header(fx.bearer(&fx.author))
        .set_json(json!({ "location_id": null }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    let stored = fx.store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.location_id, None);
    assert_eq!(stored.title, "draft v2");
}

#[actix_rt::test]
async fn test_deleting_post_removes_comments() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "doomed").await;
    let comment = fx.comment(&post, "bye").await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete/", post.id))
        .insert_header(fx.bearer(&fx.author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    assert!(fx.store.posts().find_by_id(post.id).await.unwrap().is_none());
    assert!(fx.store.comments().find_by_id(comment.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_comment_edit_and_delete_are_owner_only() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    let comment = fx.comment(&post, "typo").await;
    let app = app!(fx);
    let edit_uri = format!("/posts/{}/edit_comment/{}", post.id, comment.id);
    let delete_uri = format!("/posts/{}/delete_comment/{}/", post.id, comment.id);

    // The post author does not own the reader's comment.
    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(fx.bearer(&fx.author))
        .set_json(json!({ "text": "censored" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::post()
        .uri(&edit_uri)
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({ "text": "fixed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let stored = fx.store.comments().find_by_id(comment.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "fixed");

    let req = test::TestRequest::post()
        .uri(&delete_uri)
        .insert_header(fx.bearer(&fx.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert!(fx.store.comments().find_by_id(comment.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_comment_under_wrong_post_is_not_found() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "one").await;
    let other = fx.post(&fx.category, -Duration::hours(1), true, "two").await;
    let comment = fx.comment(&post, "here").await;
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit_comment/{}", other.id, comment.id))
        .insert_header(fx.bearer(&fx.reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_edit_profile() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/edit_profile/")
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({
            "first_name": "Anton",
            "last_name": "Pavlovich",
            "email": "anton@example.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/reader/");

    let stored = fx.store.users().find_by_id(fx.reader.id).await.unwrap().unwrap();
    assert_eq!(stored.full_name(), "Anton Pavlovich");

    let req = test::TestRequest::post()
        .uri("/edit_profile/")
        .insert_header(fx.bearer(&fx.reader))
        .set_json(json!({ "email": "not-an-email" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_register_and_login() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_json(json!({ "username": "tolstoy", "password": "short" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_json(json!({ "username": "tolstoy", "password": "war-and-peace" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_json(json!({ "username": "tolstoy", "password": "anna-karenina" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "tolstoy", "password": "wrong-password" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "tolstoy", "password": "war-and-peace" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.response().cookies().any(|c| c.name() == AUTH_COOKIE));

    let auth: AuthResponse = test::read_body_json(resp).await;
    let claims = fx.tokens.validate_token(&auth.access_token).unwrap();
    assert_eq!(claims.username, "tolstoy");
}

#[actix_rt::test]
async fn test_cookie_session_requires_same_origin() {
    let fx = Fixture::new().await;
    let post = fx.post(&fx.category, -Duration::hours(1), true, "public").await;
    let app = app!(fx);
    let token = fx.tokens.generate_token(fx.reader.id, "reader").unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .cookie(actix_web::cookie::Cookie::new(AUTH_COOKIE, token.clone()))
        .set_json(json!({ "text": "cross-site" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::HOST, "blog.example.com"))
        .insert_header((header::REFERER, format!("https://blog.example.com/posts/{}/", post.id)))
        .cookie(actix_web::cookie::Cookie::new(AUTH_COOKIE, token))
        .set_json(json!({ "text": "same-site" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_rt::test]
async fn test_login_with_stored_hash() {
    let fx = Fixture::new().await;
    let hash = Argon2PasswordService::new().hash("the-seagull").unwrap();
    let mut user = User::new("nina".into(), String::new(), hash).unwrap();
    user.first_name = "Nina".into();
    fx.store.users().save(user).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(json!({ "username": "nina", "password": "the-seagull" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_unknown_route_and_bad_id_are_not_found() {
    let fx = Fixture::new().await;
    let app = app!(fx);

    for uri in ["/nowhere/", "/posts/not-a-uuid/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, 404);
    }
}
