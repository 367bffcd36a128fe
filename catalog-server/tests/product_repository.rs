//! Product repository against an embedded RocksDB store

use catalog_server::db::repository::{CatalogError, Missing, Operation, ProductRepository};
use futures::future::join_all;
use rust_decimal::Decimal;
use shared::models::{Product, ProductUpdate, Review, ReviewFilter, ReviewPatch};
use std::str::FromStr;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

async fn open_repo() -> (tempfile::TempDir, ProductRepository) {
    let tmp = tempfile::tempdir().unwrap();
    let db: Surreal<Db> = Surreal::new::<RocksDb>(tmp.path()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    let repo = ProductRepository::new(db);
    repo.ensure_indexes().await.unwrap();
    (tmp, repo)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn product(sku: &str) -> Product {
    Product {
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        price: dec("19.99"),
        category: Some("kitchen".to_string()),
        reviews: Vec::new(),
    }
}

fn review(id: &str, rating: u8) -> Review {
    Review {
        review_id: id.to_string(),
        user_id: format!("user-{id}"),
        rating,
        comment: None,
        verified: false,
    }
}

fn rating(rating: u8) -> ReviewPatch {
    ReviewPatch {
        rating: Some(rating),
        ..Default::default()
    }
}

fn is_product_not_found(err: &CatalogError) -> bool {
    matches!(
        err,
        CatalogError::NotFound {
            target: Missing::Product,
            ..
        }
    )
}

#[tokio::test]
async fn test_create_then_get_returns_same_product() {
    let (_tmp, repo) = open_repo().await;

    let mut p = product("A1");
    p.reviews.push(review("r1", 4));
    let created = repo.create(p.clone()).await.unwrap();
    assert_eq!(created, p);

    let fetched = repo.get("A1").await.unwrap();
    assert_eq!(fetched, p);
    assert_eq!(fetched.price, dec("19.99"));
}

#[tokio::test]
async fn test_create_defaults_to_no_reviews() {
    let (_tmp, repo) = open_repo().await;

    let mut p = product("A1");
    p.category = None;
    let created = repo.create(p).await.unwrap();
    assert!(created.reviews.is_empty());
    assert!(created.category.is_none());
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let (_tmp, repo) = open_repo().await;

    repo.create(product("A1")).await.unwrap();
    let err = repo.create(product("A1")).await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Conflict {
            op: Operation::Create,
            ..
        }
    ));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_have_one_winner() {
    let (_tmp, repo) = open_repo().await;

    let attempts = (0..8).map(|i| {
        let repo = repo.clone();
        let mut p = product("A1");
        p.name = format!("Attempt {i}");
        async move { repo.create(p).await }
    });
    let results = join_all(attempts).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(result, CatalogError::Conflict { .. }), "{result}");
    }
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (_tmp, repo) = open_repo().await;

    let err = repo.get("nope").await.unwrap_err();
    assert!(is_product_not_found(&err));
    assert_eq!(err.op(), Operation::Get);
    assert_eq!(err.sku(), Some("nope"));
}

#[tokio::test]
async fn test_list_returns_every_product() {
    let (_tmp, repo) = open_repo().await;
    assert!(repo.list().await.unwrap().is_empty());

    for sku in ["A1", "B2", "C3"] {
        repo.create(product(sku)).await.unwrap();
    }
    let mut skus: Vec<String> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.sku)
        .collect();
    skus.sort();
    assert_eq!(skus, ["A1", "B2", "C3"]);
}

#[tokio::test]
async fn test_update_merges_only_supplied_fields() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews.push(review("r1", 5));
    repo.create(p).await.unwrap();

    let updated = repo
        .update(
            "A1",
            ProductUpdate {
                price: Some(dec("149.99")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, dec("149.99"));
    assert_eq!(updated.name, "Product A1");
    assert_eq!(updated.category.as_deref(), Some("kitchen"));
    assert_eq!(updated.reviews.len(), 1);

    assert_eq!(repo.get("A1").await.unwrap(), updated);
}

#[tokio::test]
async fn test_empty_update_is_noop() {
    let (_tmp, repo) = open_repo().await;
    let created = repo.create(product("A1")).await.unwrap();

    let updated = repo.update("A1", ProductUpdate::default()).await.unwrap();
    assert_eq!(updated, created);

    let err = repo.update("ghost", ProductUpdate::default()).await.unwrap_err();
    assert!(is_product_not_found(&err));
    assert_eq!(err.op(), Operation::Update);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_all_land() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("A1")).await.unwrap();

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                let changes = ProductUpdate {
                    name: Some(format!("Name {i}")),
                    ..Default::default()
                };
                repo.update("A1", changes).await
            })
        })
        .collect();

    for result in join_all(writers).await {
        let updated = result.unwrap();
        assert!(updated.is_ok(), "{}", updated.unwrap_err());
    }
    let stored = repo.get("A1").await.unwrap();
    assert!(stored.name.starts_with("Name "));
    assert_eq!(stored.price, dec("19.99"));
}

#[tokio::test]
async fn test_update_missing_is_not_found_and_creates_nothing() {
    let (_tmp, repo) = open_repo().await;

    let err = repo
        .update(
            "ghost",
            ProductUpdate {
                name: Some("Ghost".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(is_product_not_found(&err));
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("A1")).await.unwrap();

    let deleted = repo.delete("A1").await.unwrap();
    assert_eq!(deleted.sku, "A1");
    assert_eq!(deleted.message, "Product 'A1' deleted successfully");

    assert!(is_product_not_found(&repo.get("A1").await.unwrap_err()));
    let err = repo.delete("A1").await.unwrap_err();
    assert!(is_product_not_found(&err));
    assert_eq!(err.op(), Operation::Delete);
}

#[tokio::test]
async fn test_add_review_appends_in_order() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("A1")).await.unwrap();

    repo.add_review("A1", review("r1", 3)).await.unwrap();
    repo.add_review("A1", review("r2", 5)).await.unwrap();
    // Duplicate ids are accepted
    let updated = repo.add_review("A1", review("r1", 1)).await.unwrap();

    let ids: Vec<_> = updated.reviews.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(ids, ["r1", "r2", "r1"]);
    assert_eq!(updated.reviews[2].rating, 1);
    assert_eq!(repo.get("A1").await.unwrap(), updated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_review_keeps_every_review() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("A1")).await.unwrap();

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.add_review("A1", review(&format!("r{i}"), 4)).await })
        })
        .collect();

    for result in join_all(writers).await {
        let added = result.unwrap();
        assert!(added.is_ok(), "{}", added.unwrap_err());
    }

    let stored = repo.get("A1").await.unwrap();
    assert_eq!(stored.reviews.len(), 16);
    for i in 0..16 {
        let id = format!("r{i}");
        assert!(stored.reviews.iter().any(|r| r.review_id == id), "{id} was lost");
    }
}

#[tokio::test]
async fn test_add_review_to_missing_product() {
    let (_tmp, repo) = open_repo().await;

    let err = repo.add_review("ghost", review("r1", 3)).await.unwrap_err();
    assert!(is_product_not_found(&err));
    assert_eq!(err.op(), Operation::AddReview);
}

#[tokio::test]
async fn test_update_review_by_position_patches_first_match_only() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = vec![review("r1", 2), review("r2", 2), review("r1", 2)];
    repo.create(p).await.unwrap();

    let patch = ReviewPatch {
        rating: Some(5),
        comment: Some("better now".into()),
        ..Default::default()
    };
    let updated = repo
        .update_review_by_position("A1", "r1", patch)
        .await
        .unwrap();

    assert_eq!(updated.reviews[0].rating, 5);
    assert_eq!(updated.reviews[0].comment.as_deref(), Some("better now"));
    assert_eq!(updated.reviews[0].user_id, "user-r1");
    assert_eq!(updated.reviews[1].rating, 2);
    assert_eq!(updated.reviews[2].rating, 2);
    assert!(updated.reviews[2].comment.is_none());
}

#[tokio::test]
async fn test_update_review_by_position_not_found_cases() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = vec![review("r1", 2)];
    repo.create(p.clone()).await.unwrap();

    let err = repo
        .update_review_by_position("A1", "r9", rating(5))
        .await
        .unwrap_err();
    match &err {
        CatalogError::NotFound {
            target: Missing::Review(criteria),
            sku,
            ..
        } => {
            assert_eq!(sku, "A1");
            assert!(criteria.contains("r9"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.get("A1").await.unwrap(), p);

    let err = repo
        .update_review_by_position("ghost", "r1", rating(5))
        .await
        .unwrap_err();
    assert!(is_product_not_found(&err));
}

#[tokio::test]
async fn test_update_reviews_by_filter_patches_every_match() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = vec![review("r1", 2), review("r2", 4), review("r3", 2)];
    repo.create(p).await.unwrap();

    let filter = ReviewFilter {
        rating: Some(2),
        ..Default::default()
    };
    let patch = ReviewPatch {
        verified: Some(true),
        ..Default::default()
    };
    let updated = repo
        .update_reviews_by_filter("A1", filter, patch)
        .await
        .unwrap();

    let verified: Vec<bool> = updated.reviews.iter().map(|r| r.verified).collect();
    assert_eq!(verified, [true, false, true]);
    assert_eq!(repo.get("A1").await.unwrap(), updated);
}

#[tokio::test]
async fn test_update_reviews_by_filter_without_match_is_unchanged() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = vec![review("r1", 2)];
    repo.create(p.clone()).await.unwrap();

    let unchanged = repo
        .update_reviews_by_filter("A1", ReviewFilter::by_review_id("nope"), rating(5))
        .await
        .unwrap();
    assert_eq!(unchanged, p);

    let err = repo
        .update_reviews_by_filter("ghost", ReviewFilter::by_review_id("r1"), rating(5))
        .await
        .unwrap_err();
    assert!(is_product_not_found(&err));
    assert_eq!(err.op(), Operation::UpdateReviewsByFilter);
}

#[tokio::test]
async fn test_concurrent_review_patches_lose_no_update() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = (0..6).map(|i| review(&format!("r{i}"), 1)).collect();
    repo.create(p).await.unwrap();

    let patches = (0..6).map(|i| {
        let repo = repo.clone();
        async move {
            repo.update_review_by_position("A1", &format!("r{i}"), rating(5))
                .await
        }
    });
    let results = join_all(patches).await;

    let stored = repo.get("A1").await.unwrap();
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(_) => assert_eq!(stored.reviews[i].rating, 5, "update of r{i} was lost"),
            Err(CatalogError::Contended { attempts, .. }) => assert!(*attempts > 0),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(results.iter().any(|r| r.is_ok()));
}

#[tokio::test]
async fn test_review_patch_after_append_sees_new_review() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("A1")).await.unwrap();
    repo.add_review("A1", review("r1", 1)).await.unwrap();

    let updated = repo
        .update_review_by_position("A1", "r1", rating(4))
        .await
        .unwrap();
    repo.add_review("A1", review("r2", 2)).await.unwrap();
    let updated_again = repo
        .update_reviews_by_filter("A1", ReviewFilter::default(), rating(3))
        .await
        .unwrap();

    assert_eq!(updated.reviews[0].rating, 4);
    assert!(updated_again.reviews.iter().all(|r| r.rating == 3));
    assert_eq!(updated_again.reviews.len(), 2);
}

#[tokio::test]
async fn test_ratings_summary_reports_null_average_without_reviews() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("EMPTY")).await.unwrap();
    let mut rated = product("A1");
    rated.reviews = vec![review("r1", 3), review("r2", 5)];
    repo.create(rated).await.unwrap();

    let mut summary = repo.ratings_summary().await.unwrap();
    summary.sort_by(|a, b| a.sku.cmp(&b.sku));
    assert_eq!(summary.len(), 2);

    assert_eq!(summary[0].sku, "A1");
    assert_eq!(summary[0].review_count, 2);
    assert_eq!(summary[0].avg_rating, Some(4.0));
    assert_eq!(summary[0].price, dec("19.99"));

    assert_eq!(summary[1].sku, "EMPTY");
    assert_eq!(summary[1].review_count, 0);
    assert_eq!(summary[1].avg_rating, None);
}

#[tokio::test]
async fn test_rating_for_sku_averages_reviews() {
    let (_tmp, repo) = open_repo().await;
    let mut p = product("A1");
    p.reviews = vec![review("r1", 3), review("r2", 5)];
    repo.create(p).await.unwrap();

    let rating = repo.rating_for_sku("A1").await.unwrap();
    assert_eq!(rating.sku, "A1");
    assert_eq!(rating.name, "Product A1");
    assert_eq!(rating.avg_rating, 4.0);
    assert_eq!(rating.review_count, 2);
}

#[tokio::test]
async fn test_rating_for_sku_not_found_cases() {
    let (_tmp, repo) = open_repo().await;
    repo.create(product("EMPTY")).await.unwrap();

    let err = repo.rating_for_sku("EMPTY").await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            target: Missing::Reviews,
            ..
        }
    ));

    let err = repo.rating_for_sku("ghost").await.unwrap_err();
    assert!(is_product_not_found(&err));
}

#[tokio::test]
async fn test_ensure_indexes_is_idempotent() {
    let (_tmp, repo) = open_repo().await;

    let first = repo.ensure_indexes().await.unwrap();
    let second = repo.ensure_indexes().await.unwrap();
    assert_eq!(first, second);

    let names: Vec<&str> = first.iter().map(|i| i.name.as_str()).collect();
    for expected in ["idx_price", "idx_reviews_review_id", "idx_sku_unique"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    let sku_index = first.iter().find(|i| i.name == "idx_sku_unique").unwrap();
    assert!(sku_index.definition.contains("UNIQUE"));
}
