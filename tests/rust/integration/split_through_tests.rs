//! Reads over author → posts → comments (→ ratings) with one query per hop.

use anyhow::Result;

use splithop::scope::{Condition, Value};

use super::fixtures::*;

#[tokio::test]
async fn test_counting_on_split_through() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_chain(), &blog.mary).await?;

    assert_eq!(comments.count().await?, 2);
    assert_eq!(blog.executor.query_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_counting_with_key_accessors_and_custom_key() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_2_chain(), &blog.mary).await?;

    assert_eq!(comments.count().await?, 2);
    assert_eq!(blog.executor.query_count(), 2);
    assert!(blog
        .executor
        .queries()
        .iter()
        .any(|q| q.contains("origin_post_id IN (1, 2)")));
    Ok(())
}

#[tokio::test]
async fn test_pluck_on_split_through() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_chain(), &blog.mary).await?;

    assert_eq!(
        comments.pluck("id").await?,
        vec![blog.comment1.clone(), blog.comment2.clone()]
    );
    assert_eq!(blog.executor.query_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_first_on_split_through() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_chain(), &blog.mary).await?;
    let first = comments.first().await?.expect("mary has comments");

    assert_eq!(first.value("id"), &blog.comment1);
    assert_eq!(blog.executor.query_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_to_a_on_split_through() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_chain(), &blog.mary).await?;

    assert_eq!(
        row_ids(&comments.to_a().await?),
        vec![blog.comment1.clone(), blog.comment2.clone()]
    );
    assert_eq!(blog.executor.query_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_new_rows_show_up_on_the_next_resolve() -> Result<()> {
    let blog = Blog::new();
    let chain = comments_chain();

    let before = blog.resolver.resolve(&chain, &blog.mary).await?;
    assert_eq!(before.count().await?, 2);

    let comment3 = blog.add_comment(&blog.post1, None);

    let after = blog.resolver.resolve(&chain, &blog.mary).await?;
    assert_eq!(
        row_ids(&after.to_a().await?),
        vec![blog.comment1.clone(), blog.comment2.clone(), comment3]
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_owner_on_split_through() -> Result<()> {
    let blog = Blog::new();

    let comments = blog.resolver.resolve(&comments_chain(), &blog.bob).await?;

    assert!(comments.is_none());
    assert!(comments.to_a().await?.is_empty());
    assert_eq!(comments.count().await?, 0);
    assert_eq!(blog.executor.query_count(), 1);
    assert_eq!(queries_on(&blog.executor, "comments"), 0);
    Ok(())
}

#[tokio::test]
async fn test_pluck_on_split_through_a_through() -> Result<()> {
    let blog = Blog::new();

    let ratings = blog.resolver.resolve(&ratings_chain(), &blog.mary).await?;

    assert_eq!(
        ratings.pluck("id").await?,
        vec![blog.rating1.clone(), blog.rating2.clone()]
    );
    assert_eq!(blog.executor.query_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_count_on_constrained_split_through_a_through() -> Result<()> {
    let blog = Blog::new();

    let ratings = blog
        .resolver
        .resolve(&good_ratings_chain(), &blog.mary)
        .await?;

    assert_eq!(ratings.count().await?, 2);
    assert_eq!(blog.executor.query_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_constraint_filters_final_hop() -> Result<()> {
    let blog = Blog::new();
    blog.executor.insert(
        "ratings",
        splithop::Row::new()
            .with("comment_id", blog.comment2.clone())
            .with("value", 2),
    )?;

    let all = blog.resolver.resolve(&ratings_chain(), &blog.mary).await?;
    let good = blog
        .resolver
        .resolve(&good_ratings_chain(), &blog.mary)
        .await?;

    assert_eq!(all.count().await?, 3);
    assert_eq!(
        good.pluck("value").await?,
        vec![Value::Int(8), Value::Int(9)]
    );
    Ok(())
}

#[tokio::test]
async fn test_filter_narrows_resolved_relation() -> Result<()> {
    let blog = Blog::new();

    let ratings = blog.resolver.resolve(&ratings_chain(), &blog.mary).await?;
    let nines = ratings.filter(Condition::eq("value", 9));

    assert_eq!(row_ids(&nines.to_a().await?), vec![blog.rating2.clone()]);
    assert_eq!(ratings.count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_preload_aligns_with_owners() -> Result<()> {
    let blog = Blog::new();

    let loaded = blog
        .resolver
        .preload(&comments_chain(), &[blog.mary.clone(), blog.bob.clone()])
        .await?;

    assert_eq!(loaded.len(), 2);
    assert_eq!(
        row_ids(&loaded[0]),
        vec![blog.comment1.clone(), blog.comment2.clone()]
    );
    assert!(loaded[1].is_empty());
    // one posts query and one comments query shared by both owners
    assert_eq!(blog.executor.query_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_owner_of_another_type_is_rejected() -> Result<()> {
    let blog = Blog::new();

    let err = blog
        .resolver
        .resolve(&comments_chain(), &splithop::Owner::new("Hotel", 1))
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(blog.executor.query_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_column_surfaces_as_execution_error() -> Result<()> {
    let blog = Blog::new();
    let chain = splithop::Chain::new(vec![
        splithop::Hop::new("posts", "Author", "posts").join_keys("writer_id", "id"),
        splithop::Hop::new("comments", "posts", "comments").join_keys("post_id", "id"),
    ])?;

    let err = blog.resolver.resolve(&chain, &blog.mary).await.unwrap_err();

    assert_eq!(
        err,
        splithop::ResolveError::Execution(splithop::ExecutionError::UnknownColumn {
            column: "writer_id".to_string(),
            table: "posts".to_string(),
        })
    );
    Ok(())
}
