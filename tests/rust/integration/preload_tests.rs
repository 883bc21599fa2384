//! Preloading a chain for many owners at once.

use anyhow::Result;

use splithop::{Chain, Owner, Row, SplitResolver, Value};

use super::fixtures::*;

/// Gives bob a post with comments from both members, one of them rated.
fn with_bob_writing(blog: &Blog) -> Result<()> {
    let post = blog
        .executor
        .insert("posts", Row::new().with("author_id", 2).with("title", "bob"))?;
    let comment = blog.add_comment(&post, Some(("Member", &blog.member1)));
    blog.add_comment(&post, Some(("Member", &blog.member2)));
    blog.add_comment(&blog.post2, Some(("Member", &blog.member1)));
    blog.executor
        .insert("ratings", Row::new().with("comment_id", comment).with("value", 6))?;
    Ok(())
}

async fn assert_preload_matches_resolve(
    resolver: &SplitResolver,
    chain: &Chain,
    owners: &[Owner],
) -> Result<()> {
    let loaded = resolver.preload(chain, owners).await?;

    assert_eq!(loaded.len(), owners.len());
    for (owner, rows) in owners.iter().zip(&loaded) {
        let resolved = resolver.resolve(chain, owner).await?.to_a().await?;
        assert_eq!(
            rows,
            &resolved,
            "`{}` for {} {}",
            chain.last().name(),
            owner.type_name,
            owner.id
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_preload_costs_one_query_per_hop() -> Result<()> {
    let blog = Blog::new();
    with_bob_writing(&blog)?;
    let owners: Vec<Owner> = (1..=5).map(|id| Owner::new("Author", id)).collect();
    blog.executor.reset_query_count();

    let loaded = blog.resolver.preload(&ratings_chain(), &owners).await?;

    assert_eq!(blog.executor.query_count(), 3);
    assert_eq!(
        row_ids(&loaded[0]),
        vec![blog.rating1.clone(), blog.rating2.clone()]
    );
    assert_eq!(loaded[1].len(), 1);
    assert_eq!(loaded[2].len(), 1);
    assert!(loaded[3].is_empty());
    assert!(loaded[4].is_empty());
    Ok(())
}

#[tokio::test]
async fn test_preload_stops_when_no_owner_reaches_the_target() -> Result<()> {
    let blog = Blog::new();
    let owners = [Owner::new("Author", 8), Owner::new("Author", 9)];

    let loaded = blog.resolver.preload(&ratings_chain(), &owners).await?;

    assert_eq!(loaded, vec![Vec::<Row>::new(), Vec::new()]);
    assert_eq!(blog.executor.query_count(), 1);
    assert_eq!(queries_on(&blog.executor, "ratings"), 0);
    Ok(())
}

#[tokio::test]
async fn test_preload_matches_resolve_for_every_blog_chain() -> Result<()> {
    let blog = Blog::new();
    with_bob_writing(&blog)?;
    let owners = [
        blog.mary.clone(),
        blog.bob.clone(),
        Owner::new("Author", 3),
        Owner::new("Author", 9),
        Owner::new("Author", Value::Null),
        blog.mary.clone(),
    ];

    for chain in [
        comments_chain(),
        comments_2_chain(),
        comments_by_newest_post_chain(),
        ratings_chain(),
        good_ratings_chain(),
        ordered_members_chain(),
        members_by_newest_post_chain(),
    ] {
        assert_preload_matches_resolve(&blog.resolver, &chain, &owners).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_preload_keeps_repeated_rows_per_owner() -> Result<()> {
    let blog = Blog::new();
    with_bob_writing(&blog)?;

    let loaded = blog
        .resolver
        .preload(
            &members_by_newest_post_chain(),
            &[blog.mary.clone(), blog.bob.clone()],
        )
        .await?;

    // mary: post 2 → member 2, member 1; post 1 → member 1
    assert_eq!(
        row_ids(&loaded[0]),
        vec![
            blog.member2.clone(),
            blog.member1.clone(),
            blog.member1.clone()
        ]
    );
    assert_eq!(
        row_ids(&loaded[1]),
        vec![blog.member1.clone(), blog.member2.clone()]
    );
    Ok(())
}

#[tokio::test]
async fn test_preload_matches_resolve_for_discriminated_hotel_chains() -> Result<()> {
    let hotel = Hotel::new();
    let owners = [hotel.hotel.clone(), Owner::new("Hotel", 2)];

    for chain in [
        designers_chain("CakeDesigner", "cake_designers", false),
        designers_chain("CakeDesigner", "cake_designers", true),
        undiscriminated_designers_chain("cake_designers", true),
        mocktail_designers_chain(),
    ] {
        assert_preload_matches_resolve(&hotel.resolver, &chain, &owners).await?;
    }
    Ok(())
}
