//! Discriminated hops: polymorphic owners and fixed source types.

use anyhow::Result;

use splithop::scope::{Condition, OrderClause, Value};

use super::fixtures::*;

#[tokio::test]
async fn test_counting_on_ordered_polymorphic_source() -> Result<()> {
    let blog = Blog::new();

    let members = blog
        .resolver
        .resolve(&ordered_members_chain(), &blog.mary)
        .await?;

    assert_eq!(members.count().await?, 2);
    assert_eq!(blog.executor.query_count(), 3);
    assert!(blog
        .executor
        .queries()
        .iter()
        .any(|q| q.contains("resource_type = 'Member'")));
    Ok(())
}

#[tokio::test]
async fn test_ordered_polymorphic_source_to_a() -> Result<()> {
    let blog = Blog::new();

    let members = blog
        .resolver
        .resolve(&ordered_members_chain(), &blog.mary)
        .await?;

    assert_eq!(
        row_ids(&members.to_a().await?),
        vec![blog.member2.clone(), blog.member1.clone()]
    );
    Ok(())
}

#[tokio::test]
async fn test_reorder_on_polymorphic_source() -> Result<()> {
    let blog = Blog::new();

    let members = blog
        .resolver
        .resolve(&ordered_members_chain(), &blog.mary)
        .await?
        .reorder(vec![OrderClause::asc("id")]);

    assert_eq!(
        row_ids(&members.to_a().await?),
        vec![blog.member1.clone(), blog.member2.clone()]
    );
    Ok(())
}

#[tokio::test]
async fn test_chained_filters_on_polymorphic_source() -> Result<()> {
    let blog = Blog::new();
    let member3 = blog.add_member(None);
    let member4 = blog.add_member(Some("named"));
    blog.add_comment(&blog.post1, Some(("Member", &member3)));
    blog.add_comment(&blog.post1, Some(("Member", &member4)));

    let members = blog
        .resolver
        .resolve(&ordered_members_chain(), &blog.mary)
        .await?;
    let unnamed = members.filter(Condition::eq("name", Value::Null));
    let of_type = unnamed.filter(Condition::eq("member_type_id", blog.member_type.clone()));

    let expected = vec![member3, blog.member2.clone(), blog.member1.clone()];
    assert_eq!(row_ids(&unnamed.to_a().await?), expected);
    assert_eq!(row_ids(&of_type.to_a().await?), expected);
    assert_eq!(members.count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn test_limit_and_first_on_polymorphic_source() -> Result<()> {
    let blog = Blog::new();

    let members = blog
        .resolver
        .resolve(&ordered_members_chain(), &blog.mary)
        .await?;

    assert_eq!(
        row_ids(&members.limit(1).await?),
        vec![blog.member2.clone()]
    );
    assert!(blog
        .executor
        .queries()
        .last()
        .is_some_and(|q| q.ends_with("LIMIT 1")));
    assert_eq!(
        members.first().await?.map(|m| m.value("id").clone()),
        Some(blog.member2.clone())
    );
    Ok(())
}

#[tokio::test]
async fn test_source_type_keeps_only_matching_chefs() -> Result<()> {
    let hotel = Hotel::new();

    let cake = hotel
        .resolver
        .resolve(&designers_chain("CakeDesigner", "cake_designers", false), &hotel.hotel)
        .await?;
    let drink = hotel
        .resolver
        .resolve(&designers_chain("DrinkDesigner", "drink_designers", false), &hotel.hotel)
        .await?;

    assert_eq!(row_ids(&cake.to_a().await?), ids(&[1, 2]));
    assert_eq!(row_ids(&drink.to_a().await?), ids(&[1]));
    assert!(hotel
        .executor
        .queries()
        .iter()
        .any(|q| q.contains("FROM chefs") && q.contains("employable_type = 'CakeDesigner'")));
    Ok(())
}

#[tokio::test]
async fn test_source_type_stops_sibling_rows_duplicating_split_results() -> Result<()> {
    let hotel = Hotel::new();

    let discriminated = hotel
        .resolver
        .resolve(&designers_chain("CakeDesigner", "cake_designers", true), &hotel.hotel)
        .await?;
    let undiscriminated = hotel
        .resolver
        .resolve(&undiscriminated_designers_chain("cake_designers", true), &hotel.hotel)
        .await?;

    assert!(discriminated.is_split());
    // ... WHERE chefs.employable_type = 'CakeDesigner' ORDER BY departments.id DESC
    assert_eq!(row_ids(&discriminated.to_a().await?), ids(&[2, 1]));
    assert_eq!(discriminated.count().await?, 2);
    // the drink designer chef shares employable_id 1 and repeats cake designer 1
    assert_eq!(row_ids(&undiscriminated.to_a().await?), ids(&[2, 1, 1]));
    Ok(())
}

#[tokio::test]
async fn test_polymorphic_owner_filters_on_owner_type() -> Result<()> {
    let hotel = Hotel::new();

    let designers = hotel
        .resolver
        .resolve(&mocktail_designers_chain(), &hotel.hotel)
        .await?;

    assert_eq!(row_ids(&designers.to_a().await?), ids(&[1]));
    assert!(hotel.executor.queries()[0].contains("employable_list_type = 'Hotel'"));
    Ok(())
}

#[tokio::test]
async fn test_preload_through_polymorphic_owner() -> Result<()> {
    let hotel = Hotel::new();

    let loaded = hotel
        .resolver
        .preload(&mocktail_designers_chain(), &[hotel.hotel.clone()])
        .await?;

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0][0].value("name"), &Value::from("virgin"));
    Ok(())
}
